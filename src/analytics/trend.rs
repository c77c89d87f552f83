use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

/// Mean day-over-day change (percentage points) beyond which a series is
/// considered to be moving.
pub const TREND_THRESHOLD_PCT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Flat,
    InsufficientData,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Flat => "flat",
            Trend::InsufficientData => "insufficient data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DayKind {
    Weekday,
    Weekend,
}

impl DayKind {
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => DayKind::Weekend,
            _ => DayKind::Weekday,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayKind::Weekday => "weekday",
            DayKind::Weekend => "weekend",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusiestDay {
    pub date: NaiveDate,
    pub utilization: f64,
    pub kind: DayKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub trend: Trend,
    pub mean_daily_delta: Option<f64>,
    pub busiest_day: Option<BusiestDay>,
}

impl TrendReport {
    pub fn label(&self) -> String {
        let Some(delta) = self.mean_daily_delta else {
            return self.trend.as_str().to_string();
        };

        let mut label = format!("{} ({delta:+.1} pts/day)", self.trend.as_str());
        if let Some(busiest) = &self.busiest_day {
            label.push_str(&format!(
                "; busiest day {} ({:.1}%) was a {}",
                busiest.date,
                busiest.utilization,
                busiest.kind.as_str()
            ));
        }
        label
    }
}

/// Classifies a daily utilization series (percent, one entry per day with data).
///
/// Deltas are taken between consecutive days present in the series; missing
/// days are skipped rather than treated as zero.
pub fn classify_trend(daily: &BTreeMap<NaiveDate, f64>) -> TrendReport {
    let busiest_day = daily
        .iter()
        .fold(None::<(NaiveDate, f64)>, |best, (&date, &value)| match best {
            Some((_, top)) if value <= top => best,
            _ => Some((date, value)),
        })
        .map(|(date, utilization)| BusiestDay {
            date,
            utilization,
            kind: DayKind::of(date),
        });

    if daily.len() < 2 {
        return TrendReport {
            trend: Trend::InsufficientData,
            mean_daily_delta: None,
            busiest_day,
        };
    }

    let values: Vec<f64> = daily.values().copied().collect();
    let deltas: Vec<f64> = values.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let mean_delta = deltas.iter().sum::<f64>() / deltas.len() as f64;

    let trend = if mean_delta > TREND_THRESHOLD_PCT {
        Trend::Increasing
    } else if mean_delta < -TREND_THRESHOLD_PCT {
        Trend::Decreasing
    } else {
        Trend::Flat
    };

    TrendReport {
        trend,
        mean_daily_delta: Some(mean_delta),
        busiest_day,
    }
}
