use std::collections::BTreeMap;

use chrono::{Datelike, Timelike, Weekday};
use serde::Serialize;

use crate::db::Reading;

use super::buckets::group_by;

/// How many hours are reported as all-time peak hours.
pub const PEAK_HOUR_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayUtilization {
    pub weekday: Weekday,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourUtilization {
    pub hour: u32,
    pub utilization: f64,
}

/// Utilization (percent) grouped by ISO weekday and, independently, by hour of day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryBreakdown {
    /// Monday first; weekdays without samples are omitted.
    pub weekday: Vec<WeekdayUtilization>,
    pub hourly: BTreeMap<u32, f64>,
    pub peak_hours: Vec<HourUtilization>,
}

impl HistoryBreakdown {
    pub fn is_empty(&self) -> bool {
        self.weekday.is_empty() && self.hourly.is_empty()
    }
}

pub fn weekday_hour_breakdown(readings: &[Reading]) -> HistoryBreakdown {
    let weekday = group_by(readings, |r| r.timestamp.weekday().number_from_monday())
        .into_iter()
        .filter_map(|(number, mean)| {
            weekday_from_number(number).map(|weekday| WeekdayUtilization {
                weekday,
                utilization: mean.fraction() * 100.0,
            })
        })
        .collect();

    let hourly: BTreeMap<u32, f64> = group_by(readings, |r| r.timestamp.hour())
        .into_iter()
        .map(|(hour, mean)| (hour, mean.fraction() * 100.0))
        .collect();

    let peak_hours = top_hours(&hourly, PEAK_HOUR_COUNT);

    HistoryBreakdown {
        weekday,
        hourly,
        peak_hours,
    }
}

/// The `count` busiest hours, highest first. The sort is stable over the
/// ascending hour order, so ties keep the earlier hour first.
pub fn top_hours(hourly: &BTreeMap<u32, f64>, count: usize) -> Vec<HourUtilization> {
    let mut ranked: Vec<HourUtilization> = hourly
        .iter()
        .map(|(&hour, &utilization)| HourUtilization { hour, utilization })
        .collect();
    ranked.sort_by(|a, b| b.utilization.total_cmp(&a.utilization));
    ranked.truncate(count);
    ranked
}

fn weekday_from_number(number: u32) -> Option<Weekday> {
    match number {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}
