pub mod config;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

pub use config::RecommendationConfig;

const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Tip {
    PremiumPricing {
        hour: u32,
        threshold: f64,
        /// Share of observed buckets at `hour` that crossed the threshold
        share: f64,
    },
    EarlyBirdDiscount {
        hour: u32,
        threshold: f64,
        share: f64,
    },
    NoStrongTrend,
    NoData,
}

impl fmt::Display for Tip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tip::PremiumPricing {
                hour,
                threshold,
                share,
            } => write!(
                f,
                "Premium pricing between {:02}:00–{:02}:00 (≥ {:.0}% full on {:.0}% of days)",
                hour,
                (hour + 1) % 24,
                threshold * 100.0,
                share * 100.0
            ),
            Tip::EarlyBirdDiscount {
                hour,
                threshold,
                share,
            } => write!(
                f,
                "Early-bird discount around {:02}:00–{:02}:00 (≤ {:.0}% full on {:.0}% of days)",
                hour,
                (hour + 1) % 24,
                threshold * 100.0,
                share * 100.0
            ),
            Tip::NoStrongTrend => write!(f, "No strong trends detected – keep flat pricing."),
            Tip::NoData => write!(f, "No data yet – run the collector first."),
        }
    }
}

/// Per hour-of-day tallies of threshold crossings.
#[derive(Debug, Default)]
struct HourTally {
    observed: [u32; HOURS_PER_DAY],
    above: [u32; HOURS_PER_DAY],
    below: [u32; HOURS_PER_DAY],
}

impl HourTally {
    fn from_series(
        hourly: &BTreeMap<DateTime<Utc>, f64>,
        config: &RecommendationConfig,
    ) -> Self {
        let mut tally = Self::default();
        for (bucket, &utilization) in hourly {
            let hour = bucket.hour() as usize;
            tally.observed[hour] += 1;
            if utilization > config.high_threshold {
                tally.above[hour] += 1;
            }
            if utilization < config.low_threshold {
                tally.below[hour] += 1;
            }
        }
        tally
    }

    /// Hour with the most crossings, first maximum in ascending hour order.
    /// `None` when nothing crossed.
    fn modal_hour(&self, counts: &[u32; HOURS_PER_DAY]) -> Option<(u32, f64)> {
        let mut best: Option<usize> = None;
        for hour in 0..HOURS_PER_DAY {
            if counts[hour] == 0 {
                continue;
            }
            match best {
                Some(current) if counts[hour] <= counts[current] => {}
                _ => best = Some(hour),
            }
        }

        best.map(|hour| {
            let share = f64::from(counts[hour]) / f64::from(self.observed[hour]);
            (hour as u32, share)
        })
    }
}

/// Pricing/reservation tips from an hourly utilization series (fractions of
/// capacity keyed by UTC hour bucket). Pure and deterministic.
pub fn recommend(
    hourly: &BTreeMap<DateTime<Utc>, f64>,
    config: &RecommendationConfig,
) -> Vec<Tip> {
    if hourly.is_empty() {
        return vec![Tip::NoData];
    }

    let tally = HourTally::from_series(hourly, config);
    let mut tips = Vec::new();

    if let Some((hour, share)) = tally.modal_hour(&tally.above) {
        tips.push(Tip::PremiumPricing {
            hour,
            threshold: config.high_threshold,
            share,
        });
    }

    if let Some((hour, share)) = tally.modal_hour(&tally.below) {
        tips.push(Tip::EarlyBirdDiscount {
            hour,
            threshold: config.low_threshold,
            share,
        });
    }

    if tips.is_empty() {
        tips.push(Tip::NoStrongTrend);
    }

    tips
}
