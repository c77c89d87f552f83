//! Time-series analytics over stored readings.
//!
//! Everything past [`load_window`] is a pure function of the loaded readings.

mod breakdown;
mod buckets;
mod status;
mod trend;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};

use crate::db::{Database, Reading};

pub use breakdown::{
    top_hours, weekday_hour_breakdown, HistoryBreakdown, HourUtilization, WeekdayUtilization,
    PEAK_HOUR_COUNT,
};
pub use buckets::{daily_utilization, day_bucket, hour_bucket, hourly_utilization, peak_hour_per_day};
pub use status::{SlotState, Status};
pub use trend::{classify_trend, BusiestDay, DayKind, Trend, TrendReport, TREND_THRESHOLD_PCT};

/// Start of a lookback window of `days` days ending at `now`.
pub fn window_start(days: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(i64::from(days))
}

/// Readings with `timestamp >= since`, oldest first.
pub async fn load_window(db: &Database, since: DateTime<Utc>) -> Result<Vec<Reading>> {
    db.select_since(since)
        .await
        .with_context(|| format!("failed to load readings since {since}"))
}
