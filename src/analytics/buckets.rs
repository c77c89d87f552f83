//! Fixed-width UTC bucketing.
//!
//! A timestamp belongs to the bucket that starts at its truncation to the
//! calendar day or the whole hour. Buckets without samples never appear in
//! the output maps; there is no interpolation and no zero filling.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};

use crate::db::{Reading, CAPACITY};

pub fn day_bucket(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

pub fn hour_bucket(ts: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = ts.date_naive().and_time(NaiveTime::MIN);
    (midnight + Duration::hours(i64::from(ts.hour()))).and_utc()
}

/// Running mean of `occupied`. Summed as `i128` so a bucket of large stored
/// values cannot overflow.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct OccupancyMean {
    sum: i128,
    count: u64,
}

impl OccupancyMean {
    pub(crate) fn push(&mut self, occupied: i64) {
        self.sum += i128::from(occupied);
        self.count += 1;
    }

    /// Mean occupied slots as a fraction of capacity.
    pub(crate) fn fraction(&self) -> f64 {
        self.sum as f64 / self.count as f64 / CAPACITY as f64
    }
}

pub(crate) fn group_by<K, F>(readings: &[Reading], key: F) -> BTreeMap<K, OccupancyMean>
where
    K: Ord,
    F: Fn(&Reading) -> K,
{
    let mut groups: BTreeMap<K, OccupancyMean> = BTreeMap::new();
    for reading in readings {
        groups.entry(key(reading)).or_default().push(reading.occupied);
    }
    groups
}

/// Mean utilization per UTC calendar day, in percent of capacity.
pub fn daily_utilization(readings: &[Reading]) -> BTreeMap<NaiveDate, f64> {
    group_by(readings, |r| day_bucket(r.timestamp))
        .into_iter()
        .map(|(day, mean)| (day, mean.fraction() * 100.0))
        .collect()
}

/// Mean utilization per UTC hour bucket, as a fraction of capacity.
pub fn hourly_utilization(readings: &[Reading]) -> BTreeMap<DateTime<Utc>, f64> {
    group_by(readings, |r| hour_bucket(r.timestamp))
        .into_iter()
        .map(|(hour, mean)| (hour, mean.fraction()))
        .collect()
}

/// Busiest hour of each day that has at least one hourly bucket. Ties go to
/// the earliest hour.
pub fn peak_hour_per_day(hourly: &BTreeMap<DateTime<Utc>, f64>) -> BTreeMap<NaiveDate, u32> {
    let mut best: BTreeMap<NaiveDate, (u32, f64)> = BTreeMap::new();

    for (bucket, &value) in hourly {
        let candidate = (bucket.hour(), value);
        best.entry(day_bucket(*bucket))
            .and_modify(|current| {
                if value > current.1 {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }

    best.into_iter().map(|(day, (hour, _))| (day, hour)).collect()
}
