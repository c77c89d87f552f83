//! Raw feed row -> [`Reading`] conversion.
//!
//! Missing, null and blank slot fields count as free (0). A slot that is
//! present but not an integer, a negative slot, a slot total that overflows,
//! or an unusable `entry_id` / `created_at` drops the whole row.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::db::{Reading, SLOT_COUNT};
use crate::error::ValidationError;
use crate::feed::RawReading;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A row that did not survive normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRow {
    pub index: usize,
    pub reason: ValidationError,
}

#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub readings: Vec<Reading>,
    pub dropped: Vec<DroppedRow>,
    /// Rows whose `entry_id` already appeared earlier in the same batch.
    pub repeated: usize,
}

pub fn normalize(raw: &RawReading) -> Result<Reading, ValidationError> {
    let entry_id = parse_entry_id(raw.entry_id.as_ref())?;
    let timestamp = parse_timestamp(raw.created_at.as_ref())?;

    let mut slot_states = [0_i64; SLOT_COUNT];
    for (index, field) in raw.slot_fields().into_iter().enumerate() {
        slot_states[index] = parse_slot(index + 1, field)?;
    }

    Reading::checked(entry_id, timestamp, slot_states).ok_or(ValidationError::OccupancyOverflow)
}

/// Normalizes every row, keeping the first occurrence of each `entry_id`.
pub fn normalize_batch(raw: &[RawReading]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    let mut seen = HashSet::with_capacity(raw.len());

    for (index, row) in raw.iter().enumerate() {
        match normalize(row) {
            Ok(reading) => {
                if seen.insert(reading.entry_id) {
                    batch.readings.push(reading);
                } else {
                    batch.repeated += 1;
                }
            }
            Err(reason) => batch.dropped.push(DroppedRow { index, reason }),
        }
    }

    batch
}

fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn parse_entry_id(value: Option<&Value>) -> Result<i64, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::MissingEntryId),
        Some(value) => {
            parse_integer(value).ok_or_else(|| ValidationError::InvalidEntryId(render(value)))
        }
    }
}

fn parse_timestamp(value: Option<&Value>) -> Result<DateTime<Utc>, ValidationError> {
    let text = match value {
        None | Some(Value::Null) => return Err(ValidationError::MissingTimestamp),
        Some(Value::String(text)) => text.trim(),
        Some(other) => return Err(ValidationError::InvalidTimestamp(other.to_string())),
    };

    if text.is_empty() {
        return Err(ValidationError::MissingTimestamp);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidTimestamp(text.to_string()))
}

fn parse_slot(slot: usize, value: Option<&Value>) -> Result<i64, ValidationError> {
    let value = match value {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(0),
        Some(value) => value,
    };

    let parsed = parse_integer(value).ok_or_else(|| ValidationError::InvalidSlot {
        slot,
        value: render(value),
    })?;

    if parsed < 0 {
        return Err(ValidationError::NegativeSlot {
            slot,
            value: parsed,
        });
    }

    Ok(parsed)
}
