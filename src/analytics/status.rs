use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{Reading, CAPACITY, SLOT_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotState {
    pub slot: usize,
    pub status: i64,
}

/// Point-in-time view of the lot.
///
/// `timestamp` is `None` only when nothing has been stored yet; that is the
/// sole difference between "no data" and "all slots free".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub timestamp: Option<DateTime<Utc>>,
    pub occupied: i64,
    pub available: i64,
    pub slots: Vec<SlotState>,
}

impl Status {
    pub fn empty() -> Self {
        Self {
            timestamp: None,
            occupied: 0,
            available: CAPACITY,
            slots: slot_list(&[0; SLOT_COUNT]),
        }
    }

    pub fn from_latest(latest: Option<&Reading>) -> Self {
        match latest {
            Some(reading) => Self {
                timestamp: Some(reading.timestamp),
                occupied: reading.occupied,
                available: reading.available(),
                slots: slot_list(&reading.slot_states),
            },
            None => Self::empty(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.timestamp.is_some()
    }
}

fn slot_list(states: &[i64; SLOT_COUNT]) -> Vec<SlotState> {
    states
        .iter()
        .enumerate()
        .map(|(index, &status)| SlotState {
            slot: index + 1,
            status,
        })
        .collect()
}
