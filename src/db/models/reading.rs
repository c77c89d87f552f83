//! Occupancy reading data model.
//!
//! One timestamped sample across the monitored parking slots, as persisted in
//! the `readings` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of monitored slots carried by every reading.
pub const SLOT_COUNT: usize = 8;

/// Slot capacity used as the denominator for utilization.
pub const CAPACITY: i64 = SLOT_COUNT as i64;

/// A validated occupancy sample. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub entry_id: i64,
    pub timestamp: DateTime<Utc>,
    pub slot_states: [i64; SLOT_COUNT],
    pub occupied: i64,
}

impl Reading {
    /// Builds a reading and derives `occupied` as the plain sum of the slot
    /// values. Sums above the capacity are kept as-is; a sum that does not fit
    /// in an `i64` saturates. Feed rows go through [`Reading::checked`].
    pub fn new(entry_id: i64, timestamp: DateTime<Utc>, slot_states: [i64; SLOT_COUNT]) -> Self {
        Self {
            entry_id,
            timestamp,
            slot_states,
            occupied: slot_states
                .iter()
                .fold(0_i64, |total, &slot| total.saturating_add(slot)),
        }
    }

    /// Like [`Reading::new`], but `None` when the slot sum overflows.
    pub fn checked(
        entry_id: i64,
        timestamp: DateTime<Utc>,
        slot_states: [i64; SLOT_COUNT],
    ) -> Option<Self> {
        let occupied = slot_states
            .iter()
            .try_fold(0_i64, |total, &slot| total.checked_add(slot))?;

        Some(Self {
            entry_id,
            timestamp,
            slot_states,
            occupied,
        })
    }

    /// Free slots; negative when the sensors report more than the capacity.
    pub fn available(&self) -> i64 {
        CAPACITY - self.occupied
    }
}
