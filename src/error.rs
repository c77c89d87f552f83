use thiserror::Error;

/// Failure to obtain a batch from the occupancy feed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("feed responded with HTTP {status}")]
    Status { status: u16 },
    #[error("feed payload could not be decoded: {0}")]
    Decode(String),
}

/// Batch-level failure of an ingest pass.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to persist readings: {0:#}")]
    Persistence(anyhow::Error),
}

/// Why a single raw row was dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("entry_id is missing")]
    MissingEntryId,
    #[error("entry_id {0:?} is not an integer")]
    InvalidEntryId(String),
    #[error("created_at is missing")]
    MissingTimestamp,
    #[error("created_at {0:?} is not a recognised timestamp")]
    InvalidTimestamp(String),
    #[error("slot {slot} value {value:?} is not an integer")]
    InvalidSlot { slot: usize, value: String },
    #[error("slot {slot} value {value} is negative")]
    NegativeSlot { slot: usize, value: i64 },
    #[error("slot values add up to more than an i64 can hold")]
    OccupancyOverflow,
}
