//! Fetch -> normalize -> dedup -> append.
//!
//! The existing-id lookup only trims the batch before it is sent to the store.
//! Uniqueness itself is guaranteed by the `entry_id` primary key, so two
//! ingest passes racing on the same ids still insert each id once.

mod normalize;

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::RwLock;

use crate::db::{Database, Reading};
use crate::error::IngestError;
use crate::feed::{FeedClient, RawReading};

pub use normalize::{normalize, normalize_batch, DroppedRow, NormalizedBatch};

#[derive(Clone)]
pub struct Ingestor {
    db: Database,
    feed: Arc<dyn FeedClient>,
    // Readers: ordinary ingest passes. Writer: table replacement.
    gate: Arc<RwLock<()>>,
}

impl Ingestor {
    pub fn new(db: Database, feed: Arc<dyn FeedClient>) -> Self {
        Self {
            db,
            feed,
            gate: Arc::new(RwLock::new(())),
        }
    }

    /// Persists the rows of `raw` whose `entry_id` is not stored yet and returns
    /// how many were inserted. Invalid rows are dropped and logged.
    pub async fn ingest(&self, raw: &[RawReading]) -> Result<usize, IngestError> {
        let _pass = self.gate.read().await;

        let batch = normalize_batch(raw);
        log_dropped(&batch);

        if batch.readings.is_empty() {
            info!("No new data to insert.");
            return Ok(0);
        }

        let candidate_ids: Vec<i64> = batch.readings.iter().map(|r| r.entry_id).collect();
        let existing = self
            .db
            .select_existing_ids(&candidate_ids)
            .await
            .map_err(IngestError::Persistence)?;

        let fresh: Vec<Reading> = batch
            .readings
            .into_iter()
            .filter(|reading| !existing.contains(&reading.entry_id))
            .collect();

        if fresh.is_empty() {
            info!("No new data to insert.");
            return Ok(0);
        }

        let inserted = self
            .db
            .insert_many(&fresh)
            .await
            .map_err(IngestError::Persistence)?;

        if inserted < fresh.len() {
            debug!(
                "{} readings were stored concurrently by another writer",
                fresh.len() - inserted
            );
        }
        info!("Persisted {inserted} new records.");
        Ok(inserted)
    }

    /// One fetch of the newest `limit` rows followed by [`Ingestor::ingest`].
    pub async fn collect_once(&self, limit: usize) -> Result<usize, IngestError> {
        let raw = self.feed.fetch(limit).await?;
        self.ingest(&raw).await
    }

    /// Replaces the whole table with `full_history`.
    ///
    /// Waits for in-flight ingest passes to finish and blocks new ones until the
    /// replacement commits. On failure the previous table is left untouched.
    pub async fn reinitialize(&self, full_history: &[RawReading]) -> Result<usize, IngestError> {
        let _exclusive = self.gate.write().await;

        let batch = normalize_batch(full_history);
        log_dropped(&batch);

        let inserted = self
            .db
            .replace_all(batch.readings)
            .await
            .map_err(IngestError::Persistence)?;

        info!("Initial historical data saved ({inserted} records).");
        Ok(inserted)
    }

    /// Fetches up to `history_limit` rows and reinitializes the store from them.
    /// A failed fetch leaves the store as it was.
    pub async fn bootstrap(&self, history_limit: usize) -> Result<usize, IngestError> {
        let raw = self.feed.fetch(history_limit).await?;
        info!("Fetched {} historical records.", raw.len());
        self.reinitialize(&raw).await
    }
}

fn log_dropped(batch: &NormalizedBatch) {
    for dropped in &batch.dropped {
        debug!("dropping raw row {}: {}", dropped.index, dropped.reason);
    }
    if !batch.dropped.is_empty() {
        warn!("Dropped {} malformed rows from batch", batch.dropped.len());
    }
    if batch.repeated > 0 {
        debug!("Collapsed {} repeated entry ids within batch", batch.repeated);
    }
}
