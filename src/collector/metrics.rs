use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorSnapshot {
    pub iterations: u64,
    pub failures: u64,
    pub rows_inserted: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Counters shared between the polling task and whoever reports on it.
pub struct CollectorMetrics {
    inner: Arc<Mutex<CollectorSnapshot>>,
}

impl CollectorMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CollectorSnapshot::default())),
        }
    }

    pub async fn record_success(&self, inserted: usize) {
        let mut state = self.inner.lock().await;
        state.iterations += 1;
        state.rows_inserted += inserted as u64;
        state.last_success_at = Some(Utc::now());
    }

    pub async fn record_failure(&self, error: &str) {
        let mut state = self.inner.lock().await;
        state.iterations += 1;
        state.failures += 1;
        state.last_error = Some(error.to_string());
    }

    pub async fn snapshot(&self) -> CollectorSnapshot {
        self.inner.lock().await.clone()
    }
}

impl Default for CollectorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CollectorMetrics {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
