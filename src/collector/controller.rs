use anyhow::{Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::ingest::Ingestor;

use super::loop_worker::collector_loop;
use super::metrics::CollectorMetrics;

/// Owns at most one polling task. `Stopped` while `handle` is empty.
pub struct CollectorController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    metrics: CollectorMetrics,
}

impl CollectorController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            metrics: CollectorMetrics::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Spawns the polling task. Returns `false` without side effects when a
    /// task is already running.
    pub fn start(&mut self, ingestor: Ingestor, interval: Duration, limit: usize) -> bool {
        if self.is_running() {
            info!("collector already running; start ignored");
            return false;
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(collector_loop(
            ingestor,
            interval,
            limit,
            self.metrics.clone(),
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        info!("[collector] running every {}s", interval.as_secs());
        true
    }

    /// Signals the loop and waits for the in-flight pass to finish.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("collector loop task failed to join")?;
            info!("[collector] stopped");
        }

        Ok(())
    }

    pub fn metrics(&self) -> CollectorMetrics {
        self.metrics.clone()
    }
}

impl Default for CollectorController {
    fn default() -> Self {
        Self::new()
    }
}
