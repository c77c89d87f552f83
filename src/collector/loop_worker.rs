use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::ingest::Ingestor;

use super::metrics::CollectorMetrics;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_debug, log_error, log_info};

/// Polls the feed until `cancel_token` fires.
///
/// The first pass runs immediately. The next one starts `interval` after the
/// previous pass finished, so slow fetches stretch the period instead of
/// overlapping. Cancellation is only observed between passes.
pub async fn collector_loop(
    ingestor: Ingestor,
    interval: Duration,
    limit: usize,
    metrics: CollectorMetrics,
    cancel_token: CancellationToken,
) {
    log_info!(
        "collector polling feed every {}s (limit {limit})",
        interval.as_secs()
    );

    loop {
        let pass_start = Instant::now();
        match ingestor.collect_once(limit).await {
            Ok(inserted) => {
                metrics.record_success(inserted).await;
                log_debug!(
                    "collector pass stored {inserted} rows in {}ms",
                    pass_start.elapsed().as_millis()
                );
            }
            Err(err) => {
                log_error!("collector pass failed: {err}");
                metrics.record_failure(&err.to_string()).await;
            }
        }

        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("collector loop shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
