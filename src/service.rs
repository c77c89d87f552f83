use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::analytics::{
    self, classify_trend, daily_utilization, hourly_utilization, peak_hour_per_day,
    weekday_hour_breakdown, HistoryBreakdown, Status, TrendReport,
};
use crate::collector::{CollectorController, CollectorSnapshot};
use crate::db::{Database, Reading};
use crate::error::IngestError;
use crate::feed::{FeedClient, RawReading, ThingSpeakClient};
use crate::ingest::Ingestor;
use crate::recommend::{recommend, RecommendationConfig};
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    /// Percent utilization per UTC day; days without samples are absent.
    pub daily: BTreeMap<NaiveDate, f64>,
    pub peak_hours: BTreeMap<NaiveDate, u32>,
    pub trend: TrendReport,
    pub trend_label: String,
}

impl DailyReport {
    pub fn has_data(&self) -> bool {
        !self.daily.is_empty()
    }
}

/// Entry point for callers: CLI commands, API handlers and the background
/// collector all go through one shared service.
#[derive(Clone)]
pub struct ParkingService {
    db: Database,
    ingestor: Ingestor,
    collector: Arc<Mutex<CollectorController>>,
    settings: Arc<Settings>,
}

impl ParkingService {
    pub fn new(db: Database, feed: Arc<dyn FeedClient>, settings: Settings) -> Self {
        Self {
            ingestor: Ingestor::new(db.clone(), feed),
            db,
            collector: Arc::new(Mutex::new(CollectorController::new())),
            settings: Arc::new(settings),
        }
    }

    /// Opens the on-disk store and the HTTP feed described by `settings`.
    pub fn open(settings: Settings) -> Result<Self> {
        let db = Database::new(settings.database_path.clone())?;
        let feed = ThingSpeakClient::new(
            settings.feed_url.clone(),
            settings.api_key.clone(),
            settings.request_timeout(),
        )?;
        Ok(Self::new(db, Arc::new(feed), settings))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn window(&self, days: u32) -> Result<Vec<Reading>> {
        let since = analytics::window_start(days, Utc::now());
        analytics::load_window(&self.db, since).await
    }

    /// Latest reading, or the empty shape when nothing is stored.
    pub async fn get_status(&self) -> Result<Status> {
        let latest = self.db.latest_reading().await?;
        Ok(Status::from_latest(latest.as_ref()))
    }

    pub async fn get_daily_utilization(&self, days: u32) -> Result<DailyReport> {
        let readings = self.window(days).await?;
        let daily = daily_utilization(&readings);
        let peak_hours = peak_hour_per_day(&hourly_utilization(&readings));
        let trend = classify_trend(&daily);

        Ok(DailyReport {
            trend_label: trend.label(),
            daily,
            peak_hours,
            trend,
        })
    }

    pub async fn get_weekday_hour_breakdown(&self, days: u32) -> Result<HistoryBreakdown> {
        let readings = self.window(days).await?;
        Ok(weekday_hour_breakdown(&readings))
    }

    pub async fn get_recommendations(&self, days: u32, high: f64, low: f64) -> Result<Vec<String>> {
        let readings = self.window(days).await?;
        let config = RecommendationConfig {
            high_threshold: high,
            low_threshold: low,
        };

        Ok(recommend(&hourly_utilization(&readings), &config)
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    /// One on-demand collection pass. Failures are returned to the caller.
    pub async fn collect_once(&self) -> Result<usize, IngestError> {
        self.ingestor.collect_once(self.settings.poll_limit).await
    }

    /// Replaces the store with `full_history`. Destructive.
    pub async fn bootstrap(&self, full_history: &[RawReading]) -> Result<usize, IngestError> {
        self.ingestor.reinitialize(full_history).await
    }

    /// Fetches the full history from the feed and replaces the store with it.
    /// Destructive; on any failure the store keeps its previous contents.
    pub async fn reset_and_reload(&self) -> Result<usize, IngestError> {
        self.ingestor.bootstrap(self.settings.history_limit).await
    }

    /// Returns `false` if a collector was already running.
    pub async fn start_collector(&self, interval: Duration) -> bool {
        self.collector
            .lock()
            .await
            .start(self.ingestor.clone(), interval, self.settings.poll_limit)
    }

    pub async fn stop_collector(&self) -> Result<()> {
        self.collector.lock().await.stop().await
    }

    pub async fn collector_running(&self) -> bool {
        self.collector.lock().await.is_running()
    }

    pub async fn collector_metrics(&self) -> CollectorSnapshot {
        let metrics = self.collector.lock().await.metrics();
        metrics.snapshot().await
    }
}
