use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::recommend::RecommendationConfig;

pub const DEFAULT_FEED_URL: &str =
    "https://api.thingspeak.com/channels/2921519/feeds.json?results={limit}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_path: PathBuf,
    /// Feed endpoint; `{limit}` is replaced by the requested result count.
    pub feed_url: String,
    pub api_key: Option<String>,
    /// Rows requested per collector pass
    pub poll_limit: usize,
    /// Rows requested when bootstrapping from full history
    pub history_limit: usize,
    pub collect_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub high_threshold: f64,
    pub low_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        let thresholds = RecommendationConfig::default();
        Self {
            database_path: PathBuf::from("parking.db"),
            feed_url: DEFAULT_FEED_URL.into(),
            api_key: None,
            poll_limit: 100,
            history_limit: 8000,
            collect_interval_secs: 30,
            request_timeout_secs: 10,
            high_threshold: thresholds.high_threshold,
            low_threshold: thresholds.low_threshold,
        }
    }
}

impl Settings {
    /// Reads settings from `path`. No path, or a path that does not exist,
    /// yields the defaults; a file that exists but cannot be parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    /// Never zero; a zero interval would poll the feed back to back.
    pub fn collect_interval(&self) -> Duration {
        Duration::from_secs(self.collect_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn recommendation_config(&self) -> RecommendationConfig {
        RecommendationConfig {
            high_threshold: self.high_threshold,
            low_threshold: self.low_threshold,
        }
    }
}
