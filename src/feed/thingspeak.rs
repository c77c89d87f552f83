use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use crate::error::FetchError;

use super::{FeedClient, RawReading};

#[derive(Debug, Deserialize)]
struct FeedPage {
    #[serde(default)]
    feeds: Vec<RawReading>,
}

/// HTTP client for a ThingSpeak channel feed.
///
/// `url_template` must contain a `{limit}` placeholder which is replaced by
/// the requested result count on every call.
pub struct ThingSpeakClient {
    client: reqwest::Client,
    url_template: String,
    api_key: Option<String>,
}

impl ThingSpeakClient {
    pub fn new(
        url_template: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("parkwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url_template: url_template.into(),
            api_key,
        })
    }

    pub fn url_for(&self, limit: usize) -> String {
        self.url_template.replace("{limit}", &limit.to_string())
    }
}

#[async_trait]
impl FeedClient for ThingSpeakClient {
    async fn fetch(&self, limit: usize) -> Result<Vec<RawReading>, FetchError> {
        let url = self.url_for(limit);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let page: FeedPage =
            serde_json::from_str(&body).map_err(|err| FetchError::Decode(err.to_string()))?;

        debug!("fetched {} raw rows from {url}", page.feeds.len());
        Ok(page.feeds)
    }
}
