use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::catalog::parse_catalog;
use super::request::{archive_key, FrameRequest};
use crate::error::{Result, ViewerError};

/// Where frame bytes come from
pub trait FrameSource {
    /// URL that serves the frame captured at `timestamp`
    fn url_for(&self, timestamp: &DateTime<Utc>) -> String;

    /// Retrieve the encoded image bytes for one request
    fn fetch(&self, request: &FrameRequest) -> impl Future<Output = Result<Vec<u8>>>;
}

/// Upper bound on a catalog request unless `with_catalog_timeout` says otherwise
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Imagery proxy reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpFrameSource {
    client: reqwest::Client,
    base: String,
    catalog_timeout: Duration,
}

impl HttpFrameSource {
    pub fn new(base: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sat-viewer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
            catalog_timeout: DEFAULT_CATALOG_TIMEOUT,
        })
    }

    pub fn with_catalog_timeout(mut self, timeout: Duration) -> Self {
        self.catalog_timeout = timeout;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Ask the proxy which frames exist for the last `hours_back` hours.
    /// Gives up with `Timeout` after the catalog timeout.
    pub async fn fetch_catalog(&self, hours_back: u32) -> Result<Vec<FrameRequest>> {
        let limit = self.catalog_timeout;
        match tokio::time::timeout(limit, self.request_catalog(hours_back)).await {
            Ok(result) => result,
            Err(_) => Err(ViewerError::Timeout(limit.as_millis() as u64)),
        }
    }

    async fn request_catalog(&self, hours_back: u32) -> Result<Vec<FrameRequest>> {
        let url = format!("{}/imagery?hoursBack={}", self.base, hours_back);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::network(format!("HTTP {status} for {url}")));
        }

        let body = response.text().await?;
        parse_catalog(&body, &self.base)
    }
}

impl FrameSource for HttpFrameSource {
    fn url_for(&self, timestamp: &DateTime<Utc>) -> String {
        format!("{}/goes-proxy?t={}", self.base, archive_key(timestamp))
    }

    async fn fetch(&self, request: &FrameRequest) -> Result<Vec<u8>> {
        let response = self.client.get(&request.source_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::network(format!(
                "HTTP {status} for {}",
                request.source_url
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
