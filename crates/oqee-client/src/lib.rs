pub mod cache;
pub mod types;

// Re-export commonly used cache types
pub use cache::CacheStatsSnapshot;

use std::time::Duration as StdDuration;

use anyhow::{anyhow, Context, Result};
use cache::MemoryCache;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::types::{ApiEnvelope, EpgBucket, SearchItem, ServicePlan};

const DEFAULT_API_BASE_URL: &str = "https://api.oqee.net";
const DEFAULT_WEB_BASE_URL: &str = "https://oqee.tv";

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("unexpected status code: {0}")]
    Status(StatusCode),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub web_base_url: String,
    pub memory_cache_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            web_base_url: DEFAULT_WEB_BASE_URL.to_string(),
            memory_cache_ttl: Duration::minutes(10),
        }
    }
}

#[derive(Debug)]
pub struct OqeeClient {
    http: Client,
    plan_lock: Mutex<()>,
    memory_cache: MemoryCache<Vec<u8>>,
    config: ClientConfig,
}

impl Default for OqeeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OqeeClient {
    pub fn with_config(config: ClientConfig) -> Self {
        let http = Client::builder()
            .user_agent("OqeeGuideMCP/1.0")
            .timeout(StdDuration::from_secs(15))
            .gzip(true)
            .build()
            .expect("failed to build reqwest client");

        Self {
            http,
            plan_lock: Mutex::new(()),
            memory_cache: MemoryCache::new(config.memory_cache_ttl),
            config,
        }
    }

    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }

    /// Base of the public site, used to assemble playback and detail links.
    pub fn web_base_url(&self) -> &str {
        &self.config.web_base_url
    }

    #[instrument(name = "oqee_client.service_plan", skip(self))]
    pub async fn service_plan(&self) -> Result<ServicePlan> {
        let url = self.endpoint(&["api", "v5", "service_plan"])?;
        if let Some(plan) = self.cached_result(&url)? {
            debug!("service plan served from memory cache");
            return Ok(plan);
        }

        let _lock = self.plan_lock.lock().await;
        self.fetch_result(&url).await
    }

    #[instrument(name = "oqee_client.refresh_service_plan", skip(self))]
    pub async fn refresh_service_plan(&self) -> Result<ServicePlan> {
        let url = self.endpoint(&["api", "v5", "service_plan"])?;
        let _lock = self.plan_lock.lock().await;
        self.fetch_result_fresh(&url).await
    }

    /// Fetches the hourly guide window starting at `bucket` (epoch seconds).
    #[instrument(name = "oqee_client.guide_bucket", skip(self))]
    pub async fn guide_bucket(&self, bucket: i64) -> Result<EpgBucket> {
        let segment = bucket.to_string();
        let url = self.endpoint(&["api", "v1", "epg", "all", segment.as_str()])?;
        self.fetch_result(&url).await
    }

    #[instrument(name = "oqee_client.search", skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchItem>> {
        let url = self.endpoint(&["api", "v1", "search", query])?;
        let raw: Vec<Value> = self.fetch_result(&url).await?;
        Ok(types::decode_search_items(raw))
    }

    pub fn clear_memory_cache(&self) {
        self.memory_cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.memory_cache.stats().snapshot()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_base_url)
            .with_context(|| format!("invalid api base url: {}", self.config.api_base_url))?;
        url.path_segments_mut()
            .map_err(|()| anyhow!("api base url cannot carry path segments"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn cached_result<T>(&self, url: &Url) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let Some(bytes) = self.memory_cache.get_with_size(url.as_str(), |bytes| bytes.len())
        else {
            return Ok(None);
        };
        let envelope = serde_json::from_slice::<ApiEnvelope<T>>(&bytes)
            .with_context(|| format!("failed to parse cached json for {url}"))?;
        Ok(Some(envelope.result))
    }

    async fn fetch_result<T>(&self, url: &Url) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        if let Some(value) = self.cached_result(url)? {
            return Ok(value);
        }
        self.fetch_result_fresh(url).await
    }

    async fn fetch_result_fresh<T>(&self, url: &Url) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| ClientError::Http(err.to_string()))?;
        if !response.status().is_success() {
            warn!(status = %response.status(), %url, "OQEE api request failed");
            return Err(ClientError::Status(response.status()).into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| ClientError::Http(err.to_string()))?;
        self.memory_cache.insert(url.as_str(), bytes.to_vec());

        let envelope = serde_json::from_slice::<ApiEnvelope<T>>(&bytes)
            .with_context(|| format!("failed to parse json from {url}"))?;
        if !envelope.success {
            warn!(%url, "api response flagged success=false");
        }
        Ok(envelope.result)
    }
}
