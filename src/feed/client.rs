//! HTTP client for the telemetry provider
//!
//! Fetches `GET /channels/{channel_id}/feeds.json?api_key=..&results=n` and
//! hands the entries to the selection logic. Requests are never retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;

use crate::config::TelemetryConfig;
use crate::metrics;
use crate::models::{Channel, TrackPoint};
use crate::utils::error::{FeedError, FetchError};
use crate::utils::mask_secret;

use super::selection::{first_valid_fix, valid_fixes, FeedEntry, FeedFix};

/// Largest window the history lookup will request
pub const MAX_HISTORY_RESULTS: u32 = 100;

// ============================================================================
// Call Sites
// ============================================================================

/// Query path that issued a feed request
///
/// Each call site has its own window size and timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallSite {
    /// Single ship, live lookup
    Live,
    /// All ships at once
    Bulk,
    /// Single ship with extended fields
    Search,
    /// Navigation start point
    Navigate,
    /// Recent track
    History,
}

impl CallSite {
    /// Number of samples requested from the provider
    pub fn window(&self) -> u32 {
        match self {
            Self::Navigate => 1,
            Self::Live | Self::Bulk | Self::Search | Self::History => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Bulk => "bulk",
            Self::Search => "search",
            Self::Navigate => "navigate",
            Self::History => "history",
        }
    }
}

impl std::fmt::Display for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Feed Source
// ============================================================================

/// Source of telemetry feed windows
///
/// [`FeedClient`] is the HTTP implementation; tests substitute scripted
/// sources.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch up to `results` entries, newest first
    async fn fetch_window(
        &self,
        channel: &Channel,
        results: u32,
        site: CallSite,
    ) -> Result<Vec<FeedEntry>, FetchError>;

    /// Fetch the call site's window and select the newest valid fix
    async fn latest_fix(&self, channel: &Channel, site: CallSite) -> Result<FeedFix, FeedError> {
        let entries = self.fetch_window(channel, site.window(), site).await?;
        first_valid_fix(&entries)
    }

    /// Fetch `results` entries and keep every one with a valid position
    ///
    /// An empty window is [`FeedError::NoData`]; a window without any valid
    /// position yields an empty track.
    async fn history(
        &self,
        channel: &Channel,
        results: u32,
    ) -> Result<Vec<TrackPoint>, FeedError> {
        let results = results.clamp(1, MAX_HISTORY_RESULTS);
        let entries = self
            .fetch_window(channel, results, CallSite::History)
            .await?;

        if entries.is_empty() {
            return Err(FeedError::NoData);
        }

        Ok(valid_fixes(&entries).map(|fix| fix.to_track_point()).collect())
    }
}

/// Provider response body
///
/// Entries are decoded one by one so a malformed entry cannot fail the
/// whole window.
#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    feeds: Option<Vec<Value>>,
}

impl FeedResponse {
    fn into_entries(self) -> Vec<FeedEntry> {
        self.feeds
            .unwrap_or_default()
            .into_iter()
            .map(FeedEntry::from_value)
            .collect()
    }
}

// ============================================================================
// Feed Client
// ============================================================================

/// HTTP client for the telemetry provider
pub struct FeedClient {
    client: Client,
    base_url: Url,
    config: TelemetryConfig,
}

impl FeedClient {
    /// Create a client from the telemetry configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for a malformed base URL and
    /// `FetchError::Http` if the HTTP client cannot be built
    pub fn new(config: TelemetryConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .gzip(true)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Timeout applied to requests from `site`
    pub fn timeout_for(&self, site: CallSite) -> Duration {
        self.config.timeout_for(site)
    }

    fn feed_url(&self, channel_id: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("channels")
            .push(channel_id)
            .push("feeds.json");
        Ok(url)
    }

    async fn request(
        &self,
        url: Url,
        channel: &Channel,
        results: u32,
        site: CallSite,
    ) -> Result<Vec<FeedEntry>, FetchError> {
        let results = results.to_string();
        let response = self
            .client
            .get(url)
            .query(&[
                ("api_key", channel.read_key.as_str()),
                ("results", results.as_str()),
            ])
            .timeout(self.timeout_for(site))
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: FeedResponse = response.json().await.map_err(FetchError::from_reqwest)?;
        Ok(body.into_entries())
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch_window(
        &self,
        channel: &Channel,
        results: u32,
        site: CallSite,
    ) -> Result<Vec<FeedEntry>, FetchError> {
        let url = self.feed_url(&channel.channel_id)?;
        let started = Instant::now();

        tracing::debug!(
            channel_id = %channel.channel_id,
            read_key = %mask_secret(&channel.read_key),
            results,
            site = %site,
            "Fetching feed window"
        );

        let outcome = {
            let _timer = metrics::start_provider_timer("telemetry");
            self.request(url, channel, results, site).await
        };

        match &outcome {
            Ok(entries) => {
                metrics::record_provider_request("telemetry", "ok");
                tracing::debug!(
                    channel_id = %channel.channel_id,
                    entries = entries.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Feed window received"
                );
            }
            Err(e) => {
                metrics::record_provider_request("telemetry", "error");
                tracing::warn!(
                    channel_id = %channel.channel_id,
                    site = %site,
                    error = %e,
                    "Feed request failed"
                );
            }
        }

        outcome
    }
}
