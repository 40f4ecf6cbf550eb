//! Error types for the provider clients
//!
//! Transport failures are kept apart from the two "the provider answered but
//! there is nothing usable" outcomes, because callers map each of them to a
//! different status code.

use thiserror::Error;

/// Errors that can occur while talking to a remote provider over HTTP
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error (connect, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Provider answered with a non-success status code
    #[error("Provider returned status {0}")]
    Status(u16),

    /// Body could not be decoded into the expected shape
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Classify a reqwest error, separating timeouts from other failures
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

/// Errors produced while resolving a fix from a telemetry feed
#[derive(Error, Debug)]
pub enum FeedError {
    /// The provider returned no feed entries at all
    #[error("No data available for this ship")]
    NoData,

    /// Entries were returned but none carried a usable latitude/longitude pair
    #[error("Missing latitude or longitude for this ship in all feeds")]
    MissingCoordinates,

    /// Network or HTTP level failure
    #[error("Error fetching data: {0}")]
    Transport(#[from] FetchError),
}

impl FeedError {
    /// Short label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::MissingCoordinates => "missing_coordinates",
            Self::Transport(_) => "transport",
        }
    }
}

/// Errors produced by the weather client
#[derive(Error, Debug)]
pub enum WeatherError {
    /// No API key configured for the weather provider
    #[error("Weather provider API key is not configured")]
    NotConfigured,

    /// The provider reported an application-level error in its payload
    #[error("{message}")]
    Provider { code: String, message: String },

    /// Network or HTTP level failure
    #[error("Error fetching weather data: {0}")]
    Transport(#[from] FetchError),
}
