//! Configuration management for vesseltrack
//!
//! Configuration comes from defaults, an optional TOML file, and environment
//! variables, applied in that order.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::feed::CallSite;
use crate::server::config::{ApiKeyConfig, ServerConfig};
use crate::utils::normalize_base_url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Telemetry provider configuration
    pub telemetry: TelemetryConfig,

    /// Weather provider configuration
    pub weather: WeatherConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Query fan-out configuration
    pub query: QueryConfig,

    /// Navigation configuration
    pub navigate: NavigateConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Telemetry provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Provider base URL
    pub base_url: String,

    /// User agent string
    pub user_agent: String,

    /// Timeout for live single-ship lookups, in seconds
    pub live_timeout_secs: u64,

    /// Timeout for each request of a bulk lookup, in seconds
    pub bulk_timeout_secs: u64,

    /// Timeout for search lookups, in seconds
    pub search_timeout_secs: u64,

    /// Timeout for navigation start lookups, in seconds
    pub navigate_timeout_secs: u64,

    /// Timeout for history lookups, in seconds
    pub history_timeout_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://api.thingspeak.com"),
            user_agent: format!("vesseltrack/{}", env!("CARGO_PKG_VERSION")),
            live_timeout_secs: 10,
            bulk_timeout_secs: 5,
            search_timeout_secs: 5,
            navigate_timeout_secs: 5,
            history_timeout_secs: 10,
        }
    }
}

impl TelemetryConfig {
    /// Request timeout for a call site
    #[must_use]
    pub fn timeout_for(&self, site: CallSite) -> Duration {
        let secs = match site {
            CallSite::Live => self.live_timeout_secs,
            CallSite::Bulk => self.bulk_timeout_secs,
            CallSite::Search => self.search_timeout_secs,
            CallSite::Navigate => self.navigate_timeout_secs,
            CallSite::History => self.history_timeout_secs,
        };
        Duration::from_secs(secs)
    }

    fn timeouts(&self) -> [(&'static str, u64); 5] {
        [
            ("live_timeout_secs", self.live_timeout_secs),
            ("bulk_timeout_secs", self.bulk_timeout_secs),
            ("search_timeout_secs", self.search_timeout_secs),
            ("navigate_timeout_secs", self.navigate_timeout_secs),
            ("history_timeout_secs", self.history_timeout_secs),
        ]
    }
}

/// Weather provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Provider base URL (the `onecall` endpoint is appended)
    pub base_url: String,

    /// Provider API key
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://api.openweathermap.org/data/3.0"),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl WeatherConfig {
    /// Get request timeout as Duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/devices.db"),
        }
    }
}

/// Query fan-out configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Maximum provider requests in flight during a bulk lookup
    pub bulk_concurrency: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            bulk_concurrency: 8,
        }
    }
}

/// Navigation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigateConfig {
    /// Return the channel id and read key with the start point so the client
    /// can poll the provider directly
    pub expose_channel_credentials: bool,
}

impl Default for NavigateConfig {
    fn default() -> Self {
        Self {
            expose_channel_credentials: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.trim().parse::<T>().ok())
}

/// Parse `name:key` pairs separated by commas
fn parse_api_keys(raw: &str) -> Vec<ApiKeyConfig> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, key) = pair.split_once(':')?;
            let (name, key) = (name.trim(), key.trim());
            if name.is_empty() || key.is_empty() {
                return None;
            }
            Some(ApiKeyConfig {
                name: name.to_string(),
                key: key.to_string(),
            })
        })
        .collect()
}

impl Config {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load the file if one is given, apply environment overrides, validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `VESSELTRACK_*` environment variables
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(bind) = env_var("VESSELTRACK_BIND") {
            self.server.bind_address = bind
                .parse()
                .with_context(|| format!("Invalid VESSELTRACK_BIND: {bind}"))?;
        }

        if let Some(public) = env_parse::<bool>("VESSELTRACK_PUBLIC_LOCATE") {
            self.server.public_locate_endpoints = public;
        }

        if let Some(keys) = env_var("VESSELTRACK_API_KEYS") {
            self.server.api_keys = parse_api_keys(&keys);
        }

        if let Some(url) = env_var("VESSELTRACK_TELEMETRY_URL") {
            self.telemetry.base_url = url;
        }

        if let Some(url) = env_var("VESSELTRACK_WEATHER_URL") {
            self.weather.base_url = url;
        }

        if let Some(key) = env_var("OPENWEATHER_API_KEY") {
            self.weather.api_key = Some(key);
        }

        if let Some(path) = env_var("VESSELTRACK_SQLITE_PATH") {
            self.database.sqlite_path = PathBuf::from(path);
        }

        if let Some(limit) = env_parse::<usize>("VESSELTRACK_BULK_CONCURRENCY") {
            self.query.bulk_concurrency = limit;
        }

        if let Some(expose) = env_parse::<bool>("VESSELTRACK_EXPOSE_CHANNEL_CREDENTIALS") {
            self.navigate.expose_channel_credentials = expose;
        }

        if let Some(level) = env_var("VESSELTRACK_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = env_var("VESSELTRACK_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;

        normalize_base_url(&self.telemetry.base_url).context("telemetry.base_url")?;
        normalize_base_url(&self.weather.base_url).context("weather.base_url")?;

        for (field, secs) in self.telemetry.timeouts() {
            if secs == 0 {
                anyhow::bail!("telemetry.{field} must be greater than 0");
            }
        }

        if self.weather.timeout_secs == 0 {
            anyhow::bail!("weather.timeout_secs must be greater than 0");
        }

        if self.query.bulk_concurrency == 0 {
            anyhow::bail!("query.bulk_concurrency must be greater than 0");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging.format must be 'text' or 'json'");
        }

        Ok(())
    }
}
