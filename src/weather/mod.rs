//! Current weather conditions from the weather provider
//!
//! Issues `GET {base}/onecall?lat&lon&exclude=...&appid&units=metric` and
//! keeps a fixed subset of the `current` block. The provider reports
//! application errors through a `cod` field in the payload, sometimes with a
//! 2xx status and sometimes without.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::WeatherConfig;
use crate::metrics;
use crate::models::WeatherSnapshot;
use crate::utils::error::{FetchError, WeatherError};
use crate::utils::non_empty;

const EXCLUDED_BLOCKS: &str = "minutely,hourly,daily,alerts";
const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Default, Deserialize)]
struct OneCallResponse {
    #[serde(default)]
    cod: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
    /// Kept raw; every field of the block is optional and loosely typed
    #[serde(default)]
    current: Option<Value>,
}

/// The subset of the `current` block the service reports
#[derive(Debug, Default)]
struct CurrentConditions {
    temp: Option<f64>,
    pressure: Option<f64>,
    humidity: Option<f64>,
    wind_speed: Option<f64>,
    sea_level: Option<f64>,
    grnd_level: Option<f64>,
    description: Option<String>,
}

impl CurrentConditions {
    /// Pick the known fields, dropping any that are missing or of the wrong type
    fn from_value(current: &Value) -> Self {
        let number = |key: &str| current.get(key).and_then(Value::as_f64);

        Self {
            temp: number("temp"),
            pressure: number("pressure"),
            humidity: number("humidity"),
            wind_speed: number("wind_speed"),
            sea_level: number("sea_level"),
            grnd_level: number("grnd_level"),
            description: current
                .get("weather")
                .and_then(Value::as_array)
                .and_then(|conditions| conditions.first())
                .and_then(|condition| condition.get("description"))
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

impl OneCallResponse {
    /// The provider error carried by the payload, if any
    fn provider_error(&self) -> Option<WeatherError> {
        let code = self.cod.as_ref().filter(|cod| is_truthy(cod))?;
        let message = match &self.message {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None => UNKNOWN_ERROR.to_string(),
            Some(other) => other.to_string(),
        };

        Some(WeatherError::Provider {
            code: value_text(code),
            message,
        })
    }

    fn into_snapshot(self, lat: f64, lon: f64) -> WeatherSnapshot {
        let current = self
            .current
            .as_ref()
            .map(CurrentConditions::from_value)
            .unwrap_or_default();
        WeatherSnapshot {
            temp: current.temp,
            pressure: current.pressure,
            humidity: current.humidity,
            wind_speed: current.wind_speed,
            sea_level: current.sea_level,
            grnd_level: current.grnd_level,
            lat,
            lon,
            weather: current.description,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// HTTP client for the weather provider
pub struct WeatherClient {
    client: Client,
    endpoint: Url,
    config: WeatherConfig,
}

impl WeatherClient {
    /// Create a client from the weather configuration
    ///
    /// A missing API key is not an error here; [`WeatherClient::current`]
    /// reports it per request so the rest of the service can still start.
    pub fn new(config: WeatherConfig) -> Result<Self, FetchError> {
        let mut endpoint = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        endpoint
            .path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(config.base_url.clone()))?
            .pop_if_empty()
            .push("onecall");

        let client = Client::builder()
            .gzip(true)
            .user_agent(concat!("vesseltrack/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// Whether an API key is configured
    pub fn is_configured(&self) -> bool {
        non_empty(self.config.api_key.as_deref()).is_some()
    }

    /// Current conditions at a coordinate
    ///
    /// # Errors
    ///
    /// - [`WeatherError::NotConfigured`] without an API key, before any request
    /// - [`WeatherError::Provider`] when the payload carries a truthy `cod`
    /// - [`WeatherError::Transport`] for network failures, non-2xx responses
    ///   without a provider error, and malformed bodies
    pub async fn current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError> {
        let api_key = non_empty(self.config.api_key.as_deref()).ok_or(WeatherError::NotConfigured)?;

        tracing::debug!(lat, lon, "Fetching current weather");

        let outcome = {
            let _timer = metrics::start_provider_timer("weather");
            self.request(api_key, lat, lon).await
        };

        match &outcome {
            Ok(_) => metrics::record_provider_request("weather", "ok"),
            Err(WeatherError::Provider { code, message }) => {
                metrics::record_provider_request("weather", "provider_error");
                tracing::warn!(
                    code = %code,
                    message = %message,
                    "Weather provider rejected request"
                );
            }
            Err(e) => {
                metrics::record_provider_request("weather", "error");
                tracing::warn!(error = %e, "Weather request failed");
            }
        }

        outcome
    }

    async fn request(
        &self,
        api_key: &str,
        lat: f64,
        lon: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let lat_param = lat.to_string();
        let lon_param = lon.to_string();

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("lat", lat_param.as_str()),
                ("lon", lon_param.as_str()),
                ("exclude", EXCLUDED_BLOCKS),
                ("appid", api_key),
                ("units", "metric"),
            ])
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(FetchError::from_reqwest)?;

        if !status.is_success() {
            let provider_error = serde_json::from_str::<OneCallResponse>(&body)
                .ok()
                .and_then(|payload| payload.provider_error());

            return Err(provider_error.unwrap_or(FetchError::Status(status.as_u16()).into()));
        }

        let payload: OneCallResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        if let Some(err) = payload.provider_error() {
            return Err(err);
        }

        Ok(payload.into_snapshot(lat, lon))
    }
}
