// Core data structures for vesseltrack

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a ship name
pub const MAX_SHIP_NAME_LEN: usize = 100;
/// Maximum length of an owner name
pub const MAX_OWNER_NAME_LEN: usize = 100;
/// Maximum length of a provider read key
pub const MAX_READ_KEY_LEN: usize = 50;
/// Maximum length of a provider channel identifier
pub const MAX_CHANNEL_ID_LEN: usize = 50;

/// A tracked vessel bound to a telemetry channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: i64,
    pub ship_name: String,
    pub owner_name: String,
    #[serde(skip_serializing)]
    pub read_key: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
}

impl Device {
    /// Provider credentials for this device
    pub fn channel(&self) -> Channel {
        Channel {
            channel_id: self.channel_id.clone(),
            read_key: self.read_key.clone(),
        }
    }
}

/// Fields required to register a device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDevice {
    pub ship_name: String,
    pub owner_name: String,
    pub read_key: String,
    pub channel_id: String,
}

impl NewDevice {
    pub fn new(
        ship_name: impl Into<String>,
        owner_name: impl Into<String>,
        read_key: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            ship_name: ship_name.into(),
            owner_name: owner_name.into(),
            read_key: read_key.into(),
            channel_id: channel_id.into(),
        }
    }

    /// Trim surrounding whitespace from every field
    pub fn normalized(&self) -> Self {
        Self {
            ship_name: self.ship_name.trim().to_string(),
            owner_name: self.owner_name.trim().to_string(),
            read_key: self.read_key.trim().to_string(),
            channel_id: self.channel_id.trim().to_string(),
        }
    }

    /// Check that every field is present and within its length limit
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("ship_name", &self.ship_name, MAX_SHIP_NAME_LEN),
            ("owner_name", &self.owner_name, MAX_OWNER_NAME_LEN),
            ("read_key", &self.read_key, MAX_READ_KEY_LEN),
            ("channel_id", &self.channel_id, MAX_CHANNEL_ID_LEN),
        ];

        for (name, value, max) in fields {
            if value.trim().is_empty() {
                return Err(format!("{name} is required"));
            }
            if value.chars().count() > max {
                return Err(format!("{name} must be at most {max} characters"));
            }
        }

        Ok(())
    }
}

/// Telemetry channel credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub channel_id: String,
    pub read_key: String,
}

impl Channel {
    pub fn new(channel_id: impl Into<String>, read_key: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            read_key: read_key.into(),
        }
    }
}

/// Last known position of a ship, as returned by live and bulk lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipLocation {
    pub ship_name: String,
    pub owner_name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "time")]
    pub observed_at: String,
}

/// Bulk lookup payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipLocations {
    pub locations: Vec<ShipLocation>,
}

/// Geofence status reported by search
///
/// Not computed from live data; search always reports `Outside`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeofenceStatus {
    Inside,
    Outside,
}

/// Extended position payload returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipSearchResult {
    pub ship_name: String,
    pub owner: String,
    pub lat: f64,
    pub lon: f64,
    pub time: String,
    pub status: GeofenceStatus,
    pub exit_time: String,
    pub return_time: String,
}

/// Starting point for interactive navigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStart {
    pub ship_name: String,
    pub owner: String,
    pub lat: f64,
    pub lon: f64,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_key: Option<String>,
}

/// Both ends of a navigation route, echoed back as submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEndpoints {
    pub start_lat: String,
    pub start_lon: String,
    pub end_lat: String,
    pub end_lon: String,
}

/// One valid sample of a recent track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub time: String,
}

/// Recent track of a ship, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipHistory {
    pub ship_name: String,
    pub owner_name: String,
    pub points: Vec<TrackPoint>,
}

/// Current weather conditions at a coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temp: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub sea_level: Option<f64>,
    pub grnd_level: Option<f64>,
    pub lat: f64,
    pub lon: f64,
    pub weather: Option<String>,
}
