//! First-valid-fix selection over a window of feed entries
//!
//! The provider returns entries newest first. Selection walks them in that
//! order and stops at the first entry whose latitude (`field1`) and longitude
//! (`field2`) are both present and parse as finite numbers. Entries that fail
//! to parse are skipped, never fatal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::TrackPoint;
use crate::utils::error::FeedError;

/// Placeholder for passthrough fields the provider did not fill
pub const NOT_AVAILABLE: &str = "N/A";

/// One sample of a telemetry channel, as sent by the provider
///
/// Every field arrives as a string, number or null depending on how the
/// device and provider wrote it, so all of them are kept as raw JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub entry_id: Option<Value>,
    /// Latitude
    #[serde(default)]
    pub field1: Option<Value>,
    /// Longitude
    #[serde(default)]
    pub field2: Option<Value>,
    #[serde(default)]
    pub field3: Option<Value>,
    /// Last exit time
    #[serde(default)]
    pub field4: Option<Value>,
    /// Last return time
    #[serde(default)]
    pub field5: Option<Value>,
}

impl FeedEntry {
    /// Latitude, if present and numeric
    pub fn latitude(&self) -> Option<f64> {
        parse_coordinate(self.field1.as_ref())
    }

    /// Longitude, if present and numeric
    pub fn longitude(&self) -> Option<f64> {
        parse_coordinate(self.field2.as_ref())
    }

    /// Sample timestamp, empty when the provider sent none
    pub fn observed_at(&self) -> String {
        match &self.created_at {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Decode one raw entry of a feed window
    ///
    /// An entry that is not an object decodes to an entry with no fields, so
    /// it still counts toward the window but never yields a fix.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Feed entry is not an object");
            Self::default()
        })
    }

    /// Last exit time, passed through verbatim
    pub fn exit_time(&self) -> String {
        passthrough(self.field4.as_ref())
    }

    /// Last return time, passed through verbatim
    pub fn return_time(&self) -> String {
        passthrough(self.field5.as_ref())
    }
}

/// Parse a coordinate field
///
/// JSON numbers are taken as they are; strings are trimmed and parsed.
/// Anything else, and any non-finite result, is rejected.
pub fn parse_coordinate(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn passthrough(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// A feed entry that carries a usable position
#[derive(Debug, Clone, PartialEq)]
pub struct FeedFix {
    pub lat: f64,
    pub lon: f64,
    pub entry: FeedEntry,
}

impl FeedFix {
    pub fn observed_at(&self) -> String {
        self.entry.observed_at()
    }

    pub fn to_track_point(&self) -> TrackPoint {
        TrackPoint {
            lat: self.lat,
            lon: self.lon,
            time: self.observed_at(),
        }
    }
}

/// Every entry of the window with a usable position, in received order
pub fn valid_fixes(entries: &[FeedEntry]) -> impl Iterator<Item = FeedFix> + '_ {
    entries.iter().enumerate().filter_map(|(index, entry)| {
        match (entry.latitude(), entry.longitude()) {
            (Some(lat), Some(lon)) => Some(FeedFix {
                lat,
                lon,
                entry: entry.clone(),
            }),
            _ => {
                tracing::debug!(
                    index,
                    created_at = ?entry.created_at,
                    "Skipping feed entry without usable coordinates"
                );
                None
            }
        }
    })
}

/// Select the newest entry with a usable position
///
/// # Errors
///
/// - [`FeedError::NoData`] when the window is empty
/// - [`FeedError::MissingCoordinates`] when no entry has a usable position
pub fn first_valid_fix(entries: &[FeedEntry]) -> Result<FeedFix, FeedError> {
    if entries.is_empty() {
        return Err(FeedError::NoData);
    }

    valid_fixes(entries)
        .next()
        .ok_or(FeedError::MissingCoordinates)
}
