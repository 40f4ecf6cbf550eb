//! Provider payloads for integration tests

use serde_json::{json, Value};

/// Newest sample first, as the telemetry provider returns them
pub fn orion_window() -> Value {
    json!([
        {
            "created_at": "2024-05-01T08:10:00Z",
            "entry_id": 42,
            "field1": "59.9139",
            "field2": "10.7522",
            "field4": "2024-05-01 06:00",
            "field5": null
        },
        {
            "created_at": "2024-05-01T08:00:00Z",
            "entry_id": 41,
            "field1": "59.9000",
            "field2": "10.7400"
        }
    ])
}

pub fn vega_window() -> Value {
    json!([
        {"created_at": "2024-05-01T07:55:00Z", "field1": 63.43, "field2": 10.39}
    ])
}

/// Samples a GPS unit writes before it has a fix
pub fn no_fix_window() -> Value {
    json!([
        {"created_at": "2024-05-01T08:10:00Z", "field1": null, "field2": null},
        {"created_at": "2024-05-01T08:05:00Z", "field1": "", "field2": "0"}
    ])
}

pub fn weather_payload() -> Value {
    json!({
        "lat": 59.91,
        "lon": 10.75,
        "current": {
            "temp": 9.8,
            "pressure": 1021,
            "humidity": 64,
            "wind_speed": 2.6,
            "sea_level": 1021,
            "grnd_level": 1018,
            "weather": [{"description": "broken clouds"}]
        }
    })
}
