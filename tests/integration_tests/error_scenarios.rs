//! Error scenario integration tests
//!
//! Provider failures, unusable feeds, and registry conflicts as seen through
//! the HTTP API.

use std::time::Duration;

use axum::body::Body;
use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vesseltrack::models::NewDevice;

use super::fixtures::{no_fix_window, orion_window};
use crate::common::{
    authed, authed_get, body_json, feeds, get, mount_feed, registry_with, sample_devices, send,
    test_app, test_config,
};

// ============================================================================
// Telemetry Provider Failures
// ============================================================================

#[tokio::test]
async fn test_provider_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/100/feeds.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(feeds(orion_window()))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.telemetry.live_timeout_secs = 1;
    let app = test_app(&config, registry_with(&sample_devices()));

    let response = send(&app, get("/api/ships/live?ship_name=orion")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "Error fetching data: Request timeout"
    );
}

#[tokio::test]
async fn test_provider_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/100/feeds.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, get("/api/ships/live?ship_name=orion")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "Error fetching data: Provider returned status 503"
    );
}

#[tokio::test]
async fn test_malformed_provider_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/100/feeds.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, authed_get("/api/ships/search?ship_name=orion")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Error fetching data:"));
}

#[tokio::test]
async fn test_navigation_transport_wording() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/navigate")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("ship_name=orion&owner_name=dana"))
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "An error occurred while fetching data."
    );
}

// ============================================================================
// Unusable Feeds
// ============================================================================

#[tokio::test]
async fn test_feed_without_fix() {
    let server = MockServer::start().await;
    mount_feed(&server, "100", "KEY1", feeds(no_fix_window())).await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, get("/api/ships/live?ship_name=orion")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Missing latitude or longitude for this ship in all feeds"
    );
}

#[tokio::test]
async fn test_empty_feed() {
    let server = MockServer::start().await;
    mount_feed(&server, "100", "KEY1", feeds(json!([]))).await;
    mount_feed(&server, "200", "KEY2", json!({"channel": {"id": 200}})).await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    for uri in [
        "/api/ships/live?ship_name=orion",
        "/api/ships/live?ship_name=vega",
    ] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(
            body_json(response).await["error"],
            "No data available for this ship"
        );
    }
}

#[tokio::test]
async fn test_empty_history_window() {
    let server = MockServer::start().await;
    mount_feed(&server, "100", "KEY1", feeds(json!([]))).await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, authed_get("/api/ships/history?ship_name=orion")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Bulk Lookups
// ============================================================================

#[tokio::test]
async fn test_bulk_omits_failing_devices() {
    let server = MockServer::start().await;
    mount_feed(&server, "100", "KEY1", feeds(orion_window())).await;
    Mock::given(method("GET"))
        .and(path("/channels/200/feeds.json"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    mount_feed(&server, "300", "KEY3", feeds(no_fix_window())).await;

    let mut devices = sample_devices();
    devices.push(NewDevice::new("Lyra", "Kim", "KEY3", "300"));
    let app = test_app(&test_config(&server.uri()), registry_with(&devices));

    let response = send(&app, get("/api/ships/locations")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let locations = body["locations"].as_array().unwrap();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0]["ship_name"], "orion");
}

#[tokio::test]
async fn test_bulk_with_empty_registry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = test_app(&test_config(&server.uri()), registry_with(&[]));

    let response = send(&app, get("/api/ships/locations")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"locations": []}));
}

// ============================================================================
// Registry Conflicts
// ============================================================================

#[tokio::test]
async fn test_ambiguous_ship_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feeds(orion_window())))
        .expect(0)
        .mount(&server)
        .await;

    let mut devices = sample_devices();
    devices.push(NewDevice::new("ORION", "Sam", "KEY9", "900"));
    let app = test_app(&test_config(&server.uri()), registry_with(&devices));

    let response = send(&app, get("/api/ships/live?ship_name=Orion")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_search_unknown_ship() {
    let server = MockServer::start().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, authed_get("/api/ships/search?ship_name=Nautilus")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Device not found");

    let response = send(&app, authed_get("/api/ships/search")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_device_payloads() {
    let server = MockServer::start().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&[]));

    let response = send(
        &app,
        authed("POST", "/api/devices", Body::from("{\"ship_name\": 5")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let too_long = NewDevice::new("Polaris", "Ari", "K".repeat(51), "900");
    let response = send(
        &app,
        authed(
            "POST",
            "/api/devices",
            Body::from(serde_json::to_vec(&too_long).unwrap()),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, authed_get("/api/devices/abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid device id");
}

// ============================================================================
// Weather Provider Failures
// ============================================================================

#[tokio::test]
async fn test_weather_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/onecall"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "cod": 401,
            "message": "Invalid API key. Please see the FAQ for more info."
        })))
        .mount(&server)
        .await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, authed_get("/api/weather?lat=59.91&lon=10.75")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid API key"));
}

#[tokio::test]
async fn test_weather_not_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.weather.api_key = None;
    let app = test_app(&config, registry_with(&sample_devices()));

    let response = send(&app, authed_get("/api/weather?lat=59.91&lon=10.75")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "Weather service is not configured"
    );
}

#[tokio::test]
async fn test_weather_provider_unreachable() {
    let mut config = test_config("http://127.0.0.1:9");
    config.weather.timeout_secs = 1;
    let app = test_app(&config, registry_with(&sample_devices()));

    let response = send(&app, authed_get("/api/weather?lat=1&lon=2")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
