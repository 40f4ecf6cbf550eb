//! HTTP API tests
//!
//! Drives the full router against mock telemetry and weather providers.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vesseltrack::models::NewDevice;
use vesseltrack::server::ServerConfig;

use super::fixtures::{orion_window, vega_window, weather_payload};
use crate::common::{
    authed, authed_get, body_json, feeds, get, mount_feed, registry_with, sample_devices, send,
    test_app, test_config, API_KEY, WEATHER_KEY,
};

async fn providers() -> MockServer {
    let server = MockServer::start().await;
    mount_feed(&server, "100", "KEY1", feeds(orion_window())).await;
    mount_feed(&server, "200", "KEY2", feeds(vega_window())).await;
    server
}

// ============================================================================
// Service Endpoints
// ============================================================================

#[tokio::test]
async fn test_health_and_index_are_public() {
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, get("/api/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["devices"], 2);

    let response = send(&app, get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "vesseltrack");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let _ = vesseltrack::metrics::init_metrics();
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    send(&app, get("/api/health")).await;
    let response = send(&app, get("/metrics")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
}

// ============================================================================
// Ship Lookups
// ============================================================================

#[tokio::test]
async fn test_all_locations_in_registry_order() {
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, get("/api/ships/locations")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({
            "locations": [
                {
                    "ship_name": "orion",
                    "owner_name": "Dana",
                    "lat": 59.9139,
                    "lon": 10.7522,
                    "time": "2024-05-01T08:10:00Z"
                },
                {
                    "ship_name": "Vega",
                    "owner_name": "Lee",
                    "lat": 63.43,
                    "lon": 10.39,
                    "time": "2024-05-01T07:55:00Z"
                }
            ]
        })
    );
}

#[tokio::test]
async fn test_live_location_ignores_case() {
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, get("/api/ships/live?ship_name=Orion")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["ship_name"], "orion");
    assert_eq!(body["owner_name"], "Dana");
    assert_eq!(body["lat"], 59.9139);
    assert_eq!(body["time"], "2024-05-01T08:10:00Z");
}

#[tokio::test]
async fn test_live_location_requires_name() {
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    for uri in ["/api/ships/live", "/api/ships/live?ship_name=%20%20"] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Ship name is required");
    }
}

#[tokio::test]
async fn test_unknown_ship_makes_no_provider_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feeds(orion_window())))
        .expect(0)
        .mount(&server)
        .await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));
    let response = send(&app, get("/api/ships/live?ship_name=Nautilus")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Ship not found");
}

#[tokio::test]
async fn test_search_extended_fields() {
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, authed_get("/api/ships/search?ship_name=ORION")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({
            "ship_name": "orion",
            "owner": "Dana",
            "lat": 59.9139,
            "lon": 10.7522,
            "time": "2024-05-01T08:10:00Z",
            "status": "Outside",
            "exit_time": "2024-05-01 06:00",
            "return_time": "N/A"
        })
    );
}

#[tokio::test]
async fn test_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/100/feeds.json"))
        .and(query_param("results", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feeds(orion_window())))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));
    let response = send(&app, authed_get("/api/ships/history?ship_name=orion&results=25")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["ship_name"], "orion");
    assert_eq!(body["points"].as_array().unwrap().len(), 2);
    assert_eq!(body["points"][1]["time"], "2024-05-01T08:00:00Z");
}

#[tokio::test]
async fn test_history_rejects_non_numeric_window() {
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, authed_get("/api/ships/history?ship_name=orion&results=ten")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Weather
// ============================================================================

#[tokio::test]
async fn test_weather() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/onecall"))
        .and(query_param("appid", WEATHER_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));
    let response = send(&app, authed_get("/api/weather?lat=59.91&lon=10.75")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["temp"], 9.8);
    assert_eq!(body["grnd_level"], 1018.0);
    assert_eq!(body["weather"], "broken clouds");
    assert_eq!(body["lat"], 59.91);
}

#[tokio::test]
async fn test_weather_requires_coordinates_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_payload()))
        .expect(0)
        .mount(&server)
        .await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    for uri in ["/api/weather?lat=59.91", "/api/weather?lon=10.75", "/api/weather?lat=&lon=1"] {
        let response = send(&app, authed_get(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Latitude and longitude required"
        );
    }

    let response = send(&app, authed_get("/api/weather?lat=north&lon=1")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Navigation
// ============================================================================

fn navigate_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/navigate")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_navigate_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/200/feeds.json"))
        .and(query_param("results", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feeds(vega_window())))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));
    let response = send(&app, navigate_form("ship_name=vega&owner_name=lee")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["ship_name"], "vega");
    assert_eq!(body["owner"], "lee");
    assert_eq!(body["lat"], 63.43);
    assert_eq!(body["channel_id"], "200");
    assert_eq!(body["read_key"], "KEY2");
}

#[tokio::test]
async fn test_navigate_start_without_credentials() {
    let server = providers().await;
    let mut config = test_config(&server.uri());
    config.navigate.expose_channel_credentials = false;
    let app = test_app(&config, registry_with(&sample_devices()));

    let response = send(&app, navigate_form("ship_name=Vega&owner_name=Lee")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body.get("channel_id").is_none());
    assert!(body.get("read_key").is_none());
}

#[tokio::test]
async fn test_navigate_start_validation() {
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, navigate_form("ship_name=Vega")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Ship name and owner name are required."
    );

    let response = send(&app, navigate_form("ship_name=Vega&owner_name=Dana")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Device not found.");

    let response = send(&app, get("/navigate")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["method"], "POST");
}

#[tokio::test]
async fn test_navigate_end_echoes_route() {
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(
        &app,
        authed_get("/navigate/end?start_lat=59.9&start_lon=10.7&end_lat=60.1&end_lon=11.0"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"start_lat": "59.9", "start_lon": "10.7", "end_lat": "60.1", "end_lon": "11.0"})
    );
}

#[tokio::test]
async fn test_navigate_end_incomplete_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));
    let response = send(
        &app,
        authed_get("/navigate/end?start_lat=59.9&start_lon=10.7&end_lat=60.1"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/navigate");
}

// ============================================================================
// Devices
// ============================================================================

#[tokio::test]
async fn test_device_lifecycle() {
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&[]));

    let new_device = NewDevice::new("  Polaris ", "Ari", "READKEY9", "900");
    let response = send(
        &app,
        authed(
            "POST",
            "/api/devices",
            Body::from(serde_json::to_vec(&new_device).unwrap()),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["ship_name"], "Polaris");
    assert!(created.get("read_key").is_none());
    let id = created["id"].as_i64().unwrap();

    let response = send(&app, authed_get("/api/devices")).await;
    let listed = body_json(response).await;
    assert_eq!(listed["devices"].as_array().unwrap().len(), 1);
    assert!(listed["devices"][0].get("read_key").is_none());

    let response = send(&app, authed_get(&format!("/api/devices/{id}"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["channel_id"], "900");

    for _ in 0..2 {
        let uri = format!("/api/devices/{id}");
        let response = send(&app, authed("DELETE", &uri, Body::empty())).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let response = send(&app, authed_get(&format!("/api/devices/{id}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Device not found");
}

// ============================================================================
// Session Gate and Routing
// ============================================================================

#[tokio::test]
async fn test_protected_routes_require_session() {
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let protected = [
        "/api/ships/search?ship_name=orion",
        "/api/ships/history?ship_name=orion",
        "/api/weather?lat=1&lon=2",
        "/navigate/end?start_lat=1&start_lon=2&end_lat=3&end_lon=4",
        "/api/devices",
        "/api/devices/1",
    ];

    for uri in protected {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");

        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer wrong-token")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }

    let request = Request::builder()
        .uri("/api/devices")
        .header(header::AUTHORIZATION, format!("bearer {API_KEY}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_locate_routes_can_require_session() {
    let server = providers().await;
    let mut config = test_config(&server.uri());
    config.server = ServerConfig::builder()
        .public_locate_endpoints(false)
        .api_key("tests", API_KEY)
        .build()
        .unwrap();
    let app = test_app(&config, registry_with(&sample_devices()));

    for uri in ["/api/ships/locations", "/api/ships/live?ship_name=orion"] {
        assert_eq!(send(&app, get(uri)).await.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(send(&app, authed_get(uri)).await.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_wrong_method() {
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let request = Request::builder()
        .method("POST")
        .uri("/api/ships/locations")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_json(response).await["error"], "Invalid request method.");
}

#[tokio::test]
async fn test_unknown_route() {
    let server = providers().await;
    let app = test_app(&test_config(&server.uri()), registry_with(&sample_devices()));

    let response = send(&app, get("/api/ships/unknown")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
