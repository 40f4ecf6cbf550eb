//! REST API handlers
//!
//! Every endpoint answers JSON. Failures are `{"error": message}` with the
//! status code chosen by [`ApiError`].

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        MatchedPath, Path, Query, Request, State,
    },
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::Categorized;
use crate::metrics;
use crate::models::{Device, NewDevice, ShipLocations};
use crate::query::{QueryError, RouteParams};
use crate::storage::RegistryError;
use crate::utils::error::{FeedError, WeatherError};
use crate::utils::non_empty;

use super::auth::{require_session, Principal};
use super::server::AppState;

/// Path navigate-end redirects to when a route is incomplete
pub const NAVIGATE_PATH: &str = "/navigate";

// ============================================================================
// Errors
// ============================================================================

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error answered to the client
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

/// Which lookup failed, for the wording of not-found answers
#[derive(Debug, Clone, Copy)]
pub enum Lookup {
    Ship,
    Device,
    Navigation,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Map a query failure onto a status code and message
    pub fn from_query(err: QueryError, lookup: Lookup) -> Self {
        log_failure(&err);

        match err {
            QueryError::Validation(msg) => Self::bad_request(msg),
            QueryError::Registry(e) => Self::from_registry(e, lookup),
            QueryError::Feed(e) => match (e, lookup) {
                (FeedError::NoData, Lookup::Navigation) => {
                    Self::new(StatusCode::NOT_FOUND, "No location data available.")
                }
                (FeedError::Transport(_), Lookup::Navigation) => Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while fetching data.",
                ),
                (e @ FeedError::NoData, _) => Self::new(StatusCode::NOT_FOUND, e.to_string()),
                (e @ FeedError::MissingCoordinates, _) => Self::bad_request(e.to_string()),
                (e @ FeedError::Transport(_), _) => {
                    Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                }
            },
        }
    }

    /// Map a registry failure onto a status code and message
    pub fn from_registry(err: RegistryError, lookup: Lookup) -> Self {
        match err {
            RegistryError::NotFound(_) => {
                let message = match lookup {
                    Lookup::Ship => "Ship not found",
                    Lookup::Device => "Device not found",
                    Lookup::Navigation => "Device not found.",
                };
                Self::new(StatusCode::NOT_FOUND, message)
            }
            e @ RegistryError::Ambiguous { .. } => Self::new(StatusCode::CONFLICT, e.to_string()),
            RegistryError::Validation(msg) => Self::bad_request(msg),
            e => {
                log_failure(&e);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Unexpected error: {e}"),
                )
            }
        }
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        log_failure(&err);

        match err {
            e @ WeatherError::Provider { .. } => Self::bad_request(e.to_string()),
            WeatherError::NotConfigured => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Weather service is not configured",
            ),
            e @ WeatherError::Transport(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

fn log_failure(err: &impl Categorized) {
    let category = err.category();
    if err.is_transient() {
        tracing::warn!(category = %category, error = %err, "Request failed");
    } else {
        tracing::debug!(category = %category, error = %err, "Request rejected");
    }
}

// ============================================================================
// API Response Types
// ============================================================================

/// Service description
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub devices: usize,
}

/// Navigate form description
#[derive(Debug, Serialize, Deserialize)]
pub struct NavigateForm {
    pub method: String,
    pub fields: Vec<String>,
}

/// Device list response
#[derive(Debug, Serialize)]
pub struct DevicesResponse {
    pub devices: Vec<Device>,
}

#[derive(Debug, Deserialize)]
pub struct ShipParams {
    pub ship_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub ship_name: Option<String>,
    pub results: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub ship_name: Option<String>,
    pub owner_name: Option<String>,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let locate_routes = Router::new()
        .route("/api/ships/locations", get(get_all_locations))
        .route("/api/ships/live", get(get_live_location));

    let mut public = Router::new()
        .route("/", get(index))
        .route("/api/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .route(NAVIGATE_PATH, get(navigate_form).post(navigate_start));

    let mut protected = Router::new()
        .route("/api/ships/search", get(search_ship))
        .route("/api/ships/history", get(ship_history))
        .route("/api/weather", get(get_weather))
        .route("/navigate/end", get(navigate_end))
        .route("/api/devices", get(list_devices).post(create_device))
        .route("/api/devices/{id}", get(get_device).delete(delete_device));

    if state.config.public_locate_endpoints {
        public = public.merge(locate_routes);
    } else {
        protected = protected.merge(locate_routes);
    }

    let protected = protected.route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_session,
    ));

    public
        .merge(protected)
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Invalid request method.")
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not found")
}

/// Count every request by route and status
async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    metrics::record_api_request(
        &endpoint,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

// ============================================================================
// Service Handlers
// ============================================================================

async fn index() -> Json<ServiceInfo> {
    let endpoints = [
        "/api/health",
        "/api/ships/locations",
        "/api/ships/live",
        "/api/ships/search",
        "/api/ships/history",
        "/api/weather",
        "/api/devices",
        "/navigate",
        "/navigate/end",
        "/metrics",
    ];

    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
    })
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let devices = state
        .query
        .registry()
        .count()
        .map_err(|e| ApiError::from_registry(e, Lookup::Device))?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        devices,
    }))
}

async fn metrics_endpoint() -> Response {
    match metrics::encode_metrics() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {e}"),
        )
        .into_response(),
    }
}

// ============================================================================
// Ship Handlers
// ============================================================================

async fn get_all_locations(State(state): State<AppState>) -> Result<Json<ShipLocations>, ApiError> {
    let locations = state
        .query
        .locate_all()
        .await
        .map_err(|e| ApiError::from_query(e, Lookup::Ship))?;

    Ok(Json(ShipLocations { locations }))
}

async fn get_live_location(
    State(state): State<AppState>,
    Query(params): Query<ShipParams>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .query
        .locate_one(params.ship_name.as_deref())
        .await
        .map(Json)
        .map_err(|e| ApiError::from_query(e, Lookup::Ship))
}

async fn search_ship(
    State(state): State<AppState>,
    Query(params): Query<ShipParams>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .query
        .search(params.ship_name.as_deref())
        .await
        .map(Json)
        .map_err(|e| ApiError::from_query(e, Lookup::Device))
}

async fn ship_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let results = match non_empty(params.results.as_deref()) {
        Some(raw) => Some(
            raw.parse::<u32>()
                .map_err(|_| ApiError::bad_request("results must be a positive integer"))?,
        ),
        None => None,
    };

    state
        .query
        .history(params.ship_name.as_deref(), results)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_query(e, Lookup::Ship))
}

async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(lat), Some(lon)) = (
        non_empty(params.lat.as_deref()),
        non_empty(params.lon.as_deref()),
    ) else {
        return Err(ApiError::bad_request("Latitude and longitude required"));
    };

    let parse = |raw: &str| raw.parse::<f64>().ok().filter(|v| v.is_finite());
    let (Some(lat), Some(lon)) = (parse(lat), parse(lon)) else {
        return Err(ApiError::bad_request("Invalid latitude or longitude"));
    };

    Ok(Json(state.weather.current(lat, lon).await?))
}

// ============================================================================
// Navigation Handlers
// ============================================================================

async fn navigate_form() -> Json<NavigateForm> {
    Json(NavigateForm {
        method: "POST".to_string(),
        fields: vec!["ship_name".to_string(), "owner_name".to_string()],
    })
}

async fn navigate_start(
    State(state): State<AppState>,
    Form(form): Form<NavigateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .query
        .navigate_start(form.ship_name.as_deref(), form.owner_name.as_deref())
        .await
        .map(Json)
        .map_err(|e| ApiError::from_query(e, Lookup::Navigation))
}

async fn navigate_end(
    State(state): State<AppState>,
    Query(params): Query<RouteParams>,
) -> Response {
    match state.query.navigate_end(&params) {
        Some(route) => Json(route).into_response(),
        None => Redirect::to(NAVIGATE_PATH).into_response(),
    }
}

// ============================================================================
// Device Handlers
// ============================================================================

async fn list_devices(State(state): State<AppState>) -> Result<Json<DevicesResponse>, ApiError> {
    let devices = state
        .query
        .registry()
        .list()
        .map_err(|e| ApiError::from_registry(e, Lookup::Device))?;

    Ok(Json(DevicesResponse { devices }))
}

async fn create_device(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<NewDevice>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new_device) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let device = state
        .query
        .registry()
        .create(&new_device)
        .map_err(|e| ApiError::from_registry(e, Lookup::Device))?;

    tracing::info!(
        device_id = device.id,
        ship_name = %device.ship_name,
        created_by = %principal.name,
        "Device registered"
    );

    Ok((StatusCode::CREATED, Json(device)))
}

async fn get_device(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Device>, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::bad_request("Invalid device id"))?;

    state
        .query
        .registry()
        .get(id)
        .map(Json)
        .map_err(|e| ApiError::from_registry(e, Lookup::Device))
}

async fn delete_device(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::bad_request("Invalid device id"))?;

    let removed = state
        .query
        .registry()
        .delete(id)
        .map_err(|e| ApiError::from_registry(e, Lookup::Device))?;

    tracing::info!(
        device_id = id,
        removed,
        deleted_by = %principal.name,
        "Device delete requested"
    );
    Ok(StatusCode::NO_CONTENT)
}
