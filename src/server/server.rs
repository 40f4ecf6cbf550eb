//! Server implementation
//!
//! Wires the registry, the provider clients, and the session store into the
//! router and runs it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::feed::{FeedClient, FeedSource};
use crate::query::QueryService;
use crate::storage::{create_sqlite_repository, SharedDeviceRepository};
use crate::weather::WeatherClient;

use super::api::create_router;
use super::auth::{SessionStore, StaticKeyStore};
use super::config::ServerConfig;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Ship queries over the registry and the telemetry feed
    pub query: QueryService,

    /// Weather provider client
    pub weather: Arc<WeatherClient>,

    /// Session token resolution
    pub sessions: Arc<dyn SessionStore>,

    /// Server start time
    pub start_time: Instant,

    /// Configuration
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        query: QueryService,
        weather: WeatherClient,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            query,
            weather: Arc::new(weather),
            sessions,
            start_time: Instant::now(),
            config,
        }
    }

    /// Assemble the state from configuration and an opened registry
    pub fn from_config(
        config: &Config,
        registry: SharedDeviceRepository,
    ) -> Result<Self, ServerError> {
        let feed: Arc<dyn FeedSource> = Arc::new(
            FeedClient::new(config.telemetry.clone())
                .map_err(|e| ServerError::InitError(format!("telemetry client: {e}")))?,
        );

        let weather = WeatherClient::new(config.weather.clone())
            .map_err(|e| ServerError::InitError(format!("weather client: {e}")))?;

        if !weather.is_configured() {
            tracing::warn!("No weather API key configured; /api/weather will answer 500");
        }

        let query = QueryService::new(registry, feed)
            .with_bulk_concurrency(config.query.bulk_concurrency)
            .with_exposed_credentials(config.navigate.expose_channel_credentials);

        let sessions = StaticKeyStore::from_config(&config.server.api_keys);
        if sessions.is_empty() {
            tracing::warn!("No API keys configured; protected routes will answer 401");
        }

        Ok(Self::new(config.server.clone(), query, weather, Arc::new(sessions)))
    }
}

// ============================================================================
// Vessel Server
// ============================================================================

/// HTTP server for ship queries and device management
pub struct VesselServer {
    config: ServerConfig,
    state: AppState,
}

impl VesselServer {
    /// Open the registry and create the server
    pub fn new(config: &Config) -> Result<Self, ServerError> {
        config
            .server
            .validate()
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        let registry = create_sqlite_repository(&config.database.sqlite_path)
            .map_err(|e| ServerError::InitError(e.to_string()))?;

        let state = AppState::from_config(config, registry)?;
        Ok(Self::with_state(state))
    }

    /// Create a server around prepared state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config.clone(),
            state,
        }
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("{addr}: {e}")))?;

        tracing::info!(address = %addr, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.bind_address,
            cors_enabled: self.config.enable_cors,
            request_logging_enabled: self.config.enable_request_logging,
            public_locate_endpoints: self.config.public_locate_endpoints,
            api_keys: self.config.api_keys.len(),
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
    pub public_locate_endpoints: bool,
    pub api_keys: usize,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        let on_off = |flag: bool| if flag { "enabled" } else { "disabled" };
        format!(
            "vesseltrack server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             CORS: {}\n\
             Request Logging: {}\n\
             Public Locate Endpoints: {}\n\
             API Keys: {}",
            "",
            self.bind_address,
            on_off(self.cors_enabled),
            on_off(self.request_logging_enabled),
            on_off(self.public_locate_endpoints),
            self.api_keys
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone)]
pub enum ServerError {
    /// Configuration error
    ConfigError(String),

    /// Initialization error
    InitError(String),

    /// Failed to bind to address
    BindError(String),

    /// Server error
    ServeError(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::InitError(msg) => write!(f, "Initialization error: {}", msg),
            Self::BindError(msg) => write!(f, "Failed to bind: {}", msg),
            Self::ServeError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

// ============================================================================
// Tests
// ============================================================================
