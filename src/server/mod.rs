//! HTTP API
//!
//! - [`api`] - routes, handlers, and the JSON error mapping
//! - [`auth`] - bearer-token session gate
//! - [`config`] - server configuration
//! - [`server`] - application state and the server runner

pub mod api;
pub mod auth;
pub mod config;
pub mod server;

pub use api::{create_router, ApiError, ErrorResponse, NAVIGATE_PATH};
pub use auth::{Principal, SessionStore, StaticKeyStore};
pub use config::{ApiKeyConfig, ConfigError, ServerConfig, ServerConfigBuilder};
pub use server::{AppState, ServerError, ServerInfo, VesselServer};
