//! vesseltrack - vessel registry and position service
//!
//! Registered vessels ("devices") are bound to a telemetry channel on a remote
//! time-series provider. The service resolves a ship by name, fetches a window
//! of recent samples from its channel, and answers with the newest sample that
//! carries a usable position. Current weather for a coordinate comes from a
//! separate provider.
//!
//! # Architecture
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Core data structures and types
//! - [`storage`] - Device registry (SQLite and in-memory)
//! - [`feed`] - Telemetry provider client and first-valid-fix selection
//! - [`weather`] - Weather provider client
//! - [`query`] - Orchestration of registry and feed lookups
//! - [`server`] - HTTP API, session gate, and error mapping
//! - [`metrics`] - Prometheus counters
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vesseltrack::config::Config;
//! use vesseltrack::feed::FeedClient;
//! use vesseltrack::query::QueryService;
//! use vesseltrack::storage::create_sqlite_repository;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let registry = create_sqlite_repository(&config.database.sqlite_path)?;
//!     let feed = FeedClient::new(config.telemetry.clone())?;
//!     let service = QueryService::new(registry, Arc::new(feed));
//!
//!     let location = service.locate_one(Some("Orion")).await?;
//!     println!("{} at {}, {}", location.ship_name, location.lat, location.lon);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod metrics;
pub mod models;
pub mod query;
pub mod server;
pub mod storage;
pub mod utils;
pub mod weather;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Categorized, Error, ErrorCategory, Result};
    pub use crate::feed::{CallSite, FeedClient, FeedSource};
    pub use crate::models::{Device, NewDevice, ShipLocation, WeatherSnapshot};
    pub use crate::query::QueryService;
    pub use crate::server::VesselServer;
    pub use crate::storage::{DeviceRepository, SharedDeviceRepository};
    pub use crate::weather::WeatherClient;
}

// Direct re-exports for convenience
pub use models::{Device, NewDevice, ShipLocation};
