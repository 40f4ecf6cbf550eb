//! Query orchestration over the device registry and the telemetry feed
//!
//! Every lookup resolves a device first and only then talks to the provider,
//! so an unknown or ambiguous ship never costs a network request.

mod error;

pub use error::QueryError;

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::feed::{CallSite, FeedSource};
use crate::metrics;
use crate::models::{
    Device, GeofenceStatus, NavigationStart, RouteEndpoints, ShipHistory, ShipLocation,
    ShipSearchResult,
};
use crate::storage::SharedDeviceRepository;
use crate::utils::non_empty;

/// Default history window
pub const DEFAULT_HISTORY_RESULTS: u32 = 10;

const SHIP_NAME_REQUIRED: &str = "Ship name is required";
const NAVIGATE_FIELDS_REQUIRED: &str = "Ship name and owner name are required.";

/// Raw navigate-end parameters as submitted
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RouteParams {
    pub start_lat: Option<String>,
    pub start_lon: Option<String>,
    pub end_lat: Option<String>,
    pub end_lon: Option<String>,
}

/// Answers ship queries from the registry and the feed source
#[derive(Clone)]
pub struct QueryService {
    registry: SharedDeviceRepository,
    feed: Arc<dyn FeedSource>,
    bulk_concurrency: usize,
    expose_credentials: bool,
}

impl QueryService {
    pub fn new(registry: SharedDeviceRepository, feed: Arc<dyn FeedSource>) -> Self {
        Self {
            registry,
            feed,
            bulk_concurrency: 8,
            expose_credentials: true,
        }
    }

    /// Cap on provider requests in flight during [`QueryService::locate_all`]
    pub fn with_bulk_concurrency(mut self, limit: usize) -> Self {
        self.bulk_concurrency = limit.max(1);
        self
    }

    /// Include channel credentials in navigation start points
    pub fn with_exposed_credentials(mut self, expose: bool) -> Self {
        self.expose_credentials = expose;
        self
    }

    pub fn registry(&self) -> &SharedDeviceRepository {
        &self.registry
    }

    fn resolve_ship(&self, ship_name: Option<&str>) -> Result<Device, QueryError> {
        let ship_name =
            non_empty(ship_name).ok_or_else(|| QueryError::validation(SHIP_NAME_REQUIRED))?;
        Ok(self.registry.get_by_name(ship_name)?)
    }

    async fn locate_device(
        &self,
        device: &Device,
        site: CallSite,
    ) -> Result<ShipLocation, QueryError> {
        let fix = self.feed.latest_fix(&device.channel(), site).await?;
        Ok(ShipLocation {
            ship_name: device.ship_name.clone(),
            owner_name: device.owner_name.clone(),
            lat: fix.lat,
            lon: fix.lon,
            observed_at: fix.observed_at(),
        })
    }

    /// Last known position of one ship
    pub async fn locate_one(&self, ship_name: Option<&str>) -> Result<ShipLocation, QueryError> {
        let device = self.resolve_ship(ship_name)?;
        self.locate_device(&device, CallSite::Live).await
    }

    /// Last known position of every registered ship
    ///
    /// Results follow registry order. A device whose lookup fails is logged
    /// and left out; only a registry failure fails the call.
    pub async fn locate_all(&self) -> Result<Vec<ShipLocation>, QueryError> {
        let devices = self.registry.list()?;
        let total = devices.len();

        let locations: Vec<ShipLocation> = stream::iter(devices)
            .map(|device| async move {
                match self.locate_device(&device, CallSite::Bulk).await {
                    Ok(location) => Some(location),
                    Err(QueryError::Feed(e)) => {
                        metrics::record_bulk_omission(e.kind());
                        tracing::warn!(
                            ship_name = %device.ship_name,
                            device_id = device.id,
                            kind = e.kind(),
                            error = %e,
                            "Omitting ship from bulk lookup"
                        );
                        None
                    }
                    Err(e) => {
                        metrics::record_bulk_omission("other");
                        tracing::warn!(
                            ship_name = %device.ship_name,
                            error = %e,
                            "Omitting ship from bulk lookup"
                        );
                        None
                    }
                }
            })
            .buffered(self.bulk_concurrency)
            .filter_map(|location| async move { location })
            .collect()
            .await;

        tracing::debug!(total, located = locations.len(), "Bulk lookup finished");
        Ok(locations)
    }

    /// Position of one ship with the search-only fields
    pub async fn search(&self, ship_name: Option<&str>) -> Result<ShipSearchResult, QueryError> {
        let device = self.resolve_ship(ship_name)?;
        let fix = self.feed.latest_fix(&device.channel(), CallSite::Search).await?;

        Ok(ShipSearchResult {
            ship_name: device.ship_name,
            owner: device.owner_name,
            lat: fix.lat,
            lon: fix.lon,
            time: fix.observed_at(),
            status: GeofenceStatus::Outside,
            exit_time: fix.entry.exit_time(),
            return_time: fix.entry.return_time(),
        })
    }

    /// Starting point for navigation, looked up by ship and owner
    pub async fn navigate_start(
        &self,
        ship_name: Option<&str>,
        owner_name: Option<&str>,
    ) -> Result<NavigationStart, QueryError> {
        let (Some(ship_name), Some(owner_name)) = (non_empty(ship_name), non_empty(owner_name))
        else {
            return Err(QueryError::validation(NAVIGATE_FIELDS_REQUIRED));
        };

        let device = self.registry.get_by_name_owner(ship_name, owner_name)?;
        let fix = self.feed.latest_fix(&device.channel(), CallSite::Navigate).await?;

        let (channel_id, read_key) = if self.expose_credentials {
            (Some(device.channel_id), Some(device.read_key))
        } else {
            (None, None)
        };

        Ok(NavigationStart {
            ship_name: ship_name.to_string(),
            owner: owner_name.to_string(),
            lat: fix.lat,
            lon: fix.lon,
            time: fix.observed_at(),
            channel_id,
            read_key,
        })
    }

    /// Echo a complete route, or `None` when any endpoint is missing
    pub fn navigate_end(&self, params: &RouteParams) -> Option<RouteEndpoints> {
        Some(RouteEndpoints {
            start_lat: non_empty(params.start_lat.as_deref())?.to_string(),
            start_lon: non_empty(params.start_lon.as_deref())?.to_string(),
            end_lat: non_empty(params.end_lat.as_deref())?.to_string(),
            end_lon: non_empty(params.end_lon.as_deref())?.to_string(),
        })
    }

    /// Recent track of one ship, newest first
    pub async fn history(
        &self,
        ship_name: Option<&str>,
        results: Option<u32>,
    ) -> Result<ShipHistory, QueryError> {
        let device = self.resolve_ship(ship_name)?;
        let results = results.unwrap_or(DEFAULT_HISTORY_RESULTS);
        let points = self.feed.history(&device.channel(), results).await?;

        Ok(ShipHistory {
            ship_name: device.ship_name,
            owner_name: device.owner_name,
            points,
        })
    }
}
