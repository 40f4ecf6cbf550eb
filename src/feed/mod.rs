//! Telemetry feed access
//!
//! - [`client`] - HTTP client for the telemetry provider and the [`FeedSource`] seam
//! - [`selection`] - first-valid-fix selection over a feed window

pub mod client;
pub mod selection;

pub use client::{CallSite, FeedClient, FeedSource, MAX_HISTORY_RESULTS};
pub use selection::{first_valid_fix, parse_coordinate, valid_fixes, FeedEntry, FeedFix};
