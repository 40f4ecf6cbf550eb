//! Errors surfaced by the query service

use thiserror::Error;

use crate::storage::RegistryError;
use crate::utils::error::FeedError;

/// Failure of a single-ship query
///
/// Registry failures always short-circuit before any provider request.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Caller input rejected before any lookup
    #[error("{0}")]
    Validation(String),

    /// Device lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Feed fetch or fix selection failed
    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl QueryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the device lookup found nothing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Registry(RegistryError::NotFound(_)))
    }
}
