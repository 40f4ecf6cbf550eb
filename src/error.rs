//! Unified error handling for the vesseltrack crate
//!
//! Each component keeps its own error enum; this module wraps them in a single
//! [`Error`] and classifies them with [`ErrorCategory`] so logs and the HTTP
//! layer can treat them uniformly.
//!
//! # Architecture
//!
//! - [`Categorized`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use thiserror::Error;

pub use crate::query::QueryError;
pub use crate::storage::RegistryError;
pub use crate::utils::error::{FeedError, FetchError, WeatherError};

/// Common trait for all vesseltrack error types
pub trait Categorized: std::error::Error {
    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;

    /// Whether the same request could succeed if issued again later
    ///
    /// Nothing in the crate retries; this only informs the log level and the
    /// CLI's exit message.
    fn is_transient(&self) -> bool {
        matches!(self.category(), ErrorCategory::Network)
    }
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Provider unreachable, slow, or answering garbage
    Network,
    /// Provider answered but the data holds no usable fix
    Data,
    /// Caller input rejected
    Validation,
    /// Registry lookup failed to resolve a single device
    Lookup,
    /// Storage and I/O errors
    Storage,
    /// Configuration errors
    Config,
}

impl ErrorCategory {
    /// Short label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Data => "data",
            Self::Validation => "validation",
            Self::Lookup => "lookup",
            Self::Storage => "storage",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Categorized for FetchError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUrl(_) => ErrorCategory::Config,
            _ => ErrorCategory::Network,
        }
    }
}

impl Categorized for FeedError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::NoData | Self::MissingCoordinates => ErrorCategory::Data,
            Self::Transport(e) => e.category(),
        }
    }
}

impl Categorized for WeatherError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::NotConfigured => ErrorCategory::Config,
            Self::Provider { .. } => ErrorCategory::Data,
            Self::Transport(e) => e.category(),
        }
    }
}

impl Categorized for RegistryError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) | Self::Ambiguous { .. } => ErrorCategory::Lookup,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Database(_) | Self::Io(_) | Self::Poisoned => ErrorCategory::Storage,
        }
    }
}

impl Categorized for QueryError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Registry(e) => e.category(),
            Self::Feed(e) => e.category(),
        }
    }
}

/// Unified error type for the vesseltrack crate
///
/// Returned by the command layer, which opens the registry and provider
/// clients itself and reports failures by category.
#[derive(Error, Debug)]
pub enum Error {
    /// Query orchestration errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Device registry errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Telemetry feed errors
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Weather provider errors
    #[error(transparent)]
    Weather(#[from] WeatherError),

    /// Provider client setup errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

impl Categorized for Error {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Query(e) => e.category(),
            Self::Registry(e) => e.category(),
            Self::Feed(e) => e.category(),
            Self::Weather(e) => e.category(),
            Self::Fetch(e) => e.category(),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
