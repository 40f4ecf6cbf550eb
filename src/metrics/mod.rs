//! Prometheus metrics for vesseltrack
//!
//! This module tracks:
//! - Provider calls: telemetry and weather requests by outcome, and latency
//! - HTTP API: requests by endpoint and status, and latency
//! - Bulk lookups: devices omitted from a locate-all answer
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec,
    TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

struct TrackerMetrics {
    provider_requests: CounterVec,
    provider_duration: HistogramVec,
    api_requests: CounterVec,
    api_duration: HistogramVec,
    bulk_omissions: CounterVec,
}

static METRICS: OnceLock<TrackerMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup.
/// If metric registration fails, subsequent metric operations become no-ops.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = vesseltrack::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = TrackerMetrics {
        provider_requests: register_counter_vec!(
            "vesseltrack_provider_requests_total",
            "Total provider requests by provider and outcome",
            &["provider", "outcome"]
        )?,
        provider_duration: register_histogram_vec!(
            "vesseltrack_provider_request_duration_seconds",
            "Provider request duration in seconds",
            &["provider"],
            vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )?,
        api_requests: register_counter_vec!(
            "vesseltrack_api_requests_total",
            "Total API requests by endpoint and status",
            &["endpoint", "status"]
        )?,
        api_duration: register_histogram_vec!(
            "vesseltrack_api_request_duration_seconds",
            "API request duration in seconds",
            &["endpoint"],
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )?,
        bulk_omissions: register_counter_vec!(
            "vesseltrack_bulk_omissions_total",
            "Devices left out of a bulk lookup, by failure kind",
            &["kind"]
        )?,
    };

    METRICS
        .set(metrics)
        .map_err(|_| "Metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a provider request outcome
pub fn record_provider_request(provider: &str, outcome: &str) {
    if let Some(m) = METRICS.get() {
        m.provider_requests
            .with_label_values(&[provider, outcome])
            .inc();
    }
}

/// Record API request
pub fn record_api_request(endpoint: &str, status: u16, duration_secs: f64) {
    let Some(m) = METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.api_requests
        .with_label_values(&[endpoint, &status_str])
        .inc();
    m.api_duration
        .with_label_values(&[endpoint])
        .observe(duration_secs);
}

/// Record a device omitted from a bulk lookup
pub fn record_bulk_omission(kind: &str) {
    if let Some(m) = METRICS.get() {
        m.bulk_omissions.with_label_values(&[kind]).inc();
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a provider request timer
pub fn start_provider_timer(provider: &str) -> MetricsTimer {
    match METRICS.get() {
        Some(m) => MetricsTimer::new(
            m.provider_duration
                .with_label_values(&[provider])
                .start_timer(),
        ),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================
