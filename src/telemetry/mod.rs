//! Telemetry module
//!
//! Structured logging and Prometheus metrics, initialized once at startup.
//! Components receive everything else explicitly; the subscriber and the
//! metrics recorder are the only process-wide installations.

mod logging;
mod metrics;

pub use logging::init_logging;
pub use metrics::{inc_counter, set_gauge, CounterMetric, GaugeMetric};

use crate::config::TelemetryConfig;

/// Guard that pins telemetry for the process lifetime
pub struct TelemetryGuard {
    _priv: (),
}

/// Initialize logging and the Prometheus metrics exporter
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level, config.log_format)?;
    metrics::install_exporter(config.metrics_port)?;
    Ok(TelemetryGuard { _priv: () })
}

/// Initialize logging only, for commands that do not serve metrics
pub fn init_logging_only(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level, config.log_format)?;
    Ok(TelemetryGuard { _priv: () })
}
