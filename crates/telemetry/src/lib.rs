//! Telemetry bootstrap for bookapi.
//!
//! Logging goes through `tracing` with a `tracing-subscriber` pipeline chosen
//! by [`TelemetrySettings`]. Metrics go through the `metrics` facade: when no
//! recorder is installed every call is a no-op, so emitting a metric can never
//! fail or block a request.

pub mod metrics;

use bookapi_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::TimingGuard;

/// Initialize the tracing/logging pipeline.
///
/// `RUST_LOG` wins over `settings.log_filter` when set. Returns `false` if a
/// global subscriber was already installed (e.g. by an earlier test).
pub fn init_tracing(settings: &TelemetrySettings) -> anyhow::Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.log_filter)?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match settings.log_format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(
            target: "bookapi-telemetry",
            format = ?settings.log_format,
            "tracing initialized"
        );
    }

    Ok(installed)
}
