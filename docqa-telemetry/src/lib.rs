//! # docqa-telemetry
//!
//! Logging for DocQA binaries and tests.
//!
//! - [`init_telemetry`] installs a human-readable `fmt` subscriber.
//! - [`init_json_telemetry`] installs a JSON-lines subscriber.
//! - [`EventCapture`] is a [`Layer`](tracing_subscriber::Layer) that keeps
//!   events in memory so tests can assert on what was logged.
//!
//! Both initialisers honour `RUST_LOG` and fall back to `info`. Calling
//! either one a second time returns an error instead of panicking.

mod capture;

pub use capture::{CapturedEvent, EventCapture};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::TryInitError;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global fmt subscriber.
///
/// # Errors
///
/// Returns [`TryInitError`] if a global subscriber is already set.
pub fn init_telemetry(service_name: &str) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()?;
    tracing::debug!(service = service_name, "telemetry initialised");
    Ok(())
}

/// Install the global JSON subscriber, one object per event.
///
/// # Errors
///
/// Returns [`TryInitError`] if a global subscriber is already set.
pub fn init_json_telemetry(service_name: &str) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
        .try_init()?;
    tracing::debug!(service = service_name, "json telemetry initialised");
    Ok(())
}
