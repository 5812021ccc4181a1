//! Logging initialization.
//!
//! Sets up tracing-subscriber with an env filter and a compact fmt layer.
//! Live progress during a run is emitted as tracing events, so the filter
//! also controls how chatty a run is (`RUST_LOG=clutch=debug` etc.).

use crate::error::{Error, Result};

/// Initialize the tracing subscriber.
///
/// # Errors
///
/// Returns an error if a subscriber was already installed.
pub fn init_logging() -> Result<()> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
        .map_err(|e| Error::Config(format!("failed to init tracing subscriber: {e}")))
}
