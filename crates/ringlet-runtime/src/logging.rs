//! Tracing subscriber setup

use crate::config::LoggingConfig;
use crate::errors::{Result, RuntimeError};
use tracing_subscriber::EnvFilter;

/// The filter a subscriber would use: `RUST_LOG` when set, otherwise the
/// configured level
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| RuntimeError::invalid_log_filter(&config.level, e.to_string())),
    }
}

/// Install a global `fmt` subscriber.
///
/// Returns `false` when a global subscriber was already installed, which
/// leaves the existing one in place.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = env_filter(config)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(config.with_target)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(level = %config.level, "Tracing initialized");
    }
    Ok(installed)
}
