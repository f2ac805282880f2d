//! Logging setup
//!
//! Structured logging through `tracing`. The filter comes from the
//! `SWITCHBOARD_LOG` environment variable when set, otherwise from the
//! configured level. Output goes to stderr so stdout stays free for results.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::core::config::LoggingConfig;
use crate::core::{Result, SwitchboardError};

/// Environment variable holding a full filter directive
pub const LOG_ENV: &str = "SWITCHBOARD_LOG";

/// Install the global subscriber
///
/// Returns `Ok(false)` if a subscriber was already installed.
pub fn init(config: &LoggingConfig) -> Result<bool> {
    let filter = build_env_filter(config)?;
    let base = Registry::default().with(filter);

    let installed = match config.format.as_str() {
        "json" => base
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        "text" => base
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        other => {
            return Err(SwitchboardError::config(format!(
                "Invalid log format: {}. Must be 'text' or 'json'",
                other
            )))
        }
    };

    Ok(installed.is_ok())
}

/// Build the filter from `SWITCHBOARD_LOG` or the configured level
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.level)
        .map_err(|e| SwitchboardError::config(format!("Invalid log level '{}': {}", config.level, e)))
}
