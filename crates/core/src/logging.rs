//! Logging initialization for hosts embedding the SBOM generator.
//!
//! Configures `tracing-subscriber` based on the `[general]` section
//! of `ApkbomConfig`. Supports JSON structured logging and
//! human-readable pretty format.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::GeneralConfig;
use crate::error::{ApkbomError, ConfigError};

/// Initialize the global tracing subscriber.
///
/// Must be called at most once per process, before any tracing macros are used.
/// `RUST_LOG` takes precedence over `config.log_level` when set.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines (default for build pipelines)
/// * `"pretty"` - Human-readable colored output (for local builds)
pub fn init_tracing(config: &GeneralConfig) -> Result<(), ApkbomError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .map_err(|e| {
                    ConfigError::Logging(format!("failed to initialize JSON subscriber: {e}"))
                })?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .map_err(|e| {
                    ConfigError::Logging(format!("failed to initialize pretty subscriber: {e}"))
                })?;
        }
        other => {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("unknown log format '{other}', expected 'json' or 'pretty'"),
            }
            .into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_is_rejected_before_install() {
        let config = GeneralConfig {
            log_level: "info".to_owned(),
            log_format: "xml".to_owned(),
        };
        let err = init_tracing(&config).unwrap_err();
        assert!(err.to_string().contains("xml"));
    }
}
