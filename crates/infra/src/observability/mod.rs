//! Tracing setup
//!
//! Hosts call [`init_tracing`] once at startup. `RUST_LOG` wins over the
//! configured level; output goes to stderr in pretty or JSON form.

use casefile_domain::{CasefileError, LogFormat, LoggingConfig, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed, so calling
/// it more than once is harmless.
///
/// # Errors
/// Returns `CasefileError::Config` if the configured level is not a valid
/// filter directive and `RUST_LOG` is unset.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = build_filter(config)?;

    let builder = fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    match installed {
        Ok(()) => {
            tracing::debug!(level = %config.level, format = ?config.format, "tracing initialised");
            Ok(true)
        }
        Err(e) => {
            tracing::debug!(error = %e, "tracing subscriber already installed");
            Ok(false)
        }
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.level).map_err(|e| {
        CasefileError::Config(format!("Invalid log level {:?}: {}", config.level, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_is_config_error() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig { level: "casefile=bogus".into(), format: LogFormat::Pretty };
        assert!(matches!(build_filter(&config), Err(CasefileError::Config(_))));
    }

    #[test]
    fn second_init_reports_existing_subscriber() {
        let config = LoggingConfig::default();
        init_tracing(&config).unwrap();

        assert!(!init_tracing(&config).unwrap());
    }
}
