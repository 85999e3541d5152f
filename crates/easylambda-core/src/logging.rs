//! Log subscriber setup.
//!
//! The crate itself only emits `tracing` events and spans; installing a
//! subscriber is left to the function's `main`. [`init`] installs the usual
//! one for Lambda: no ANSI colours (CloudWatch shows them verbatim), an
//! `EnvFilter` built from [`LogConfig::level`], text or JSON lines.

use crate::config::{LogConfig, LogFormat};
use tracing_subscriber::EnvFilter;

/// Error installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter directive")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("failed to install the global subscriber: {0}")]
    Install(String),
}

/// Install the global `tracing` subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(&config.level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true);
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
    installed.map_err(|err| LoggingError::Install(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_filter() {
        let config = LogConfig {
            level: "easylambda=loud".to_owned(),
            format: LogFormat::Text,
        };
        assert!(matches!(init(&config), Err(LoggingError::Filter(_))));
    }

    #[test]
    fn installs_once() {
        let config = LogConfig {
            level: "debug".to_owned(),
            format: LogFormat::Json,
        };
        assert!(init(&config).is_ok());
        assert!(matches!(init(&config), Err(LoggingError::Install(_))));
    }
}
