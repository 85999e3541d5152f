//! Application configuration.
//!
//! Configuration is built in code with [`AppConfig`]'s builder methods, or
//! read from the Lambda function's environment with [`AppConfig::from_env`]:
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `EASYLAMBDA_APP_NAME` | `name` | `easylambda` |
//! | `EASYLAMBDA_MAX_BODY_SIZE` | `max_body_size` (bytes) | 1 MiB |
//! | `EASYLAMBDA_LOG_LEVEL` | `log.level` (an `EnvFilter` directive) | `info` |
//! | `EASYLAMBDA_LOG_FORMAT` | `log.format` (`text` or `json`) | `text` |

use crate::error::ConfigError;
use easylambda_http::DEFAULT_MAX_BODY_SIZE;
use std::fmt;
use std::str::FromStr;

pub const ENV_APP_NAME: &str = "EASYLAMBDA_APP_NAME";
pub const ENV_MAX_BODY_SIZE: &str = "EASYLAMBDA_MAX_BODY_SIZE";
pub const ENV_LOG_LEVEL: &str = "EASYLAMBDA_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "EASYLAMBDA_LOG_FORMAT";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per event, for CloudWatch Logs Insights.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `text` or `json`, got `{other}`")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `info,easylambda_core=debug`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Name recorded on every dispatch span.
    pub name: String,
    /// Largest accepted request body, in bytes.
    pub max_body_size: usize,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "easylambda".to_owned(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the maximum request body size.
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Set the log filter directive.
    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log.level = level.into();
        self
    }

    /// Set the log output format.
    #[must_use]
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log.format = format;
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Unset and blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(name) = get(ENV_APP_NAME) {
            config.name = name;
        }
        if let Some(raw) = get(ENV_MAX_BODY_SIZE) {
            config.max_body_size = raw.trim().parse().map_err(|err: std::num::ParseIntError| {
                ConfigError::InvalidEnv {
                    name: ENV_MAX_BODY_SIZE.to_owned(),
                    value: raw.clone(),
                    reason: err.to_string(),
                }
            })?;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log.level = level;
        }
        if let Some(raw) = get(ENV_LOG_FORMAT) {
            config.log.format = raw.parse().map_err(|reason| ConfigError::InvalidEnv {
                name: ENV_LOG_FORMAT.to_owned(),
                value: raw.clone(),
                reason,
            })?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.name, "easylambda");
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn builder() {
        let config = AppConfig::new()
            .name("orders")
            .max_body_size(4096)
            .log_level("debug")
            .log_format(LogFormat::Json);
        assert_eq!(config.name, "orders");
        assert_eq!(config.max_body_size, 4096);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_APP_NAME, "webhooks"),
            (ENV_MAX_BODY_SIZE, " 2048 "),
            (ENV_LOG_LEVEL, "warn,easylambda_core=trace"),
            (ENV_LOG_FORMAT, "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.name, "webhooks");
        assert_eq!(config.max_body_size, 2048);
        assert_eq!(config.log.level, "warn,easylambda_core=trace");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn blank_variables_keep_defaults() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_APP_NAME, "  ")])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(ENV_MAX_BODY_SIZE, "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref name, .. } if name == ENV_MAX_BODY_SIZE));

        let err = AppConfig::from_lookup(lookup(&[(ENV_LOG_FORMAT, "xml")])).unwrap_err();
        assert!(err.to_string().contains("expected `text` or `json`"));
    }
}
