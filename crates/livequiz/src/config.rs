//! Server configuration.
//!
//! Every field has a default, so a server runs with no configuration at
//! all. [`ServerConfig::from_env`] overrides defaults from `LIVEQUIZ_*`
//! environment variables:
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `LIVEQUIZ_BIND` | `bind` | `127.0.0.1:8080` |
//! | `LIVEQUIZ_TEMPLATES` | `templates_dir` | `quizzes` |
//! | `LIVEQUIZ_LISTENER_CAPACITY` | `listener_capacity` | `16` |
//! | `LIVEQUIZ_IDLE_TIMEOUT_SECS` | `idle_timeout` | `300` |
//! | `LIVEQUIZ_LOG_LEVEL` | `log_level` | `info` |
//! | `LIVEQUIZ_LOG_FORMAT` | `log_format` | `text` |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use livequiz_broadcast::DEFAULT_LISTENER_CAPACITY;
use serde::{Deserialize, Serialize};

/// A configuration value that could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {other:?} (expected text or json)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind: String,

    /// Directory holding `<name>.json` quiz templates.
    pub templates_dir: PathBuf,

    /// Events buffered per listener before new ones are dropped for it.
    pub listener_capacity: usize,

    /// Connections that send nothing for this long are closed.
    pub idle_timeout: Duration,

    /// Default tracing filter; `RUST_LOG` wins when set.
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".into(),
            templates_dir: PathBuf::from("quizzes"),
            listener_capacity: DEFAULT_LISTENER_CAPACITY,
            idle_timeout: Duration::from_secs(300),
            log_level: "info".into(),
            log_format: LogFormat::Text,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `LIVEQUIZ_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `LIVEQUIZ_*` variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(bind) = lookup("LIVEQUIZ_BIND") {
            config.bind = bind;
        }
        if let Some(dir) = lookup("LIVEQUIZ_TEMPLATES") {
            config.templates_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("LIVEQUIZ_LISTENER_CAPACITY") {
            config.listener_capacity = parse("LIVEQUIZ_LISTENER_CAPACITY", &raw)?;
            if config.listener_capacity == 0 {
                return Err(invalid("LIVEQUIZ_LISTENER_CAPACITY", raw, "must be at least 1"));
            }
        }
        if let Some(raw) = lookup("LIVEQUIZ_IDLE_TIMEOUT_SECS") {
            config.idle_timeout = Duration::from_secs(parse("LIVEQUIZ_IDLE_TIMEOUT_SECS", &raw)?);
        }
        if let Some(level) = lookup("LIVEQUIZ_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(raw) = lookup("LIVEQUIZ_LOG_FORMAT") {
            config.log_format = parse("LIVEQUIZ_LOG_FORMAT", &raw)?;
        }

        Ok(config)
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| invalid(var, raw.to_string(), e.to_string()))
}

fn invalid(var: &'static str, value: String, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        value,
        reason: reason.into(),
    }
}
