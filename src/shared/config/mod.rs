//! Application configuration module
//!
//! Configuration is layered: built-in defaults, then an optional TOML file
//! named by `STUDYHUB_CONFIG`, then individual environment variables.
//!
//! | Variable | Field |
//! |---|---|
//! | `SERVER_HOST` | `host` |
//! | `SERVER_PORT` | `port` |
//! | `DATABASE_URL` | `database_url` (unset: in-memory storage) |
//! | `JWT_SECRET` | `jwt_secret` |
//! | `DEV_AUTH_BYPASS` | `dev_auth_bypass` (`1` or `true`) |
//! | `MAX_MESSAGE_CHARS` | `max_message_chars` |
//! | `CONNECTION_QUEUE_CAPACITY` | `connection_queue_capacity` |

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 4000;
pub const DEFAULT_CONNECTION_QUEUE_CAPACITY: usize = 256;

/// Application configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// SQLite URL, e.g. `sqlite://studyhub.db?mode=rwc`
    pub database_url: Option<String>,
    /// HS256 secret for verifying identity tokens
    pub jwt_secret: Option<String>,
    /// Accept a bare `X-User-Id` header instead of a token
    pub dev_auth_bypass: bool,
    /// Upper bound on message content length, in characters
    pub max_message_chars: usize,
    /// Outbound frames buffered per live connection before deliveries drop
    pub connection_queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            jwt_secret: None,
            dev_auth_bypass: false,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
            connection_queue_capacity: DEFAULT_CONNECTION_QUEUE_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Defaults, then `STUDYHUB_CONFIG`, then the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("STUDYHUB_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        let config = base.with_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay values from `lookup` (normally the process environment)
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.port = parse_var("SERVER_PORT", &port)?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = Some(secret);
        }
        if let Some(flag) = lookup("DEV_AUTH_BYPASS") {
            self.dev_auth_bypass = matches!(flag.trim(), "1" | "true" | "yes");
        }
        if let Some(max) = lookup("MAX_MESSAGE_CHARS") {
            self.max_message_chars = parse_var("MAX_MESSAGE_CHARS", &max)?;
        }
        if let Some(cap) = lookup("CONNECTION_QUEUE_CAPACITY") {
            self.connection_queue_capacity = parse_var("CONNECTION_QUEUE_CAPACITY", &cap)?;
        }
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_chars == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_message_chars",
                message: "must be at least 1".to_string(),
            });
        }
        if self.connection_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "connection_queue_capacity",
                message: "must be at least 1".to_string(),
            });
        }
        let has_secret = self.jwt_secret.as_deref().is_some_and(|s| !s.is_empty());
        if !has_secret && !self.dev_auth_bypass {
            return Err(ConfigError::MissingValue("jwt_secret"));
        }
        Ok(())
    }

    /// `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        message: format!("cannot parse '{raw}'"),
    })
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = Some(secret.into());
        self
    }

    pub fn dev_auth_bypass(mut self, enabled: bool) -> Self {
        self.config.dev_auth_bypass = enabled;
        self
    }

    pub fn max_message_chars(mut self, max: usize) -> Self {
        self.config.max_message_chars = max;
        self
    }

    pub fn connection_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.connection_queue_capacity = capacity;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}
