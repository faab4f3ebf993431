use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Prefix of environment overrides (`BOT_HELPER_DATABASE__PATH=...`).
pub const ENV_PREFIX: &str = "BOT_HELPER_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid listen address: {0}")]
    InvalidListenAddress(String),

    #[error("Invalid log_channel_capacity: {0}. Must be at least 1")]
    InvalidChannelCapacity(usize),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. YAML file (`config.yml` unless a path is given; optional)
    /// 3. Environment variables (`BOT_HELPER_*`, `__` separates nested keys)
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        if config.http_server.listen.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::InvalidListenAddress(
                config.http_server.listen.clone(),
            ));
        }

        if config.session.log_channel_capacity == 0 {
            return Err(ConfigError::InvalidChannelCapacity(
                config.session.log_channel_capacity,
            ));
        }

        if config.session.default_lang.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "session.default_lang cannot be empty".to_string(),
            ));
        }

        if let Some(url) = &config.alerting.webhook_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationFailed(format!(
                    "alerting.webhook_url must be an http(s) URL, got '{url}'"
                )));
            }
        }

        Ok(())
    }
}
