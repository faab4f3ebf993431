use serde::{Deserialize, Serialize};

use super::integration::IntegrationSettings;

/// Main configuration structure for the bot helper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Version string reported by the health endpoint
    #[serde(default = "default_version")]
    pub version: String,

    /// Debug-level logging, including API responses and connection lifecycle notes
    #[serde(default)]
    pub debug: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub http_server: HttpServerConfig,

    /// Integration identity shown to tenants
    #[serde(default)]
    pub bot_info: BotInfoConfig,

    /// Per-tenant session tuning
    #[serde(default)]
    pub session: SessionConfig,

    /// Commerce API client settings
    #[serde(default)]
    pub commerce: HttpClientConfig,

    /// Gateway API client settings
    #[serde(default)]
    pub gateway: HttpClientConfig,

    /// Error-tracking sink
    #[serde(default)]
    pub alerting: AlertingConfig,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
            http_server: HttpServerConfig::default(),
            bot_info: BotInfoConfig::default(),
            session: SessionConfig::default(),
            commerce: HttpClientConfig::default(),
            gateway: HttpClientConfig::default(),
            alerting: AlertingConfig::default(),
        }
    }
}

impl Config {
    /// Logging section with the level forced to debug when `debug` is set.
    pub fn effective_logging(&self) -> LoggingConfig {
        let mut logging = self.logging.clone();
        if self.debug {
            logging.level = "debug".to_string();
        }
        logging
    }

    /// Integration identity served from the public host.
    pub fn integration(&self) -> IntegrationSettings {
        IntegrationSettings::new(&self.bot_info, self.http_server.host.clone())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stdout only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    "bot-helper.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// sqlx connection URL for the configured path.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpServerConfig {
    /// Public host name used in integration links
    #[serde(default = "default_host")]
    pub host: String,

    /// Socket address to bind
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_listen() -> String {
    "127.0.0.1:3001".to_string()
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            listen: default_listen(),
        }
    }
}

/// Integration identity announced to the commerce backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BotInfoConfig {
    #[serde(default = "default_bot_name")]
    pub name: String,

    #[serde(default = "default_bot_code")]
    pub code: String,

    /// Logo path on `http_server.host`
    #[serde(default)]
    pub logo_path: String,
}

fn default_bot_name() -> String {
    "Helper".to_string()
}

fn default_bot_code() -> String {
    "crm-info-bot".to_string()
}

impl Default for BotInfoConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            code: default_bot_code(),
            logo_path: String::new(),
        }
    }
}

/// Per-tenant session tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// Sleep after a failed dial before the next attempt
    #[serde(default = "default_dial_backoff_ms")]
    pub dial_backoff_ms: u64,

    /// Sleep after an unexpected disconnect before redialing (0 = immediate)
    #[serde(default)]
    pub redial_backoff_ms: u64,

    /// Upper bound on a single event read; unbounded when unset
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,

    /// Capacity of the shared log/alert fan-in channel
    #[serde(default = "default_log_channel_capacity")]
    pub log_channel_capacity: usize,

    /// Language used when a tenant tag is absent or unrecognized
    #[serde(default = "default_lang")]
    pub default_lang: String,
}

const fn default_dial_backoff_ms() -> u64 {
    1000
}

const fn default_log_channel_capacity() -> usize {
    1024
}

fn default_lang() -> String {
    "en".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dial_backoff_ms: default_dial_backoff_ms(),
            redial_backoff_ms: 0,
            read_timeout_ms: None,
            log_channel_capacity: default_log_channel_capacity(),
            default_lang: default_lang(),
        }
    }
}

/// Outbound HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpClientConfig {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

const fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Error-tracking sink
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AlertingConfig {
    /// Webhook receiving alert JSON; alerts only go to the log when unset
    #[serde(default)]
    pub webhook_url: Option<String>,

    #[serde(default)]
    pub environment: Option<String>,
}

impl SessionConfig {
    pub fn dial_backoff(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.dial_backoff_ms)
    }

    pub fn redial_backoff(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.redial_backoff_ms)
    }

    pub fn read_timeout(&self) -> Option<std::time::Duration> {
        self.read_timeout_ms.map(std::time::Duration::from_millis)
    }
}
