//! Configuration module for lanshare.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, ShareError};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Share behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareConfig {
    /// Expiry applied when a create request does not specify one, in minutes.
    #[serde(default = "default_expiry_minutes")]
    pub default_expiry_minutes: u64,
    /// Port of the receiver frontend, used when building share links.
    #[serde(default = "default_frontend_port")]
    pub frontend_port: u16,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Interval of the expired-share sweep in seconds (0 disables the sweep).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_expiry_minutes() -> u64 {
    24 * 60
}

fn default_frontend_port() -> u16 {
    5173
}

fn default_max_upload_size() -> u64 {
    100
}

fn default_sweep_interval() -> u64 {
    300
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            default_expiry_minutes: default_expiry_minutes(),
            frontend_port: default_frontend_port(),
            max_upload_size_mb: default_max_upload_size(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Web layer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Name of the session cookie carrying the client session id.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Rate limit for the password endpoint (attempts per minute per IP).
    #[serde(default = "default_auth_rate_limit")]
    pub auth_rate_limit: u32,
    /// Minutes a session may go unused before the sweep drops it (0 keeps sessions).
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u64,
}

fn default_session_cookie() -> String {
    "lanshare_session".to_string()
}

fn default_auth_rate_limit() -> u32 {
    10
}

fn default_session_idle_minutes() -> u64 {
    24 * 60
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            session_cookie: default_session_cookie(),
            auth_rate_limit: default_auth_rate_limit(),
            session_idle_minutes: default_session_idle_minutes(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file, appended to. Empty logs to the console only.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/lanshare.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Share configuration.
    #[serde(default)]
    pub share: ShareConfig,
    /// Web configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ShareError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ShareError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `LANSHARE_HOST`: Override the bind address
    /// - `LANSHARE_PORT`: Override the listen port (ignored if not a valid port)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("LANSHARE_HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }

        if let Ok(port) = std::env::var("LANSHARE_PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid LANSHARE_PORT"),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.share.max_upload_size_mb == 0 {
            return Err(ShareError::Config(
                "share.max_upload_size_mb must be greater than 0".to_string(),
            ));
        }
        if self.web.session_cookie.trim().is_empty() {
            return Err(ShareError::Config(
                "web.session_cookie must not be empty".to_string(),
            ));
        }
        if self.web.auth_rate_limit == 0 {
            return Err(ShareError::Config(
                "web.auth_rate_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
