//! Logging setup for lanshare.
//!
//! Share events are logged with structured fields (`token`, `entries`,
//! `bytes`, `filename`). Tokens grant access to a directory, so only their
//! prefix is ever written out, via [`token_prefix`].

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Number of token characters that may appear in log lines.
const TOKEN_LOG_PREFIX: usize = 8;

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Filter directives: our own events and request traces at `level`,
/// dependencies at warn.
fn default_directives(level: Level) -> String {
    let level = level.to_string().to_lowercase();
    format!("warn,lanshare={level},tower_http={level}")
}

/// `RUST_LOG` when set, otherwise [`default_directives`].
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(parse_level(level))))
}

/// Loggable form of a share token.
pub fn token_prefix(token: &str) -> &str {
    token.get(..TOKEN_LOG_PREFIX).unwrap_or(token)
}

/// Initialize logging to stdout and, unless `file` is empty, to the log file.
///
/// The log file is appended to across restarts.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if config.file.trim().is_empty() {
        init_console_only(&config.level);
        return Ok(());
    }

    let path = Path::new(&config.file);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let log_file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(build_filter(&config.level))
        .init();

    Ok(())
}

/// Initialize console-only logging.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(true)
                .with_target(true),
        )
        .with(build_filter(level))
        .init();
}
