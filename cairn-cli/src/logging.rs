//! Logging setup for the CLI.
//!
//! # Environment Variables
//!
//! - `CAIRN_LOG=trace|debug|info|warn|error` - Log level (default: warn)
//! - `CAIRN_LOG_FORMAT=pretty|compact|json` - Output format (default: compact)
//!
//! Logs go to stderr so they never mix with command output.

use std::env;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Get the configured log level from `CAIRN_LOG`.
pub fn get_log_level() -> &'static str {
    env::var("CAIRN_LOG")
        .map(|level| match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "error" => "error",
            _ => "warn",
        })
        .unwrap_or("warn")
}

/// Get the configured log format from `CAIRN_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    env::var("CAIRN_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "json" => "json",
            _ => "compact",
        })
        .unwrap_or("compact")
}

/// Initialize logging. Subsequent calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        let level = get_log_level();
        let filter = EnvFilter::try_new(format!(
            "cairn={level},cairn_cli={level},cairn_migrate={level},cairn_sqlite={level}"
        ))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

        let registry = tracing_subscriber::registry().with(filter);
        let result = match get_log_format() {
            "json" => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init(),
            "pretty" => registry
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init(),
            _ => registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init(),
        };

        if result.is_ok() {
            tracing::debug!(level, format = get_log_format(), "Cairn logging initialized");
        }
    });
}
