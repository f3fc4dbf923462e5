//! Logging setup with file rotation.

use crate::error::{HostError, HostResult};

use ks_config::LoggingConfig;

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const LOG_FILE_SUFFIX: &str = "log";

/// Install console and rotating file output.
///
/// # Log Layers
/// - Console: human readable, colored when configured
/// - File: plain text, daily rotation, `retention_days` files kept
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn setup_logging(log_dir: &Path, config: &LoggingConfig) -> HostResult<()> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        HostError::logging(format!("cannot create {}: {e}", log_dir.display()))
    })?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(config.colored)
        .with_writer(std::io::stderr);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(config.retention_days)
        .filename_prefix(&config.file_prefix)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(log_dir)
        .map_err(|e| HostError::logging(e.to_string()))?;

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| HostError::logging(e.to_string()))?;

    Ok(())
}

/// Path of today's log file. The appender rotates on UTC dates.
pub fn current_log_path(log_dir: &Path, file_prefix: &str) -> PathBuf {
    let today = chrono::Utc::now().format("%Y-%m-%d");
    log_dir.join(format!("{file_prefix}.{today}.{LOG_FILE_SUFFIX}"))
}
