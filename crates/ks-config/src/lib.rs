mod config;
mod error;
mod home_config;
mod import_config;
mod log_level;
mod logging_config;
mod server_config;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use home_config::HomeConfig;
pub use import_config::ImportConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use server_config::{ServerConfig, ServerMode};

use tracing::level_filters::LevelFilter;

pub const CONFIG_FILENAME: &str = "config.toml";
pub const CONFIG_DIR_ENV: &str = "KS_CONFIG_DIR";
const APP_DIR_NAME: &str = "keyshell";

const DEFAULT_HOST: &str = "127.0.0.1";
const LOCALHOST: &str = "localhost";
const DEFAULT_PORT: u16 = 0;
const MIN_PORT: u16 = 1024;
const DEFAULT_READY_PATH: &str = "/ready";
const DEFAULT_SIDECAR_ARGS: &[&str] = &["serve"];
const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

const DEFAULT_HOME_DIR: &str = "home";

const DEFAULT_CONTENT_PREFIX: &str = "content/";
const DEFAULT_MANIFEST_PATH: &str = "content/manifest.json";
const DEFAULT_IMPORT_BUFFER_SIZE: usize = 8 * 1024;
const MIN_IMPORT_BUFFER_SIZE: usize = 512;
const MAX_IMPORT_BUFFER_SIZE: usize = 1024 * 1024;

const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::INFO;
const DEFAULT_LOG_DIRECTORY: &str = "logs";
const DEFAULT_LOG_FILE_PREFIX: &str = "keyshell";
const DEFAULT_LOG_RETENTION_DAYS: usize = 7;
