use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_LOG_DIRECTORY, DEFAULT_LOG_FILE_PREFIX,
    DEFAULT_LOG_LEVEL, DEFAULT_LOG_RETENTION_DAYS, LogLevel,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Relative to the config directory
    pub dir: String,
    pub file_prefix: String,
    /// Daily files kept before the oldest is removed
    pub retention_days: usize,
    pub colored: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel(DEFAULT_LOG_LEVEL),
            dir: String::from(DEFAULT_LOG_DIRECTORY),
            file_prefix: String::from(DEFAULT_LOG_FILE_PREFIX),
            retention_days: DEFAULT_LOG_RETENTION_DAYS,
            colored: true,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.retention_days == 0 {
            return Err(ConfigError::logging("logging.retention_days must be > 0"));
        }

        if self.file_prefix.trim().is_empty() || self.file_prefix.contains(['/', '\\']) {
            return Err(ConfigError::logging(format!(
                "logging.file_prefix must be a plain file name, got '{}'",
                self.file_prefix
            )));
        }

        Ok(())
    }
}
