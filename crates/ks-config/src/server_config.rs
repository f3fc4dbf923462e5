use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_READY_PATH,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS, DEFAULT_SIDECAR_ARGS, DEFAULT_STARTUP_TIMEOUT_SECS, LOCALHOST,
    MIN_PORT,
};

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the embedded server is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerMode {
    /// In-process loopback HTTP server
    #[default]
    Loopback,
    /// Child process spawned from `binary`
    Sidecar,
}

impl FromStr for ServerMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "loopback" => Ok(ServerMode::Loopback),
            "sidecar" => Ok(ServerMode::Sidecar),
            other => Err(ConfigError::server(format!(
                "server.mode must be 'loopback' or 'sidecar', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub mode: ServerMode,
    /// Loopback address only
    pub host: String,
    /// 0 = pick an ephemeral port
    pub port: u16,
    /// Sidecar executable; `None` runs the current executable
    pub binary: Option<String>,
    /// Arguments passed to the sidecar executable
    pub args: Vec<String>,
    pub ready_path: String,
    pub startup_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: ServerMode::default(),
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            binary: None,
            args: DEFAULT_SIDECAR_ARGS.iter().map(|s| s.to_string()).collect(),
            ready_path: String::from(DEFAULT_READY_PATH),
            startup_timeout_secs: DEFAULT_STARTUP_TIMEOUT_SECS,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        // Host must be loopback, the app key travels in a plain cookie
        if self.host != DEFAULT_HOST && self.host != LOCALHOST {
            return Err(ConfigError::server(format!(
                "server.host must be {DEFAULT_HOST} or {LOCALHOST}, got '{}'",
                self.host
            )));
        }

        if self.port != 0 && self.port < MIN_PORT {
            return Err(ConfigError::server(format!(
                "server.port must be 0 (auto) or >= {MIN_PORT}, got {}",
                self.port
            )));
        }

        if !self.ready_path.starts_with('/') {
            return Err(ConfigError::server(format!(
                "server.ready_path must start with '/', got '{}'",
                self.ready_path
            )));
        }

        if self.startup_timeout_secs == 0 {
            return Err(ConfigError::server("server.startup_timeout_secs must be > 0"));
        }

        if self.shutdown_timeout_secs == 0 {
            return Err(ConfigError::server(
                "server.shutdown_timeout_secs must be > 0",
            ));
        }

        if let Some(binary) = &self.binary
            && binary.trim().is_empty()
        {
            return Err(ConfigError::server("server.binary cannot be empty"));
        }

        Ok(())
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
