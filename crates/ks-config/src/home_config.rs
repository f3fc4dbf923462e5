use crate::{ConfigError, ConfigErrorResult, DEFAULT_HOME_DIR};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Minimum length for a node id to be handed to the server.
const MIN_NODE_ID_LEN: usize = 16;

/// Id reported by a large batch of devices with a hard-coded value.
const KNOWN_SHARED_NODE_ID: &str = "9774d56d682e549c";

/// Server data directory and the environment the server runs with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    /// Data directory, relative to the config directory unless absolute
    pub dir: String,
    pub run_mode: String,
    pub timezone: Option<String>,
    pub node_id: Option<String>,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            dir: String::from(DEFAULT_HOME_DIR),
            run_mode: String::new(),
            timezone: None,
            node_id: None,
        }
    }
}

impl HomeConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.dir.trim().is_empty() {
            return Err(ConfigError::home("home.dir cannot be empty"));
        }

        if Path::new(&self.dir)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(ConfigError::home("home.dir cannot contain '..'"));
        }

        if self
            .run_mode
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        {
            return Err(ConfigError::home(format!(
                "home.run_mode may only contain [A-Za-z0-9_-], got '{}'",
                self.run_mode
            )));
        }

        Ok(())
    }

    /// Resolve the data directory against the config directory.
    pub fn resolve(&self, config_dir: &Path) -> PathBuf {
        let dir = Path::new(&self.dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            config_dir.join(dir)
        }
    }

    /// Node id to pass to the server, if it is usable.
    ///
    /// Short ids and the well-known shared id are dropped so the server
    /// generates its own.
    pub fn usable_node_id(&self) -> Option<&str> {
        self.node_id
            .as_deref()
            .map(str::trim)
            .filter(|id| id.len() >= MIN_NODE_ID_LEN && *id != KNOWN_SHARED_NODE_ID)
    }
}
