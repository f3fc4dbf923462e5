use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_CONTENT_PREFIX, DEFAULT_IMPORT_BUFFER_SIZE,
    DEFAULT_MANIFEST_PATH, MAX_IMPORT_BUFFER_SIZE, MIN_IMPORT_BUFFER_SIZE,
};

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Every archive entry must live under this prefix
    pub content_prefix: String,
    /// Archive path of the manifest, renamed with a timestamp on import
    pub manifest_path: String,
    /// Copy buffer size in bytes
    pub buffer_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            content_prefix: String::from(DEFAULT_CONTENT_PREFIX),
            manifest_path: String::from(DEFAULT_MANIFEST_PATH),
            buffer_size: DEFAULT_IMPORT_BUFFER_SIZE,
        }
    }
}

impl ImportConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.content_prefix.is_empty() || !self.content_prefix.ends_with('/') {
            return Err(ConfigError::import(format!(
                "import.content_prefix must be non-empty and end with '/', got '{}'",
                self.content_prefix
            )));
        }

        if !is_plain_relative(&self.content_prefix) {
            return Err(ConfigError::import(format!(
                "import.content_prefix must be relative without '..', got '{}'",
                self.content_prefix
            )));
        }

        if !self.manifest_path.starts_with(&self.content_prefix)
            || self.manifest_path.ends_with('/')
            || !is_plain_relative(&self.manifest_path)
        {
            return Err(ConfigError::import(format!(
                "import.manifest_path must be a file under '{}', got '{}'",
                self.content_prefix, self.manifest_path
            )));
        }

        if !(MIN_IMPORT_BUFFER_SIZE..=MAX_IMPORT_BUFFER_SIZE).contains(&self.buffer_size) {
            return Err(ConfigError::import(format!(
                "import.buffer_size must be {MIN_IMPORT_BUFFER_SIZE}-{MAX_IMPORT_BUFFER_SIZE}, got {}",
                self.buffer_size
            )));
        }

        Ok(())
    }

    /// Content root directory name, the prefix without its trailing slash.
    pub fn content_dir_name(&self) -> &str {
        self.content_prefix.trim_end_matches('/')
    }
}

fn is_plain_relative(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
