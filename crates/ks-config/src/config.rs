use crate::{
    APP_DIR_NAME, CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult, HomeConfig,
    ImportConfig, LoggingConfig, ServerConfig,
};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub home: HomeConfig,
    pub import: ImportConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from the default config directory.
    ///
    /// Loading order:
    /// 1. KS_CONFIG_DIR env var, else `<local data dir>/keyshell`
    /// 2. Auto-create the config directory
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply KS_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_in(&config_dir)
    }

    /// Same as [`Config::load`] against an explicit directory.
    pub fn load_in(config_dir: &Path) -> ConfigErrorResult<Self> {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.to_path_buf(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: KS_CONFIG_DIR env var > `<local data dir>/keyshell`
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoDataDir)
    }

    /// Write config.toml atomically (temp file + rename).
    pub fn save_in(&self, config_dir: &Path) -> ConfigErrorResult<PathBuf> {
        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Io {
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::TomlSerialize { source: e })?;

        let config_path = config_dir.join(CONFIG_FILENAME);
        let temp_path = config_path.with_extension("toml.tmp");

        std::fs::write(&temp_path, contents).map_err(|e| ConfigError::Io {
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        Ok(config_path)
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.home.validate()?;
        self.import.validate()?;
        self.logging.validate()?;

        Ok(())
    }

    /// Absolute path of the server data directory.
    pub fn home_dir(&self, config_dir: &Path) -> PathBuf {
        self.home.resolve(config_dir)
    }

    /// Absolute path of the managed content root.
    pub fn content_dir(&self, config_dir: &Path) -> PathBuf {
        self.home_dir(config_dir).join(self.import.content_dir_name())
    }

    pub fn log_dir(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.logging.dir)
    }

    /// Log configuration summary.
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  server: {:?} on {}:{} (ready {}, startup {}s, shutdown {}s)",
            self.server.mode,
            self.server.host,
            self.server.port,
            self.server.ready_path,
            self.server.startup_timeout_secs,
            self.server.shutdown_timeout_secs
        );

        if let Some(binary) = &self.server.binary {
            info!("  sidecar: {} {}", binary, self.server.args.join(" "));
        }

        info!(
            "  home: {} (run_mode '{}', tz {}, node_id {})",
            self.home.dir,
            self.home.run_mode,
            self.home.timezone.as_deref().unwrap_or("system"),
            if self.home.usable_node_id().is_some() {
                "set"
            } else {
                "generated"
            }
        );

        info!(
            "  import: prefix={}, manifest={}, buffer={}B",
            self.import.content_prefix, self.import.manifest_path, self.import.buffer_size
        );

        info!(
            "  logging: {} in {} (colored: {}, keep {}d)",
            *self.logging.level,
            self.logging.dir,
            self.logging.colored,
            self.logging.retention_days
        );
    }

    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_parse("KS_SERVER_MODE", &mut self.server.mode);
        Self::apply_env_string("KS_SERVER_HOST", &mut self.server.host);
        Self::apply_env_parse("KS_SERVER_PORT", &mut self.server.port);
        Self::apply_env_option_string("KS_SERVER_BINARY", &mut self.server.binary);
        Self::apply_env_parse(
            "KS_STARTUP_TIMEOUT_SECS",
            &mut self.server.startup_timeout_secs,
        );
        Self::apply_env_parse(
            "KS_SHUTDOWN_TIMEOUT_SECS",
            &mut self.server.shutdown_timeout_secs,
        );

        // Home
        Self::apply_env_string("KS_HOME_DIR", &mut self.home.dir);
        Self::apply_env_string("KS_RUN_MODE", &mut self.home.run_mode);
        Self::apply_env_option_string("KS_TIMEZONE", &mut self.home.timezone);
        Self::apply_env_option_string("KS_NODE_ID", &mut self.home.node_id);

        // Import
        Self::apply_env_string("KS_CONTENT_PREFIX", &mut self.import.content_prefix);
        Self::apply_env_string("KS_MANIFEST_PATH", &mut self.import.manifest_path);
        Self::apply_env_parse("KS_IMPORT_BUFFER_SIZE", &mut self.import.buffer_size);

        // Logging
        Self::apply_env_parse("KS_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_string("KS_LOG_DIR", &mut self.logging.dir);
        Self::apply_env_bool("KS_LOG_COLORED", &mut self.logging.colored);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
