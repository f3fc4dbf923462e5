//! Settings of `keyshell serve`, the process a sidecar parent spawns.

use ks_config::{Config, ConfigError, ConfigErrorResult, ServerConfig};
use ks_host::server::{APP_KEY_ENV, HOME_ENV, SERVE_HOST_ENV, SERVE_PORT_ENV};

use std::path::{Path, PathBuf};

pub(crate) struct ServeSettings {
    pub(crate) server: ServerConfig,
    pub(crate) app_key: Option<String>,
    pub(crate) content_root: PathBuf,
}

impl ServeSettings {
    pub(crate) fn from_env(config: &Config, config_dir: &Path) -> ConfigErrorResult<Self> {
        Self::from_lookup(config, config_dir, |name| std::env::var(name).ok())
    }

    /// Resolve settings from `lookup`, falling back to `config`.
    pub(crate) fn from_lookup(
        config: &Config,
        config_dir: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigErrorResult<Self> {
        let mut server = config.server.clone();

        if let Some(host) = lookup(SERVE_HOST_ENV) {
            server.host = host;
        }

        if let Some(port) = lookup(SERVE_PORT_ENV) {
            server.port = port.trim().parse().map_err(|_| {
                ConfigError::server(format!("{SERVE_PORT_ENV} must be a port number, got '{port}'"))
            })?;
        }

        server.validate()?;

        let content_root = match lookup(HOME_ENV) {
            Some(home) => PathBuf::from(home).join(config.import.content_dir_name()),
            None => config.content_dir(config_dir),
        };

        Ok(Self {
            server,
            app_key: lookup(APP_KEY_ENV).filter(|key| !key.is_empty()),
            content_root,
        })
    }
}
