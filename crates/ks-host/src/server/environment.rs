use crate::server::HOME_ENV;

use ks_config::Config;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

const RUN_MODE_ENV: &str = "KS_RUN_MODE";
const NODE_ID_ENV: &str = "KS_NODE_ID";
const TIMEZONE_ENV: &str = "TZ";

/// Environment handed to the embedded server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEnvironment {
    pub home: PathBuf,
    pub run_mode: String,
    pub timezone: Option<String>,
    pub node_id: Option<String>,
}

impl ServerEnvironment {
    pub fn from_config(config: &Config, config_dir: &Path) -> Self {
        Self {
            home: config.home_dir(config_dir),
            run_mode: config.home.run_mode.clone(),
            timezone: config.home.timezone.clone(),
            node_id: config.home.usable_node_id().map(str::to_string),
        }
    }

    /// Variables to set on the child process. The home path is passed as-is,
    /// even when it is not valid UTF-8.
    pub fn vars(&self) -> Vec<(&'static str, OsString)> {
        let mut vars = vec![
            (HOME_ENV, self.home.clone().into_os_string()),
            (RUN_MODE_ENV, OsString::from(&self.run_mode)),
        ];

        if let Some(tz) = &self.timezone {
            vars.push((TIMEZONE_ENV, OsString::from(tz)));
        }

        if let Some(node_id) = &self.node_id {
            vars.push((NODE_ID_ENV, OsString::from(node_id)));
        }

        vars
    }
}
