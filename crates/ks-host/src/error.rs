use crate::control::ControlError;
use crate::import::ImportError;
use crate::init::InitError;
use crate::server::ServerError;

use std::panic::Location;

use error_location::ErrorLocation;
use ks_config::ConfigError;
use thiserror::Error;

/// Errors surfaced by the host context and the lifecycle manager.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Initialization failed: {0}")]
    Init(#[from] InitError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Control channel error: {0}")]
    Control(#[from] ControlError),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Background task failed: {message} {location}")]
    Task {
        message: String,
        location: ErrorLocation,
    },

    #[error("Logging setup failed: {message} {location}")]
    Logging {
        message: String,
        location: ErrorLocation,
    },
}

impl HostError {
    #[track_caller]
    pub fn logging<S: Into<String>>(message: S) -> Self {
        Self::Logging {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::Server(e) => e.recovery_hint(),
            Self::Init(InitError::LockOpen { .. } | InitError::LockAcquisition { .. }) => {
                "Unable to lock the data directory. \
                   Check file permissions next to the data directory."
            }
            Self::Init(_) => {
                "The data directory could not be prepared. \
                   Check available disk space and permissions, then try again."
            }
            Self::Config(_) => {
                "Configuration file has invalid settings. \
                   Run `keyshell config show` or delete the config file to use defaults."
            }
            Self::Import(_) => {
                "The archive could not be read. \
                   Make sure it is a complete zip file and try again."
            }
            _ => "An unexpected error occurred. Please check the logs for details.",
        }
    }
}

impl From<tokio::task::JoinError> for HostError {
    #[track_caller]
    fn from(source: tokio::task::JoinError) -> Self {
        Self::Task {
            message: source.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type HostResult<T> = std::result::Result<T, HostError>;
