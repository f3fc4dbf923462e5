use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Server is already started {location}")]
    AlreadyStarted { location: ErrorLocation },

    #[error("Failed to bind {addr}: {source} {location}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to spawn server process {binary}: {source} {location}")]
    ProcessSpawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Server binary not found at {path} {location}")]
    BinaryNotFound {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Server failed to become ready within {timeout_secs}s {location}")]
    StartupTimeout {
        timeout_secs: u64,
        location: ErrorLocation,
    },

    #[error("Server startup failed: {message} {location}")]
    StartupFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Server process exited during startup with code {code:?} {location}")]
    ProcessExited {
        code: Option<i32>,
        location: ErrorLocation,
    },

    #[error("Graceful shutdown timed out after {timeout_secs}s {location}")]
    ShutdownTimeout {
        timeout_secs: u64,
        location: ErrorLocation,
    },

    #[error("IO error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("HTTP error: {source} {location}")]
    Http {
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },
}

impl ServerError {
    /// Whether this error is recoverable via retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::StartupTimeout { .. } | Self::Bind { .. }
        )
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::AlreadyStarted { .. } => {
                "The server is already running. \
                   Stop it before starting it again."
            }
            Self::Bind { .. } => {
                "Another application is using the required port. \
                   Set server.port = 0 to pick a free port automatically."
            }
            Self::StartupTimeout { .. } => {
                "The server is taking too long to start. \
                   Try restarting the application or check the logs."
            }
            Self::BinaryNotFound { .. } => {
                "The configured server binary does not exist. \
                   Check server.binary in the configuration file."
            }
            Self::ProcessSpawn { .. } | Self::ProcessExited { .. } => {
                "The server process could not be started. \
                   Check the server logs for details."
            }
            Self::ShutdownTimeout { .. } => {
                "The server did not stop in time and was terminated. \
                   Check the logs for details."
            }
            _ => "An unexpected error occurred. Please check the logs for details.",
        }
    }
}

impl From<std::io::Error> for ServerError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for ServerError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        Self::Http {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
