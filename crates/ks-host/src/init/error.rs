use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InitError {
    #[error("Failed to open lock file {path}: {source} {location}")]
    LockOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to acquire lock on {path}: {source} {location}")]
    LockAcquisition {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Data directory {path} has no usable file name {location}")]
    InvalidDataDir {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("IO error at {path}: {source} {location}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Layout marker {path} is corrupted: {source} {location}")]
    Layout {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("Initialization failed: {message} {location}")]
    Initialization {
        message: String,
        location: ErrorLocation,
    },
}

impl InitError {
    #[track_caller]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn initialization<S: Into<String>>(message: S) -> Self {
        Self::Initialization {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, InitError>;
