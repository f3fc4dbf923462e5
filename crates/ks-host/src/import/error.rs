use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

/// Failures that abort a whole import.
///
/// Per-entry problems are recorded in `ImportStats` instead.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to open archive {path}: {source} {location}")]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Archive is malformed: {source} {location}")]
    Archive {
        #[source]
        source: zip::result::ZipError,
        location: ErrorLocation,
    },

    #[error("Failed to read entry {entry}: {source} {location}")]
    ArchiveRead {
        entry: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to spool archive stream: {source} {location}")]
    Spool {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Destination root {path} is unusable: {source} {location}")]
    DestinationRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },
}

pub type Result<T> = std::result::Result<T, ImportError>;
