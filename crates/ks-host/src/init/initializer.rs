//! First-run initialization and layout migrations of the data directory.

use crate::init::{InitError, InitResult};

use std::panic::Location;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const CURRENT_LAYOUT_VERSION: u32 = 2;

const LAYOUT_FILENAME: &str = "layout.json";
const LOGS_DIR: &str = "logs";
const DATABASES_DIR: &str = "databases";
const STORAGE_DIR: &str = "storage";

/// Body run by the init gate.
///
/// Both methods are called while the gate's lock is held.
pub trait Initializer: Send + Sync {
    /// Whether the data directory is already at the current layout.
    fn is_current(&self) -> InitResult<bool>;

    /// Create or migrate the data directory.
    fn initialize(&self) -> InitResult<()>;
}

/// Contents of `<dataDir>/layout.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutMarker {
    pub version: u32,
    pub initialized_at: DateTime<Utc>,
    pub run_mode: String,
}

/// Prepares the server's data directory.
pub struct HomeInitializer {
    home: PathBuf,
    content_dir_name: String,
    run_mode: String,
}

impl HomeInitializer {
    pub fn new(
        home: impl Into<PathBuf>,
        content_dir_name: impl Into<String>,
        run_mode: impl Into<String>,
    ) -> Self {
        Self {
            home: home.into(),
            content_dir_name: content_dir_name.into(),
            run_mode: run_mode.into(),
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn marker_path(&self) -> PathBuf {
        self.home.join(LAYOUT_FILENAME)
    }

    pub fn read_marker(&self) -> InitResult<Option<LayoutMarker>> {
        let path = self.marker_path();

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(InitError::io(path, e)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| InitError::Layout {
                path,
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn content_dir(&self) -> PathBuf {
        self.home.join(&self.content_dir_name)
    }

    /// Apply the step taking the layout from `from` to `from + 1`.
    fn migrate(&self, from: u32) -> InitResult<()> {
        let dirs = match from {
            0 => vec![
                self.home.clone(),
                self.home.join(LOGS_DIR),
                self.content_dir(),
            ],
            1 => vec![
                self.content_dir().join(DATABASES_DIR),
                self.content_dir().join(STORAGE_DIR),
            ],
            other => {
                return Err(InitError::initialization(format!(
                    "no migration from layout version {other}"
                )));
            }
        };

        for dir in dirs {
            std::fs::create_dir_all(&dir).map_err(|e| InitError::io(&dir, e))?;
        }

        info!("Migrated data layout v{from} -> v{}", from + 1);
        Ok(())
    }

    fn write_marker(&self, marker: &LayoutMarker) -> InitResult<()> {
        let path = self.marker_path();
        let temp_path = path.with_extension("json.tmp");

        let contents = serde_json::to_string_pretty(marker).map_err(|e| InitError::Layout {
            path: path.clone(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        std::fs::write(&temp_path, contents).map_err(|e| InitError::io(&temp_path, e))?;
        std::fs::rename(&temp_path, &path).map_err(|e| InitError::io(&path, e))?;

        Ok(())
    }
}

impl Initializer for HomeInitializer {
    fn is_current(&self) -> InitResult<bool> {
        Ok(self
            .read_marker()?
            .is_some_and(|marker| marker.version >= CURRENT_LAYOUT_VERSION))
    }

    fn initialize(&self) -> InitResult<()> {
        let existing = self.read_marker()?;

        let mut version = match &existing {
            Some(marker) => {
                info!(
                    "Upgrading data directory {} from layout v{}",
                    self.home.display(),
                    marker.version
                );
                marker.version
            }
            None => {
                info!("First time initialization of {}", self.home.display());
                0
            }
        };

        if version > CURRENT_LAYOUT_VERSION {
            warn!(
                "Data directory layout v{version} is newer than v{CURRENT_LAYOUT_VERSION}, leaving it as is"
            );
            return Ok(());
        }

        while version < CURRENT_LAYOUT_VERSION {
            self.migrate(version)?;
            version += 1;
        }

        let initialized_at = existing
            .map(|marker| marker.initialized_at)
            .unwrap_or_else(Utc::now);

        self.write_marker(&LayoutMarker {
            version,
            initialized_at,
            run_mode: self.run_mode.clone(),
        })
    }
}
