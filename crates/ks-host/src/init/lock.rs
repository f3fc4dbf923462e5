//! Host-wide advisory lock next to the data directory.

use crate::init::{InitError, InitResult};

use std::fs::{File, OpenOptions};
use std::panic::Location;
use std::path::{Path, PathBuf};

use error_location::ErrorLocation;
use fs2::FileExt;
use tracing::{debug, warn};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

const LOCK_EXTENSION: &str = "lock";
#[cfg(unix)]
const LOCK_FILE_MODE: u32 = 0o600; // Owner read/write only

/// Exclusive `flock` on `<dataDir>.lock`, released on drop.
///
/// The lock file itself is left in place; removing it while another
/// process waits on it would hand out two locks.
pub struct InitLock {
    path: PathBuf,
    file: File,
}

impl InitLock {
    /// Path of the lock file guarding `data_dir`.
    pub fn path_for(data_dir: &Path) -> InitResult<PathBuf> {
        let name = data_dir
            .file_name()
            .ok_or_else(|| InitError::InvalidDataDir {
                path: data_dir.to_path_buf(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let mut lock_name = name.to_os_string();
        lock_name.push(".");
        lock_name.push(LOCK_EXTENSION);

        Ok(data_dir.with_file_name(lock_name))
    }

    /// Block until the lock is held.
    pub fn acquire(data_dir: &Path) -> InitResult<Self> {
        let path = Self::path_for(data_dir)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| InitError::LockOpen {
                path: path.clone(),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;
        }

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(false);
        #[cfg(unix)]
        options.mode(LOCK_FILE_MODE);

        let file = options.open(&path).map_err(|e| InitError::LockOpen {
            path: path.clone(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        file.lock_exclusive()
            .map_err(|e| InitError::LockAcquisition {
                path: path.clone(),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!("Acquired init lock {}", path.display());

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InitLock {
    fn drop(&mut self) {
        match FileExt::unlock(&self.file) {
            Ok(()) => debug!("Released init lock {}", self.path.display()),
            // Closing the descriptor releases the lock anyway
            Err(e) => warn!("Failed to unlock {}: {e}", self.path.display()),
        }
    }
}
