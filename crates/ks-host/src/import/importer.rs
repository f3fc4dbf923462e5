//! Streams zip archives into the managed content directory.

use crate::import::{ImportError, ImportResult, ImportStats};

use ks_config::ImportConfig;

use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::panic::Location;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use error_location::ErrorLocation;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Source of the timestamp used to rename imported manifests.
pub trait Clock: Send + Sync {
    fn unix_seconds(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }
}

impl<F> Clock for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn unix_seconds(&self) -> i64 {
        self()
    }
}

enum CopyFailure {
    Read(std::io::Error),
    Write(std::io::Error),
}

/// Merges archives into a destination root without clobbering manifests.
///
/// Every entry must live under the content prefix and resolve inside the
/// destination root; other entries are skipped and recorded. The manifest
/// is written under a timestamped name. Other files are overwritten.
pub struct ContentImporter {
    content_prefix: String,
    manifest_path: String,
    manifest_stem: String,
    manifest_extension: Option<String>,
    buffer_size: usize,
    clock: Arc<dyn Clock>,
}

impl ContentImporter {
    pub fn new(config: &ImportConfig) -> Self {
        let manifest = Path::new(&config.manifest_path);

        Self {
            content_prefix: config.content_prefix.clone(),
            manifest_path: config.manifest_path.clone(),
            manifest_stem: manifest
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            manifest_extension: manifest
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned()),
            buffer_size: config.buffer_size.max(1),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Import the archive at `archive` into `destination_root`.
    pub fn import_file(&self, archive: &Path, destination_root: &Path) -> ImportResult<ImportStats> {
        let file = File::open(archive).map_err(|e| ImportError::OpenArchive {
            path: archive.to_path_buf(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(
            "Importing {} into {}",
            archive.display(),
            destination_root.display()
        );
        self.import_archive(BufReader::new(file), destination_root)
    }

    /// Import a non-seekable archive stream into `destination_root`.
    ///
    /// The stream is spooled to an anonymous temporary file first, since
    /// entries written with data descriptors can only be sized from the
    /// central directory.
    pub fn import_stream<R: Read>(
        &self,
        mut reader: R,
        destination_root: &Path,
    ) -> ImportResult<ImportStats> {
        let to_error = |e| ImportError::Spool {
            source: e,
            location: ErrorLocation::from(Location::caller()),
        };

        let mut spool = tempfile::tempfile().map_err(to_error)?;
        let spooled = std::io::copy(&mut reader, &mut spool).map_err(to_error)?;
        spool.seek(SeekFrom::Start(0)).map_err(to_error)?;
        debug!("Spooled {spooled} archive bytes");

        self.import_archive(BufReader::new(spool), destination_root)
    }

    /// Copy entries from `reader` into `destination_root`, in archive order.
    ///
    /// Malformed archives and unreadable entry data abort the import. Files
    /// written before the failure stay in place.
    pub fn import_archive<R: Read + Seek>(
        &self,
        reader: R,
        destination_root: &Path,
    ) -> ImportResult<ImportStats> {
        let root = Self::prepare_root(destination_root)?;
        let mut archive = ZipArchive::new(reader).map_err(|e| ImportError::Archive {
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;
        let mut stats = ImportStats::default();
        let mut buffer = vec![0u8; self.buffer_size];

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| ImportError::Archive {
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;

            let name = entry.name().to_string();

            let Some(relative) = self.accept(&name, entry.enclosed_name()) else {
                warn!("Skipping archive entry {name}: outside {}", self.content_prefix);
                stats.rejected.push(name);
                continue;
            };

            let target = root.join(&relative);
            if !is_contained(&root, &target) {
                warn!("Skipping archive entry {name}: resolves outside the destination");
                stats.rejected.push(name);
                continue;
            }

            if entry.is_dir() {
                self.create_directory(&target, name, &mut stats);
            } else {
                self.write_file(&mut entry, &target, name, &mut buffer, &mut stats)?;
            }
        }

        info!(
            "Import finished: {} files ({} bytes), {} directories, {} rejected, {} failed",
            stats.files_written,
            stats.bytes_written,
            stats.directories_created,
            stats.rejected.len(),
            stats.failed.len()
        );

        Ok(stats)
    }

    fn prepare_root(destination_root: &Path) -> ImportResult<PathBuf> {
        let to_error = |e| ImportError::DestinationRoot {
            path: destination_root.to_path_buf(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        };

        std::fs::create_dir_all(destination_root).map_err(to_error)?;
        destination_root.canonicalize().map_err(to_error)
    }

    /// Relative target path of an acceptable entry.
    fn accept(&self, name: &str, enclosed: Option<PathBuf>) -> Option<PathBuf> {
        if !name.starts_with(&self.content_prefix) {
            return None;
        }

        enclosed.filter(|path| {
            path.starts_with(&self.content_prefix)
                && path.components().all(|component| {
                    matches!(component, Component::Normal(_) | Component::CurDir)
                })
        })
    }

    fn create_directory(&self, target: &Path, name: String, stats: &mut ImportStats) {
        match create_dirs(target) {
            Ok(created) => {
                stats.directories_created += created;
                debug!("Created directory {}", target.display());
            }
            Err(e) => {
                warn!("Failed to create directory {}: {e}", target.display());
                stats.failed.push(name);
            }
        }
    }

    fn write_file<R: Read>(
        &self,
        entry: &mut R,
        target: &Path,
        name: String,
        buffer: &mut [u8],
        stats: &mut ImportStats,
    ) -> ImportResult<()> {
        let Some(parent) = target.parent() else {
            stats.rejected.push(name);
            return Ok(());
        };

        match create_dirs(parent) {
            Ok(created) => stats.directories_created += created,
            Err(e) => {
                warn!("Failed to create directory {}: {e}", parent.display());
                stats.failed.push(name);
                return Ok(());
            }
        }

        if std::fs::symlink_metadata(target).is_ok_and(|meta| meta.file_type().is_symlink()) {
            warn!("Skipping archive entry {name}: target is a symlink");
            stats.rejected.push(name);
            return Ok(());
        }

        let is_manifest = name == self.manifest_path;
        let opened = if is_manifest {
            self.create_manifest(parent)
        } else {
            File::create(target).map(|file| (file, target.to_path_buf()))
        };

        let (mut file, path) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                warn!("Failed to create {}: {e}", target.display());
                stats.failed.push(name);
                return Ok(());
            }
        };

        match copy_entry(entry, &mut file, buffer) {
            Ok(bytes) => {
                debug!("Wrote {} ({bytes} bytes)", path.display());
                stats.files_written += 1;
                stats.bytes_written += bytes;
                if is_manifest {
                    info!("Imported manifest as {}", path.display());
                    stats.manifests.push(path);
                }
                Ok(())
            }
            Err(CopyFailure::Write(e)) => {
                warn!("Failed to write {}: {e}", path.display());
                drop(file);
                remove_partial(&path);
                stats.failed.push(name);
                Ok(())
            }
            Err(CopyFailure::Read(e)) => {
                drop(file);
                remove_partial(&path);
                Err(ImportError::ArchiveRead {
                    entry: name,
                    source: e,
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Create `<stem>.<secs>[-N].<ext>` next to where the manifest would go.
    ///
    /// `create_new` guarantees an existing manifest is never replaced.
    fn create_manifest(&self, dir: &Path) -> std::io::Result<(File, PathBuf)> {
        let secs = self.clock.unix_seconds();
        let extension = self
            .manifest_extension
            .as_deref()
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        let mut attempt = 0u32;
        loop {
            let file_name = if attempt == 0 {
                format!("{}.{secs}{extension}", self.manifest_stem)
            } else {
                format!("{}.{secs}-{attempt}{extension}", self.manifest_stem)
            };
            let path = dir.join(file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((file, path)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

fn copy_entry<R: Read>(
    entry: &mut R,
    file: &mut File,
    buffer: &mut [u8],
) -> Result<u64, CopyFailure> {
    let mut total = 0u64;

    loop {
        let read = match entry.read(buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyFailure::Read(e)),
        };

        file.write_all(&buffer[..read])
            .map_err(CopyFailure::Write)?;
        total += read as u64;
    }

    file.flush().map_err(CopyFailure::Write)?;
    Ok(total)
}

/// `create_dir_all` that reports how many directories did not exist before.
fn create_dirs(path: &Path) -> std::io::Result<usize> {
    let missing = path.ancestors().take_while(|dir| !dir.exists()).count();
    std::fs::create_dir_all(path)?;
    Ok(missing)
}

fn remove_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != ErrorKind::NotFound
    {
        warn!("Failed to remove partial file {}: {e}", path.display());
    }
}

/// Whether `path` stays under the canonical `root` once the deepest existing
/// ancestor is resolved.
fn is_contained(root: &Path, path: &Path) -> bool {
    let mut probe = Some(path);

    while let Some(current) = probe {
        if std::fs::symlink_metadata(current).is_ok() {
            return current
                .canonicalize()
                .is_ok_and(|resolved| resolved.starts_with(root));
        }
        probe = current.parent();
    }

    false
}
