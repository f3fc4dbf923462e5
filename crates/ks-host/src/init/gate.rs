use crate::init::{InitLock, InitResult, Initializer};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info};

/// What `run_once` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitOutcome {
    /// The initializer body ran
    Initialized,
    /// Another process already brought the layout up to date
    UpToDate,
    /// This process already initialized during its lifetime
    AlreadyInitialized,
}

/// Runs the data directory initializer exactly once per boot cycle.
///
/// The lock file is the single-execution guarantee across threads and
/// processes. The in-process flag is only read while the lock is held.
pub struct InitGate {
    data_dir: PathBuf,
    initializer: Arc<dyn Initializer>,
    initialized: AtomicBool,
}

impl InitGate {
    pub fn new(data_dir: impl Into<PathBuf>, initializer: Arc<dyn Initializer>) -> Self {
        Self {
            data_dir: data_dir.into(),
            initializer,
            initialized: AtomicBool::new(false),
        }
    }

    /// Blocking. Call from a blocking-capable thread.
    pub fn run_once(&self) -> InitResult<InitOutcome> {
        let _lock = InitLock::acquire(&self.data_dir)?;

        if self.initialized.load(Ordering::SeqCst) {
            debug!("Data directory already initialized by this process");
            return Ok(InitOutcome::AlreadyInitialized);
        }

        if self.initializer.is_current()? {
            self.initialized.store(true, Ordering::SeqCst);
            debug!("Data directory layout is current");
            return Ok(InitOutcome::UpToDate);
        }

        self.initializer.initialize()?;
        self.initialized.store(true, Ordering::SeqCst);

        info!("Initialized data directory {}", self.data_dir.display());
        Ok(InitOutcome::Initialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
