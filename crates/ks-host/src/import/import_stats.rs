use std::path::PathBuf;

use serde::Serialize;

/// Outcome of one archive import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Regular files written, manifests included
    pub files_written: usize,
    /// Directories that did not exist before, explicit entries and parents alike
    pub directories_created: usize,
    pub bytes_written: u64,
    /// Where each imported manifest was written
    pub manifests: Vec<PathBuf>,
    /// Entries refused by the path rules
    pub rejected: Vec<String>,
    /// Entries that could not be written
    pub failed: Vec<String>,
}

impl ImportStats {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.failed.is_empty()
    }
}
