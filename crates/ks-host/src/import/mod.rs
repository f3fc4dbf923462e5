mod error;
mod import_stats;
mod importer;

pub use error::{ImportError, Result as ImportResult};
pub use import_stats::ImportStats;
pub use importer::{Clock, ContentImporter, SystemClock};
