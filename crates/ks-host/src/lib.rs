//! Host for an embedded local application server.
//!
//! The host owns the server lifecycle, guards first-run initialization of
//! the server's data directory, answers control requests from foreground
//! callers, and merges content archives into the managed content root.

pub mod context;
pub mod control;
pub mod error;
pub mod import;
pub mod init;
pub mod lifecycle;
pub mod logging;
pub mod server;
pub mod shutdown;

#[cfg(test)]
mod tests;

pub use context::HostContext;
pub use error::{HostError, HostResult};
pub use shutdown::{ShutdownCoordinator, ShutdownGuard};
