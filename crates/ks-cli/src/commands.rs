use crate::config_commands::ConfigCommands;

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Start the server, print its connection data and keep it running
    Run {
        /// Tag echoed back by the control channel
        #[arg(long, default_value_t = 1)]
        tag: i32,

        /// Seconds to wait for the server data
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Merge a zip archive into the content directory
    Import {
        /// Path of the zip archive
        archive: PathBuf,

        /// Destination root (defaults to the data directory)
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Prepare the data directory without starting the server
    Init,

    /// Serve the content directory (used as the sidecar process)
    Serve,

    /// Configuration file operations
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

impl Commands {
    /// Commands that touch the data directory or the server log to file.
    pub(crate) fn uses_host(&self) -> bool {
        !matches!(self, Commands::Config { .. })
    }
}
