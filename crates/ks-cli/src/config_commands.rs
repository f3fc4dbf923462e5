use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the effective configuration to config.toml
    Init,
}
