//! keyshell - host for an embedded local application server
//!
//! # Examples
//!
//! ```bash
//! # Start the server and print its URL, app key and navigation target
//! keyshell run --pretty
//!
//! # Merge a content archive into the data directory
//! keyshell import bundle.zip
//!
//! # Write the default configuration
//! keyshell config init
//! ```

mod cli;
mod commands;
mod config_commands;
mod serve;
mod signal;

#[cfg(test)]
mod tests;

use crate::{
    cli::Cli, commands::Commands, config_commands::ConfigCommands, serve::ServeSettings,
    signal::shutdown_signal,
};

use ks_config::Config;
use ks_host::control::{ControlClient, SessionUpdate};
use ks_host::logging::setup_logging;
use ks_host::server::{EmbeddedServer, LoopbackServer};
use ks_host::{HostContext, HostResult};

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use serde_json::{Value, json};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli.command, cli.pretty).await {
        Ok(Some(value)) => print_json(&value, cli.pretty),
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            eprintln!("{}", e.recovery_hint());
            ExitCode::FAILURE
        }
    }
}

fn print_json(value: &Value, pretty: bool) -> ExitCode {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };

    match output {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run `command`; `None` means the command already produced its output.
async fn execute(command: Commands, pretty: bool) -> HostResult<Option<Value>> {
    let config_dir = Config::config_dir()?;
    let config = Config::load_in(&config_dir)?;
    config.validate()?;

    if command.uses_host() {
        init_logging(&config, &config_dir);
        config.log_summary();
    }

    match command {
        Commands::Run { tag, timeout } => {
            let context = HostContext::new(config, config_dir);
            let result = run(&context, tag, Duration::from_secs(timeout), pretty).await;
            context.shutdown().await?;
            result.map(|()| None)
        }
        Commands::Import { archive, dest } => {
            let context = HostContext::new(config, config_dir);
            let result = context.import_file(&archive, dest.as_deref()).await;
            context.shutdown().await?;
            Ok(Some(json!(result?)))
        }
        Commands::Init => {
            let context = HostContext::new(config, config_dir);
            let result = context.initialize().await;
            let home = context.home_dir();
            context.shutdown().await?;
            Ok(Some(json!({ "outcome": result?, "home": home })))
        }
        Commands::Serve => serve(&config, &config_dir).await.map(|()| None),
        Commands::Config { action } => match action {
            ConfigCommands::Show => Ok(Some(json!(config))),
            ConfigCommands::Init => {
                let path = config.save_in(&config_dir)?;
                Ok(Some(json!({ "path": path })))
            }
        },
    }
}

fn init_logging(config: &Config, config_dir: &Path) {
    let log_dir = config.log_dir(config_dir);
    if let Err(e) = setup_logging(&log_dir, &config.logging) {
        eprintln!("Warning: {e}");
    }
}

/// Bind, print the session for the running server, then hold the binding
/// until a shutdown signal arrives.
async fn run(context: &HostContext, tag: i32, timeout: Duration, pretty: bool) -> HostResult<()> {
    let channel = context.bind().await?;

    let mut session: Option<SessionUpdate> = None;
    let data = {
        let mut client = ControlClient::new(|update: &SessionUpdate| {
            session = Some(update.clone());
        });
        client.bind(&channel, tag).await?;
        client.wait_ready(timeout).await?
    };

    print_json(
        &json!({ "serverData": data, "session": session, "tag": tag }),
        pretty,
    );

    shutdown_signal().await;
    context.unbind().await
}

async fn serve(config: &Config, config_dir: &Path) -> HostResult<()> {
    let settings = ServeSettings::from_env(config, config_dir)?;

    let mut server = LoopbackServer::new(&settings.server, settings.content_root);
    if let Some(app_key) = settings.app_key {
        server = server.with_app_key(app_key);
    }

    server.start().await?;
    info!("Serving at {}", server.url().unwrap_or_default());

    shutdown_signal().await;
    server.stop().await?;

    Ok(())
}
