//! Embedded server hosted in a child process.

use crate::server::{
    APP_KEY_ENV, EmbeddedServer, PortManager, ReadinessProbe, ReadinessStatus, SERVE_HOST_ENV,
    SERVE_PORT_ENV, ServerEnvironment, ServerError, ServerResult, mint_app_key,
};

use ks_config::ServerConfig;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use error_location::ErrorLocation;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

struct RunningSidecar {
    child: Child,
    url: String,
    app_key: String,
}

/// Runs the server as a child process and talks to it over loopback HTTP.
///
/// The child receives its bind address, app key and the server environment
/// through env vars, and must serve the ready endpoint.
pub struct SidecarServer {
    binary: Option<PathBuf>,
    args: Vec<String>,
    host: String,
    port: u16,
    ready_path: String,
    startup_timeout: Duration,
    shutdown_timeout: Duration,
    environment: ServerEnvironment,
    running: Option<RunningSidecar>,
}

impl SidecarServer {
    pub fn new(config: &ServerConfig, environment: ServerEnvironment) -> Self {
        Self {
            binary: config.binary.as_ref().map(PathBuf::from),
            args: config.args.clone(),
            host: config.host.clone(),
            port: config.port,
            ready_path: config.ready_path.clone(),
            startup_timeout: config.startup_timeout(),
            shutdown_timeout: config.shutdown_timeout(),
            environment,
            running: None,
        }
    }

    /// Find the server binary.
    ///
    /// Search order:
    /// 1. Configured path, if it contains a directory component
    /// 2. Configured bare name, looked up on PATH
    /// 3. The current executable (`keyshell serve`)
    fn find_server_binary(&self) -> ServerResult<PathBuf> {
        let Some(binary) = &self.binary else {
            return std::env::current_exe().map_err(|_| ServerError::BinaryNotFound {
                path: PathBuf::from("<current executable>"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        if binary.components().count() > 1 || binary.is_absolute() {
            if binary.is_file() {
                return Ok(binary.clone());
            }
            return Err(ServerError::BinaryNotFound {
                path: binary.clone(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        std::env::var_os("PATH")
            .iter()
            .flat_map(std::env::split_paths)
            .map(|dir| dir.join(binary))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ServerError::BinaryNotFound {
                path: binary.clone(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn command(&self, binary: &Path, port: u16, app_key: &str) -> Command {
        let mut cmd = Command::new(binary);
        cmd.args(&self.args)
            .envs(self.environment.vars())
            .env(SERVE_HOST_ENV, &self.host)
            .env(SERVE_PORT_ENV, port.to_string())
            .env(APP_KEY_ENV, app_key)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    async fn wait_ready(&self, child: &mut Child, probe: &ReadinessProbe) -> ServerResult<()> {
        let start = Instant::now();

        loop {
            if let Some(status) = child.try_wait()? {
                return Err(ServerError::ProcessExited {
                    code: status.code(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            match probe.check().await {
                ReadinessStatus::Ready { version, .. } => {
                    info!("Sidecar ready at {} (version {version})", probe.url());
                    return Ok(());
                }
                ReadinessStatus::NotReady { last_error } => {
                    debug!("Sidecar not ready yet: {last_error}");
                }
            }

            if start.elapsed() >= self.startup_timeout {
                return Err(ServerError::StartupTimeout {
                    timeout_secs: self.startup_timeout.as_secs(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            tokio::time::sleep(probe.poll_interval()).await;
        }
    }
}

#[cfg(unix)]
fn request_termination(child: &mut Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        info!("Sending SIGTERM to pid {pid}");
        if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            warn!("Failed to send SIGTERM to pid {pid}: {e}");
        }
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!("Failed to terminate server process: {e}");
    }
}

#[async_trait]
impl EmbeddedServer for SidecarServer {
    async fn start(&mut self) -> ServerResult<()> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyStarted {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let binary = self.find_server_binary()?;
        let port = PortManager::resolve(&self.host, self.port)?;
        let app_key = mint_app_key();

        info!(
            "Spawning server {} {} on {}:{port}",
            binary.display(),
            self.args.join(" "),
            self.host
        );

        let mut child = self
            .command(&binary, port, &app_key)
            .spawn()
            .map_err(|e| ServerError::ProcessSpawn {
                binary: binary.clone(),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let url = format!("http://{}:{port}", self.host);
        let probe = ReadinessProbe::new(&url, &self.ready_path)?;

        if let Err(e) = self.wait_ready(&mut child, &probe).await {
            warn!("Sidecar failed to start: {e}");
            if let Err(kill_err) = child.kill().await {
                debug!("Failed to kill sidecar after startup failure: {kill_err}");
            }
            return Err(e);
        }

        self.running = Some(RunningSidecar {
            child,
            url,
            app_key,
        });

        Ok(())
    }

    async fn stop(&mut self) -> ServerResult<()> {
        let Some(mut running) = self.running.take() else {
            return Ok(());
        };

        request_termination(&mut running.child);

        match tokio::time::timeout(self.shutdown_timeout, running.child.wait()).await {
            Ok(Ok(status)) => {
                info!("Sidecar exited with {status}");
                Ok(())
            }
            Ok(Err(e)) => Err(ServerError::from(e)),
            Err(_) => {
                warn!(
                    "Sidecar did not exit within {}s, force killing",
                    self.shutdown_timeout.as_secs()
                );
                running.child.kill().await?;
                Err(ServerError::ShutdownTimeout {
                    timeout_secs: self.shutdown_timeout.as_secs(),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    fn url(&self) -> Option<String> {
        self.running.as_ref().map(|running| running.url.clone())
    }

    fn app_key(&self) -> Option<String> {
        self.running.as_ref().map(|running| running.app_key.clone())
    }
}
