use crate::server::{EmbeddedServer, ServerData, ServerError, ServerResult, ServerState};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::sync::watch;
use tracing::{info, warn};

/// Ownership wrapper around one embedded server.
///
/// URL and app key are cached together when the server is running and
/// cleared together when it stops.
pub struct ServerProcessHandle {
    server: Box<dyn EmbeddedServer>,
    data: Option<ServerData>,
    state_tx: watch::Sender<ServerState>,
    state_rx: watch::Receiver<ServerState>,
}

impl ServerProcessHandle {
    pub fn new(server: Box<dyn EmbeddedServer>) -> Self {
        let (state_tx, state_rx) = watch::channel(ServerState::Stopped);

        Self {
            server,
            data: None,
            state_tx,
            state_rx,
        }
    }

    /// Start the server and wait until it reports ready.
    ///
    /// Fails fast with `AlreadyStarted` unless the handle is stopped.
    pub async fn start(&mut self) -> ServerResult<ServerData> {
        if *self.state_rx.borrow() != ServerState::Stopped {
            return Err(ServerError::AlreadyStarted {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.set_state(ServerState::Starting);

        if let Err(e) = self.server.start().await {
            self.set_state(ServerState::Stopped);
            return Err(e);
        }

        let data = match (self.server.url(), self.server.app_key()) {
            (Some(server_url), Some(app_key)) if !server_url.is_empty() && !app_key.is_empty() => {
                ServerData {
                    server_url,
                    app_key,
                }
            }
            _ => {
                if let Err(e) = self.server.stop().await {
                    warn!("Failed to stop incompletely started server: {e}");
                }
                self.set_state(ServerState::Stopped);
                return Err(ServerError::StartupFailed {
                    message: String::from("server reported ready without a URL or app key"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        info!("Server running at {}", data.server_url);

        self.data = Some(data.clone());
        self.set_state(ServerState::Running {
            server_url: data.server_url.clone(),
        });

        Ok(data)
    }

    /// Stop the server and wait for teardown. No-op when already stopped.
    pub async fn stop(&mut self) -> ServerResult<()> {
        if *self.state_rx.borrow() == ServerState::Stopped {
            return Ok(());
        }

        let result = self.server.stop().await;

        self.data = None;
        self.set_state(ServerState::Stopped);

        match &result {
            Ok(()) => info!("Server stopped"),
            Err(e) => warn!("Server stopped with error: {e}"),
        }

        result
    }

    pub fn server_data(&self) -> Option<&ServerData> {
        self.data.as_ref()
    }

    pub fn url(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.server_url.as_str())
    }

    pub fn app_key(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.app_key.as_str())
    }

    pub fn state(&self) -> ServerState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state_rx.clone()
    }

    fn set_state(&self, state: ServerState) {
        let _ = self.state_tx.send(state);
    }
}
