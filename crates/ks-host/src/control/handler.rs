use crate::control::{
    CONTROL_QUEUE_CAPACITY, ControlChannel, ControlMessage, ControlReply, Envelope,
};
use crate::lifecycle::ServerLifecycleManager;
use crate::server::ServerData;
use crate::shutdown::{ShutdownCoordinator, ShutdownGuard};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Where the handler reads connection data from.
pub trait ServerDataSource: Send + Sync {
    fn server_data(&self) -> Option<ServerData>;
}

impl ServerDataSource for ServerLifecycleManager {
    fn server_data(&self) -> Option<ServerData> {
        ServerLifecycleManager::server_data(self)
    }
}

/// Single task answering control requests, one at a time.
///
/// The handler only reads cached data; it never activates the server.
pub struct ControlHandler {
    rx: mpsc::Receiver<Envelope>,
    source: Arc<dyn ServerDataSource>,
    shutdown: ShutdownGuard,
}

impl ControlHandler {
    pub fn new(
        source: Arc<dyn ServerDataSource>,
        shutdown: &ShutdownCoordinator,
    ) -> (Self, ControlChannel) {
        let (tx, rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);

        let handler = Self {
            rx,
            source,
            shutdown: shutdown.subscribe_guard(),
        };

        (handler, ControlChannel::new(tx))
    }

    /// Spawn the handler on the current runtime.
    pub fn spawn(
        source: Arc<dyn ServerDataSource>,
        shutdown: &ShutdownCoordinator,
    ) -> (ControlChannel, JoinHandle<()>) {
        let (handler, channel) = Self::new(source, shutdown);
        (channel, tokio::spawn(handler.run()))
    }

    /// Process messages until shutdown or until every sender is gone.
    pub async fn run(self) {
        let Self {
            mut rx,
            source,
            mut shutdown,
        } = self;

        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    info!("Control handler shutting down");
                    break;
                }
                envelope = rx.recv() => match envelope {
                    Some(envelope) => handle_envelope(source.as_ref(), envelope),
                    None => {
                        debug!("All control channels dropped, handler exiting");
                        break;
                    }
                },
            }
        }
    }
}

fn handle_envelope(source: &dyn ServerDataSource, envelope: Envelope) {
    let message = match ControlMessage::try_from(envelope) {
        Ok(message) => message,
        Err(e) => {
            warn!("Dropping control message: {e}");
            return;
        }
    };

    match message {
        ControlMessage::GetServerData { reply_to, tag } => {
            let data = source.server_data();
            debug!(tag, available = data.is_some(), "Replying with server data");

            if let Err(e) = reply_to.send(ControlReply::ServerData { tag, data }) {
                warn!("{e}");
            }
        }
    }
}
