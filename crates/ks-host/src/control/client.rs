use crate::control::{
    BrowserSession, ControlChannel, ControlError, ControlReply, ControlResult, ReplyTo,
    SessionUpdate,
};
use crate::server::ServerData;

use std::panic::Location;
use std::time::Duration;

use error_location::ErrorLocation;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Foreground caller's view of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unbound,
    /// Request sent, waiting for the reply with `tag`
    Pending { tag: i32 },
    Ready(ServerData),
}

/// Foreground side of the control protocol.
///
/// Sends one `GetServerData` per binding and applies the matching reply
/// to its [`BrowserSession`], handing the result to `on_ready`. Every
/// binding gets its own reply destination; `bind` and `unbind` close the
/// previous one, so replies meant for an earlier binding never land.
pub struct ControlClient<F>
where
    F: FnMut(&SessionUpdate),
{
    state: ConnectionState,
    session: BrowserSession,
    reply_to: ReplyTo,
    replies: mpsc::UnboundedReceiver<ControlReply>,
    on_ready: F,
}

impl<F> ControlClient<F>
where
    F: FnMut(&SessionUpdate),
{
    pub fn new(on_ready: F) -> Self {
        let (reply_to, replies) = ReplyTo::channel();

        Self {
            state: ConnectionState::Unbound,
            session: BrowserSession::new(),
            reply_to,
            replies,
            on_ready,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn session(&self) -> &BrowserSession {
        &self.session
    }

    /// Reply destination of the current binding, for sending requests by hand.
    pub fn reply_to(&self) -> ReplyTo {
        self.reply_to.clone()
    }

    /// Request server data over `channel`, tagged with `tag`.
    pub async fn bind(&mut self, channel: &ControlChannel, tag: i32) -> ControlResult<()> {
        self.reset_destination();
        channel
            .request_server_data(self.reply_to.clone(), tag)
            .await?;

        debug!("Bound, waiting for reply {tag}");
        self.state = ConnectionState::Pending { tag };
        Ok(())
    }

    /// Detach. `current_url` is the page being shown, remembered for the
    /// next binding.
    pub fn unbind(&mut self, current_url: Option<&str>) {
        if let Some(url) = current_url {
            self.session.remember(url);
        }

        self.reset_destination();
        self.state = ConnectionState::Unbound;
        debug!("Unbound");
    }

    /// Drop the current reply receiver so late replies fail delivery.
    fn reset_destination(&mut self) {
        let (reply_to, replies) = ReplyTo::channel();
        self.reply_to = reply_to;
        self.replies = replies;
    }

    /// Apply one reply. Returns whether it moved the client to `Ready`.
    pub fn handle_reply(&mut self, reply: ControlReply) -> bool {
        let ControlReply::ServerData { tag, data } = reply;

        let expected = match &self.state {
            ConnectionState::Pending { tag } => *tag,
            ConnectionState::Unbound => {
                debug!("Discarding reply {tag} received while unbound");
                return false;
            }
            ConnectionState::Ready(_) => {
                debug!("Discarding reply {tag}, already connected");
                return false;
            }
        };

        if tag != expected {
            warn!("Ignoring reply with tag {tag}, expected {expected}");
            return false;
        }

        let Some(data) = data else {
            warn!("Server data not available yet for reply {tag}");
            return false;
        };

        match self.session.update_for(&data) {
            Ok(update) => {
                info!("Connecting to {}", update.navigate_to);
                (self.on_ready)(&update);
                self.state = ConnectionState::Ready(data);
                true
            }
            Err(e) => {
                warn!("Ignoring reply {tag}: {e}");
                false
            }
        }
    }

    /// Apply every reply already queued.
    pub fn drain_replies(&mut self) {
        while let Ok(reply) = self.replies.try_recv() {
            self.handle_reply(reply);
        }
    }

    /// Process replies until `Ready` or until `timeout` elapses.
    pub async fn wait_ready(&mut self, timeout: Duration) -> ControlResult<ServerData> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let ConnectionState::Ready(data) = &self.state {
                return Ok(data.clone());
            }

            let reply = match tokio::time::timeout_at(deadline, self.replies.recv()).await {
                Ok(Some(reply)) => reply,
                Ok(None) => return Err(ControlError::channel_closed()),
                Err(_) => {
                    return Err(ControlError::ReplyTimeout {
                        timeout_ms: timeout.as_millis() as u64,
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            };

            self.handle_reply(reply);
        }
    }
}
