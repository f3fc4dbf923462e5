use crate::control::{ControlError, ControlResult, Envelope, ReplyTo};

use tokio::sync::mpsc;

/// Capacity of the handler's request queue.
pub const CONTROL_QUEUE_CAPACITY: usize = 32;

/// Sending side of the control handler's queue.
#[derive(Debug, Clone)]
pub struct ControlChannel {
    tx: mpsc::Sender<Envelope>,
}

impl ControlChannel {
    pub(crate) fn new(tx: mpsc::Sender<Envelope>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, envelope: Envelope) -> ControlResult<()> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| ControlError::channel_closed())
    }

    /// Ask for server data; the reply arrives on `reply_to` with `tag`.
    pub async fn request_server_data(&self, reply_to: ReplyTo, tag: i32) -> ControlResult<()> {
        self.send(Envelope::get_server_data(reply_to, tag)).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
