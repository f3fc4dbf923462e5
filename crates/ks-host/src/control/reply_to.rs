use crate::control::{ControlError, ControlReply, ControlResult};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::sync::mpsc;

/// Reply destination carried inside a request.
#[derive(Debug, Clone)]
pub struct ReplyTo {
    tx: mpsc::UnboundedSender<ControlReply>,
}

impl ReplyTo {
    /// Create a destination and the receiver its replies arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ControlReply>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    #[track_caller]
    pub fn send(&self, reply: ControlReply) -> ControlResult<()> {
        let tag = reply.tag();
        self.tx.send(reply).map_err(|_| ControlError::Delivery {
            tag,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
