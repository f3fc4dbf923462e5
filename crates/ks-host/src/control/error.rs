use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Message with opcode {opcode} has no reply destination {location}")]
    MissingReplyTo { opcode: i32, location: ErrorLocation },

    #[error("Unknown opcode {opcode} {location}")]
    UnknownOpcode { opcode: i32, location: ErrorLocation },

    #[error("Reply with tag {tag} could not be delivered: destination dropped {location}")]
    Delivery { tag: i32, location: ErrorLocation },

    #[error("Control channel is closed {location}")]
    ChannelClosed { location: ErrorLocation },

    #[error("No reply within {timeout_ms}ms {location}")]
    ReplyTimeout {
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("Server URL '{url}' is invalid: {message} {location}")]
    InvalidServerUrl {
        url: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Server reported an empty app key {location}")]
    EmptyAppKey { location: ErrorLocation },
}

impl ControlError {
    #[track_caller]
    pub fn channel_closed() -> Self {
        Self::ChannelClosed {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Protocol errors are dropped by the handler; nothing is replied.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::MissingReplyTo { .. } | Self::UnknownOpcode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;
