use crate::control::{ControlError, ReplyTo};
use crate::server::ServerData;

use std::panic::Location;

use error_location::ErrorLocation;

/// Opcode asking for the server's URL and app key.
pub const GET_SERVER_DATA: i32 = 1;

/// Raw message as sent over the control channel.
#[derive(Debug)]
pub struct Envelope {
    pub opcode: i32,
    pub reply_to: Option<ReplyTo>,
    pub tag: Option<i32>,
}

impl Envelope {
    pub fn get_server_data(reply_to: ReplyTo, tag: i32) -> Self {
        Self {
            opcode: GET_SERVER_DATA,
            reply_to: Some(reply_to),
            tag: Some(tag),
        }
    }
}

/// Decoded control request.
#[derive(Debug)]
pub enum ControlMessage {
    GetServerData { reply_to: ReplyTo, tag: i32 },
}

impl TryFrom<Envelope> for ControlMessage {
    type Error = ControlError;

    #[track_caller]
    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        match envelope.opcode {
            GET_SERVER_DATA => {
                let reply_to = envelope.reply_to.ok_or(ControlError::MissingReplyTo {
                    opcode: envelope.opcode,
                    location: ErrorLocation::from(Location::caller()),
                })?;

                Ok(ControlMessage::GetServerData {
                    reply_to,
                    tag: envelope.tag.unwrap_or_default(),
                })
            }
            opcode => Err(ControlError::UnknownOpcode {
                opcode,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

/// Reply delivered to a caller's `ReplyTo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlReply {
    /// `data` is `None` while the server is not running
    ServerData { tag: i32, data: Option<ServerData> },
}

impl ControlReply {
    pub fn tag(&self) -> i32 {
        match self {
            Self::ServerData { tag, .. } => *tag,
        }
    }
}
