//! Request/reply protocol between foreground callers and the server owner.

mod channel;
mod client;
mod error;
mod handler;
mod message;
mod reply_to;
mod session;

pub use channel::{CONTROL_QUEUE_CAPACITY, ControlChannel};
pub use client::{ConnectionState, ControlClient};
pub use error::{ControlError, Result as ControlResult};
pub use handler::{ControlHandler, ServerDataSource};
pub use message::{ControlMessage, ControlReply, Envelope, GET_SERVER_DATA};
pub use reply_to::ReplyTo;
pub use session::{BrowserSession, SessionUpdate};
