//! Port allocation and availability checking.

use crate::server::{ServerError, ServerResult};

use std::net::TcpListener;
use std::panic::Location;

use error_location::ErrorLocation;

pub struct PortManager;

impl PortManager {
    /// Check if a port is available for binding.
    ///
    /// The socket is released as soon as the listener is dropped.
    pub fn is_available(host: &str, port: u16) -> bool {
        TcpListener::bind((host, port)).is_ok()
    }

    /// Ask the OS for a free port on `host`.
    pub fn ephemeral(host: &str) -> ServerResult<u16> {
        let listener = TcpListener::bind((host, 0)).map_err(|e| ServerError::Bind {
            addr: format!("{host}:0"),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;
        Ok(listener.local_addr()?.port())
    }

    /// Resolve the configured port: 0 picks a free one, anything else must
    /// be free.
    pub fn resolve(host: &str, port: u16) -> ServerResult<u16> {
        if port == 0 {
            return Self::ephemeral(host);
        }

        match TcpListener::bind((host, port)) {
            Ok(_) => Ok(port),
            Err(e) => Err(ServerError::Bind {
                addr: format!("{host}:{port}"),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
