mod embedded_server;
mod environment;
mod error;
mod handle;
mod loopback;
mod port;
mod readiness;
mod server_data;
mod server_state;
mod sidecar;

pub use embedded_server::{EmbeddedServer, ServerFactory, factory_from_config};
pub use environment::ServerEnvironment;
pub use error::{Result as ServerResult, ServerError};
pub use handle::ServerProcessHandle;
pub use loopback::{LoopbackServer, build_router, mint_app_key};
pub use port::PortManager;
pub use readiness::{ReadinessProbe, ReadinessStatus, ReadyResponse};
pub use server_data::ServerData;
pub use server_state::ServerState;
pub use sidecar::SidecarServer;

/// Cookie carrying the app key on every content request.
pub const APP_KEY_COOKIE: &str = "app_key_cookie";

/// Environment variables read by `keyshell serve`.
pub const SERVE_HOST_ENV: &str = "KS_SERVE_HOST";
pub const SERVE_PORT_ENV: &str = "KS_SERVE_PORT";
pub const APP_KEY_ENV: &str = "KS_APP_KEY";
pub const HOME_ENV: &str = "KS_HOME";
