use crate::server::{LoopbackServer, ServerEnvironment, ServerResult, SidecarServer};

use ks_config::{Config, ServerMode};

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

/// An embedded application server the host can start and stop.
///
/// `start` returns once the server reports ready. `url` and `app_key` are
/// `Some` only while the server is running.
#[async_trait]
pub trait EmbeddedServer: Send + Sync {
    async fn start(&mut self) -> ServerResult<()>;

    async fn stop(&mut self) -> ServerResult<()>;

    fn url(&self) -> Option<String>;

    fn app_key(&self) -> Option<String>;
}

/// Builds a fresh server for every lifecycle.
pub trait ServerFactory: Send + Sync {
    fn create(&self) -> Box<dyn EmbeddedServer>;
}

impl<F> ServerFactory for F
where
    F: Fn() -> Box<dyn EmbeddedServer> + Send + Sync,
{
    fn create(&self) -> Box<dyn EmbeddedServer> {
        self()
    }
}

/// Factory for the server implementation selected by `server.mode`.
pub fn factory_from_config(config: &Config, config_dir: &Path) -> Arc<dyn ServerFactory> {
    let server = config.server.clone();

    match server.mode {
        ServerMode::Loopback => {
            let content_root = config.content_dir(config_dir);
            Arc::new(move || -> Box<dyn EmbeddedServer> {
                Box::new(LoopbackServer::new(&server, content_root.clone()))
            })
        }
        ServerMode::Sidecar => {
            let environment = ServerEnvironment::from_config(config, config_dir);
            Arc::new(move || -> Box<dyn EmbeddedServer> {
                Box::new(SidecarServer::new(&server, environment.clone()))
            })
        }
    }
}
