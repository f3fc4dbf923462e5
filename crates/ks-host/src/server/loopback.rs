//! In-process HTTP server bound to a loopback address.

use crate::server::{
    APP_KEY_COOKIE, EmbeddedServer, ReadinessProbe, ReadyResponse, ServerError, ServerResult,
};
use crate::shutdown::ShutdownCoordinator;

use ks_config::ServerConfig;

use std::net::SocketAddr;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use error_location::ErrorLocation;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{info, warn};
use uuid::Uuid;

const READY_STATUS: &str = "ok";

/// Mint a fresh app key: 32 lowercase hex characters.
pub fn mint_app_key() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Clone)]
struct LoopbackState {
    app_key: Arc<str>,
    ready_path: Arc<str>,
}

/// Build the router serving the ready endpoint and the content root.
///
/// Everything except the ready endpoint requires the app key cookie.
pub fn build_router(content_root: PathBuf, ready_path: &str, app_key: &str) -> Router {
    let state = LoopbackState {
        app_key: Arc::from(app_key),
        ready_path: Arc::from(ready_path),
    };

    Router::new()
        .route(ready_path, get(readiness))
        .fallback_service(ServeDir::new(content_root))
        .layer(middleware::from_fn_with_state(state, require_app_key))
}

async fn readiness() -> Json<ReadyResponse> {
    Json(ReadyResponse {
        status: String::from(READY_STATUS),
        version: String::from(env!("CARGO_PKG_VERSION")),
    })
}

async fn require_app_key(
    State(state): State<LoopbackState>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() == &*state.ready_path {
        return next.run(request).await;
    }

    let authorized = request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(name, value)| name == APP_KEY_COOKIE && value == &*state.app_key);

    if authorized {
        next.run(request).await
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

struct RunningServer {
    addr: SocketAddr,
    app_key: String,
    shutdown: ShutdownCoordinator,
    task: JoinHandle<std::io::Result<()>>,
}

/// Embedded server running on the host's tokio runtime.
pub struct LoopbackServer {
    host: String,
    port: u16,
    ready_path: String,
    content_root: PathBuf,
    startup_timeout: Duration,
    shutdown_timeout: Duration,
    preset_app_key: Option<String>,
    running: Option<RunningServer>,
}

impl LoopbackServer {
    pub fn new(config: &ServerConfig, content_root: PathBuf) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            ready_path: config.ready_path.clone(),
            content_root,
            startup_timeout: config.startup_timeout(),
            shutdown_timeout: config.shutdown_timeout(),
            preset_app_key: None,
            running: None,
        }
    }

    /// Use `app_key` instead of minting one on start.
    pub fn with_app_key(mut self, app_key: impl Into<String>) -> Self {
        self.preset_app_key = Some(app_key.into());
        self
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.addr)
    }
}

#[async_trait]
impl EmbeddedServer for LoopbackServer {
    async fn start(&mut self) -> ServerResult<()> {
        if self.running.is_some() {
            return Err(ServerError::AlreadyStarted {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let listener = TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|e| ServerError::Bind {
                addr: format!("{}:{}", self.host, self.port),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;
        let addr = listener.local_addr()?;

        let app_key = self.preset_app_key.clone().unwrap_or_else(mint_app_key);
        let router = build_router(self.content_root.clone(), &self.ready_path, &app_key);

        let shutdown = ShutdownCoordinator::new();
        let mut guard = shutdown.subscribe_guard();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { guard.wait().await })
                .await
        });

        let url = format!("http://{addr}");
        let probe = ReadinessProbe::new(&url, &self.ready_path)?;
        if let Err(e) = probe.wait_ready(self.startup_timeout).await {
            shutdown.shutdown();
            task.abort();
            return Err(e);
        }

        info!(
            "Loopback server listening on {addr}, serving {}",
            self.content_root.display()
        );

        self.running = Some(RunningServer {
            addr,
            app_key,
            shutdown,
            task,
        });

        Ok(())
    }

    async fn stop(&mut self) -> ServerResult<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        running.shutdown.shutdown();

        let mut task = running.task;
        match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
            Ok(Ok(Ok(()))) => {
                info!("Loopback server on {} stopped", running.addr);
                Ok(())
            }
            Ok(Ok(Err(e))) => Err(ServerError::from(e)),
            Ok(Err(e)) => {
                warn!("Loopback server task ended abnormally: {e}");
                Ok(())
            }
            Err(_) => {
                warn!("Loopback server did not stop in time, aborting");
                task.abort();
                Err(ServerError::ShutdownTimeout {
                    timeout_secs: self.shutdown_timeout.as_secs(),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    fn url(&self) -> Option<String> {
        self.running
            .as_ref()
            .map(|running| format!("http://{}", running.addr))
    }

    fn app_key(&self) -> Option<String> {
        self.running.as_ref().map(|running| running.app_key.clone())
    }
}
