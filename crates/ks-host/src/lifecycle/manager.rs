//! Per-process owner of the embedded server.

use crate::error::HostResult;
use crate::init::{InitGate, InitOutcome};
use crate::server::{ServerData, ServerFactory, ServerProcessHandle};

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{error, info};

/// Owns at most one running server.
///
/// `activate` and `deactivate` are serialized; concurrent activations
/// share one server. Deactivation drops the handle, so the next activation
/// starts a fresh server.
pub struct ServerLifecycleManager {
    gate: Arc<InitGate>,
    factory: Arc<dyn ServerFactory>,
    handle: Mutex<Option<ServerProcessHandle>>,
    data_tx: watch::Sender<Option<ServerData>>,
}

impl ServerLifecycleManager {
    pub fn new(gate: Arc<InitGate>, factory: Arc<dyn ServerFactory>) -> Self {
        let (data_tx, _) = watch::channel(None);

        Self {
            gate,
            factory,
            handle: Mutex::new(None),
            data_tx,
        }
    }

    /// Run the init gate on the blocking pool.
    pub async fn initialize(&self) -> HostResult<InitOutcome> {
        let gate = self.gate.clone();
        let outcome = tokio::task::spawn_blocking(move || gate.run_once()).await??;
        Ok(outcome)
    }

    /// Make sure the server is initialized and running, and return its data.
    pub async fn activate(&self) -> HostResult<ServerData> {
        let mut guard = self.handle.lock().await;

        if let Some(data) = guard.as_ref().and_then(|handle| handle.server_data()) {
            return Ok(data.clone());
        }

        let outcome = self.initialize().await.inspect_err(|e| {
            error!("Data directory initialization failed: {e}");
        })?;
        info!("Init gate: {outcome:?}");

        let mut handle = ServerProcessHandle::new(self.factory.create());
        let data = handle.start().await.inspect_err(|e| {
            error!(transient = e.is_transient(), "Server failed to start: {e}");
        })?;

        *guard = Some(handle);
        self.data_tx.send_replace(Some(data.clone()));

        Ok(data)
    }

    /// Stop the server if it is running. The cached data is cleared first.
    pub async fn deactivate(&self) -> HostResult<()> {
        let mut guard = self.handle.lock().await;

        let Some(mut handle) = guard.take() else {
            return Ok(());
        };

        self.data_tx.send_replace(None);
        handle.stop().await?;

        Ok(())
    }

    /// Cached connection data. Never blocks.
    pub fn server_data(&self) -> Option<ServerData> {
        self.data_tx.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.data_tx.borrow().is_some()
    }

    /// Subscribe to connection data changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<ServerData>> {
        self.data_tx.subscribe()
    }

    pub fn gate(&self) -> &InitGate {
        &self.gate
    }
}
