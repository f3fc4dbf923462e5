//! Process-wide wiring of config, lifecycle, control handler and importer.

use crate::control::{ControlChannel, ControlHandler};
use crate::error::HostResult;
use crate::import::{ContentImporter, ImportStats};
use crate::init::{HomeInitializer, InitGate, InitOutcome};
use crate::lifecycle::ServerLifecycleManager;
use crate::server::{ServerData, ServerFactory, factory_from_config};
use crate::shutdown::ShutdownCoordinator;

use ks_config::Config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Everything a foreground caller needs to reach the embedded server.
///
/// The server runs while at least one binding is held. Construct inside a
/// tokio runtime; the control handler is spawned immediately.
pub struct HostContext {
    config: Config,
    config_dir: PathBuf,
    lifecycle: Arc<ServerLifecycleManager>,
    channel: ControlChannel,
    handler_task: Mutex<Option<JoinHandle<()>>>,
    bindings: Mutex<usize>,
    shutdown: ShutdownCoordinator,
    importer: Arc<ContentImporter>,
}

impl HostContext {
    pub fn new(config: Config, config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let factory = factory_from_config(&config, &config_dir);
        Self::with_server_factory(config, config_dir, factory)
    }

    pub fn with_server_factory(
        config: Config,
        config_dir: impl Into<PathBuf>,
        factory: Arc<dyn ServerFactory>,
    ) -> Self {
        let config_dir = config_dir.into();
        let home = config.home_dir(&config_dir);

        let initializer = HomeInitializer::new(
            home.clone(),
            config.import.content_dir_name(),
            config.home.run_mode.clone(),
        );
        let gate = Arc::new(InitGate::new(home, Arc::new(initializer)));
        let lifecycle = Arc::new(ServerLifecycleManager::new(gate, factory));

        let shutdown = ShutdownCoordinator::new();
        let (channel, handler_task) = ControlHandler::spawn(lifecycle.clone(), &shutdown);

        let importer = Arc::new(ContentImporter::new(&config.import));

        Self {
            config,
            config_dir,
            lifecycle,
            channel,
            handler_task: Mutex::new(Some(handler_task)),
            bindings: Mutex::new(0),
            shutdown,
            importer,
        }
    }

    /// Register a caller. The first binding activates the server.
    ///
    /// A failed activation leaves the count unchanged.
    pub async fn bind(&self) -> HostResult<ControlChannel> {
        let mut bindings = self.bindings.lock().await;

        if *bindings == 0 {
            info!("First binding, activating server");
            self.lifecycle.activate().await?;
        }

        *bindings += 1;
        debug!(bindings = *bindings, "Caller bound");

        Ok(self.channel.clone())
    }

    /// Release a binding. The last one deactivates the server.
    pub async fn unbind(&self) -> HostResult<()> {
        let mut bindings = self.bindings.lock().await;

        if *bindings == 0 {
            warn!("unbind called without a binding");
            return Ok(());
        }

        *bindings -= 1;
        debug!(bindings = *bindings, "Caller unbound");

        if *bindings == 0 {
            info!("Last binding released, deactivating server");
            self.lifecycle.deactivate().await?;
        }

        Ok(())
    }

    pub async fn binding_count(&self) -> usize {
        *self.bindings.lock().await
    }

    /// Run the init gate without starting the server.
    pub async fn initialize(&self) -> HostResult<InitOutcome> {
        self.lifecycle.initialize().await
    }

    /// Merge an archive into the data directory on the blocking pool.
    ///
    /// Entries are expected under the content prefix, so `destination`
    /// defaults to the data directory itself.
    pub async fn import_file(
        &self,
        archive: &Path,
        destination: Option<&Path>,
    ) -> HostResult<ImportStats> {
        let archive = archive.to_path_buf();
        let destination = destination
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.home_dir());
        let importer = self.importer.clone();

        let stats = tokio::task::spawn_blocking(move || {
            importer.import_file(&archive, &destination)
        })
        .await??;

        Ok(stats)
    }

    /// Stop the server and the control handler.
    pub async fn shutdown(&self) -> HostResult<()> {
        *self.bindings.lock().await = 0;
        self.shutdown.shutdown();

        let result = self.lifecycle.deactivate().await;

        if let Some(task) = self.handler_task.lock().await.take()
            && let Err(e) = task.await
        {
            warn!("Control handler task failed: {e}");
        }

        result
    }

    pub fn server_data(&self) -> Option<ServerData> {
        self.lifecycle.server_data()
    }

    pub fn channel(&self) -> &ControlChannel {
        &self.channel
    }

    pub fn lifecycle(&self) -> &ServerLifecycleManager {
        &self.lifecycle
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn home_dir(&self) -> PathBuf {
        self.config.home_dir(&self.config_dir)
    }

    pub fn content_dir(&self) -> PathBuf {
        self.config.content_dir(&self.config_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.config.log_dir(&self.config_dir)
    }
}
