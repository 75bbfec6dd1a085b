use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::coordinator::Coordinator;
use super::errors::EngineError;
use super::types::{BandHeights, EngineCommand, EngineNotice, EngineOptions};
use crate::scan::CapabilityStatus;
use crate::window::{DisplayId, LocalId, ScanSnapshot, WindowService};

/// The presentation layer's view of a running engine.
///
/// Commands are fire-and-forget; their effects show up in later snapshots.
/// Dropping the handle stops the engine.
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
    snapshot: watch::Receiver<Arc<ScanSnapshot>>,
    status: watch::Receiver<CapabilityStatus>,
    notices: broadcast::Sender<EngineNotice>,
    band_heights: BandHeights,
    allow_terminate_on_close: bool,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Spawn the coordinator on the current tokio runtime.
    pub fn start(service: Arc<dyn WindowService>, options: EngineOptions) -> Self {
        let shutdown = CancellationToken::new();
        let (coordinator, channels) = Coordinator::new(service, &options, shutdown.clone());
        let task = tokio::spawn(coordinator.run());

        info!(
            event = "core.engine.start_completed",
            edge_guard = options.edge_guard,
            excluded_apps = options.excluded_apps.len()
        );

        Self {
            commands: channels.commands,
            snapshot: channels.snapshot,
            status: channels.status,
            notices: channels.notices,
            band_heights: options.band_heights,
            allow_terminate_on_close: options.allow_terminate_on_close,
            shutdown,
            task: Some(task),
        }
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<ScanSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// A receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ScanSnapshot>> {
        self.snapshot.clone()
    }

    pub fn status(&self) -> CapabilityStatus {
        self.status.borrow().clone()
    }

    pub fn status_receiver(&self) -> watch::Receiver<CapabilityStatus> {
        self.status.clone()
    }

    pub fn notices(&self) -> broadcast::Receiver<EngineNotice> {
        self.notices.subscribe()
    }

    /// Height of the band kept clear at the bottom of `display_id`.
    pub fn reserved_band_height(&self, display_id: DisplayId) -> f64 {
        self.band_heights.height_for(display_id)
    }

    pub fn toggle(&self, local_id: LocalId) -> Result<(), EngineError> {
        self.send(EngineCommand::Toggle(local_id))
    }

    pub fn request_focus(&self, local_id: LocalId) -> Result<(), EngineError> {
        self.send(EngineCommand::Focus(local_id))
    }

    /// Close with the configured termination policy.
    pub fn request_close(&self, local_id: LocalId) -> Result<(), EngineError> {
        self.request_close_with(local_id, self.allow_terminate_on_close)
    }

    pub fn request_close_with(
        &self,
        local_id: LocalId,
        allow_terminate: bool,
    ) -> Result<(), EngineError> {
        self.send(EngineCommand::Close {
            local_id,
            allow_terminate,
        })
    }

    /// Display layout changed; reconciliation restarts from scratch.
    pub fn displays_changed(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::DisplaysChanged)
    }

    fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .map_err(|_| EngineError::Stopped)
    }

    /// Stop the coordinator and wait for it to unsubscribe everything.
    pub async fn stop(mut self) -> Result<(), EngineError> {
        self.shutdown.cancel();
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        task.await.map_err(|e| {
            error!(event = "core.engine.stop_failed", error = %e);
            EngineError::TaskFailed {
                message: e.to_string(),
            }
        })?;
        info!(event = "core.engine.stop_completed");
        Ok(())
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
