use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::{mpsc, watch};

use crate::location::PositionState;
use crate::markers::{Marker, ViewportChange};
use crate::overpass::FetchState;
use crate::proximity::{CheckOutcome, NotifierStatus};

use super::PipelineCommand;
use super::state::SharedState;

/// Handle for driving the pipeline and reading its state
#[derive(Clone)]
pub struct PipelineHandle {
    pub cmd_tx: mpsc::Sender<PipelineCommand>,
    pub shared: Arc<SharedState>,
    pub position_rx: watch::Receiver<PositionState>,
    pub fetch_rx: watch::Receiver<FetchState>,
    pub status_rx: watch::Receiver<NotifierStatus>,
}

impl PipelineHandle {
    async fn send(&self, cmd: PipelineCommand) -> Result<(), String> {
        self.cmd_tx.send(cmd).await.map_err(|e| e.to_string())
    }

    /// Change the search radius; refetches and recenters the map
    pub async fn set_radius(&self, meters: u32) -> Result<(), String> {
        if meters == 0 {
            return Err("Radius must be greater than zero".to_string());
        }
        self.send(PipelineCommand::SetRadius(meters)).await
    }

    pub async fn set_filter(&self, query: impl Into<String>) -> Result<(), String> {
        self.send(PipelineCommand::SetFilter(query.into())).await
    }

    pub async fn retry_location(&self) -> Result<(), String> {
        self.send(PipelineCommand::RetryLocation).await
    }

    pub async fn shutdown(&self) -> Result<(), String> {
        self.send(PipelineCommand::Shutdown).await
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn radius(&self) -> u32 {
        self.shared.radius_m.load(Ordering::SeqCst)
    }

    pub fn position(&self) -> PositionState {
        self.position_rx.borrow().clone()
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch_rx.borrow().clone()
    }

    pub fn notifier_status(&self) -> NotifierStatus {
        self.status_rx.borrow().clone()
    }

    pub async fn filter(&self) -> String {
        self.shared.filter.read().await.clone()
    }

    pub async fn markers(&self) -> Vec<Marker> {
        self.shared.markers.read().await.clone()
    }

    pub async fn viewport(&self) -> Option<ViewportChange> {
        *self.shared.viewport.read().await
    }

    pub async fn last_check(&self) -> Option<CheckOutcome> {
        self.shared.last_check.read().await.clone()
    }
}
