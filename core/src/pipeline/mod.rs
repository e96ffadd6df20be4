//! Pipeline service
//!
//! Wires the position source, POI fetcher, marker layer and proximity
//! notifier together in one background task. Position and radius changes
//! drive the fetcher; new places refresh the markers; every change of
//! either feeds the notifier.

mod handle;
mod state;


pub use handle::PipelineHandle;
pub use state::SharedState;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use lugabiz_types::AppConfig;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::clock::SharedClock;
use crate::geo::GeoPosition;
use crate::location::{LocationProvider, PositionSource};
use crate::markers::{MarkerLayer, Viewport};
use crate::overpass::{PoiCache, PoiFetcher, PoiSource};
use crate::places::PointOfInterest;
use crate::proximity::{CheckOutcome, NotificationSink, ProximityNotifier};

/// Commands sent to the pipeline service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCommand {
    SetRadius(u32),
    SetFilter(String),
    RetryLocation,
    Shutdown,
}

/// Latest inputs for the notifier; a watch so bursts coalesce
#[derive(Debug, Clone, Default)]
struct CheckInputs {
    position: Option<GeoPosition>,
    places: Option<Arc<Vec<PointOfInterest>>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline Service
// ─────────────────────────────────────────────────────────────────────────────

pub struct PipelineService<P, S, N> {
    position: PositionSource<P>,
    fetcher: PoiFetcher<S>,
    notifier: Arc<ProximityNotifier<N>>,
    markers: MarkerLayer,
    viewport: Viewport,
    shared: Arc<SharedState>,
    cmd_rx: mpsc::Receiver<PipelineCommand>,
    check_tx: watch::Sender<CheckInputs>,
    check_handle: Option<JoinHandle<()>>,
}

impl<P, S, N> PipelineService<P, S, N>
where
    P: LocationProvider,
    S: PoiSource,
    N: NotificationSink,
{
    pub fn new(
        provider: Arc<P>,
        source: Arc<S>,
        sink: Arc<N>,
        cache: Arc<PoiCache>,
        clock: SharedClock,
        config: &AppConfig,
    ) -> (Self, PipelineHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (check_tx, _) = watch::channel(CheckInputs::default());

        let position = PositionSource::new(provider);
        let fetcher = PoiFetcher::new(source, cache, Arc::clone(&clock));
        let notifier = Arc::new(ProximityNotifier::new(
            sink,
            config.proximity,
            clock,
            config.notifications.remembered_permission,
        ));
        let shared = Arc::new(SharedState::new(config.default_radius_m.max(1)));

        let handle = PipelineHandle {
            cmd_tx,
            shared: Arc::clone(&shared),
            position_rx: position.subscribe(),
            fetch_rx: fetcher.subscribe(),
            status_rx: notifier.subscribe(),
        };

        let service = Self {
            position,
            fetcher,
            notifier,
            markers: MarkerLayer::new(),
            viewport: Viewport::new(),
            shared,
            cmd_rx,
            check_tx,
            check_handle: None,
        };

        (service, handle)
    }

    /// Run the service event loop
    pub async fn run(mut self) {
        self.shared.running.store(true, Ordering::SeqCst);
        self.start_checker();

        let mut position_rx = self.position.subscribe();
        let mut fetch_rx = self.fetcher.subscribe();

        self.position.start();
        self.on_inputs_changed().await;

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(PipelineCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },
                changed = position_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.on_inputs_changed().await;
                }
                changed = fetch_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.on_places_changed().await;
                }
            }
        }

        tracing::info!("Pipeline shutting down");
        self.position.stop();
        self.fetcher.cancel();
        if let Some(handle) = self.check_handle.take() {
            handle.abort();
        }
        self.shared.running.store(false, Ordering::SeqCst);
    }

    async fn handle_command(&mut self, cmd: PipelineCommand) {
        match cmd {
            PipelineCommand::SetRadius(meters) => {
                if meters == 0 {
                    tracing::warn!("Ignoring zero search radius");
                    return;
                }
                let previous = self.shared.radius_m.swap(meters, Ordering::SeqCst);
                tracing::info!(previous, radius_m = meters, "Search radius changed");
                self.on_inputs_changed().await;
            }
            PipelineCommand::SetFilter(query) => {
                self.markers.set_query(&query);
                *self.shared.filter.write().await = self.markers.query().to_string();
                self.publish_markers().await;
            }
            PipelineCommand::RetryLocation => {
                self.fetcher.invalidate();
                self.position.retry();
            }
            PipelineCommand::Shutdown => {}
        }
    }

    /// Position or radius changed
    async fn on_inputs_changed(&mut self) {
        let position = self.position.state().position;
        let radius_m = self.shared.radius_m.load(Ordering::SeqCst);

        let outcome = self.fetcher.request(position, radius_m);
        tracing::debug!(?outcome, "Fetch requested");

        if let Some(change) = self.viewport.update(position, radius_m) {
            tracing::debug!(center = %change.center, zoom = change.zoom, "Viewport moved");
            *self.shared.viewport.write().await = Some(change);
        }

        self.feed_checker(position);
    }

    async fn on_places_changed(&mut self) {
        let state = self.fetcher.state();
        self.markers.set_places(state.places());
        self.publish_markers().await;
        self.feed_checker(self.position.state().position);
    }

    async fn publish_markers(&self) {
        *self.shared.markers.write().await = self.markers.markers().to_vec();
    }

    fn feed_checker(&self, position: Option<GeoPosition>) {
        let places = self.fetcher.state().data;
        self.check_tx.send_replace(CheckInputs { position, places });
    }

    /// Evaluate proximity sequentially, always against the latest inputs
    fn start_checker(&mut self) {
        let notifier = Arc::clone(&self.notifier);
        let shared = Arc::clone(&self.shared);
        let mut inputs = self.check_tx.subscribe();

        self.check_handle = Some(tokio::spawn(async move {
            while inputs.changed().await.is_ok() {
                let CheckInputs { position, places } = inputs.borrow_and_update().clone();
                let places = places.as_deref().map(Vec::as_slice).unwrap_or(&[]);

                let outcome = notifier.check(position, places).await;
                if !matches!(outcome, CheckOutcome::Throttled | CheckOutcome::Busy) {
                    tracing::debug!(?outcome, "Proximity check");
                }
                *shared.last_check.write().await = Some(outcome);
            }
        }));
    }
}

impl<P, S, N> Drop for PipelineService<P, S, N> {
    fn drop(&mut self) {
        if let Some(handle) = self.check_handle.take() {
            handle.abort();
        }
    }
}
