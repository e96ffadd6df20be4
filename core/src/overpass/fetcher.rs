//! POI fetcher
//!
//! Position watches fire on every bit of GPS jitter, and the Overpass API is
//! slow and rate limited. The fetcher turns that stream into at most one
//! request per rounded position + radius, serves recent results from the
//! cache, and aborts superseded requests so an out-of-order completion can
//! never bring back stale data.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::clock::SharedClock;
use crate::geo::GeoPosition;
use crate::places::{PointOfInterest, verified_only};

use super::cache::{PoiCache, cache_key};
use super::client::PoiSource;
use super::error::FetchError;

/// Observable fetcher output
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    /// Last good verified result set; kept across transient failures
    pub data: Option<Arc<Vec<PointOfInterest>>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl FetchState {
    pub fn places(&self) -> &[PointOfInterest] {
        self.data.as_deref().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// What a call to [`PoiFetcher::request`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    NoPosition,
    InvalidRadius,
    /// Same key as the data already held or in flight
    Unchanged,
    CacheHit { key: String },
    Requested { key: String },
}

pub struct PoiFetcher<S> {
    source: Arc<S>,
    cache: Arc<PoiCache>,
    clock: SharedClock,
    state_tx: Arc<watch::Sender<FetchState>>,
    current_key: Option<String>,
    generation: Arc<AtomicU64>,
    in_flight: Option<JoinHandle<()>>,
}

impl<S: PoiSource> PoiFetcher<S> {
    pub fn new(source: Arc<S>, cache: Arc<PoiCache>, clock: SharedClock) -> Self {
        let (state_tx, _) = watch::channel(FetchState::default());
        Self {
            source,
            cache,
            clock,
            state_tx: Arc::new(state_tx),
            current_key: None,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> FetchState {
        self.state_tx.borrow().clone()
    }

    pub fn current_key(&self) -> Option<&str> {
        self.current_key.as_deref()
    }

    /// Bring the published data in line with `position` and `radius_m`
    pub fn request(&mut self, position: Option<GeoPosition>, radius_m: u32) -> FetchOutcome {
        let Some(position) = position else {
            return FetchOutcome::NoPosition;
        };

        if radius_m == 0 {
            let message = FetchError::InvalidRadius.user_message();
            self.state_tx.send_modify(|s| s.error = Some(message));
            return FetchOutcome::InvalidRadius;
        }

        let key = cache_key(&position, radius_m);
        if self.current_key.as_deref() == Some(key.as_str()) {
            return FetchOutcome::Unchanged;
        }

        // Bump first so a completion racing with this call fails its check
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.abort_in_flight();
        self.current_key = Some(key.clone());

        if let Some(data) = self.cache.get(&key, self.clock.now_millis()) {
            tracing::debug!(key = %key, count = data.len(), "Serving POIs from cache");
            self.state_tx.send_modify(|s| {
                s.data = Some(data);
                s.loading = false;
                s.error = None;
            });
            return FetchOutcome::CacheHit { key };
        }

        tracing::info!(key = %key, radius_m, "Fetching nearby POIs");
        self.state_tx.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        let clock = Arc::clone(&self.clock);
        let state_tx = Arc::clone(&self.state_tx);
        let current = Arc::clone(&self.generation);
        let task_key = key.clone();

        self.in_flight = Some(tokio::spawn(async move {
            let result = source.fetch_pois(position, radius_m).await;
            let result = result.map(|elements| Arc::new(verified_only(elements)));

            state_tx.send_if_modified(|state| {
                if current.load(Ordering::SeqCst) != generation {
                    tracing::debug!(key = %task_key, "Discarding superseded POI response");
                    return false;
                }
                match &result {
                    Ok(data) => {
                        tracing::info!(key = %task_key, count = data.len(), "Fetched verified POIs");
                        cache.insert(task_key.clone(), Arc::clone(data), clock.now_millis());
                        state.data = Some(Arc::clone(data));
                        state.error = None;
                    }
                    Err(err) if err.is_cancellation() => {
                        tracing::debug!(key = %task_key, "POI request cancelled");
                    }
                    Err(err) => {
                        tracing::warn!(key = %task_key, error = %err, "POI request failed");
                        state.error = Some(err.user_message());
                    }
                }
                state.loading = false;
                true
            });
        }));

        FetchOutcome::Requested { key }
    }

    /// Forget the current key so the next request for it goes out again
    pub fn invalidate(&mut self) {
        self.current_key = None;
    }

    /// Abort any in-flight request and clear the loading flag
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if self.abort_in_flight() {
            self.current_key = None;
            self.state_tx.send_modify(|s| s.loading = false);
        }
    }

    fn abort_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }
}

impl<S> Drop for PoiFetcher<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}
