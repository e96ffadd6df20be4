//! Position source
//!
//! Runs a fast low-accuracy read alongside a continuous high-accuracy watch.
//! Both write into the same `watch` channel, so the first fix shows up as
//! soon as either produces one and the watch keeps it current afterwards.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::geo::GeoPosition;

use super::error::LocationError;
use super::provider::{LocationProvider, PositionOptions};

#[derive(Debug, Clone, PartialEq)]
pub struct PositionState {
    pub position: Option<GeoPosition>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for PositionState {
    fn default() -> Self {
        Self {
            position: None,
            loading: true,
            error: None,
        }
    }
}

pub struct PositionSource<P> {
    provider: Arc<P>,
    state_tx: Arc<watch::Sender<PositionState>>,
    started: bool,
    quick_task: Option<JoinHandle<()>>,
    watch_task: Option<JoinHandle<()>>,
}

impl<P: LocationProvider> PositionSource<P> {
    pub fn new(provider: Arc<P>) -> Self {
        let (state_tx, _) = watch::channel(PositionState::default());
        Self {
            provider,
            state_tx: Arc::new(state_tx),
            started: false,
            quick_task: None,
            watch_task: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PositionState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> PositionState {
        self.state_tx.borrow().clone()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Begin acquiring positions; calling again is a no-op
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        if !self.provider.is_supported() {
            tracing::warn!("Geolocation not supported; position source idle");
            apply_error(&self.state_tx, &LocationError::Unsupported, false);
            return;
        }

        tracing::info!("Requesting location");

        let provider = Arc::clone(&self.provider);
        let state_tx = Arc::clone(&self.state_tx);
        self.quick_task = Some(tokio::spawn(async move {
            let options = PositionOptions::QUICK;
            let reading = timeout(options.timeout, provider.current_position(options))
                .await
                .unwrap_or(Err(LocationError::Timeout));

            // The watch may already have delivered a better fix
            match reading {
                Ok(position) => {
                    state_tx.send_if_modified(|s| {
                        if s.position.is_some() {
                            return false;
                        }
                        tracing::info!(%position, "Initial location acquired");
                        set_position(s, position);
                        true
                    });
                }
                Err(err) => {
                    tracing::debug!(error = %err, "Quick location read failed");
                    apply_error(&state_tx, &err, true);
                }
            }
        }));

        // Registered here so a started source always owns exactly one watch
        let options = PositionOptions::WATCH;
        let mut updates = self.provider.watch_position(options);
        let state_tx = Arc::clone(&self.state_tx);
        self.watch_task = Some(tokio::spawn(async move {
            let mut has_fix = false;

            loop {
                let next = if has_fix {
                    updates.recv().await
                } else {
                    match timeout(options.timeout, updates.recv()).await {
                        Ok(next) => next,
                        Err(_) => {
                            apply_error(&state_tx, &LocationError::Timeout, false);
                            continue;
                        }
                    }
                };

                match next {
                    Some(Ok(position)) => {
                        has_fix = true;
                        state_tx.send_if_modified(|s| {
                            let changed = s.position != Some(position) || s.loading || s.error.is_some();
                            if changed {
                                tracing::debug!(%position, "Location updated");
                                set_position(s, position);
                            }
                            changed
                        });
                    }
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "Location watch error");
                        apply_error(&state_tx, &err, false);
                    }
                    None => {
                        tracing::debug!("Location watch ended");
                        break;
                    }
                }
            }
        }));
    }

    /// Drop everything and acquire from scratch
    pub fn retry(&mut self) {
        tracing::info!("Retrying location");
        self.abort_tasks();
        self.started = false;
        self.state_tx.send_replace(PositionState::default());
        self.start();
    }

    pub fn stop(&mut self) {
        self.abort_tasks();
    }

    fn abort_tasks(&mut self) {
        for handle in [self.quick_task.take(), self.watch_task.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

impl<P> Drop for PositionSource<P> {
    fn drop(&mut self) {
        for handle in [self.quick_task.take(), self.watch_task.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

fn set_position(state: &mut PositionState, position: GeoPosition) {
    state.position = Some(position);
    state.loading = false;
    state.error = None;
}

/// Record a failure, keeping the last known position
fn apply_error(state_tx: &watch::Sender<PositionState>, err: &LocationError, only_without_fix: bool) {
    let message = err.user_message();
    state_tx.send_if_modified(|s| {
        if only_without_fix && s.position.is_some() {
            return false;
        }
        let changed = s.loading || s.error.as_deref() != Some(message.as_str());
        s.loading = false;
        s.error = Some(message);
        changed
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    use crate::location::PositionUpdates;

    /// Scripted provider: a fixed quick result and a watch channel the test
    /// drives by hand.
    struct ScriptedProvider {
        supported: bool,
        quick: Result<GeoPosition, LocationError>,
        quick_delay: Duration,
        watch_calls: AtomicUsize,
        watch_tx: Mutex<Option<mpsc::Sender<Result<GeoPosition, LocationError>>>>,
    }

    impl ScriptedProvider {
        fn new(quick: Result<GeoPosition, LocationError>) -> Self {
            Self {
                supported: true,
                quick,
                quick_delay: Duration::ZERO,
                watch_calls: AtomicUsize::new(0),
                watch_tx: Mutex::new(None),
            }
        }

        async fn push(&self, reading: Result<GeoPosition, LocationError>) {
            let tx = self.watch_tx.lock().unwrap().clone().expect("watch not started");
            tx.send(reading).await.unwrap();
        }
    }

    impl LocationProvider for ScriptedProvider {
        fn is_supported(&self) -> bool {
            self.supported
        }

        async fn current_position(&self, _options: PositionOptions) -> Result<GeoPosition, LocationError> {
            tokio::time::sleep(self.quick_delay).await;
            self.quick.clone()
        }

        fn watch_position(&self, _options: PositionOptions) -> PositionUpdates {
            self.watch_calls.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = mpsc::channel(8);
            *self.watch_tx.lock().unwrap() = Some(tx);
            rx
        }
    }

    fn pos(lat: f64, lon: f64) -> GeoPosition {
        GeoPosition::new(lat, lon).unwrap()
    }

    async fn wait_until(
        rx: &mut watch::Receiver<PositionState>,
        f: impl FnMut(&PositionState) -> bool,
    ) -> PositionState {
        timeout(Duration::from_secs(2), rx.wait_for(f))
            .await
            .expect("state did not change in time")
            .expect("source dropped")
            .clone()
    }

    #[tokio::test]
    async fn test_initial_state_is_loading() {
        let source = PositionSource::new(Arc::new(ScriptedProvider::new(Ok(pos(1.0, 1.0)))));
        let state = source.state();
        assert!(state.loading);
        assert!(state.position.is_none());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_quick_read_sets_position() {
        let provider = Arc::new(ScriptedProvider::new(Ok(pos(4.6, -74.08))));
        let mut source = PositionSource::new(provider);
        let mut rx = source.subscribe();
        source.start();

        let state = wait_until(&mut rx, |s| s.position.is_some()).await;
        assert_eq!(state.position, Some(pos(4.6, -74.08)));
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_watch_updates_and_error_keeps_position() {
        let provider = Arc::new(ScriptedProvider::new(Err(LocationError::Timeout)));
        let mut source = PositionSource::new(Arc::clone(&provider));
        let mut rx = source.subscribe();
        source.start();
        tokio::task::yield_now().await;

        provider.push(Ok(pos(4.6, -74.08))).await;
        wait_until(&mut rx, |s| s.position == Some(pos(4.6, -74.08))).await;

        provider.push(Ok(pos(4.61, -74.09))).await;
        wait_until(&mut rx, |s| s.position == Some(pos(4.61, -74.09))).await;

        provider.push(Err(LocationError::PositionUnavailable)).await;
        let state = wait_until(&mut rx, |s| s.error.is_some()).await;
        assert_eq!(state.position, Some(pos(4.61, -74.09)));
        assert_eq!(state.error, Some(LocationError::PositionUnavailable.user_message()));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_errors_map_to_distinct_messages() {
        for err in [
            LocationError::PermissionDenied,
            LocationError::PositionUnavailable,
            LocationError::Timeout,
        ] {
            let provider = Arc::new(ScriptedProvider::new(Err(err.clone())));
            let mut source = PositionSource::new(provider);
            let mut rx = source.subscribe();
            source.start();

            let state = wait_until(&mut rx, |s| s.error.is_some()).await;
            assert_eq!(state.error, Some(err.user_message()));
            assert!(state.position.is_none());
        }
    }

    #[tokio::test]
    async fn test_unsupported_short_circuits() {
        let mut provider = ScriptedProvider::new(Ok(pos(1.0, 1.0)));
        provider.supported = false;
        let provider = Arc::new(provider);
        let mut source = PositionSource::new(Arc::clone(&provider));
        source.start();

        let state = source.state();
        assert!(!state.loading);
        assert_eq!(state.error, Some(LocationError::Unsupported.user_message()));
        assert_eq!(provider.watch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_retry_restarts_once() {
        let provider = Arc::new(ScriptedProvider::new(Ok(pos(4.6, -74.08))));
        let mut source = PositionSource::new(Arc::clone(&provider));
        let mut rx = source.subscribe();

        source.start();
        source.start();
        assert_eq!(provider.watch_calls.load(Ordering::SeqCst), 1);
        wait_until(&mut rx, |s| s.position.is_some()).await;

        source.retry();
        assert_eq!(provider.watch_calls.load(Ordering::SeqCst), 2);
        assert!(source.is_started());
        wait_until(&mut rx, |s| s.position.is_some() && !s.loading).await;
    }

    #[tokio::test]
    async fn test_retry_resets_state() {
        let mut provider = ScriptedProvider::new(Ok(pos(4.6, -74.08)));
        provider.quick_delay = Duration::from_secs(60);
        let provider = Arc::new(provider);
        let mut source = PositionSource::new(Arc::clone(&provider));
        let mut rx = source.subscribe();
        source.start();
        tokio::task::yield_now().await;

        provider.push(Err(LocationError::PermissionDenied)).await;
        wait_until(&mut rx, |s| s.error.is_some()).await;

        source.retry();
        assert_eq!(source.state(), PositionState::default());
    }

    #[tokio::test]
    async fn test_late_quick_read_does_not_override_watch() {
        let mut provider = ScriptedProvider::new(Ok(pos(1.0, 1.0)));
        provider.quick_delay = Duration::from_millis(50);
        let provider = Arc::new(provider);
        let mut source = PositionSource::new(Arc::clone(&provider));
        let mut rx = source.subscribe();
        source.start();
        tokio::task::yield_now().await;

        provider.push(Ok(pos(4.6, -74.08))).await;
        wait_until(&mut rx, |s| s.position.is_some()).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.state().position, Some(pos(4.6, -74.08)));
    }
}
