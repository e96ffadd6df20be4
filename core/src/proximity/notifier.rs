//! Proximity notifier
//!
//! Decides whether the user should hear about a nearby place right now.
//! Each call to [`ProximityNotifier::check`] is one evaluation tick; ticks
//! are hard-throttled, never overlap, and every shown notification is
//! recorded before it is displayed so a slow or broken sink cannot cause
//! repeats.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use lugabiz_types::{NotificationPermission, ProximityConfig};
use tokio::sync::watch;

use crate::clock::SharedClock;
use crate::geo::GeoPosition;
use crate::places::PointOfInterest;

use super::history::NotificationHistory;
use super::sink::{NotificationSink, ProximityNotification};

/// Minimum spacing between evaluations; ticks inside it are dropped
pub const CHECK_THROTTLE_MS: i64 = 10_000;

/// Observable notifier state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifierStatus {
    pub supported: bool,
    pub permission_granted: bool,
    pub permission_denied: bool,
    /// Notifications shown within the rate window
    pub notification_count: usize,
}

/// Result of one evaluation tick
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Another evaluation is still running
    Busy,
    Throttled,
    NoPosition,
    NoPlaces,
    Unsupported,
    PermissionNotGranted,
    RateLimited,
    NoneNearby,
    Notified { place_id: String, distance_m: f64 },
}

pub struct ProximityNotifier<N> {
    sink: Arc<N>,
    clock: SharedClock,
    config: ProximityConfig,
    history: Mutex<NotificationHistory>,
    permission: Mutex<NotificationPermission>,
    permission_requested: AtomicBool,
    last_check: Mutex<Option<i64>>,
    checking: AtomicBool,
    unsupported_reported: AtomicBool,
    status_tx: watch::Sender<NotifierStatus>,
}

impl<N: NotificationSink> ProximityNotifier<N> {
    /// `remembered` is the decision persisted from an earlier session
    pub fn new(
        sink: Arc<N>,
        config: ProximityConfig,
        clock: SharedClock,
        remembered: Option<NotificationPermission>,
    ) -> Self {
        let permission = match sink.permission() {
            NotificationPermission::Default => remembered.unwrap_or_default(),
            decided => decided,
        };
        let status = NotifierStatus {
            supported: sink.is_supported(),
            permission_granted: permission.is_granted(),
            permission_denied: permission.is_denied(),
            notification_count: 0,
        };
        let (status_tx, _) = watch::channel(status);

        Self {
            sink,
            clock,
            config,
            history: Mutex::new(NotificationHistory::new()),
            permission: Mutex::new(permission),
            permission_requested: AtomicBool::new(false),
            last_check: Mutex::new(None),
            checking: AtomicBool::new(false),
            unsupported_reported: AtomicBool::new(false),
            status_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<NotifierStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> NotifierStatus {
        self.status_tx.borrow().clone()
    }

    pub fn config(&self) -> &ProximityConfig {
        &self.config
    }

    pub fn permission(&self) -> NotificationPermission {
        *lock(&self.permission)
    }

    pub fn history(&self) -> NotificationHistory {
        lock(&self.history).clone()
    }

    /// Run one evaluation tick
    pub async fn check(
        &self,
        position: Option<GeoPosition>,
        places: &[PointOfInterest],
    ) -> CheckOutcome {
        let Some(_guard) = CheckGuard::acquire(&self.checking) else {
            return CheckOutcome::Busy;
        };

        let Some(position) = position else {
            return CheckOutcome::NoPosition;
        };
        if places.is_empty() {
            return CheckOutcome::NoPlaces;
        }

        let now = self.clock.now_millis();
        {
            let mut last_check = lock(&self.last_check);
            if let Some(last) = *last_check {
                if now - last < CHECK_THROTTLE_MS {
                    return CheckOutcome::Throttled;
                }
            }
            *last_check = Some(now);
        }

        if !self.sink.is_supported() {
            if !self.unsupported_reported.swap(true, Ordering::SeqCst) {
                tracing::warn!("System notifications are not supported; proximity alerts disabled");
            }
            return CheckOutcome::Unsupported;
        }

        if !self.ensure_permission().await.is_granted() {
            return CheckOutcome::PermissionNotGranted;
        }

        let (purged, decision) = {
            let mut history = lock(&self.history);
            let purged = history.purge(now, &self.config);
            let decision = if history.rate_limited(now, &self.config) {
                tracing::debug!(
                    limit = self.config.max_notifications_per_hour,
                    "Hourly notification limit reached"
                );
                Err(CheckOutcome::RateLimited)
            } else {
                closest_eligible(position, places, &history, now, &self.config)
                    .and_then(|(place, distance_m)| {
                        ProximityNotification::for_place(place, distance_m).map(|n| (n, distance_m))
                    })
                    .ok_or(CheckOutcome::NoneNearby)
            };

            // Recorded before display: a failed or cancelled show must not re-fire
            if let Ok((notification, _)) = &decision {
                history.push(notification.place_id.clone(), now);
            }
            (purged, decision)
        };

        if purged > 0 {
            tracing::debug!(purged, "Purged old notification records");
        }
        if purged > 0 || decision.is_ok() {
            self.publish_status(now);
        }
        let (notification, distance_m) = match decision {
            Ok(found) => found,
            Err(outcome) => return outcome,
        };

        tracing::info!(
            place_id = %notification.place_id,
            distance_m = notification.distance_m,
            "Notifying nearby place"
        );
        if let Err(err) = self.sink.show(&notification).await {
            tracing::warn!(place_id = %notification.place_id, error = %err, "Notification not shown");
        }

        CheckOutcome::Notified {
            place_id: notification.place_id,
            distance_m,
        }
    }

    /// Prompt at most once per session, and never after a denial
    async fn ensure_permission(&self) -> NotificationPermission {
        let current = self.permission();
        if current != NotificationPermission::Default
            || self.permission_requested.swap(true, Ordering::SeqCst)
        {
            return current;
        }

        let decided = self.sink.request_permission().await;
        tracing::info!(permission = ?decided, "{}", decided.message());
        *lock(&self.permission) = decided;
        self.publish_status(self.clock.now_millis());
        decided
    }

    fn publish_status(&self, now: i64) {
        let permission = self.permission();
        let notification_count = lock(&self.history).count_within_window(now);
        self.status_tx.send_if_modified(|status| {
            let next = NotifierStatus {
                supported: status.supported,
                permission_granted: permission.is_granted(),
                permission_denied: permission.is_denied(),
                notification_count,
            };
            let changed = *status != next;
            *status = next;
            changed
        });
    }
}

/// Closest named place within the radius that is not cooling down
///
/// Ties keep the first place encountered.
pub fn closest_eligible<'a>(
    position: GeoPosition,
    places: &'a [PointOfInterest],
    history: &NotificationHistory,
    now: i64,
    config: &ProximityConfig,
) -> Option<(&'a PointOfInterest, f64)> {
    let mut best: Option<(&PointOfInterest, f64)> = None;
    for place in places {
        if place.name().is_none() {
            continue;
        }
        let Some(place_position) = place.position() else {
            continue;
        };
        let distance = position.distance_to(&place_position);
        if !(distance <= config.radius_m) {
            continue;
        }
        if history.is_cooling_down(&place.place_id(), now, config) {
            continue;
        }
        if best.is_none_or(|(_, closest)| distance < closest) {
            best = Some((place, distance));
        }
    }
    best
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Holds the "checking" flag for the duration of one evaluation
struct CheckGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CheckGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for CheckGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
