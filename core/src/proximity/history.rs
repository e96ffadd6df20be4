use std::collections::VecDeque;

use lugabiz_types::ProximityConfig;

/// Window the hourly rate limit is counted over
pub const RATE_WINDOW_MS: i64 = 60 * 60 * 1000;

/// A notification that was shown (or attempted) for a place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub place_id: String,
    /// Epoch millis
    pub timestamp: i64,
}

/// In-memory notification log, oldest first
#[derive(Debug, Clone, Default)]
pub struct NotificationHistory {
    records: VecDeque<NotificationRecord>,
}

impl NotificationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, place_id: impl Into<String>, now: i64) {
        self.records.push_back(NotificationRecord {
            place_id: place_id.into(),
            timestamp: now,
        });
    }

    /// Drop records no rule can still look at; returns how many went
    ///
    /// Records are kept for the rate window or the cooldown, whichever is
    /// longer, so a cooldown above one hour still holds.
    pub fn purge(&mut self, now: i64, config: &ProximityConfig) -> usize {
        let retention = RATE_WINDOW_MS.max(config.cooldown_millis());
        let before = self.records.len();
        while self
            .records
            .front()
            .is_some_and(|record| now - record.timestamp >= retention)
        {
            self.records.pop_front();
        }
        before - self.records.len()
    }

    /// Records inside the rate window ending at `now`
    pub fn count_within_window(&self, now: i64) -> usize {
        self.records
            .iter()
            .filter(|record| now - record.timestamp < RATE_WINDOW_MS)
            .count()
    }

    pub fn is_cooling_down(&self, place_id: &str, now: i64, config: &ProximityConfig) -> bool {
        let cooldown = config.cooldown_millis();
        self.records
            .iter()
            .rev()
            .any(|record| record.place_id == place_id && now - record.timestamp < cooldown)
    }

    pub fn rate_limited(&self, now: i64, config: &ProximityConfig) -> bool {
        self.count_within_window(now) >= config.max_notifications_per_hour as usize
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter()
    }
}

/// Whether `place_id` may be notified at `now`
pub fn can_notify(
    history: &NotificationHistory,
    place_id: &str,
    now: i64,
    config: &ProximityConfig,
) -> bool {
    !history.rate_limited(now, config) && !history.is_cooling_down(place_id, now, config)
}
