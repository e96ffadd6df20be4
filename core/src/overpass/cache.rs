use std::sync::{Arc, Mutex};
use std::time::Duration;

use hashbrown::HashMap;

use crate::geo::GeoPosition;
use crate::places::PointOfInterest;

/// How long a fetched result set stays fresh
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// `"{lat:.4}_{lon:.4}_{radius}"`
pub fn cache_key(position: &GeoPosition, radius_m: u32) -> String {
    format!("{}_{}", position.rounded_key(), radius_m)
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub data: Arc<Vec<PointOfInterest>>,
    /// Epoch millis when the entry was stored
    pub timestamp: i64,
}

impl CacheEntry {
    fn is_fresh(&self, now: i64, ttl_ms: i64) -> bool {
        now - self.timestamp < ttl_ms
    }
}

/// In-memory store of verified POI lists
///
/// Owned by whoever composes the pipeline and handed to the fetcher, so each
/// test can work with its own instance.
#[derive(Debug)]
pub struct PoiCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl_ms: i64,
}

impl Default for PoiCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PoiCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_ms: ttl.as_millis() as i64,
        }
    }

    /// Fresh data for `key`; stale entries count as a miss and are dropped
    pub fn get(&self, key: &str, now: i64) -> Option<Arc<Vec<PointOfInterest>>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now, self.ttl_ms) => Some(Arc::clone(&entry.data)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `data` under `key`, dropping every entry that has expired
    pub fn insert(&self, key: String, data: Arc<Vec<PointOfInterest>>, now: i64) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, entry| entry.is_fresh(now, self.ttl_ms));
        entries.insert(
            key.clone(),
            CacheEntry {
                key,
                data,
                timestamp: now,
            },
        );
    }

    pub fn purge_expired(&self, now: i64) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now, self.ttl_ms));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
