use std::sync::atomic::{AtomicBool, AtomicU32};

use tokio::sync::RwLock;

use crate::markers::{Marker, ViewportChange};
use crate::proximity::CheckOutcome;

// ─────────────────────────────────────────────────────────────────────────────
// Shared State
// ─────────────────────────────────────────────────────────────────────────────

/// State shared between the pipeline service and its handles
pub struct SharedState {
    pub radius_m: AtomicU32,
    pub filter: RwLock<String>,
    pub markers: RwLock<Vec<Marker>>,
    /// Last camera move requested from the map
    pub viewport: RwLock<Option<ViewportChange>>,
    pub last_check: RwLock<Option<CheckOutcome>>,
    pub running: AtomicBool,
}

impl SharedState {
    pub fn new(radius_m: u32) -> Self {
        Self {
            radius_m: AtomicU32::new(radius_m),
            filter: RwLock::new(String::new()),
            markers: RwLock::new(Vec::new()),
            viewport: RwLock::new(None),
            last_check: RwLock::new(None),
            running: AtomicBool::new(false),
        }
    }
}
