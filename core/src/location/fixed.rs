//! Providers that need no device: a configured coordinate, and one that
//! reports no capability at all.

use tokio::sync::mpsc;

use crate::geo::GeoPosition;

use super::error::LocationError;
use super::provider::{LocationProvider, PositionOptions, PositionUpdates};

/// Always reports the same coordinate
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    position: GeoPosition,
}

impl FixedLocation {
    pub fn new(position: GeoPosition) -> Self {
        Self { position }
    }
}

impl LocationProvider for FixedLocation {
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(&self, _options: PositionOptions) -> Result<GeoPosition, LocationError> {
        Ok(self.position)
    }

    fn watch_position(&self, _options: PositionOptions) -> PositionUpdates {
        let (tx, rx) = mpsc::channel(1);
        // Capacity 1 and a fresh channel: cannot fail
        let _ = tx.try_send(Ok(self.position));
        rx
    }
}

/// Device without geolocation
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedLocation;

impl LocationProvider for UnsupportedLocation {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_position(&self, _options: PositionOptions) -> Result<GeoPosition, LocationError> {
        Err(LocationError::Unsupported)
    }

    fn watch_position(&self, _options: PositionOptions) -> PositionUpdates {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.try_send(Err(LocationError::Unsupported));
        rx
    }
}
