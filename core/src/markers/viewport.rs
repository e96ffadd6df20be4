use std::time::Duration;

use crate::geo::GeoPosition;

/// Radius (meters) to map zoom level, ascending
pub const ZOOM_STEPS: &[(u32, u8)] = &[(500, 16), (2_000, 14), (5_000, 13), (10_000, 12), (30_000, 11)];

pub const FALLBACK_ZOOM: u8 = 13;

/// Movement in either axis that re-centers the map
pub const RECENTER_THRESHOLD_DEG: f64 = 0.001;

pub const FLY_DURATION: Duration = Duration::from_millis(800);

/// Zoom of the largest step not above `radius_m`
pub fn zoom_for_radius(radius_m: u32) -> u8 {
    ZOOM_STEPS
        .iter()
        .rev()
        .find(|(meters, _)| *meters <= radius_m)
        .map(|(_, zoom)| *zoom)
        .unwrap_or(FALLBACK_ZOOM)
}

/// Camera move the map layer should perform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportChange {
    pub center: GeoPosition,
    pub zoom: u8,
    /// Zero for the initial jump
    pub duration: Duration,
}

/// Tracks where the map is centered and decides when to move it
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    center: Option<GeoPosition>,
    radius_m: Option<u32>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(&self) -> Option<GeoPosition> {
        self.center
    }

    pub fn zoom(&self) -> Option<u8> {
        self.radius_m.map(zoom_for_radius)
    }

    pub fn update(&mut self, position: Option<GeoPosition>, radius_m: u32) -> Option<ViewportChange> {
        let position = position?;
        let initialized = self.center.is_some();

        let moved = self.center.is_none_or(|last| {
            (last.lat - position.lat).abs() > RECENTER_THRESHOLD_DEG
                || (last.lon - position.lon).abs() > RECENTER_THRESHOLD_DEG
        });
        let radius_changed = self.radius_m != Some(radius_m);
        if !moved && !radius_changed {
            return None;
        }

        self.center = Some(position);
        self.radius_m = Some(radius_m);
        Some(ViewportChange {
            center: position,
            zoom: zoom_for_radius(radius_m),
            duration: if initialized { FLY_DURATION } else { Duration::ZERO },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_table() {
        assert_eq!(zoom_for_radius(500), 16);
        assert_eq!(zoom_for_radius(1_999), 16);
        assert_eq!(zoom_for_radius(2_000), 14);
        assert_eq!(zoom_for_radius(5_000), 13);
        assert_eq!(zoom_for_radius(15_000), 12);
        assert_eq!(zoom_for_radius(30_000), 11);
        assert_eq!(zoom_for_radius(100_000), 11);
        assert_eq!(zoom_for_radius(100), FALLBACK_ZOOM);
    }

    #[test]
    fn test_first_update_jumps_without_animation() {
        let mut viewport = Viewport::new();
        assert_eq!(viewport.update(None, 500), None);

        let here = GeoPosition::new(4.6097, -74.0817).unwrap();
        let change = viewport.update(Some(here), 500).unwrap();
        assert_eq!(change.center, here);
        assert_eq!(change.zoom, 16);
        assert_eq!(change.duration, Duration::ZERO);
    }

    #[test]
    fn test_recenter_threshold() {
        let mut viewport = Viewport::new();
        viewport.update(GeoPosition::new(4.6097, -74.0817), 500);

        assert_eq!(viewport.update(GeoPosition::new(4.6105, -74.0810), 500), None);

        let change = viewport.update(GeoPosition::new(4.6120, -74.0817), 500).unwrap();
        assert_eq!(change.duration, FLY_DURATION);
        assert_eq!(viewport.center(), GeoPosition::new(4.6120, -74.0817));
    }

    #[test]
    fn test_radius_change_recenters() {
        let mut viewport = Viewport::new();
        let here = GeoPosition::new(4.6097, -74.0817);
        viewport.update(here, 500);

        let change = viewport.update(here, 10_000).unwrap();
        assert_eq!(change.zoom, 12);
        assert_eq!(viewport.zoom(), Some(12));
    }
}
