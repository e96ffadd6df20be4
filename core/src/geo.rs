//! Coordinates and great-circle distance

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for haversine distances
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate in degrees
///
/// Only constructed from valid degrees; a missing fix is `Option::None`,
/// never `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPosition {
    /// Returns `None` for non-finite or out-of-range degrees
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }

    pub fn distance_to(&self, other: &GeoPosition) -> f64 {
        haversine_m(self.lat, self.lon, other.lat, other.lon)
    }

    /// `"{lat}_{lon}"` with both rounded to 4 decimals (~11 m)
    pub fn rounded_key(&self) -> String {
        rounded_key(self.lat, self.lon)
    }
}

impl std::fmt::Display for GeoPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

pub fn rounded_key(lat: f64, lon: f64) -> String {
    format!("{:.4}_{:.4}", lat, lon)
}

/// Great-circle distance in meters
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` past 1 for near-antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(lat: f64, lon: f64) -> GeoPosition {
        GeoPosition::new(lat, lon).unwrap()
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        for p in [pos(0.0, 0.0), pos(4.6097, -74.0817), pos(-89.9, 179.9)] {
            assert_eq!(p.distance_to(&p), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let points = [
            pos(0.0, 0.0),
            pos(4.60971, -74.08175),
            pos(48.8566, 2.3522),
            pos(-33.8688, 151.2093),
            pos(89.0, -179.0),
        ];
        for a in &points {
            for b in &points {
                let ab = a.distance_to(b);
                let ba = b.distance_to(a);
                assert!((ab - ba).abs() < 1e-6, "{a} -> {b}: {ab} vs {ba}");
            }
        }
    }

    #[test]
    fn test_hundred_meters_at_equator() {
        let d = pos(0.0, 0.0).distance_to(&pos(0.0, 0.0009));
        assert!((95.0..=105.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_known_city_distance() {
        // Bogotá to Medellín is roughly 240 km as the crow flies
        let d = pos(4.7110, -74.0721).distance_to(&pos(6.2442, -75.5812));
        assert!((230_000.0..250_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_antipodal_distance_is_finite() {
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_M;
        for (a, b) in [
            (pos(0.0, 0.0), pos(0.0, 180.0)),
            (pos(4.6097, -74.0817), pos(-4.6097, 105.9183)),
            (pos(45.0, 10.0), pos(-45.0, -170.0)),
            (pos(89.9, 0.0), pos(-89.9, 180.0)),
        ] {
            let d = a.distance_to(&b);
            assert!(d.is_finite(), "{a} -> {b} gave {d}");
            assert!(d <= half_circumference + 1.0, "{a} -> {b} gave {d}");
        }
    }

    #[test]
    fn test_invalid_positions_are_absent() {
        assert!(GeoPosition::new(f64::NAN, 0.0).is_none());
        assert!(GeoPosition::new(0.0, f64::INFINITY).is_none());
        assert!(GeoPosition::new(91.0, 0.0).is_none());
        assert!(GeoPosition::new(0.0, -180.5).is_none());
        assert_eq!(GeoPosition::new(0.0, 0.0), Some(GeoPosition { lat: 0.0, lon: 0.0 }));
    }

    #[test]
    fn test_rounded_key_ignores_sub_decimal_jitter() {
        let a = pos(4.60971001, -74.08175);
        let b = pos(4.60971004, -74.08175);
        assert_eq!(a.rounded_key(), b.rounded_key());
        assert_eq!(a.rounded_key(), rounded_key(4.6097, a.lon));
    }
}
