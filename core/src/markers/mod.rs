//! Map marker projection
//!
//! Turns a POI list into screen markers: places sharing a rounded
//! coordinate are fanned out on a small circle so none hides another, and
//! each marker knows whether it matches the current text filter.

mod viewport;

pub use viewport::{
    FALLBACK_ZOOM, FLY_DURATION, RECENTER_THRESHOLD_DEG, Viewport, ViewportChange, ZOOM_STEPS,
    zoom_for_radius,
};

use std::f64::consts::PI;
use std::fmt;

use hashbrown::HashMap;

use crate::geo::rounded_key;
use crate::places::PointOfInterest;

/// Fan-out radius for colliding markers, in degrees
pub const COLLISION_OFFSET_DEG: f64 = 0.0001;

pub const UNNAMED_LABEL: &str = "Unnamed";

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub place: PointOfInterest,
    /// Display coordinate after collision offset
    pub lat: f64,
    pub lon: f64,
    /// Non-matching markers are drawn de-emphasized but stay clickable
    pub matches: bool,
    pub label: String,
    pub emoji: &'static str,
    pub color: &'static str,
}

/// Lowercased query is empty or found in name, amenity, tourism or cuisine
pub fn matches_query(place: &PointOfInterest, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    matches_normalized(place, &query)
}

fn matches_normalized(place: &PointOfInterest, query: &str) -> bool {
    query.is_empty()
        || ["name", "amenity", "tourism", "cuisine"]
            .iter()
            .filter_map(|key| place.tag(key))
            .any(|value| value.to_lowercase().contains(query))
}

/// Project places with coordinates into markers, grouped in first-seen order
pub fn project_markers(places: &[PointOfInterest], query: &str) -> Vec<Marker> {
    let query = query.trim().to_lowercase();

    let mut groups: Vec<Vec<&PointOfInterest>> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    for place in places {
        let (Some(lat), Some(lon)) = (place.lat, place.lon) else {
            continue;
        };
        let index = *group_index.entry(rounded_key(lat, lon)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[index].push(place);
    }

    let mut markers = Vec::with_capacity(places.len());
    for group in groups {
        let count = group.len();
        let radius = if count > 1 { COLLISION_OFFSET_DEG } else { 0.0 };
        for (i, place) in group.into_iter().enumerate() {
            let angle = (i as f64 * (360.0 / count as f64)) * (PI / 180.0);
            let (Some(lat), Some(lon)) = (place.lat, place.lon) else {
                continue;
            };
            let category = place.category();
            markers.push(Marker {
                place: place.clone(),
                lat: lat + angle.cos() * radius,
                lon: lon + angle.sin() * radius,
                matches: matches_normalized(place, &query),
                label: place.name().unwrap_or(UNNAMED_LABEL).to_string(),
                emoji: category.emoji,
                color: category.color,
            });
        }
    }
    markers
}

type ClickHandler = Box<dyn Fn(&PointOfInterest) + Send + Sync>;

/// Current markers plus the caller's click handler
#[derive(Default)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
    query: String,
    on_click: Option<ClickHandler>,
}

impl fmt::Debug for MarkerLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerLayer")
            .field("markers", &self.markers.len())
            .field("query", &self.query)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_click_handler(mut self, handler: impl Fn(&PointOfInterest) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Box::new(handler));
        self
    }

    pub fn set_places(&mut self, places: &[PointOfInterest]) {
        self.markers = project_markers(places, &self.query);
    }

    /// Re-evaluate matches without regrouping
    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_lowercase();
        for marker in &mut self.markers {
            marker.matches = matches_normalized(&marker.place, &self.query);
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn matching(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|m| m.matches)
    }

    /// Invoke the click handler for the marker of `place_id`
    pub fn click(&self, place_id: i64) -> bool {
        let Some(marker) = self.markers.iter().find(|m| m.place.id == place_id) else {
            return false;
        };
        if let Some(handler) = &self.on_click {
            handler(&marker.place);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn place(id: i64, lat: f64, lon: f64, tags: &[(&str, &str)]) -> PointOfInterest {
        PointOfInterest {
            id,
            lat: Some(lat),
            lon: Some(lon),
            tags: Some(tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()),
        }
    }

    #[test]
    fn test_single_marker_is_not_offset() {
        let markers = project_markers(&[place(1, 4.6097, -74.0817, &[("name", "Solo")])], "");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].lat, 4.6097);
        assert_eq!(markers[0].lon, -74.0817);
        assert!(markers[0].matches);
    }

    #[test]
    fn test_colliding_markers_fan_out() {
        let places = [
            place(1, 4.60970, -74.08170, &[("name", "A")]),
            place(2, 4.60971, -74.08171, &[("name", "B")]),
            place(3, 4.60969, -74.08169, &[("name", "C")]),
            place(4, 4.62000, -74.08000, &[("name", "Far")]),
        ];
        let markers = project_markers(&places, "");
        assert_eq!(markers.len(), 4);

        // Marker 0: angle 0 -> straight north
        assert!((markers[0].lat - (4.60970 + COLLISION_OFFSET_DEG)).abs() < 1e-12);
        assert!((markers[0].lon - -74.08170).abs() < 1e-12);
        // Marker 1: angle 120 degrees
        let angle = 120f64.to_radians();
        assert!((markers[1].lat - (4.60971 + angle.cos() * COLLISION_OFFSET_DEG)).abs() < 1e-12);
        assert!((markers[1].lon - (-74.08171 + angle.sin() * COLLISION_OFFSET_DEG)).abs() < 1e-12);

        assert_eq!(markers[3].place.id, 4);
        assert_eq!(markers[3].lat, 4.62);
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let places = [
            place(1, 1.0, 1.0, &[]),
            place(2, 2.0, 2.0, &[]),
            place(3, 1.0, 1.0, &[]),
        ];
        let ids: Vec<i64> = project_markers(&places, "").iter().map(|m| m.place.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_places_without_coordinates_are_skipped() {
        let missing = PointOfInterest {
            id: 9,
            lat: None,
            lon: Some(1.0),
            tags: None,
        };
        assert!(project_markers(&[missing], "").is_empty());
    }

    #[test]
    fn test_query_matching() {
        let taqueria = place(
            1,
            0.0,
            0.0,
            &[("name", "La Taquería"), ("amenity", "restaurant"), ("cuisine", "mexican")],
        );
        assert!(matches_query(&taqueria, ""));
        assert!(matches_query(&taqueria, "  TAQUER "));
        assert!(matches_query(&taqueria, "restaurant"));
        assert!(matches_query(&taqueria, "Mexican"));
        assert!(!matches_query(&taqueria, "sushi"));

        let museum = place(2, 0.0, 0.0, &[("name", "Museo del Oro"), ("tourism", "museum")]);
        assert!(matches_query(&museum, "museum"));
    }

    #[test]
    fn test_marker_labels_and_categories() {
        let markers = project_markers(&[place(1, 0.0, 0.0, &[("amenity", "bar")])], "");
        assert_eq!(markers[0].label, UNNAMED_LABEL);
        assert_eq!(markers[0].emoji, "🍺");
        assert_eq!(markers[0].color, "purple");
    }

    #[test]
    fn test_layer_query_and_click() {
        let clicked = Arc::new(AtomicI64::new(0));
        let seen = Arc::clone(&clicked);
        let mut layer = MarkerLayer::new().with_click_handler(move |place| {
            seen.store(place.id, Ordering::SeqCst);
        });

        layer.set_places(&[
            place(1, 0.0, 0.0, &[("name", "Café Quindío"), ("amenity", "cafe")]),
            place(2, 1.0, 1.0, &[("name", "Bar Central"), ("amenity", "bar")]),
        ]);
        layer.set_query("cafe");
        assert_eq!(layer.matching().count(), 1);
        assert_eq!(layer.markers().len(), 2);

        // Non-matching markers stay clickable
        assert!(layer.click(2));
        assert_eq!(clicked.load(Ordering::SeqCst), 2);
        assert!(!layer.click(99));
    }
}
