use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPosition;

use super::categories::{Category, category_for};

/// `amenity` values eligible for display and notification
pub const AMENITY_ALLOW_LIST: &[&str] = &["restaurant", "cafe", "bar", "pub", "fast_food", "ice_cream"];

/// `tourism` values eligible for display and notification
pub const TOURISM_ALLOW_LIST: &[&str] = &["museum", "gallery", "attraction", "artwork"];

/// Tags that show a place is real enough to recommend
pub const CONTACT_TAGS: &[&str] = &[
    "phone",
    "contact:phone",
    "website",
    "contact:website",
    "opening_hours",
    "addr:street",
];

/// A single OpenStreetMap node
///
/// Deserialized straight from an Overpass `elements` entry; fields the
/// pipeline does not use (`type`, `version`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: i64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
}

impl PointOfInterest {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_ref()?.get(key).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.tag("name")
    }

    /// Stable string id used for notification history and tags
    pub fn place_id(&self) -> String {
        self.id.to_string()
    }

    pub fn position(&self) -> Option<GeoPosition> {
        GeoPosition::new(self.lat?, self.lon?)
    }

    pub fn category(&self) -> &'static Category {
        category_for(self)
    }

    /// Named, has a contact signal, and is an allow-listed amenity or tourism spot
    pub fn is_verified(&self) -> bool {
        let has_name = self.name().is_some_and(|n| !n.trim().is_empty());
        let has_contact = CONTACT_TAGS.iter().any(|key| self.tag(key).is_some());
        let allowed_amenity = self
            .tag("amenity")
            .is_some_and(|v| AMENITY_ALLOW_LIST.contains(&v));
        let allowed_tourism = self
            .tag("tourism")
            .is_some_and(|v| TOURISM_ALLOW_LIST.contains(&v));

        has_name && has_contact && (allowed_amenity || allowed_tourism)
    }
}

/// Raw Overpass JSON response body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<PointOfInterest>,
}

pub fn verified_only(elements: Vec<PointOfInterest>) -> Vec<PointOfInterest> {
    elements.into_iter().filter(PointOfInterest::is_verified).collect()
}
