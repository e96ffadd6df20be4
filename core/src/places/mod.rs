//! Points of interest returned by the POI source
//!
//! This module provides:
//! - **PointOfInterest**: one OpenStreetMap node with its tags
//! - **Verification**: the rule deciding which places are shown and notified
//! - **Categories**: static emoji/label/color lookup keyed by tag value

mod categories;
mod poi;

pub use categories::{Category, FALLBACK_CATEGORY, category_for, lookup_category};
pub use poi::{
    AMENITY_ALLOW_LIST, CONTACT_TAGS, OverpassResponse, PointOfInterest, TOURISM_ALLOW_LIST,
    verified_only,
};
