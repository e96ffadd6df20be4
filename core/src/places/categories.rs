//! Place categories for markers and notifications
//!
//! Maps OpenStreetMap tag values to an emoji, a short label and a color
//! token. Lookup order is `amenity`, then `tourism`, then `shop`.

use phf::phf_map;

use super::PointOfInterest;

/// Display attributes of a place category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub emoji: &'static str,
    pub label: &'static str,
    /// Marker color token
    pub color: &'static str,
}

impl Category {
    pub const fn new(emoji: &'static str, label: &'static str, color: &'static str) -> Self {
        Self { emoji, label, color }
    }
}

/// Used when no tag value is known
pub static FALLBACK_CATEGORY: Category = Category::new("📍", "Place", "gray");

static AMENITY_CATEGORIES: phf::Map<&'static str, Category> = phf_map! {
    "restaurant" => Category::new("🍽️", "Restaurant", "orange"),
    "cafe" => Category::new("☕", "Café", "amber"),
    "bar" => Category::new("🍺", "Bar", "purple"),
    "pub" => Category::new("🍺", "Pub", "purple"),
    "fast_food" => Category::new("🍕", "Fast food", "red"),
    "ice_cream" => Category::new("🍦", "Ice cream", "pink"),
};

static TOURISM_CATEGORIES: phf::Map<&'static str, Category> = phf_map! {
    "museum" => Category::new("🏛️", "Museum", "blue"),
    "gallery" => Category::new("🏛️", "Gallery", "blue"),
    "attraction" => Category::new("🎨", "Attraction", "indigo"),
    "artwork" => Category::new("🎨", "Artwork", "indigo"),
};

// Label only: shops never pass verification
static SHOP_CATEGORIES: phf::Map<&'static str, Category> = phf_map! {
    "bakery" => Category::new("🥐", "Bakery", "yellow"),
    "books" => Category::new("📚", "Bookshop", "teal"),
    "clothes" => Category::new("👕", "Clothing", "teal"),
    "convenience" => Category::new("🛒", "Convenience store", "green"),
    "supermarket" => Category::new("🛒", "Supermarket", "green"),
    "gift" => Category::new("🎁", "Gift shop", "teal"),
};

/// Look up a category by tag key and value
pub fn lookup_category(key: &str, value: &str) -> Option<&'static Category> {
    match key {
        "amenity" => AMENITY_CATEGORIES.get(value),
        "tourism" => TOURISM_CATEGORIES.get(value),
        "shop" => SHOP_CATEGORIES.get(value),
        _ => None,
    }
}

pub fn category_for(place: &PointOfInterest) -> &'static Category {
    ["amenity", "tourism", "shop"]
        .into_iter()
        .find_map(|key| place.tag(key).and_then(|value| lookup_category(key, value)))
        .unwrap_or(&FALLBACK_CATEGORY)
}
