//! Shared configuration types for Lugabiz
//!
//! This crate contains serializable configuration and value types that are shared
//! between the pipeline core (lugabiz-core) and any frontend that binds to it.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Distance Presets
// ─────────────────────────────────────────────────────────────────────────────

/// A selectable search radius shown in the distance filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistancePreset {
    pub label: &'static str,
    pub meters: u32,
}

/// Radius choices offered to the user, smallest first.
pub const DISTANCE_PRESETS: &[DistancePreset] = &[
    DistancePreset { label: "nearby", meters: 500 },
    DistancePreset { label: "5 km", meters: 5_000 },
    DistancePreset { label: "10 km", meters: 10_000 },
    DistancePreset { label: "15 km", meters: 15_000 },
    DistancePreset { label: "20 km", meters: 20_000 },
    DistancePreset { label: "25 km", meters: 25_000 },
    DistancePreset { label: "30 km", meters: 30_000 },
];

/// Find the preset matching a radius exactly, if any.
pub fn preset_for(meters: u32) -> Option<&'static DistancePreset> {
    DISTANCE_PRESETS.iter().find(|p| p.meters == meters)
}

// ─────────────────────────────────────────────────────────────────────────────
// Notification Permission
// ─────────────────────────────────────────────────────────────────────────────

/// System notification permission, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// The user has not decided yet
    #[default]
    Default,
}

impl NotificationPermission {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied)
    }

    /// User-facing message shown after a permission prompt resolves
    pub fn message(&self) -> &'static str {
        match self {
            Self::Granted => "Thanks for allowing notifications! We'll keep you posted about places nearby.",
            Self::Denied => {
                "No problem, you won't get notifications. You can enable them later in your system settings."
            }
            Self::Default => "You haven't decided about notifications yet. You can change this at any time.",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Location Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Which geolocation backend feeds the position source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationBackend {
    /// A fixed coordinate taken from `fixed_lat` / `fixed_lon`
    #[default]
    Fixed,
    /// Follow `lat,lon` lines appended to `track_file`
    TrackFile,
    /// Pretend the platform has no geolocation
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub backend: LocationBackend,
    #[serde(default = "default_fixed_lat")]
    pub fixed_lat: f64,
    #[serde(default = "default_fixed_lon")]
    pub fixed_lon: f64,
    #[serde(default)]
    pub track_file: String,
}

// Plaza de Bolívar, Bogotá
fn default_fixed_lat() -> f64 {
    4.598_056
}

fn default_fixed_lon() -> f64 {
    -74.075_833
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            backend: LocationBackend::Fixed,
            fixed_lat: default_fixed_lat(),
            fixed_lon: default_fixed_lon(),
            track_file: String::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Overpass Settings
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Client-side bound on a single request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Server-side `[timeout:N]` written into the query (capped at 25)
    #[serde(default = "default_server_timeout_secs")]
    pub server_timeout_secs: u32,
    /// `out body N;` result bound (capped at 100)
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_endpoint() -> String {
    DEFAULT_OVERPASS_ENDPOINT.to_string()
}

fn default_user_agent() -> String {
    "Lugabiz/0.1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_server_timeout_secs() -> u32 {
    25
}

fn default_max_results() -> u32 {
    100
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            server_timeout_secs: default_server_timeout_secs(),
            max_results: default_max_results(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Proximity Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Tuning for proximity notifications.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProximityConfig {
    /// A place closer than this is considered "nearby"
    #[serde(default = "default_proximity_radius")]
    pub radius_m: f64,
    /// Minimum time between two notifications for the same place
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u32,
    /// Rolling one-hour budget across all places
    #[serde(default = "default_max_per_hour")]
    pub max_notifications_per_hour: u32,
}

fn default_proximity_radius() -> f64 {
    100.0
}

fn default_cooldown_minutes() -> u32 {
    30
}

fn default_max_per_hour() -> u32 {
    3
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            radius_m: default_proximity_radius(),
            cooldown_minutes: default_cooldown_minutes(),
            max_notifications_per_hour: default_max_per_hour(),
        }
    }
}

impl ProximityConfig {
    pub fn cooldown_millis(&self) -> i64 {
        i64::from(self.cooldown_minutes) * 60 * 1000
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Use native desktop notifications instead of log output
    #[serde(default = "default_true")]
    pub desktop: bool,
    /// Last answer to the permission prompt, so a denial is never asked again
    #[serde(default)]
    pub remembered_permission: Option<NotificationPermission>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            desktop: true,
            remembered_permission: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// App Config
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level application configuration
///
/// Note: Persistence methods (load/save) are provided by lugabiz-core via the
/// `AppConfigExt` trait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_radius")]
    pub default_radius_m: u32,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub overpass: OverpassConfig,
    #[serde(default)]
    pub proximity: ProximityConfig,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

fn default_radius() -> u32 {
    DISTANCE_PRESETS[0].meters
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_radius_m: default_radius(),
            location: LocationConfig::default(),
            overpass: OverpassConfig::default(),
            proximity: ProximityConfig::default(),
            notifications: NotificationSettings::default(),
        }
    }
}
