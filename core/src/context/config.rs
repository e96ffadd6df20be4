//! Application configuration
//!
//! This module re-exports shared types from lugabiz-types and provides
//! validation and persistence for AppConfig.

use std::path::{Path, PathBuf};

pub use lugabiz_types::{
    AppConfig, DISTANCE_PRESETS, DistancePreset, LocationBackend, LocationConfig,
    NotificationPermission, NotificationSettings, OverpassConfig, ProximityConfig, preset_for,
};

use super::error::ConfigError;

pub const APP_NAME: &str = "lugabiz";
const CONFIG_NAME: &str = "config";

// ─────────────────────────────────────────────────────────────────────────────
// AppConfig Extensions
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for AppConfig persistence
pub trait AppConfigExt: Sized {
    /// Stored configuration, or defaults if missing or unreadable
    fn load() -> Self;
    fn load_from(path: &Path) -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn save_to(&self, path: &Path) -> Result<(), ConfigError>;
    fn config_path() -> Result<PathBuf, ConfigError>;
    fn validate(&self) -> Result<(), ConfigError>;
    /// Record a notification permission decision; true if it changed
    fn remember_permission(&mut self, permission: NotificationPermission) -> bool;
}

impl AppConfigExt for AppConfig {
    fn load() -> Self {
        match confy::load::<AppConfig>(APP_NAME, CONFIG_NAME) {
            Ok(config) => match config.validate() {
                Ok(()) => config,
                Err(err) => {
                    tracing::warn!(error = %err, "Invalid configuration, using defaults");
                    AppConfig::default()
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load configuration, using defaults");
                AppConfig::default()
            }
        }
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = confy::load_path(path)?;
        config.validate()?;
        Ok(config)
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        confy::store_path(path, self).map_err(ConfigError::Save)
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).map_err(ConfigError::Path)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_radius_m == 0 {
            return Err(ConfigError::InvalidRadius {
                radius: self.default_radius_m,
            });
        }
        let proximity = self.proximity.radius_m;
        if !proximity.is_finite() || proximity <= 0.0 {
            return Err(ConfigError::InvalidProximityRadius { radius: proximity });
        }
        Ok(())
    }

    fn remember_permission(&mut self, permission: NotificationPermission) -> bool {
        if permission == NotificationPermission::Default
            || self.notifications.remembered_permission == Some(permission)
        {
            return false;
        }
        self.notifications.remembered_permission = Some(permission);
        true
    }
}
