mod background_tasks;
mod config;
mod error;

pub use background_tasks::BackgroundTasks;
pub use config::{
    APP_NAME, AppConfig, AppConfigExt, DISTANCE_PRESETS, DistancePreset, LocationBackend,
    LocationConfig, NotificationPermission, NotificationSettings, OverpassConfig,
    ProximityConfig, preset_for,
};
pub use error::ConfigError;
