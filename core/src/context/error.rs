//! Error types for configuration

use thiserror::Error;

/// Errors during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save configuration")]
    Save(#[source] confy::ConfyError),

    #[error("failed to resolve configuration path")]
    Path(#[source] confy::ConfyError),

    #[error("search radius must be greater than zero (got {radius})")]
    InvalidRadius { radius: u32 },

    #[error("proximity radius must be a positive number of meters (got {radius})")]
    InvalidProximityRadius { radius: f64 },
}
