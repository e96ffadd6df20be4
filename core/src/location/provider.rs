use std::future::Future;
use std::time::Duration;

use lugabiz_types::{LocationBackend, LocationConfig};
use tokio::sync::mpsc;

use crate::clock::SharedClock;
use crate::geo::GeoPosition;

use super::error::LocationError;
use super::fixed::{FixedLocation, UnsupportedLocation};
use super::track_file::TrackFileLocation;

/// Stream of readings from a continuous watch
pub type PositionUpdates = mpsc::Receiver<Result<GeoPosition, LocationError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached reading the provider may hand back
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// One-shot read that favors speed over precision
    pub const QUICK: Self = Self {
        high_accuracy: false,
        timeout: Duration::from_secs(5),
        maximum_age: Duration::from_secs(60),
    };

    /// Continuous high-accuracy tracking
    pub const WATCH: Self = Self {
        high_accuracy: true,
        timeout: Duration::from_secs(15),
        maximum_age: Duration::from_secs(10),
    };
}

/// Platform geolocation capability
pub trait LocationProvider: Send + Sync + 'static {
    fn is_supported(&self) -> bool;

    fn current_position(
        &self,
        options: PositionOptions,
    ) -> impl Future<Output = Result<GeoPosition, LocationError>> + Send;

    /// Start a watch; it stops once the receiver is dropped
    fn watch_position(&self, options: PositionOptions) -> PositionUpdates;
}

/// Provider selected at runtime from configuration
pub enum AnyLocationProvider {
    Fixed(FixedLocation),
    TrackFile(TrackFileLocation),
    Unsupported(UnsupportedLocation),
}

impl AnyLocationProvider {
    pub fn from_config(config: &LocationConfig, clock: SharedClock) -> Self {
        match config.backend {
            LocationBackend::Fixed => match GeoPosition::new(config.fixed_lat, config.fixed_lon) {
                Some(position) => Self::Fixed(FixedLocation::new(position)),
                None => {
                    tracing::warn!(
                        lat = config.fixed_lat,
                        lon = config.fixed_lon,
                        "Configured fixed location is not a valid coordinate"
                    );
                    Self::Unsupported(UnsupportedLocation)
                }
            },
            LocationBackend::TrackFile if config.track_file.trim().is_empty() => {
                tracing::warn!("Track file backend selected without a track_file path");
                Self::Unsupported(UnsupportedLocation)
            }
            LocationBackend::TrackFile => {
                Self::TrackFile(TrackFileLocation::new(config.track_file.trim(), clock))
            }
            LocationBackend::Unsupported => Self::Unsupported(UnsupportedLocation),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Fixed(_) => "fixed",
            Self::TrackFile(_) => "track_file",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

impl LocationProvider for AnyLocationProvider {
    fn is_supported(&self) -> bool {
        match self {
            Self::Fixed(p) => p.is_supported(),
            Self::TrackFile(p) => p.is_supported(),
            Self::Unsupported(p) => p.is_supported(),
        }
    }

    async fn current_position(&self, options: PositionOptions) -> Result<GeoPosition, LocationError> {
        match self {
            Self::Fixed(p) => p.current_position(options).await,
            Self::TrackFile(p) => p.current_position(options).await,
            Self::Unsupported(p) => p.current_position(options).await,
        }
    }

    fn watch_position(&self, options: PositionOptions) -> PositionUpdates {
        match self {
            Self::Fixed(p) => p.watch_position(options),
            Self::TrackFile(p) => p.watch_position(options),
            Self::Unsupported(p) => p.watch_position(options),
        }
    }
}
