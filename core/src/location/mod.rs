//! Device position
//!
//! This module provides:
//! - **LocationProvider**: the platform geolocation seam, with fixed,
//!   track-file and unsupported backends
//! - **PositionSource**: observable position state fed by a quick read and a
//!   continuous watch

mod error;
mod fixed;
mod provider;
mod source;
mod track_file;

pub use error::{LocationError, TrackFileError};
pub use fixed::{FixedLocation, UnsupportedLocation};
pub use provider::{AnyLocationProvider, LocationProvider, PositionOptions, PositionUpdates};
pub use source::{PositionSource, PositionState};
pub use track_file::{TrackFileLocation, parse_fix};
