use std::path::PathBuf;

use thiserror::Error;

/// Why a position could not be obtained
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("timed out waiting for a position fix")]
    Timeout,

    #[error("geolocation is not supported")]
    Unsupported,

    #[error("{0}")]
    Other(String),
}

impl LocationError {
    /// Message shown to the user; one per error kind
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => {
                "Location permission denied. Enable location access in your system settings.".into()
            }
            Self::PositionUnavailable => {
                "Location unavailable. Check your GPS or network connection.".into()
            }
            Self::Timeout => "Timed out waiting for your location. Try again.".into(),
            Self::Unsupported => "This device does not support geolocation.".into(),
            Self::Other(detail) if detail.is_empty() => {
                "Unknown error while getting your location.".into()
            }
            Self::Other(detail) => format!("Could not get your location: {detail}"),
        }
    }
}

/// Errors reading a GPS track file
#[derive(Debug, Error)]
pub enum TrackFileError {
    #[error("failed to open track file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read track file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TrackFileError {
    fn io_source(&self) -> &std::io::Error {
        match self {
            Self::Open { source, .. } | Self::Read { source, .. } => source,
        }
    }
}

impl From<TrackFileError> for LocationError {
    fn from(err: TrackFileError) -> Self {
        match err.io_source().kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            std::io::ErrorKind::NotFound => Self::PositionUnavailable,
            _ => Self::Other(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_each_kind_has_distinct_message() {
        let kinds = [
            LocationError::PermissionDenied,
            LocationError::PositionUnavailable,
            LocationError::Timeout,
            LocationError::Unsupported,
            LocationError::Other("gps daemon crashed".into()),
        ];
        let messages: HashSet<String> = kinds.iter().map(LocationError::user_message).collect();
        assert_eq!(messages.len(), kinds.len());
    }

    #[test]
    fn test_other_includes_detail() {
        let message = LocationError::Other("gps daemon crashed".into()).user_message();
        assert!(message.contains("gps daemon crashed"));
        assert!(LocationError::Other(String::new()).user_message().starts_with("Unknown"));
    }

    #[test]
    fn test_track_file_errors_map_to_location_kinds() {
        let missing = TrackFileError::Open {
            path: "/nope/track.csv".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(LocationError::from(missing), LocationError::PositionUnavailable);

        let denied = TrackFileError::Open {
            path: "/root/track.csv".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(LocationError::from(denied), LocationError::PermissionDenied);
    }
}
