//! Error types for POI fetching

use thiserror::Error;

/// Errors while querying the POI source
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("search radius must be greater than zero")]
    InvalidRadius,

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("POI request failed")]
    Request(#[source] reqwest::Error),

    #[error("POI request timed out")]
    Timeout,

    #[error("POI source returned status {status}")]
    Status { status: u16 },

    #[error("failed to decode POI response")]
    Decode(#[source] serde_json::Error),

    #[error("POI request was superseded")]
    Cancelled,
}

impl FetchError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err)
        }
    }

    /// Superseded requests are not failures and never reach the error channel
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRadius => "Pick a search distance greater than zero.".to_string(),
            Self::Timeout => "Nearby places are taking too long to load. Try again in a moment.".to_string(),
            Self::Status { status: 429 } => {
                "The places service is busy right now. Try again in a moment.".to_string()
            }
            Self::Status { status } => format!("Could not load nearby places (error {status})."),
            Self::Client(_) | Self::Request(_) => {
                "Could not reach the places service. Check your connection.".to_string()
            }
            Self::Decode(_) => "The places service sent an unexpected response.".to_string(),
            Self::Cancelled => String::new(),
        }
    }
}
