use std::future::Future;
use std::time::Duration;

use lugabiz_types::OverpassConfig;

use crate::geo::GeoPosition;
use crate::places::{OverpassResponse, PointOfInterest};

use super::error::FetchError;
use super::query::OverpassQuery;

/// Anything that can list raw POIs around a point
pub trait PoiSource: Send + Sync + 'static {
    fn fetch_pois(
        &self,
        position: GeoPosition,
        radius_m: u32,
    ) -> impl Future<Output = Result<Vec<PointOfInterest>, FetchError>> + Send;
}

/// Overpass API over HTTP
pub struct OverpassClient {
    http: reqwest::Client,
    endpoint: String,
    server_timeout_secs: u32,
    max_results: u32,
}

impl OverpassClient {
    pub fn new(config: &OverpassConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            server_timeout_secs: config.server_timeout_secs,
            max_results: config.max_results,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PoiSource for OverpassClient {
    async fn fetch_pois(
        &self,
        position: GeoPosition,
        radius_m: u32,
    ) -> Result<Vec<PointOfInterest>, FetchError> {
        let query = OverpassQuery::new(position, radius_m)
            .with_limits(self.server_timeout_secs, self.max_results)
            .build();

        tracing::debug!(endpoint = %self.endpoint, radius_m, %position, "Querying Overpass");

        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(FetchError::from_reqwest)?;
        let parsed: OverpassResponse = serde_json::from_str(&body).map_err(FetchError::Decode)?;

        tracing::debug!(elements = parsed.elements.len(), "Overpass response received");
        Ok(parsed.elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_configured_endpoint() {
        let config = OverpassConfig {
            endpoint: "http://localhost:9/api/interpreter".to_string(),
            ..OverpassConfig::default()
        };
        let client = OverpassClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9/api/interpreter");
        assert_eq!(client.max_results, 100);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_request_error() {
        let config = OverpassConfig {
            endpoint: "http://127.0.0.1:9/api/interpreter".to_string(),
            request_timeout_secs: 2,
            ..OverpassConfig::default()
        };
        let client = OverpassClient::new(&config).unwrap();
        let position = GeoPosition::new(4.6, -74.08).unwrap();

        let err = client.fetch_pois(position, 500).await.unwrap_err();
        assert!(!err.is_cancellation());
        assert!(!err.user_message().is_empty());
    }
}
