use crate::geo::GeoPosition;
use crate::places::{AMENITY_ALLOW_LIST, TOURISM_ALLOW_LIST};

/// Upper bound on `out body N;`
pub const MAX_RESULTS: u32 = 100;
/// Upper bound on the server-side `[timeout:N]`
pub const MAX_SERVER_TIMEOUT_SECS: u32 = 25;

/// Overpass QL request for named venues around a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverpassQuery {
    pub position: GeoPosition,
    pub radius_m: u32,
    pub server_timeout_secs: u32,
    pub max_results: u32,
}

impl OverpassQuery {
    pub fn new(position: GeoPosition, radius_m: u32) -> Self {
        Self {
            position,
            radius_m,
            server_timeout_secs: MAX_SERVER_TIMEOUT_SECS,
            max_results: MAX_RESULTS,
        }
    }

    pub fn with_limits(mut self, server_timeout_secs: u32, max_results: u32) -> Self {
        self.server_timeout_secs = server_timeout_secs;
        self.max_results = max_results;
        self
    }

    pub fn build(&self) -> String {
        let timeout = self.server_timeout_secs.clamp(1, MAX_SERVER_TIMEOUT_SECS);
        let limit = self.max_results.clamp(1, MAX_RESULTS);
        let around = format!(
            "around:{},{},{}",
            self.radius_m, self.position.lat, self.position.lon
        );

        format!(
            "[out:json][timeout:{timeout}];\n\
             (\n  \
               node[\"amenity\"~\"^({amenities})$\"][\"name\"]({around});\n  \
               node[\"tourism\"~\"^({tourism})$\"][\"name\"]({around});\n\
             );\n\
             out body {limit};",
            amenities = AMENITY_ALLOW_LIST.join("|"),
            tourism = TOURISM_ALLOW_LIST.join("|"),
        )
    }
}
