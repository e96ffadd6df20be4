pub mod clock;
pub mod context;
pub mod geo;
pub mod location;
pub mod markers;
pub mod overpass;
pub mod pipeline;
pub mod places;
pub mod proximity;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SharedClock, SystemClock, system_clock};
pub use context::{AppConfig, AppConfigExt, BackgroundTasks, ConfigError};
pub use geo::{EARTH_RADIUS_M, GeoPosition, haversine_m};
pub use location::{
    AnyLocationProvider, LocationError, LocationProvider, PositionOptions, PositionSource,
    PositionState,
};
pub use markers::{Marker, MarkerLayer, Viewport, ViewportChange, project_markers, zoom_for_radius};
pub use overpass::{FetchError, FetchState, OverpassClient, PoiCache, PoiFetcher, PoiSource};
pub use pipeline::{PipelineCommand, PipelineHandle, PipelineService};
pub use places::{Category, PointOfInterest, category_for};
pub use proximity::{
    AnyNotificationSink, CheckOutcome, NotificationSink, NotifierStatus, ProximityNotification,
    ProximityNotifier, can_notify,
};
