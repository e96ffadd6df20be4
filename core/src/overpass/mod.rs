//! Nearby POI fetching
//!
//! This module provides:
//! - **Query**: Overpass QL for allow-listed, named nodes around a point
//! - **Client**: `PoiSource` trait and the HTTP `OverpassClient`
//! - **Cache**: injectable 5-minute store keyed by rounded position + radius
//! - **Fetcher**: coalesces position jitter, serves cache hits, and makes sure
//!   only the newest request ever reaches the published state

mod cache;
mod client;
mod error;
mod fetcher;
mod query;


pub use cache::{CACHE_TTL, CacheEntry, PoiCache, cache_key};
pub use client::{OverpassClient, PoiSource};
pub use error::FetchError;
pub use fetcher::{FetchOutcome, FetchState, PoiFetcher};
pub use query::OverpassQuery;
