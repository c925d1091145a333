//! # mapdraw
//!
//! Geodesy, Web-Mercator projection and raster tile acquisition for
//! map-drawing blocks.
//!
//! The math in [`core`] is pure. [`tiles::TileCache`] is the only part with
//! side effects: it downloads, decodes and retains tiles, falling back to a
//! secondary server when the primary fails. [`session::MapSession`] ties a
//! view, the cache and a geocoder together, and [`blocks`] maps block opcodes
//! onto session calls.

pub mod blocks;
pub mod core;
pub mod geocode;
pub mod prelude;
pub mod session;
pub mod tiles;
pub use crate::core::constants;

use std::time::Duration;

// Re-export public API
pub use crate::core::{
    config::{MapConfig, TileCacheConfig},
    geo::{LatLng, Point, TileCoord},
    projection::BoundingBox,
    view::{ImageFrame, MapView},
};

pub use blocks::{run_block, Block, BlockOutput, BlockRequest};
pub use geocode::{Geocoder, NominatimGeocoder};
pub use session::{MapSession, MapTile};
pub use tiles::{HttpTileFetcher, TileCache, TileFetcher, TileImage, TileSource};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid zoom: {0}")]
    InvalidZoom(String),

    #[error("Invalid image dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Address not found: {0}")]
    GeocodeNotFound(String),

    #[error("Tile {coord} could not be fetched ({reason})")]
    TileFetchFailed { coord: TileCoord, reason: String },

    #[error("Tile cache capacity must be at least 1, got {0}")]
    CacheCapacityMisconfigured(usize),

    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = MapError;
