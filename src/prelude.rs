//! Prelude module for common mapdraw types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapdraw::prelude::*;`

pub use crate::core::{
    config::{MapConfig, TileCacheConfig},
    geo::{bearing, distance, LatLng, Point, TileCoord},
    projection::{bounding_box, lat_lng_to_pixel, tile_for, BoundingBox},
    view::{ImageFrame, MapView},
};

pub use crate::blocks::{run_block, Block, BlockOutput, BlockRequest};

pub use crate::geocode::{Geocoder, NominatimGeocoder};

pub use crate::session::{MapSession, MapTile};

pub use crate::tiles::{
    cache::{TileCache, TileCacheEntry, TileImage},
    loader::{HttpTileFetcher, TileFetcher},
    source::{tile_url, TileSource, UrlTemplateSource},
};

pub use crate::{Error as MapError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
