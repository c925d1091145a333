//! Core constants for the spherical Earth model, the Web-Mercator tile scheme
//! and the tile cache defaults.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

use std::time::Duration;

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Mean Earth radius used by the Haversine distance, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Ground resolution of zoom 0 at the equator (meters per pixel, 256px tiles).
pub const MERCATOR_METERS_PER_PIXEL: f64 = 156_543.033_92;

/// Flat meters-per-degree approximation used by the bounding-box estimator.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Latitude limit of the square Web-Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Highest zoom accepted; keeps tile indices and pixel math inside `u32`.
pub const MAX_ZOOM: u8 = 24;

/// Initial map center (Tokyo Metropolitan Government Building).
pub const DEFAULT_CENTER: (f64, f64) = (35.689185, 139.691648);

/// Initial zoom level of a new session.
pub const DEFAULT_ZOOM: u8 = 16;

/// Number of decoded tiles kept resident by default.
pub const DEFAULT_CACHE_CAPACITY: usize = 200;

/// Per-request budget for a single tile download.
pub const TILE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Primary raster source.
pub const DEFAULT_TILE_TEMPLATE: &str =
    "https://cartodb-basemaps-{s}.global.ssl.fastly.net/light_all/{z}/{x}/{y}.png";

/// Source retried once when the primary fails.
pub const FALLBACK_TILE_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Host used for shareable map links.
pub const MAP_LINK_HOST: &str = "www.openstreetmap.org";

/// Free-text address search endpoint.
pub const GEOCODER_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// User-Agent sent to tile and geocoding servers; public OSM servers reject anonymous clients.
pub const USER_AGENT: &str = "mapdraw/0.1.0";
