//! Configuration for map sessions and the tile cache
//!
//! Every field has a default, so a JSON document only needs to name what it
//! overrides. Durations are written as milliseconds.

use crate::core::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CENTER, DEFAULT_TILE_TEMPLATE, DEFAULT_ZOOM,
    FALLBACK_TILE_TEMPLATE, GEOCODER_ENDPOINT, GEOCODE_TIMEOUT, MAP_LINK_HOST, TILE_FETCH_TIMEOUT, USER_AGENT,
};
use crate::core::geo::LatLng;
use crate::core::view::validate_zoom;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for fetching and retaining raster tiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileCacheConfig {
    /// Maximum number of resident decoded tiles
    pub capacity: usize,
    /// Budget for each individual download (primary and fallback separately)
    #[serde(with = "duration_ms")]
    pub fetch_timeout: Duration,
    /// URL template with `{z}`, `{x}`, `{y}` and optional `{s}` placeholders
    pub primary_template: String,
    pub fallback_template: String,
    /// Values substituted for `{s}`
    pub subdomains: Vec<String>,
    pub user_agent: String,
}

impl Default for TileCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            fetch_timeout: TILE_FETCH_TIMEOUT,
            primary_template: DEFAULT_TILE_TEMPLATE.to_string(),
            fallback_template: FALLBACK_TILE_TEMPLATE.to_string(),
            subdomains: vec!["a".to_string()],
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Presets for TileCacheConfig
impl TileCacheConfig {
    pub fn low_memory() -> Self {
        Self {
            capacity: 32,
            ..Self::default()
        }
    }

    pub fn for_testing() -> Self {
        Self {
            capacity: 4,
            fetch_timeout: Duration::from_millis(200),
            primary_template: "mock://primary/{z}/{x}/{y}.png".to_string(),
            fallback_template: "mock://fallback/{z}/{x}/{y}.png".to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(MapError::CacheCapacityMisconfigured(self.capacity));
        }
        Ok(())
    }
}

/// Session-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub default_center: LatLng,
    pub default_zoom: u8,
    /// Host for `https://<host>/#map=...` links
    pub map_link_host: String,
    pub geocoder_endpoint: String,
    /// Budget for one address lookup; a lookup that overruns counts as not found
    #[serde(with = "duration_ms")]
    pub geocode_timeout: Duration,
    pub tiles: TileCacheConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: LatLng::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1),
            default_zoom: DEFAULT_ZOOM,
            map_link_host: MAP_LINK_HOST.to_string(),
            geocoder_endpoint: GEOCODER_ENDPOINT.to_string(),
            geocode_timeout: GEOCODE_TIMEOUT,
            tiles: TileCacheConfig::default(),
        }
    }
}

impl MapConfig {
    /// Parses and validates a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: MapConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.default_center.validate()?;
        validate_zoom(self.default_zoom)?;
        self.tiles.validate()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
