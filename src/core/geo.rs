use crate::core::constants::{EARTH_RADIUS_M, MAX_ZOOM};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate without range checks
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Creates a coordinate, rejecting NaN, infinities and out-of-range values
    pub fn try_new(lat: f64, lng: f64) -> Result<Self> {
        let coord = Self::new(lat, lng);
        coord.validate()?;
        Ok(coord)
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(MapError::InvalidCoordinate(format!(
                "latitude {} outside [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(MapError::InvalidCoordinate(format!(
                "longitude {} outside [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }

    /// Great-circle distance to another coordinate, in whole meters
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        distance(self, other)
    }

    /// Initial bearing towards another coordinate, in degrees
    pub fn bearing_to(&self, other: &LatLng) -> f64 {
        bearing(self, other)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Haversine distance on a sphere of radius [`EARTH_RADIUS_M`], rounded to the nearest meter.
pub fn distance(from: &LatLng, to: &LatLng) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    (EARTH_RADIUS_M * c).round()
}

/// Initial great-circle bearing, clockwise from north, in `[0, 360)` with one decimal.
pub fn bearing(from: &LatLng, to: &LatLng) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let y = delta_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();

    let degrees = (y.atan2(x).to_degrees() + 360.0) % 360.0;
    let rounded = (degrees * 10.0).round() / 10.0;
    // 359.96 rounds up to a full turn
    if rounded >= 360.0 {
        0.0
    } else {
        rounded
    }
}

/// Represents a point in screen or projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a tile coordinate in the slippy map tile system.
///
/// Two coordinates are the same cache key iff zoom, x and y all match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Canonical cache key for a `(zoom, x, y)` triple
    pub fn key(zoom: u8, x: u32, y: u32) -> Self {
        Self::new(x, y, zoom)
    }

    /// Converts tile coordinate to LatLng (northwest corner)
    pub fn north_west(&self) -> LatLng {
        let n = 2_f64.powi(self.z as i32);
        let lng = self.x as f64 / n * 360.0 - 180.0;
        let lat_rad = (PI * (1.0 - 2.0 * self.y as f64 / n)).sinh().atan();

        LatLng::new(lat_rad.to_degrees(), lng)
    }

    /// Checks if the tile is valid for its zoom level
    pub fn is_valid(&self) -> bool {
        if self.z > MAX_ZOOM {
            return false;
        }
        let max_coord = 2_u64.pow(self.z as u32);
        (self.x as u64) < max_coord && (self.y as u64) < max_coord
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.z, self.x, self.y)
    }
}
