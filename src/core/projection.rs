//! Spherical Web-Mercator projection helpers.
//!
//! Pixel space is the standard slippy-map world of `256 * 2^zoom` pixels per
//! side with the origin at the north-west corner. Everything here is pure;
//! inputs outside the Mercator band are reported as errors instead of being
//! allowed to turn into `NaN` or infinities.

use crate::core::constants::{MAX_LATITUDE, MERCATOR_METERS_PER_PIXEL, METERS_PER_DEGREE, TILE_SIZE};
use crate::core::geo::{LatLng, Point, TileCoord};
use crate::core::view::{validate_zoom, ImageFrame, MapView};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Geographic extent of a rendered image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Checks if the box contains a point (edges inclusive)
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }
}

fn validate_mercator(lat_lng: &LatLng) -> Result<()> {
    lat_lng.validate()?;
    if lat_lng.lat.abs() > MAX_LATITUDE {
        return Err(MapError::InvalidCoordinate(format!(
            "latitude {} outside the Web-Mercator band (±{})",
            lat_lng.lat, MAX_LATITUDE
        )));
    }
    Ok(())
}

/// Steps of the 6-decimal grid the bounding box is reported on
const BOX_SCALE: f64 = 1e6;

/// Smallest 6-decimal value strictly above `bound`, and at least `value`
fn round_up_past(value: f64, bound: f64) -> f64 {
    let mut steps = (value * BOX_SCALE).ceil();
    while steps / BOX_SCALE <= bound {
        steps += 1.0;
    }
    steps / BOX_SCALE
}

/// Largest 6-decimal value strictly below `bound`, and at most `value`
fn round_down_past(value: f64, bound: f64) -> f64 {
    let mut steps = (value * BOX_SCALE).floor();
    while steps / BOX_SCALE >= bound {
        steps -= 1.0;
    }
    steps / BOX_SCALE
}

/// World size in pixels at `zoom`
fn world_size(zoom: u8) -> f64 {
    2_f64.powi(zoom as i32) * TILE_SIZE as f64
}

/// Projects a coordinate to world pixel space at `zoom`.
pub fn lat_lng_to_pixel(lat_lng: &LatLng, zoom: u8) -> Result<Point> {
    validate_mercator(lat_lng)?;
    validate_zoom(zoom)?;

    let size = world_size(zoom);
    let lat_rad = lat_lng.lat.to_radians();
    let x = (lat_lng.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * size;

    Ok(Point::new(x, y))
}

/// Tile containing `lat_lng` at `zoom`.
pub fn tile_for(lat_lng: &LatLng, zoom: u8) -> Result<TileCoord> {
    let pixel = lat_lng_to_pixel(lat_lng, zoom)?.floor();
    let tile = TILE_SIZE as f64;
    // lng = 180 (and the band edge in y) land exactly on the far world edge
    let max_index = (2_u64.pow(zoom as u32) - 1) as f64;
    let x = (pixel.x / tile).floor().clamp(0.0, max_index);
    let y = (pixel.y / tile).floor().clamp(0.0, max_index);

    Ok(TileCoord::new(x as u32, y as u32, zoom))
}

/// Approximates the area visible in `frame` when centered on `view`.
///
/// Uses the Web-Mercator ground resolution at the center latitude and a flat
/// 111 km per degree conversion. Edges are rounded outward to 6 decimals, so
/// the box strictly contains the center even when it spans less than one
/// rounding step.
pub fn bounding_box(view: &MapView, frame: &ImageFrame) -> Result<BoundingBox> {
    let center = view.center();
    validate_mercator(&center)?;

    let cos_lat = center.lat.to_radians().cos();
    let meters_per_pixel = MERCATOR_METERS_PER_PIXEL * cos_lat / 2_f64.powi(view.zoom() as i32);

    let half_height_m = frame.height() / 2.0 * meters_per_pixel;
    let half_width_m = frame.width() / 2.0 * meters_per_pixel;

    let lat_delta = half_height_m / METERS_PER_DEGREE;
    let lng_delta = half_width_m / (METERS_PER_DEGREE * cos_lat);

    Ok(BoundingBox {
        north: round_up_past(center.lat + lat_delta, center.lat),
        south: round_down_past(center.lat - lat_delta, center.lat),
        east: round_up_past(center.lng + lng_delta, center.lng),
        west: round_down_past(center.lng - lng_delta, center.lng),
    })
}
