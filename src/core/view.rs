use crate::core::constants::{DEFAULT_CENTER, DEFAULT_ZOOM, MAX_ZOOM};
use crate::core::geo::LatLng;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// The current view of one map session: center and integer zoom.
///
/// Only [`MapView::set_center`] and [`MapView::set_zoom`] mutate it, and both
/// validate before writing, so a view never holds an out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    center: LatLng,
    zoom: u8,
}

impl MapView {
    /// Creates a new view, validating both center and zoom
    pub fn new(center: LatLng, zoom: u8) -> Result<Self> {
        center.validate()?;
        validate_zoom(zoom)?;
        Ok(Self { center, zoom })
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Sets the center of the view; the previous center is kept on error
    pub fn set_center(&mut self, center: LatLng) -> Result<()> {
        center.validate()?;
        self.center = center;
        Ok(())
    }

    /// Sets the zoom level; the previous zoom is kept on error
    pub fn set_zoom(&mut self, zoom: u8) -> Result<()> {
        validate_zoom(zoom)?;
        self.zoom = zoom;
        Ok(())
    }
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: LatLng::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1),
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Pixel dimensions of the surface a map image is rendered into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageFrame {
    width: f64,
    height: f64,
}

impl ImageFrame {
    pub fn new(width: f64, height: f64) -> Result<Self> {
        // NaN fails both comparisons
        if !(width > 0.0 && width.is_finite()) || !(height > 0.0 && height.is_finite()) {
            return Err(MapError::InvalidDimensions(format!(
                "image frame {}x{} must be positive",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

pub fn validate_zoom(zoom: u8) -> Result<()> {
    if zoom > MAX_ZOOM {
        return Err(MapError::InvalidZoom(format!(
            "zoom {} outside 0..={}",
            zoom, MAX_ZOOM
        )));
    }
    Ok(())
}

/// Builds a `https://<host>/#map=<zoom>/<lat>/<lon>` link.
pub fn map_url(host: &str, center: &LatLng, zoom: u8) -> String {
    format!("https://{}/#map={}/{}/{}", host, zoom, center.lat, center.lng)
}
