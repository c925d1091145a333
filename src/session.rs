//! Map session: the state one block program works against.
//!
//! A session owns its [`MapView`] exclusively. The tile cache handle may be
//! shared with other sessions; it guards its own state.

use std::sync::Arc;

use crate::core::config::MapConfig;
use crate::core::geo::{self, LatLng, TileCoord};
use crate::core::projection::{self, BoundingBox};
use crate::core::view::{self, validate_zoom, ImageFrame, MapView};
use crate::geocode::{Geocoder, NominatimGeocoder};
use crate::tiles::cache::{TileCache, TileImage};
use crate::{MapError, Result};

/// A fetched tile and where it sits in the tile grid
#[derive(Debug, Clone)]
pub struct MapTile {
    pub coord: TileCoord,
    pub image: TileImage,
}

pub struct MapSession {
    view: MapView,
    config: MapConfig,
    tiles: TileCache,
    geocoder: Arc<dyn Geocoder>,
}

impl MapSession {
    /// Session backed by the HTTP tile servers and geocoder named in `config`
    pub fn new(config: MapConfig) -> Result<Self> {
        let tiles = TileCache::http(&config.tiles)?;
        let geocoder = NominatimGeocoder::new(config.geocoder_endpoint.clone())
            .with_user_agent(&config.tiles.user_agent)?
            .with_timeout(config.geocode_timeout);
        Self::with_services(config, tiles, Arc::new(geocoder))
    }

    pub fn with_services(
        config: MapConfig,
        tiles: TileCache,
        geocoder: Arc<dyn Geocoder>,
    ) -> Result<Self> {
        config.validate()?;
        let view = MapView::new(config.default_center, config.default_zoom)?;
        Ok(Self {
            view,
            config,
            tiles,
            geocoder,
        })
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn tile_cache(&self) -> &TileCache {
        &self.tiles
    }

    pub fn set_center(&mut self, lat: f64, lon: f64) -> Result<()> {
        self.view.set_center(LatLng::try_new(lat, lon)?)
    }

    pub fn set_zoom(&mut self, zoom: u8) -> Result<()> {
        self.view.set_zoom(zoom)
    }

    pub fn center(&self) -> LatLng {
        self.view.center()
    }

    pub fn latitude(&self) -> f64 {
        self.view.center().lat
    }

    pub fn longitude(&self) -> f64 {
        self.view.center().lng
    }

    pub fn zoom(&self) -> u8 {
        self.view.zoom()
    }

    /// Haversine distance in whole meters
    pub fn distance_between(&self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64> {
        let from = LatLng::try_new(lat1, lon1)?;
        let to = LatLng::try_new(lat2, lon2)?;
        Ok(geo::distance(&from, &to))
    }

    pub fn distance_from_center(&self, lat: f64, lon: f64) -> Result<f64> {
        let to = LatLng::try_new(lat, lon)?;
        Ok(geo::distance(&self.view.center(), &to))
    }

    /// Initial bearing in degrees, `[0, 360)`
    pub fn bearing_between(&self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64> {
        let from = LatLng::try_new(lat1, lon1)?;
        let to = LatLng::try_new(lat2, lon2)?;
        Ok(geo::bearing(&from, &to))
    }

    /// Area covered by a `width` x `height` pixel image of the current view
    pub fn bounding_box_of_view(&self, width: f64, height: f64) -> Result<BoundingBox> {
        let frame = ImageFrame::new(width, height)?;
        projection::bounding_box(&self.view, &frame)
    }

    /// Link to the current view
    pub fn map_url(&self) -> String {
        view::map_url(&self.config.map_link_host, &self.view.center(), self.view.zoom())
    }

    pub fn map_url_for(&self, lat: f64, lon: f64, zoom: u8) -> Result<String> {
        let center = LatLng::try_new(lat, lon)?;
        validate_zoom(zoom)?;
        Ok(view::map_url(&self.config.map_link_host, &center, zoom))
    }

    /// Tile covering `(lat, lon)` at `zoom`; the view is left untouched
    pub async fn fetch_tile_image(&self, lat: f64, lon: f64, zoom: u8) -> Result<MapTile> {
        let coord = projection::tile_for(&LatLng::try_new(lat, lon)?, zoom)?;
        let image = self.tiles.fetch_tile(coord).await?;
        Ok(MapTile { coord, image })
    }

    /// Moves the view to `(lat, lon, zoom)` and fetches the tile under the new center
    pub async fn draw_tile_map(&mut self, lat: f64, lon: f64, zoom: u8) -> Result<MapTile> {
        let center = LatLng::try_new(lat, lon)?;
        let coord = projection::tile_for(&center, zoom)?;

        self.view.set_center(center)?;
        self.view.set_zoom(zoom)?;
        log::info!("drawing map at {}, {} zoom {} (tile {})", lat, lon, zoom, coord);

        let image = self.tiles.fetch_tile(coord).await?;
        Ok(MapTile { coord, image })
    }

    /// Geocodes `address` and recenters on it; the view is unchanged on failure
    pub async fn set_center_by_address(&mut self, address: &str, zoom: u8) -> Result<LatLng> {
        validate_zoom(zoom)?;
        let center = self.resolve(address).await?;
        self.view.set_center(center)?;
        self.view.set_zoom(zoom)?;
        Ok(center)
    }

    pub async fn draw_tile_map_by_address(&mut self, address: &str, zoom: u8) -> Result<MapTile> {
        validate_zoom(zoom)?;
        let center = self.resolve(address).await?;
        self.draw_tile_map(center.lat, center.lng, zoom).await
    }

    pub fn clear_tile_cache(&self) {
        self.tiles.clear();
    }

    async fn resolve(&self, address: &str) -> Result<LatLng> {
        let budget = self.config.geocode_timeout;
        let lookup = tokio::time::timeout(budget, self.geocoder.geocode(address))
            .await
            .unwrap_or(Err(MapError::Timeout(budget)));

        match lookup {
            Ok(coord) => Ok(coord),
            Err(MapError::GeocodeNotFound(_)) => {
                log::warn!("address not found: {:?}", address);
                Err(MapError::GeocodeNotFound(address.to_string()))
            }
            Err(e) => {
                log::warn!("address lookup for {:?} failed: {}", address, e);
                Err(MapError::GeocodeNotFound(address.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for MapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSession")
            .field("view", &self.view)
            .field("tiles", &self.tiles)
            .finish()
    }
}
