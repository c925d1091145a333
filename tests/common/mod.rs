//! In-memory stand-ins for the tile servers and the geocoder.

#![allow(dead_code)]

use async_trait::async_trait;
use mapdraw::prelude::*;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const PRIMARY_SHADE: u8 = 40;
pub const FALLBACK_SHADE: u8 = 220;

/// A 256x256 single-colour PNG
pub fn png_tile(shade: u8) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(256, 256, image::Rgba([shade, shade, shade, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .expect("encode png fixture");
    bytes
}

pub fn shade_of(image: &TileImage) -> u8 {
    image.to_rgba8().get_pixel(0, 0).0[0]
}

/// Serves `mock://primary/...` and `mock://fallback/...` URLs
#[derive(Default)]
pub struct MockTileServer {
    pub requests: Mutex<Vec<String>>,
    pub primary_down: bool,
    pub fallback_down: bool,
    pub primary_garbage: bool,
    pub latency: Duration,
}

impl MockTileServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            ..Default::default()
        })
    }

    pub fn count(&self, host: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.starts_with(&format!("mock://{}/", host)))
            .count()
    }

    pub fn last_request(&self) -> Option<String> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TileFetcher for MockTileServer {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let primary = url.starts_with("mock://primary/");
        let down = if primary {
            self.primary_down
        } else {
            self.fallback_down
        };
        if down {
            return Err(MapError::HttpStatus {
                status: 502,
                url: url.to_string(),
            });
        }
        if primary && self.primary_garbage {
            return Ok(b"<html>not a tile</html>".to_vec());
        }
        Ok(png_tile(if primary { PRIMARY_SHADE } else { FALLBACK_SHADE }))
    }
}

/// Fixed address book; `"offline"` simulates a transport failure and
/// `"unresponsive"` a server that never answers
#[derive(Default)]
pub struct MockGeocoder {
    pub lookups: AtomicUsize,
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<LatLng> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match address {
            "Tokyo Tower" => Ok(LatLng::new(35.6586, 139.7454)),
            "Tokyo Station" => Ok(LatLng::new(35.6812, 139.7671)),
            "offline" => Err(MapError::Timeout(Duration::from_secs(10))),
            "unresponsive" => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(LatLng::new(0.0, 0.0))
            }
            other => Err(MapError::GeocodeNotFound(other.to_string())),
        }
    }
}

/// Routes `log` output through the test harness; safe to call repeatedly
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_config() -> MapConfig {
    MapConfig {
        geocode_timeout: Duration::from_millis(200),
        tiles: TileCacheConfig::for_testing(),
        ..MapConfig::default()
    }
}

pub fn session_with(server: Arc<MockTileServer>) -> MapSession {
    init_logging();
    let config = test_config();
    let tiles = TileCache::new(&config.tiles, server).expect("tile cache");
    MapSession::with_services(config, tiles, Arc::new(MockGeocoder::default())).expect("session")
}
