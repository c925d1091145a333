use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use image::DynamicImage;

use super::loader::{HttpTileFetcher, TileFetcher};
use super::source::{TileSource, UrlTemplateSource};
use crate::core::config::TileCacheConfig;
use crate::core::geo::TileCoord;
use crate::prelude::HashMap;
use crate::{MapError, Result};

/// Read-only handle to a decoded tile
pub type TileImage = Arc<DynamicImage>;

/// One fetch shared by every caller waiting on the same tile
type PendingTile = Shared<BoxFuture<'static, std::result::Result<TileImage, String>>>;

/// A resident tile
#[derive(Debug, Clone)]
pub struct TileCacheEntry {
    pub coord: TileCoord,
    pub image: TileImage,
    /// Monotonic insertion sequence; lower values are evicted first
    pub loaded_at: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<TileCoord, TileCacheEntry>,
    /// Insertion order, oldest at the front
    order: VecDeque<TileCoord>,
    in_flight: HashMap<TileCoord, PendingTile>,
    next_sequence: u64,
}

impl CacheState {
    /// Inserts and trims to `capacity`, returning the evicted keys
    fn insert(&mut self, coord: TileCoord, image: TileImage, capacity: usize) -> Vec<TileCoord> {
        if self.entries.contains_key(&coord) {
            self.order.retain(|c| *c != coord);
        }

        let loaded_at = self.next_sequence;
        self.next_sequence += 1;
        self.entries.insert(
            coord,
            TileCacheEntry {
                coord,
                image,
                loaded_at,
            },
        );
        self.order.push_back(coord);

        let mut evicted = Vec::new();
        while self.entries.len() > capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    evicted.push(oldest);
                }
                None => break,
            }
        }
        evicted
    }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bounded cache of decoded raster tiles with primary/fallback fetching.
///
/// * A resident tile is returned without I/O.
/// * A missing tile is downloaded from the primary source, then once from the
///   fallback source if that fails; each attempt gets its own timeout.
/// * Concurrent requests for the same missing tile share one download.
/// * Failures are not cached, the next request starts over.
/// * Eviction is strict insertion order (FIFO); reads do not refresh entries.
///
/// Clones share the same entries.
#[derive(Clone)]
pub struct TileCache {
    state: Arc<Mutex<CacheState>>,
    primary: Arc<dyn TileSource>,
    fallback: Arc<dyn TileSource>,
    fetcher: Arc<dyn TileFetcher>,
    capacity: usize,
    fetch_timeout: Duration,
}

impl TileCache {
    /// Create a cache from `config` that downloads through `fetcher`
    pub fn new(config: &TileCacheConfig, fetcher: Arc<dyn TileFetcher>) -> Result<Self> {
        let primary = UrlTemplateSource::new(config.primary_template.clone())
            .with_subdomains(config.subdomains.clone());
        let fallback = UrlTemplateSource::new(config.fallback_template.clone())
            .with_subdomains(config.subdomains.clone());

        Self::with_sources(
            config.capacity,
            config.fetch_timeout,
            Arc::new(primary),
            Arc::new(fallback),
            fetcher,
        )
    }

    /// Create a cache that downloads over HTTP
    pub fn http(config: &TileCacheConfig) -> Result<Self> {
        let fetcher = HttpTileFetcher::with_user_agent(&config.user_agent)?;
        Self::new(config, Arc::new(fetcher))
    }

    pub fn with_sources(
        capacity: usize,
        fetch_timeout: Duration,
        primary: Arc<dyn TileSource>,
        fallback: Arc<dyn TileSource>,
        fetcher: Arc<dyn TileFetcher>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(MapError::CacheCapacityMisconfigured(capacity));
        }
        Ok(Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            primary,
            fallback,
            fetcher,
            capacity,
            fetch_timeout,
        })
    }

    /// Returns the decoded tile for `coord`, downloading it if needed
    pub async fn fetch_tile(&self, coord: TileCoord) -> Result<TileImage> {
        if !coord.is_valid() {
            return Err(MapError::InvalidCoordinate(format!(
                "tile {} is outside its zoom level",
                coord
            )));
        }

        let pending = {
            let mut state = lock(&self.state);
            if let Some(entry) = state.entries.get(&coord) {
                log::debug!("tile {} served from cache", coord);
                return Ok(Arc::clone(&entry.image));
            }

            match state.in_flight.get(&coord).cloned() {
                Some(pending) => {
                    log::debug!("tile {} already loading, joining in-flight request", coord);
                    pending
                }
                None => {
                    let pending = self.start_load(coord);
                    state.in_flight.insert(coord, pending.clone());
                    pending
                }
            }
        };

        pending
            .await
            .map_err(|reason| MapError::TileFetchFailed { coord, reason })
    }

    fn start_load(&self, coord: TileCoord) -> PendingTile {
        let load = LoadRequest {
            coord,
            primary_url: self.primary.url(coord),
            fallback_url: self.fallback.url(coord),
            fetcher: Arc::clone(&self.fetcher),
            timeout: self.fetch_timeout,
            capacity: self.capacity,
            // Weak so an abandoned in-flight future cannot keep the cache alive
            state: Arc::downgrade(&self.state),
        };
        load.run().boxed().shared()
    }

    /// Get a resident tile without any I/O
    pub fn get(&self, coord: &TileCoord) -> Option<TileImage> {
        lock(&self.state)
            .entries
            .get(coord)
            .map(|entry| Arc::clone(&entry.image))
    }

    /// Insert an already decoded tile, evicting the oldest entries if full
    pub fn insert(&self, coord: TileCoord, image: TileImage) {
        let evicted = lock(&self.state).insert(coord, image, self.capacity);
        if !evicted.is_empty() {
            log::debug!("evicted {} tiles, oldest {}", evicted.len(), evicted[0]);
        }
    }

    /// Check if a tile is resident
    pub fn contains(&self, coord: &TileCoord) -> bool {
        lock(&self.state).entries.contains_key(coord)
    }

    /// Remove all resident tiles; downloads already in flight still complete and insert
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.entries.clear();
        state.order.clear();
    }

    /// Get the current number of cached tiles
    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resident keys, oldest first
    pub fn keys(&self) -> Vec<TileCoord> {
        lock(&self.state).order.iter().copied().collect()
    }

    /// Snapshot of a resident entry
    pub fn entry(&self, coord: &TileCoord) -> Option<TileCacheEntry> {
        lock(&self.state).entries.get(coord).cloned()
    }

    /// Number of downloads currently running
    pub fn in_flight_count(&self) -> usize {
        lock(&self.state).in_flight.len()
    }
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

struct LoadRequest {
    coord: TileCoord,
    primary_url: String,
    fallback_url: String,
    fetcher: Arc<dyn TileFetcher>,
    timeout: Duration,
    capacity: usize,
    state: Weak<Mutex<CacheState>>,
}

impl LoadRequest {
    async fn run(self) -> std::result::Result<TileImage, String> {
        let coord = self.coord;
        let result = match self.download(&self.primary_url).await {
            Ok(image) => Ok(image),
            Err(primary_err) => {
                log::warn!("tile {} primary source failed: {}", coord, primary_err);
                match self.download(&self.fallback_url).await {
                    Ok(image) => Ok(image),
                    Err(fallback_err) => {
                        log::error!("tile {} fallback source failed: {}", coord, fallback_err);
                        Err(format!(
                            "primary: {}; fallback: {}",
                            primary_err, fallback_err
                        ))
                    }
                }
            }
        };

        if let Some(shared) = self.state.upgrade() {
            let mut state = lock(&shared);
            state.in_flight.remove(&coord);
            if let Ok(image) = &result {
                let evicted = state.insert(coord, Arc::clone(image), self.capacity);
                log::info!(
                    "cached tile {} ({} resident, {} evicted)",
                    coord,
                    state.entries.len(),
                    evicted.len()
                );
            }
        }

        result
    }

    async fn download(&self, url: &str) -> Result<TileImage> {
        let bytes = tokio::time::timeout(self.timeout, self.fetcher.fetch(url))
            .await
            .map_err(|_| MapError::Timeout(self.timeout))??;
        let image = image::load_from_memory(&bytes)?;
        Ok(Arc::new(image))
    }
}
