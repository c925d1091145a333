//! Raster tile acquisition: URL templates, the network seam and the cache.

pub mod cache;
pub mod loader;
pub mod source;

// Re-exports for convenience
pub use cache::{TileCache, TileCacheEntry, TileImage};
pub use loader::{HttpTileFetcher, TileFetcher};
pub use source::{tile_url, TileSource, UrlTemplateSource};
