use crate::core::geo::TileCoord;

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// Substitutes `{z}`, `{x}` and `{y}` in `template`.
///
/// The result is not checked for reachability.
pub fn tile_url(template: &str, coord: TileCoord) -> String {
    template
        .replace("{z}", &coord.z.to_string())
        .replace("{x}", &coord.x.to_string())
        .replace("{y}", &coord.y.to_string())
}

/// Source driven by a `{s}/{z}/{x}/{y}` style URL template.
#[derive(Debug, Clone)]
pub struct UrlTemplateSource {
    template: String,
    subdomains: Vec<String>,
}

impl UrlTemplateSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            subdomains: Vec::new(),
        }
    }

    pub fn with_subdomains(mut self, subdomains: Vec<String>) -> Self {
        self.subdomains = subdomains;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    fn subdomain(&self, coord: TileCoord) -> &str {
        if self.subdomains.is_empty() {
            return "a";
        }
        let idx = ((coord.x as u64 + coord.y as u64) % self.subdomains.len() as u64) as usize;
        &self.subdomains[idx]
    }
}

impl TileSource for UrlTemplateSource {
    fn url(&self, coord: TileCoord) -> String {
        let url = tile_url(&self.template, coord);
        if url.contains("{s}") {
            url.replace("{s}", self.subdomain(coord))
        } else {
            url
        }
    }
}
