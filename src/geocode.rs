//! Address lookup.
//!
//! The session treats every failure here (transport error, bad payload, no
//! match) as "address not found"; implementations just report what happened.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::constants::{GEOCODER_ENDPOINT, GEOCODE_TIMEOUT};
use crate::core::geo::LatLng;
use crate::tiles::loader::{client_for, HTTP_CLIENT};
use crate::{MapError, Result};

/// Resolves a free-text address to a coordinate
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<LatLng>;
}

/// One entry of a Nominatim `format=json` search response
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Geocoder backed by a Nominatim search endpoint
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    endpoint: String,
    client: Option<reqwest::Client>,
    timeout: Duration,
}

impl NominatimGeocoder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: None,
            timeout: GEOCODE_TIMEOUT,
        }
    }

    /// Identifies requests with `user_agent` instead of the crate default
    pub fn with_user_agent(mut self, user_agent: &str) -> Result<Self> {
        self.client = client_for(user_agent)?;
        Ok(self)
    }

    /// Budget for the whole lookup, response body included
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn client(&self) -> &reqwest::Client {
        self.client.as_ref().unwrap_or(&HTTP_CLIENT)
    }

    async fn search(&self, address: &str) -> Result<Vec<NominatimPlace>> {
        let response = self
            .client()
            .get(&self.endpoint)
            .query(&[("format", "json"), ("q", address), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapError::HttpStatus {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        Ok(response.json().await?)
    }
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new(GEOCODER_ENDPOINT)
    }
}

/// Picks the first result of a search response
fn first_place(places: &[NominatimPlace], address: &str) -> Result<LatLng> {
    let place = places
        .first()
        .ok_or_else(|| MapError::GeocodeNotFound(address.to_string()))?;

    let parse = |value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| MapError::InvalidCoordinate(format!("unparseable coordinate {:?}", value)))
    };
    LatLng::try_new(parse(&place.lat)?, parse(&place.lon)?)
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<LatLng> {
        let places = tokio::time::timeout(self.timeout, self.search(address))
            .await
            .map_err(|_| MapError::Timeout(self.timeout))??;
        let coord = first_place(&places, address)?;
        log::debug!("geocoded {:?} to {:?}", address, coord);
        Ok(coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<NominatimPlace> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_first_place_is_used() {
        let places = parse(
            r#"[{"place_id": 1, "lat": "35.6585805", "lon": "139.7454329", "display_name": "Tokyo Tower"},
                {"place_id": 2, "lat": "0", "lon": "0"}]"#,
        );
        let coord = first_place(&places, "Tokyo Tower").unwrap();
        assert_eq!(coord, LatLng::new(35.6585805, 139.7454329));
    }

    #[test]
    fn test_empty_result_is_not_found() {
        let places = parse("[]");
        assert!(matches!(
            first_place(&places, "nowhere"),
            Err(MapError::GeocodeNotFound(a)) if a == "nowhere"
        ));
    }

    #[test]
    fn test_builder_settings() {
        let geocoder = NominatimGeocoder::default();
        assert_eq!(geocoder.endpoint(), GEOCODER_ENDPOINT);
        assert_eq!(geocoder.timeout(), GEOCODE_TIMEOUT);
        assert!(geocoder.client.is_none());

        let geocoder = NominatimGeocoder::default()
            .with_timeout(Duration::from_millis(750))
            .with_user_agent("my-school-lab/2.0")
            .unwrap();
        assert_eq!(geocoder.timeout(), Duration::from_millis(750));
        assert!(geocoder.client.is_some());
    }

    #[test]
    fn test_garbage_coordinates_are_rejected() {
        let places = parse(r#"[{"lat": "north", "lon": "1.0"}]"#);
        assert!(first_place(&places, "x").is_err());

        let places = parse(r#"[{"lat": "95.0", "lon": "1.0"}]"#);
        assert!(matches!(
            first_place(&places, "x"),
            Err(MapError::InvalidCoordinate(_))
        ));
    }
}
