pub mod google;
pub mod http;
#[cfg(test)]
pub mod mock;
pub mod openmeteo;
pub mod service;
pub mod types;

use async_trait::async_trait;
use google::GeocodeError;
use openmeteo::ForecastError;
use types::*;

/// Resolves a free-text address to a canonical address and coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodeError>;
}

/// Fetches the current temperature and daily series for a coordinate pair.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastSnapshot, ForecastError>;
}
