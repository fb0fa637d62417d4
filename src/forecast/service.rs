use super::google::GeocodeError;
use super::openmeteo::ForecastError;
use super::types::ForecastSnapshot;
use super::{ForecastSource, Geocoder};
use crate::cache::ExpiringCache;
use crate::utils::{is_unresolved_coordinates, postal_code_key};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("error retrieving coordinates: {0}")]
    CoordinatesUnresolved(#[source] GeocodeError),
    #[error("error retrieving forecast: {0}")]
    ForecastUnavailable(#[source] ForecastError),
}

/// A forecast for a resolved address and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedForecast {
    pub canonical_address: String,
    pub snapshot: ForecastSnapshot,
    pub served_from_cache: bool,
}

/// Geocodes an address, then serves its forecast from the cache or upstream.
///
/// Cache entries are keyed by postal code, so different spellings of
/// addresses in one postal region share an entry. Concurrent misses for the
/// same key each fetch upstream; the last `put` wins.
pub struct ForecastService<G, F> {
    geocoder: G,
    forecaster: F,
    cache: Arc<ExpiringCache>,
}

impl<G: Geocoder, F: ForecastSource> ForecastService<G, F> {
    pub fn new(geocoder: G, forecaster: F, cache: Arc<ExpiringCache>) -> Self {
        Self {
            geocoder,
            forecaster,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ExpiringCache> {
        &self.cache
    }

    pub async fn resolve_forecast(&self, address: &str) -> Result<ResolvedForecast, LookupError> {
        let geocoded = self
            .geocoder
            .geocode(address)
            .await
            .map_err(LookupError::CoordinatesUnresolved)?;

        if geocoded.formatted_address.is_empty()
            || is_unresolved_coordinates(geocoded.latitude, geocoded.longitude)
        {
            return Err(LookupError::CoordinatesUnresolved(
                GeocodeError::UnusableResult {
                    formatted_address: geocoded.formatted_address,
                    latitude: geocoded.latitude,
                    longitude: geocoded.longitude,
                },
            ));
        }

        let key = postal_code_key(&geocoded.formatted_address);
        if key.is_empty() {
            tracing::debug!(
                "No postal code in {:?}, using the shared empty key",
                geocoded.formatted_address
            );
        }

        if let Some(snapshot) = self.cache.get(&key).await {
            tracing::debug!("Cache hit for {:?}", key);
            return Ok(ResolvedForecast {
                canonical_address: geocoded.formatted_address,
                snapshot,
                served_from_cache: true,
            });
        }

        tracing::debug!("Cache miss for {:?}", key);
        let snapshot = self
            .forecaster
            .forecast(geocoded.latitude, geocoded.longitude)
            .await
            .map_err(|e| {
                tracing::warn!("Forecast fetch failed for {:?}: {}", key, e);
                LookupError::ForecastUnavailable(e)
            })?;

        self.cache.put(key, snapshot.clone()).await;

        Ok(ResolvedForecast {
            canonical_address: geocoded.formatted_address,
            snapshot,
            served_from_cache: false,
        })
    }
}
