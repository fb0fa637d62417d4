use super::google::GeocodeError;
use super::http::HttpError;
use super::openmeteo::ForecastError;
use super::types::*;
use super::{ForecastSource, Geocoder};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const ESPERANZA_ADDRESS: &str = "3001 Esperanza Crossing, Austin, TX 78758, USA";

/// Geocoder answering every query with the same result, or failing when none is set.
pub struct MockGeocoder {
    result: Option<GeocodedAddress>,
    calls: AtomicUsize,
}

impl MockGeocoder {
    pub fn resolving(formatted_address: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            result: Some(GeocodedAddress {
                formatted_address: formatted_address.to_string(),
                latitude,
                longitude,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn austin() -> Self {
        Self::resolving(ESPERANZA_ADDRESS, 30.3985991, -97.7225353)
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .clone()
            .ok_or_else(|| GeocodeError::NoResults(address.to_string()))
    }
}

/// Forecast source returning a fixed snapshot, or a 503 when none is set.
pub struct MockForecastSource {
    snapshot: Option<ForecastSnapshot>,
    calls: AtomicUsize,
}

impl MockForecastSource {
    pub fn returning(snapshot: ForecastSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            snapshot: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastSource for MockForecastSource {
    async fn forecast(&self, _latitude: f64, _longitude: f64) -> Result<ForecastSnapshot, ForecastError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot.clone().ok_or_else(|| {
            ForecastError::Http(HttpError::ApiError(
                "HTTP 503 Service Unavailable: upstream down".to_string(),
            ))
        })
    }
}

/// A week of daily records starting at 2024-09-19, warming then cooling.
pub fn sample_snapshot() -> ForecastSnapshot {
    let start = NaiveDate::from_ymd_opt(2024, 9, 19).unwrap_or_default();
    let daily = (0..7)
        .map(|day| {
            let base_temp = 90.0 + 5.0 * (day as f64 * 0.5).sin();
            DailyForecast {
                date: (start + Duration::days(day)).format("%Y-%m-%d").to_string(),
                max_temperature: base_temp + 7.6,
                min_temperature: base_temp - 14.2,
            }
        })
        .collect();

    ForecastSnapshot {
        current_temperature: 78.6,
        daily,
    }
}
