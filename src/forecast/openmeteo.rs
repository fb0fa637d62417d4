use super::http::{HttpClient, HttpError};
use super::types::*;
use super::ForecastSource;
use crate::config::Config;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("daily series lengths differ: {dates} dates, {maxes} maxes, {mins} mins")]
    MismatchedSeries {
        dates: usize,
        maxes: usize,
        mins: usize,
    },
}

/// Open-Meteo forecast client. Temperatures are requested in Fahrenheit.
pub struct OpenMeteoClient {
    http: HttpClient,
    config: Config,
}

impl OpenMeteoClient {
    pub fn new(config: Config) -> Result<Self, HttpError> {
        let http = HttpClient::new(config.http_timeout)?;
        Ok(Self { http, config })
    }

    #[cfg(test)]
    fn with_http(http: HttpClient, config: Config) -> Self {
        Self { http, config }
    }

    pub async fn get_forecast(&self, lat: f64, lon: f64) -> Result<ForecastSnapshot, ForecastError> {
        let url = format!(
            "{}{}",
            self.config.forecast_base_url, self.config.forecast_path
        );

        let response: OpenMeteoResponse = self
            .http
            .get_json(&url, &[
                ("latitude", &lat.to_string()),
                ("longitude", &lon.to_string()),
                ("current", "temperature_2m"),
                ("daily", "temperature_2m_max,temperature_2m_min"),
                ("temperature_unit", "fahrenheit"),
                ("wind_speed_unit", "mph"),
                ("precipitation_unit", "inch"),
            ])
            .await?;

        tracing::info!("Fetched forecast for ({}, {})", lat, lon);
        ForecastSnapshot::try_from(response)
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoClient {
    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastSnapshot, ForecastError> {
        self.get_forecast(latitude, longitude).await
    }
}

// Zip the parallel daily series into per-day records
impl TryFrom<OpenMeteoResponse> for ForecastSnapshot {
    type Error = ForecastError;

    fn try_from(response: OpenMeteoResponse) -> Result<Self, Self::Error> {
        let OpenMeteoDaily {
            time,
            temperature_2m_max,
            temperature_2m_min,
        } = response.daily;

        if time.len() != temperature_2m_max.len() || time.len() != temperature_2m_min.len() {
            return Err(ForecastError::MismatchedSeries {
                dates: time.len(),
                maxes: temperature_2m_max.len(),
                mins: temperature_2m_min.len(),
            });
        }

        let daily = time
            .into_iter()
            .zip(temperature_2m_max)
            .zip(temperature_2m_min)
            .map(|((date, max_temperature), min_temperature)| DailyForecast {
                date,
                max_temperature,
                min_temperature,
            })
            .collect();

        Ok(Self {
            current_temperature: response.current.temperature_2m,
            daily,
        })
    }
}
