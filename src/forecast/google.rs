use super::http::{HttpClient, HttpError};
use super::types::*;
use super::Geocoder;
use crate::config::Config;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("no results found for address: {0}")]
    NoResults(String),
    #[error("geocoder returned status {status}: {message}")]
    Status { status: String, message: String },
    #[error("unusable geocoding result {formatted_address:?} at ({latitude}, {longitude})")]
    UnusableResult {
        formatted_address: String,
        latitude: f64,
        longitude: f64,
    },
}

/// Google Geocoding API client.
pub struct GoogleGeocodeClient {
    http: HttpClient,
    config: Config,
}

impl GoogleGeocodeClient {
    pub fn new(config: Config) -> Result<Self, HttpError> {
        let http = HttpClient::new(config.http_timeout)?;
        Ok(Self { http, config })
    }

    #[cfg(test)]
    fn with_http(http: HttpClient, config: Config) -> Self {
        Self { http, config }
    }

    pub async fn geocode_address(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
        let url = format!(
            "{}{}",
            self.config.geocode_base_url, self.config.geocode_path
        );

        let response: GeocodeResponse = self
            .http
            .get_json(&url, &[
                ("address", address),
                ("key", &self.config.geocode_api_key),
            ])
            .await?;

        match response.status.as_deref() {
            None | Some("OK") | Some("ZERO_RESULTS") => {}
            Some(status) => {
                return Err(GeocodeError::Status {
                    status: status.to_string(),
                    message: response.error_message.unwrap_or_default(),
                });
            }
        }

        // The first result is the geocoder's best match.
        let result = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NoResults(address.to_string()))?;

        tracing::debug!("Geocoded {:?} to {:?}", address, result.formatted_address);
        Ok(result.into())
    }
}

#[async_trait]
impl Geocoder for GoogleGeocodeClient {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
        self.geocode_address(address).await
    }
}
