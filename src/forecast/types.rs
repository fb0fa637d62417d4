use serde::{Deserialize, Serialize};

/// One day of the extended forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: String,
    pub max_temperature: f64,
    pub min_temperature: f64,
}

/// Current temperature plus the daily series for one resolved location.
/// `daily` keeps the upstream (chronological) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub current_temperature: f64,
    pub daily: Vec<DailyForecast>,
}

impl ForecastSnapshot {
    /// Today's record, i.e. the first day of the series.
    pub fn today(&self) -> Option<&DailyForecast> {
        self.daily.first()
    }
}

/// A geocoder's answer for a free-text address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedAddress {
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
}

// Google Geocoding API

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: String,
    pub geometry: GeocodeGeometry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeGeometry {
    pub location: GeocodeLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeLocation {
    pub lat: f64,
    pub lng: f64,
}

impl From<GeocodeResult> for GeocodedAddress {
    fn from(result: GeocodeResult) -> Self {
        Self {
            formatted_address: result.formatted_address,
            latitude: result.geometry.location.lat,
            longitude: result.geometry.location.lng,
        }
    }
}

// Open-Meteo forecast API

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMeteoResponse {
    pub current: OpenMeteoCurrent,
    pub daily: OpenMeteoDaily,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMeteoCurrent {
    pub temperature_2m: f64,
}

/// Parallel daily series; index `i` of each vector describes the same day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenMeteoDaily {
    pub time: Vec<String>,
    pub temperature_2m_max: Vec<f64>,
    pub temperature_2m_min: Vec<f64>,
}
