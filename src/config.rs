use crate::cache::{DEFAULT_PURGE_INTERVAL, DEFAULT_TTL};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub geocode_api_key: String,
    pub geocode_base_url: String,
    pub geocode_path: String,
    pub forecast_base_url: String,
    pub forecast_path: String,
    pub cache_ttl: Duration,
    pub purge_interval: Duration,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            geocode_api_key: env::var("GEOCODE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("GEOCODE_API_KEY not set"))?,
            geocode_base_url: env::var("GEOCODE_BASE_URL")
                .unwrap_or_else(|_| "https://maps.googleapis.com".to_string()),
            geocode_path: env::var("GEOCODE_PATH")
                .unwrap_or_else(|_| "/maps/api/geocode/json".to_string()),
            forecast_base_url: env::var("FORECAST_BASE_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com".to_string()),
            forecast_path: env::var("FORECAST_PATH")
                .unwrap_or_else(|_| "/v1/forecast".to_string()),
            cache_ttl: secs_from_env("CACHE_TTL_SECS", DEFAULT_TTL)?,
            purge_interval: secs_from_env("CACHE_PURGE_INTERVAL_SECS", DEFAULT_PURGE_INTERVAL)?,
            http_timeout: secs_from_env("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT)?,
        })
    }

    /// Config pointing both clients at the given origin, for tests against a mock server.
    #[cfg(test)]
    pub fn for_base_url(base_url: &str) -> Self {
        Config {
            geocode_api_key: "test-key".to_string(),
            geocode_base_url: base_url.to_string(),
            geocode_path: "/maps/api/geocode/json".to_string(),
            forecast_base_url: base_url.to_string(),
            forecast_path: "/v1/forecast".to_string(),
            cache_ttl: DEFAULT_TTL,
            purge_interval: DEFAULT_PURGE_INTERVAL,
            http_timeout: Duration::from_secs(5),
        }
    }
}

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

fn secs_from_env(name: &str, default: Duration) -> anyhow::Result<Duration> {
    match env::var(name) {
        Ok(raw) => parse_secs(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_secs(name: &str, raw: &str) -> anyhow::Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds, got {:?}", name, raw))?;
    if secs == 0 {
        anyhow::bail!("{} must be greater than zero", name);
    }
    Ok(Duration::from_secs(secs))
}
