use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use address_weather::cache::ExpiringCache;
use address_weather::config::Config;
use address_weather::forecast::{
    google::GoogleGeocodeClient, openmeteo::OpenMeteoClient, service::ForecastService,
};
use address_weather::shell;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "address_weather=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize upstream clients
    let geocoder = GoogleGeocodeClient::new(config.clone())?;
    let forecaster = OpenMeteoClient::new(config.clone())?;

    // One cache for the whole session, swept in the background
    let cache = Arc::new(ExpiringCache::new(config.cache_ttl));
    let sweep = cache.start_auto_purge(config.purge_interval);
    tracing::info!(
        "Forecast cache ttl {:?}, sweep every {:?}",
        config.cache_ttl,
        config.purge_interval
    );

    let service = ForecastService::new(geocoder, forecaster, cache);

    shell::run(&service, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    sweep.stop().await;

    Ok(())
}
