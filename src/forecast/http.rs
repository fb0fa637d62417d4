use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

const USER_AGENT: &str = "AddressWeather/0.1";
const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("Rate limited, retry after: {0}s")]
    RateLimited(u64),
    #[error("API error: {0}")]
    ApiError(String),
}

/// Thin GET-and-decode wrapper shared by the upstream clients.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
            retry_base_delay: RETRY_BASE_DELAY,
        })
    }

    pub fn with_retry(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    /// GET `url` with `params` and decode the JSON body. Only 429 responses are retried.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, HttpError> {
        let mut retry_count = 0;
        let mut delay = self.retry_base_delay;

        loop {
            let response = self.client.get(url).query(params).send().await?;

            match response.status() {
                status if status.is_success() => {
                    let body = response.text().await?;
                    return Ok(serde_json::from_str(&body)?);
                }
                reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    if retry_count >= self.max_retries {
                        return Err(HttpError::RateLimited(delay.as_secs()));
                    }

                    tracing::warn!(
                        "Rate limited by {}, retrying in {}ms",
                        url,
                        delay.as_millis()
                    );

                    sleep(delay).await;
                    delay = delay.mul_f32(2.0 + fastrand::f32() * 0.5); // Exponential backoff with jitter
                    retry_count += 1;
                }
                status => {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(HttpError::ApiError(format!("HTTP {}: {}", status, error_text)));
                }
            }
        }
    }
}
