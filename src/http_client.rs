use reqwest::Client;
use std::time::Duration;

use crate::core::PixelError;

/// HTTP client with connection pooling and an overall request timeout
pub fn build(timeout: Duration) -> Result<Client, PixelError> {
    Client::builder()
        .timeout(timeout) // Image generation can take a while on cold models
        .pool_max_idle_per_host(5)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(PixelError::HttpClient)
}
