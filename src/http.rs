use crate::config::HttpConfig;
use reqwest::Client;
use std::time::Duration;

/// Shared HTTP client for the storage and marketplace calls. Both timeouts
/// are mandatory: a hung marketplace call must surface as a batch-level
/// transport failure, not stall the whole scheduled run.
pub fn build_client(config: &HttpConfig) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}
