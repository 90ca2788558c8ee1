//! Shared outbound HTTP client

use anyhow::{Context, Result};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

use crate::config::HttpConfig;

/// Build the client every integration shares.
///
/// Transient failures are retried with exponential backoff only when
/// `max_retries > 0`.
pub fn build_client(config: &HttpConfig) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
        .user_agent(&config.user_agent)
        .build()
        .context("Failed to create HTTP client")?;

    let mut builder = ClientBuilder::new(client);
    if config.max_retries > 0 {
        let policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
    }

    Ok(builder.build())
}
