//! Core HTTP operations with rate limiting
//!
//! Requests are paced by a process-wide rate limiter so that a manifest with
//! many downloads from one host does not flood it. No retries are attempted;
//! a failed request is reported to the caller as-is.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::Client;
use url::Url;

use crate::errors::{DownloadError, DownloadResult};

type DirectRateLimiter = RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>;

/// HTTP operations handler with request pacing
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: DirectRateLimiter,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and rate limit
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::InvalidConfig` if the rate is zero
    pub fn new(client: Client, rate_limit_rps: u32) -> DownloadResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    fn build_rate_limiter(rate_limit_rps: u32) -> DownloadResult<DirectRateLimiter> {
        let rate = NonZeroU32::new(rate_limit_rps).ok_or_else(|| DownloadError::InvalidConfig {
            reason: "rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rate)))
    }

    /// Sends a GET request and checks the status.
    ///
    /// The response body is left unread for streaming by the caller.
    pub async fn get_response(&self, url: &Url) -> DownloadResult<reqwest::Response> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;

        let response = self.client.get(url.as_str()).send().await?;
        if !response.status().is_success() {
            return Err(DownloadError::ServerError {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        tracing::debug!("Fetched response headers: {}", url);
        Ok(response)
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}
