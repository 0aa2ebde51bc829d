//! Fetch client for remote datasets and transform programs
//!
//! The orchestrator only depends on the [`Fetcher`] trait, so the transport
//! can be swapped (mirrors, caches, test doubles). [`HttpFetcher`] is the
//! production implementation.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: Rate-limited HTTP requests
//! - `download`: File download operations with atomic writes

use std::path::Path;

use async_trait::async_trait;

use crate::errors::{DownloadError, DownloadResult};

pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;

use download::DownloadHandler;
use http::HttpHandler;

/// Retrieves one remote resource to one local path
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` into `destination`.
    ///
    /// On failure an existing `destination` is left untouched.
    async fn fetch(&self, url: &str, destination: &Path) -> DownloadResult<()>;
}

/// HTTP(S) and `file://` fetcher with request pacing
#[derive(Debug)]
pub struct HttpFetcher {
    http_handler: HttpHandler,
}

impl HttpFetcher {
    /// Creates a fetcher with default client settings
    pub fn new() -> DownloadResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a fetcher with custom client settings
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::InvalidConfig` if the settings do not
    /// validate, or `DownloadError::Http` if the client cannot be built
    pub fn with_config(config: ClientConfig) -> DownloadResult<Self> {
        config
            .validate()
            .map_err(|reason| DownloadError::InvalidConfig { reason })?;
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.rate_limit_rps)?;

        tracing::debug!(
            "Created HTTP fetcher ({} requests/s)",
            config.rate_limit_rps
        );

        Ok(Self { http_handler })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> DownloadResult<()> {
        DownloadHandler::new(&self.http_handler)
            .download_file(url, destination)
            .await
    }
}
