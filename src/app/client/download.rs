//! File download operations with atomic writes and streaming
//!
//! Every fetch writes to `<destination>.tmp` and renames it into place only
//! after the body has been fully written, so a failed fetch never replaces a
//! previously valid file.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler) -> Self {
        Self { http_handler }
    }

    /// Downloads `url` to `destination` using the temp file + rename pattern
    ///
    /// `http(s)` URLs go through the rate-limited client; `file` URLs are
    /// copied from the local filesystem.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the URL is invalid, the transfer fails,
    /// or the file cannot be moved into place
    pub async fn download_file(&self, url: &str, destination: &Path) -> DownloadResult<()> {
        let parsed_url = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            error: e.to_string(),
        })?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = temp_path_for(destination);
        let attempt = match parsed_url.scheme() {
            "http" | "https" => self.download_http(&parsed_url, &temp_path).await,
            "file" => copy_local(&parsed_url, &temp_path).await,
            scheme => Err(DownloadError::UnsupportedScheme {
                scheme: scheme.to_string(),
                url: url.to_string(),
            }),
        };

        if let Err(e) = attempt {
            if tokio::fs::try_exists(&temp_path).await.unwrap_or(false) {
                let _ = tokio::fs::remove_file(&temp_path).await;
            }
            return Err(e);
        }

        tokio::fs::rename(&temp_path, destination)
            .await
            .map_err(|_e| DownloadError::AtomicOperationFailed {
                temp_path: temp_path.clone(),
                final_path: destination.to_path_buf(),
            })?;

        tracing::debug!("Fetched {} -> {}", url, destination.display());
        Ok(())
    }

    /// Streams an HTTP response body into `temp_path`
    async fn download_http(&self, url: &Url, temp_path: &Path) -> DownloadResult<()> {
        let mut response = self.http_handler.get_response(url).await?;
        let mut file = File::create(temp_path).await?;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(())
    }
}

/// Copies a `file://` source into `temp_path`
async fn copy_local(url: &Url, temp_path: &Path) -> DownloadResult<()> {
    let source = url.to_file_path().map_err(|()| DownloadError::InvalidUrl {
        url: url.to_string(),
        error: "not a local file path".to_string(),
    })?;
    tokio::fs::copy(&source, temp_path).await?;
    Ok(())
}

/// Temporary sibling of `destination`, e.g. `dataset` -> `dataset.tmp`
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(files::TEMP_FILE_SUFFIX);
    destination.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::fs;

    use crate::app::client::config::ClientConfig;

    fn create_test_handler() -> HttpHandler {
        let config = ClientConfig::default();
        let client = config.build_http_client().unwrap();
        HttpHandler::new(client, 5).unwrap()
    }

    #[test]
    fn test_temp_file_path_generation() {
        assert_eq!(
            temp_path_for(Path::new("/tmp/test.csv")),
            PathBuf::from("/tmp/test.csv.tmp")
        );
        assert_eq!(
            temp_path_for(Path::new("/tmp/0/dataset")),
            PathBuf::from("/tmp/0/dataset.tmp")
        );
    }

    #[tokio::test]
    async fn test_file_url_download() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("source.json");
        fs::write(&source, "[1,2,3]").await.unwrap();
        let destination = temp_dir.path().join("out/0/dataset");

        let handler = create_test_handler();
        let url = Url::from_file_path(&source).unwrap();
        DownloadHandler::new(&handler)
            .download_file(url.as_str(), &destination)
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&destination).await.unwrap(), "[1,2,3]");
        assert!(!temp_path_for(&destination).exists());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_existing_file() {
        let temp_dir = tempdir().unwrap();
        let destination = temp_dir.path().join("dataset");
        fs::write(&destination, "previous").await.unwrap();

        let handler = create_test_handler();
        let missing = Url::from_file_path(temp_dir.path().join("missing.json")).unwrap();
        let result = DownloadHandler::new(&handler)
            .download_file(missing.as_str(), &destination)
            .await;

        assert!(matches!(result, Err(DownloadError::Io(_))));
        assert_eq!(fs::read_to_string(&destination).await.unwrap(), "previous");
        assert!(!temp_path_for(&destination).exists());
    }

    #[tokio::test]
    async fn test_invalid_and_unsupported_urls() {
        let temp_dir = tempdir().unwrap();
        let destination = temp_dir.path().join("dataset");
        let handler = create_test_handler();
        let download_handler = DownloadHandler::new(&handler);

        let result = download_handler.download_file("not-a-url", &destination).await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));

        let result = download_handler
            .download_file("ftp://example.com/data.zip", &destination)
            .await;
        assert!(matches!(result, Err(DownloadError::UnsupportedScheme { .. })));
        assert!(!destination.exists());
    }
}
