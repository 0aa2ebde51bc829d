//! Local directory layout for fetched and normalized datasets
//!
//! Structure:
//! - Locality: {root}/{dataset}/{country}[/{province}[/{region}]][/{city}]
//! - Canonical output: {locality}/{provider}.json
//! - Transform program: {locality}/{provider}/converter.js
//! - Raw download i: {locality}/{provider}/{i}/dataset
//! - Extracted member: {locality}/{provider}/{i}/{dst}
//!
//! Existing on-disk datasets rely on this layout; paths are derived on
//! demand and never stored.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::app::manifest::ManifestEntry;
use crate::constants::files;
use crate::errors::{LayoutError, LayoutResult};

/// Path generation for one layout root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalLayout {
    root: PathBuf,
}

impl LocalLayout {
    /// Create a layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every provider of the entry's locality
    pub fn locality_dir(&self, entry: &ManifestEntry) -> PathBuf {
        let mut path = self.root.join(&entry.dataset_name);
        for part in entry.location() {
            path.push(part);
        }
        path
    }

    /// Staging directory for the entry's provider
    pub fn provider_dir(&self, entry: &ManifestEntry) -> PathBuf {
        self.locality_dir(entry).join(&entry.provider)
    }

    /// Where the transform program is stored
    pub fn converter_path(&self, entry: &ManifestEntry) -> PathBuf {
        self.provider_dir(entry).join(files::CONVERTER_FILE_NAME)
    }

    /// Numbered staging directory of one download
    pub fn download_dir(&self, entry: &ManifestEntry, index: usize) -> PathBuf {
        self.provider_dir(entry).join(index.to_string())
    }

    /// Where download `index` is fetched to
    pub fn dataset_path(&self, entry: &ManifestEntry, index: usize) -> PathBuf {
        self.download_dir(entry, index).join(files::DATASET_FILE_NAME)
    }

    /// Where an extracted member of download `index` is written
    pub fn extract_path(&self, entry: &ManifestEntry, index: usize, dst: &str) -> PathBuf {
        self.download_dir(entry, index).join(dst)
    }

    /// Canonical normalized output of the entry
    pub fn output_path(&self, entry: &ManifestEntry) -> PathBuf {
        self.locality_dir(entry)
            .join(format!("{}.{}", entry.provider, files::OUTPUT_EXTENSION))
    }

    /// Canonical outputs for a list of entries, in order
    pub fn output_paths(&self, entries: &[ManifestEntry]) -> Vec<PathBuf> {
        entries.iter().map(|entry| self.output_path(entry)).collect()
    }

    /// Create the provider and download directories of an entry.
    ///
    /// With `overwrite`, the provider staging directory is removed first so
    /// stale downloads do not survive. Sibling providers are left alone.
    pub async fn prepare(&self, entry: &ManifestEntry, overwrite: bool) -> LayoutResult<()> {
        entry.validate()?;

        let provider_dir = self.provider_dir(entry);
        if overwrite && tokio::fs::metadata(&provider_dir).await.is_ok_and(|m| m.is_dir()) {
            debug!("Removing staging directory {}", provider_dir.display());
            tokio::fs::remove_dir_all(&provider_dir)
                .await
                .map_err(|source| LayoutError::RemoveDir {
                    path: provider_dir.clone(),
                    source,
                })?;
        }

        create_dir(&provider_dir).await?;
        for index in 0..entry.downloads.len() {
            create_dir(&self.download_dir(entry, index)).await?;
        }
        Ok(())
    }
}

async fn create_dir(path: &Path) -> LayoutResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| LayoutError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::manifest::Download;
    use tempfile::TempDir;

    fn entry(province: Option<&str>, region: Option<&str>, city: Option<&str>) -> ManifestEntry {
        ManifestEntry {
            id: "id".to_string(),
            dataset_name: "Public Art".to_string(),
            country: "CA".to_string(),
            province: province.map(String::from),
            region: region.map(String::from),
            city: city.map(String::from),
            provider: "New Westminster".to_string(),
            schema: None,
            converter: None,
            downloads: vec![
                Download {
                    src: "https://example.com/a".to_string(),
                    encoding: None,
                    extract: None,
                },
                Download {
                    src: "https://example.com/b".to_string(),
                    encoding: None,
                    extract: None,
                },
            ],
        }
    }

    #[test]
    fn test_output_path_full_hierarchy() {
        let layout = LocalLayout::new("/data");
        let e = entry(Some("BC"), Some("Metro Vancouver"), Some("New Westminster"));
        assert_eq!(
            layout.output_path(&e),
            PathBuf::from("/data/Public Art/CA/BC/Metro Vancouver/New Westminster/New Westminster.json")
        );
    }

    #[test]
    fn test_output_path_without_region() {
        let layout = LocalLayout::new("/data");
        let e = entry(Some("BC"), None, Some("Lund"));
        assert_eq!(
            layout.locality_dir(&e),
            PathBuf::from("/data/Public Art/CA/BC/Lund")
        );
    }

    #[test]
    fn test_country_only() {
        let layout = LocalLayout::new("/data");
        let e = entry(None, Some("ignored"), None);
        assert_eq!(layout.locality_dir(&e), PathBuf::from("/data/Public Art/CA"));
    }

    #[test]
    fn test_staging_paths() {
        let layout = LocalLayout::new("/data");
        let e = entry(Some("BC"), None, None);
        assert_eq!(
            layout.converter_path(&e),
            PathBuf::from("/data/Public Art/CA/BC/New Westminster/converter.js")
        );
        assert_eq!(
            layout.dataset_path(&e, 1),
            PathBuf::from("/data/Public Art/CA/BC/New Westminster/1/dataset")
        );
        assert_eq!(
            layout.extract_path(&e, 0, "out.csv"),
            PathBuf::from("/data/Public Art/CA/BC/New Westminster/0/out.csv")
        );
    }

    #[test]
    fn test_output_paths_in_order() {
        let layout = LocalLayout::new("/data");
        let mut second = entry(None, None, None);
        second.provider = "Other".to_string();
        let paths = layout.output_paths(&[entry(None, None, None), second]);
        assert_eq!(paths.len(), 2);
        assert!(paths[1].ends_with("Other.json"));
    }

    #[tokio::test]
    async fn test_prepare_creates_download_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let layout = LocalLayout::new(temp_dir.path());
        let e = entry(Some("BC"), None, Some("Lund"));

        layout.prepare(&e, false).await.unwrap();
        assert!(layout.download_dir(&e, 0).is_dir());
        assert!(layout.download_dir(&e, 1).is_dir());
    }

    #[tokio::test]
    async fn test_prepare_overwrite_clears_staging_only() {
        let temp_dir = TempDir::new().unwrap();
        let layout = LocalLayout::new(temp_dir.path());
        let e = entry(Some("BC"), None, Some("Lund"));

        layout.prepare(&e, false).await.unwrap();
        let stale = layout.dataset_path(&e, 0);
        tokio::fs::write(&stale, "old").await.unwrap();
        let sibling = layout.locality_dir(&e).join("Other.json");
        tokio::fs::write(&sibling, "{}").await.unwrap();

        layout.prepare(&e, true).await.unwrap();
        assert!(!stale.exists());
        assert!(layout.download_dir(&e, 0).is_dir());
        assert!(sibling.exists());
    }

    #[tokio::test]
    async fn test_prepare_rejects_invalid_component() {
        let temp_dir = TempDir::new().unwrap();
        let layout = LocalLayout::new(temp_dir.path());
        let mut e = entry(None, None, None);
        e.provider = "../escape".to_string();

        let result = layout.prepare(&e, false).await;
        assert!(matches!(result, Err(LayoutError::InvalidComponent { .. })));
    }
}
