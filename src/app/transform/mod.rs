//! Per-entry normalization into the canonical output
//!
//! [`TransformInvoker`] decides, per entry, whether the staged inputs are
//! run through the entry's transform program or copied verbatim, and
//! writes the canonical output file. The program itself is executed by a
//! [`TransformEngine`].

pub mod config;
pub mod encoding;
pub mod engine;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::app::client::download::temp_path_for;
use crate::app::layout::LocalLayout;
use crate::app::manifest::ManifestEntry;
use crate::errors::{TransformError, TransformResult};

pub use config::TransformConfig;
pub use engine::{LoadedProgram, ProcessEngine, TransformEngine};

/// One staged input file of an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub encoding: Option<String>,
}

/// Produces canonical outputs from staged downloads
#[derive(Clone)]
pub struct TransformInvoker {
    layout: LocalLayout,
    engine: Arc<dyn TransformEngine>,
}

impl std::fmt::Debug for TransformInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformInvoker")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl TransformInvoker {
    pub fn new(layout: LocalLayout, engine: Arc<dyn TransformEngine>) -> Self {
        Self { layout, engine }
    }

    pub fn layout(&self) -> &LocalLayout {
        &self.layout
    }

    /// Normalize one entry, returning the canonical output path.
    ///
    /// Entries without a schema, or whose fields would escape the layout,
    /// are rejected before anything is written. Without a converter the single
    /// staged input is copied as-is; with one, every input is decoded and
    /// passed to the program in order.
    pub async fn transform(&self, entry: &ManifestEntry) -> TransformResult<PathBuf> {
        entry
            .validate()
            .map_err(|source| TransformError::InvalidEntry {
                id: entry.id.clone(),
                source,
            })?;
        if !entry.has_schema() {
            return Err(TransformError::MissingSchema {
                id: entry.id.clone(),
            });
        }

        let output = self.layout.output_path(entry);
        match entry.converter {
            None => self.copy_verbatim(entry, &output).await?,
            Some(_) => self.run_program(entry, &output).await?,
        }

        info!("Transformed {} -> {}", entry.id, output.display());
        Ok(output)
    }

    /// Staged inputs in order: each download's extracted members in
    /// instruction order, or its raw payload when it is not an archive
    pub fn input_files(&self, entry: &ManifestEntry) -> Vec<InputFile> {
        let mut inputs = Vec::new();
        for (index, download) in entry.downloads.iter().enumerate() {
            match &download.extract {
                Some(extracts) => {
                    for extract in extracts {
                        inputs.push(InputFile {
                            path: self.layout.extract_path(entry, index, &extract.dst),
                            encoding: extract
                                .encoding
                                .clone()
                                .or_else(|| download.encoding.clone()),
                        });
                    }
                }
                None => inputs.push(InputFile {
                    path: self.layout.dataset_path(entry, index),
                    encoding: download.encoding.clone(),
                }),
            }
        }
        inputs
    }

    async fn copy_verbatim(&self, entry: &ManifestEntry, output: &Path) -> TransformResult<()> {
        match entry.downloads.len() {
            0 => {
                return Err(TransformError::NoDatasets {
                    id: entry.id.clone(),
                })
            }
            1 => {}
            count => {
                return Err(TransformError::AmbiguousDatasets {
                    id: entry.id.clone(),
                    count,
                })
            }
        }

        let mut inputs = self.input_files(entry);
        let input = match inputs.len() {
            0 => {
                return Err(TransformError::NoDatasets {
                    id: entry.id.clone(),
                })
            }
            1 => inputs.remove(0),
            count => {
                return Err(TransformError::AmbiguousDatasets {
                    id: entry.id.clone(),
                    count,
                })
            }
        };

        debug!("Copying {} verbatim for {}", input.path.display(), entry.id);
        let bytes = read_input(&input.path).await?;
        write_output(output, &bytes).await
    }

    async fn run_program(&self, entry: &ManifestEntry, output: &Path) -> TransformResult<()> {
        let program = self
            .engine
            .load(&self.layout.converter_path(entry))
            .await?;

        let mut blobs = Vec::new();
        for input in self.input_files(entry) {
            let bytes = read_input(&input.path).await?;
            blobs.push(encoding::decode(
                bytes,
                input.encoding.as_deref(),
                &input.path,
            )?);
        }

        debug!("Running {} over {} inputs", program.path.display(), blobs.len());
        let result = self.engine.invoke(&program, blobs).await?;
        write_output(output, result.as_bytes()).await
    }
}

async fn read_input(path: &Path) -> TransformResult<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|source| io_error(path, source))
}

/// Write `bytes` to `output` through a temp file so a failed run never
/// leaves a truncated canonical file behind
async fn write_output(output: &Path, bytes: &[u8]) -> TransformResult<()> {
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| io_error(parent, source))?;
    }

    let temp_path = temp_path_for(output);
    if let Err(e) = tokio::fs::write(&temp_path, bytes).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(io_error(&temp_path, e));
    }
    if let Err(e) = tokio::fs::rename(&temp_path, output).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(io_error(output, e));
    }
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> TransformError {
    TransformError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::manifest::{Download, Extract};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Joins its inputs with '|' and records what it saw
    #[derive(Default)]
    struct JoinEngine {
        seen: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl TransformEngine for JoinEngine {
        async fn load(&self, program: &Path) -> TransformResult<LoadedProgram> {
            Ok(LoadedProgram {
                path: program.to_path_buf(),
                source: String::new(),
            })
        }

        async fn invoke(
            &self,
            _program: &LoadedProgram,
            inputs: Vec<String>,
        ) -> TransformResult<String> {
            self.seen.lock().unwrap().push(inputs.clone());
            Ok(inputs.join("|"))
        }
    }

    fn download(extract: Option<Vec<Extract>>) -> Download {
        Download {
            src: "https://example.com/data".to_string(),
            encoding: None,
            extract,
        }
    }

    fn entry(downloads: Vec<Download>, converter: bool) -> ManifestEntry {
        ManifestEntry {
            id: "ca-bc-lund-art".to_string(),
            dataset_name: "Public Art".to_string(),
            country: "CA".to_string(),
            province: Some("BC".to_string()),
            region: None,
            city: Some("Lund".to_string()),
            provider: "Lund".to_string(),
            schema: Some("public-art".to_string()),
            converter: converter.then(|| "https://example.com/converter.js".to_string()),
            downloads,
        }
    }

    fn setup() -> (TempDir, TransformInvoker, Arc<JoinEngine>) {
        let temp_dir = TempDir::new().unwrap();
        let engine = Arc::new(JoinEngine::default());
        let invoker = TransformInvoker::new(LocalLayout::new(temp_dir.path()), engine.clone());
        (temp_dir, invoker, engine)
    }

    async fn stage(path: &Path, bytes: &[u8]) {
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, bytes).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_schema() {
        let (_dir, invoker, _) = setup();
        let mut e = entry(vec![download(None)], false);
        e.schema = None;

        let result = invoker.transform(&e).await;
        assert!(matches!(result, Err(TransformError::MissingSchema { .. })));
    }

    #[tokio::test]
    async fn test_unsafe_provider_writes_nothing() {
        let (dir, invoker, engine) = setup();
        let mut e = entry(vec![download(None)], false);
        e.provider = "..".to_string();

        match invoker.transform(&e).await {
            Err(TransformError::InvalidEntry { id, .. }) => assert_eq!(id, "ca-bc-lund-art"),
            other => panic!("Expected InvalidEntry, got {:?}", other),
        }
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verbatim_copy_is_byte_identical() {
        let (_dir, invoker, engine) = setup();
        let e = entry(vec![download(None)], false);
        let payload = b"{\"type\":\"FeatureCollection\",\"features\":[]}\xff";
        stage(&invoker.layout().dataset_path(&e, 0), payload).await;

        let output = invoker.transform(&e).await.unwrap();
        assert_eq!(tokio::fs::read(&output).await.unwrap(), payload.to_vec());
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verbatim_copy_overwrites_previous_output() {
        let (_dir, invoker, _) = setup();
        let e = entry(vec![download(None)], false);
        stage(&invoker.layout().dataset_path(&e, 0), b"new").await;
        stage(&invoker.layout().output_path(&e), b"old").await;

        invoker.transform(&e).await.unwrap();
        assert_eq!(
            tokio::fs::read(invoker.layout().output_path(&e)).await.unwrap(),
            b"new".to_vec()
        );
    }

    #[tokio::test]
    async fn test_verbatim_copy_of_single_extracted_member() {
        let (_dir, invoker, _) = setup();
        let e = entry(
            vec![download(Some(vec![Extract {
                src: "data/art.geojson".to_string(),
                dst: "art.geojson".to_string(),
                encoding: None,
            }]))],
            false,
        );
        stage(&invoker.layout().extract_path(&e, 0, "art.geojson"), b"{}").await;

        let output = invoker.transform(&e).await.unwrap();
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"{}".to_vec());
    }

    #[tokio::test]
    async fn test_ambiguous_without_converter() {
        let (_dir, invoker, _) = setup();
        let e = entry(vec![download(None), download(None)], false);

        match invoker.transform(&e).await {
            Err(TransformError::AmbiguousDatasets { count, .. }) => assert_eq!(count, 2),
            other => panic!("Expected AmbiguousDatasets, got {:?}", other),
        }
        assert!(!invoker.layout().output_path(&e).exists());
    }

    #[tokio::test]
    async fn test_no_datasets_without_converter() {
        let (_dir, invoker, _) = setup();
        let e = entry(vec![], false);
        assert!(matches!(
            invoker.transform(&e).await,
            Err(TransformError::NoDatasets { .. })
        ));
    }

    #[tokio::test]
    async fn test_program_receives_inputs_in_order() {
        let (_dir, invoker, engine) = setup();
        let mut raw = download(None);
        raw.encoding = Some("latin1".to_string());
        let e = entry(
            vec![
                download(Some(vec![
                    Extract {
                        src: "b.csv".to_string(),
                        dst: "second.csv".to_string(),
                        encoding: None,
                    },
                    Extract {
                        src: "a.csv".to_string(),
                        dst: "first.csv".to_string(),
                        encoding: None,
                    },
                ])),
                raw,
            ],
            true,
        );
        let layout = invoker.layout().clone();
        stage(&layout.extract_path(&e, 0, "second.csv"), b"one").await;
        stage(&layout.extract_path(&e, 0, "first.csv"), b"two").await;
        stage(&layout.dataset_path(&e, 1), &[b't', 0xE9]).await;

        let output = invoker.transform(&e).await.unwrap();
        assert_eq!(
            tokio::fs::read_to_string(&output).await.unwrap(),
            "one|two|té"
        );
        assert_eq!(engine.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_input_fails_entry() {
        let (_dir, invoker, _) = setup();
        let e = entry(vec![download(None)], true);

        let result = invoker.transform(&e).await;
        assert!(matches!(result, Err(TransformError::Io { .. })));
        assert!(!invoker.layout().output_path(&e).exists());
    }

    #[test]
    fn test_extract_encoding_overrides_download() {
        let (_dir, invoker, _) = setup();
        let mut d = download(Some(vec![
            Extract {
                src: "a".to_string(),
                dst: "a".to_string(),
                encoding: Some("utf-8".to_string()),
            },
            Extract {
                src: "b".to_string(),
                dst: "b".to_string(),
                encoding: None,
            },
        ]));
        d.encoding = Some("latin1".to_string());

        let inputs = invoker.input_files(&entry(vec![d], true));
        assert_eq!(inputs[0].encoding.as_deref(), Some("utf-8"));
        assert_eq!(inputs[1].encoding.as_deref(), Some("latin1"));
    }
}
