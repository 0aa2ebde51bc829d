//! Transform program capability and its process-backed implementation
//!
//! A transform program is opaque to the fetcher: it is loaded once per
//! entry and its entry point is called with the entry's input blobs as
//! positional arguments. No state survives between entries.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::config::TransformConfig;
use crate::constants::transform::MISSING_ENTRY_POINT_EXIT_CODE;
use crate::errors::{TransformError, TransformResult};

/// A program loaded for one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProgram {
    /// Where the program was read from
    pub path: PathBuf,
    /// Program source
    pub source: String,
}

/// Load-and-invoke capability over some scripting mechanism
#[async_trait]
pub trait TransformEngine: Send + Sync {
    /// Read the program at `program`
    async fn load(&self, program: &Path) -> TransformResult<LoadedProgram>;

    /// Call the program's entry point with `inputs`, returning its text output
    async fn invoke(&self, program: &LoadedProgram, inputs: Vec<String>)
        -> TransformResult<String>;
}

/// Host script run by the interpreter. Reads one request from stdin,
/// evaluates the program in a fresh context and prints the entry point's
/// return value. Program logging goes to stderr so stdout stays clean.
const HOST_SCRIPT: &str = r#"
const vm = require('vm');
let raw = '';
process.stdin.setEncoding('utf8');
process.stdin.on('data', (chunk) => { raw += chunk; });
process.stdin.on('end', () => {
  const request = JSON.parse(raw);
  const log = (...args) => process.stderr.write(args.join(' ') + '\n');
  const context = vm.createContext({ console: { log, info: log, warn: log, error: log } });
  vm.runInContext(request.source, context, { filename: request.filename });
  const entry = context[request.entryPoint];
  if (typeof entry !== 'function') {
    process.exit(3);
  }
  const result = entry.apply(null, request.inputs);
  process.stdout.write(String(result));
});
"#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HostRequest<'a> {
    source: &'a str,
    filename: String,
    entry_point: &'a str,
    inputs: &'a [String],
}

/// Runs programs in an external interpreter process (node by default)
#[derive(Debug, Clone, Default)]
pub struct ProcessEngine {
    config: TransformConfig,
}

impl ProcessEngine {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }
}

#[async_trait]
impl TransformEngine for ProcessEngine {
    async fn load(&self, program: &Path) -> TransformResult<LoadedProgram> {
        let source = tokio::fs::read_to_string(program)
            .await
            .map_err(|source| TransformError::Io {
                path: program.to_path_buf(),
                source,
            })?;
        Ok(LoadedProgram {
            path: program.to_path_buf(),
            source,
        })
    }

    async fn invoke(
        &self,
        program: &LoadedProgram,
        inputs: Vec<String>,
    ) -> TransformResult<String> {
        let request = serde_json::to_vec(&HostRequest {
            source: &program.source,
            filename: program.path.display().to_string(),
            entry_point: &self.config.entry_point,
            inputs: &inputs,
        })?;

        debug!(
            "Invoking {} with {} inputs via {}",
            program.path.display(),
            inputs.len(),
            self.config.interpreter
        );

        let mut child = Command::new(&self.config.interpreter)
            .arg("-e")
            .arg(HOST_SCRIPT)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TransformError::Spawn {
                interpreter: self.config.interpreter.clone(),
                source,
            })?;

        // Feed stdin concurrently so a chatty program cannot deadlock on a full pipe
        let stdin = child.stdin.take();
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&request).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| TransformError::Timeout {
                program: program.path.clone(),
                seconds: self.config.timeout.as_secs(),
            })?
            .map_err(|source| TransformError::Io {
                path: program.path.clone(),
                source,
            })?;
        let _ = writer.await;

        if output.status.code() == Some(MISSING_ENTRY_POINT_EXIT_CODE) {
            return Err(TransformError::MissingEntryPoint {
                program: program.path.clone(),
                entry_point: self.config.entry_point.clone(),
            });
        }
        if !output.status.success() {
            return Err(TransformError::ProgramFailed {
                program: program.path.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| TransformError::InvalidOutput {
            program: program.path.clone(),
        })
    }
}
