//! Error types for the geodata fetcher
//!
//! Each pipeline stage owns its error enum. Per-item errors (fetch, extract,
//! transform) are reported to the result sink where they happen and never
//! abort a batch; `AppError` unifies them for the CLI and for sink callbacks
//! that can carry more than one kind of failure.

use std::path::PathBuf;
use thiserror::Error;

/// Manifest loading and lookup errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Manifest file not found
    #[error("Manifest file not found: {path}")]
    NotFound { path: PathBuf },

    /// Malformed manifest JSON
    #[error("Malformed manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// I/O error reading manifest
    #[error("I/O error reading manifest")]
    Io(#[from] std::io::Error),

    /// Requested entry ids are not in the manifest
    #[error("Unknown manifest entries: {ids:?}")]
    UnknownEntries { ids: Vec<String> },
}

/// Fetch client (transport) errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// URL scheme the client cannot fetch
    #[error("Unsupported URL scheme '{scheme}' in {url}")]
    UnsupportedScheme { scheme: String, url: String },

    /// Server returned error status
    #[error("Server error: HTTP {status} for {url}")]
    ServerError { status: u16, url: String },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// Client settings cannot be used
    #[error("Invalid client configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Fetch task ended without reporting a result
    #[error("Fetch task aborted: {reason}")]
    Aborted { reason: String },
}

/// Archive extraction errors. A missing member is not an error.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Archive file could not be opened
    #[error("Cannot open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive could not be parsed
    #[error("Cannot read archive {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Extract destination escapes its download directory
    #[error("Unsafe extract destination: {dst}")]
    UnsafeDestination { dst: String },

    /// Extract destination would clobber the staged archive or a temp file
    #[error("Extract destination '{dst}' is reserved")]
    ReservedDestination { dst: String },

    /// Writing an extracted member failed
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Transform invocation errors
#[derive(Error, Debug)]
pub enum TransformError {
    /// Entry has no schema and cannot be normalized
    #[error("Entry {id} has no schema; it cannot be normalized")]
    MissingSchema { id: String },

    /// Entry fields cannot be mapped onto the local layout
    #[error("Entry {id} has no valid output location: {source}")]
    InvalidEntry {
        id: String,
        #[source]
        source: LayoutError,
    },

    /// No converter and no dataset to copy
    #[error("Entry {id} declares no datasets to copy")]
    NoDatasets { id: String },

    /// No converter and more than one dataset; nothing to merge them with
    #[error("Entry {id} has {count} datasets but no converter to merge them")]
    AmbiguousDatasets { id: String, count: usize },

    /// Reading an input or writing the output failed
    #[error("Transform I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input declared an encoding the invoker cannot decode
    #[error("Unsupported text encoding '{encoding}'")]
    UnsupportedEncoding { encoding: String },

    /// Input bytes are not valid in the declared encoding
    #[error("Input {path} is not valid {encoding}")]
    Decode { path: PathBuf, encoding: String },

    /// Interpreter could not be started
    #[error("Failed to start transform interpreter '{interpreter}': {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    /// Program does not define the expected entry point
    #[error("Transform program {program} does not export '{entry_point}'")]
    MissingEntryPoint {
        program: PathBuf,
        entry_point: String,
    },

    /// Program ran but failed
    #[error("Transform program {program} failed (status {status:?}): {stderr}")]
    ProgramFailed {
        program: PathBuf,
        status: Option<i32>,
        stderr: String,
    },

    /// Program produced output that is not text
    #[error("Transform program {program} produced non UTF-8 output")]
    InvalidOutput { program: PathBuf },

    /// Program exceeded its time budget
    #[error("Transform program {program} timed out after {seconds} seconds")]
    Timeout { program: PathBuf, seconds: u64 },

    /// Host protocol serialization failed
    #[error("Failed to encode transform request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors reading a canonical output back
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Canonical output has not been written yet
    #[error("Dataset not found: {path}")]
    NotFound { path: PathBuf },

    /// Reading the output failed
    #[error("I/O error reading dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output does not match its schema
    #[error("Dataset {path} does not match schema '{schema}': {source}")]
    Parse {
        path: PathBuf,
        schema: String,
        #[source]
        source: serde_json::Error,
    },

    /// Entry declares no schema
    #[error("Entry {id} has no schema")]
    MissingSchema { id: String },

    /// Schema has no typed model
    #[error("No model for schema '{schema}'")]
    UnsupportedSchema { schema: String },
}

/// Local directory layout errors
#[derive(Error, Debug)]
pub enum LayoutError {
    /// Directory could not be created
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory could not be removed
    #[error("Failed to remove directory {path}: {source}")]
    RemoveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest value cannot be used as a path component
    #[error("Invalid {field} '{value}' for a local path component")]
    InvalidComponent { field: &'static str, value: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Could not determine the user configuration directory
    #[error("Could not determine user config directory")]
    NoConfigDir,

    /// Reading or writing the configuration file failed
    #[error("Configuration I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Archive error
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Transform error
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Layout error
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Dataset error
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Manifest(_) => "manifest",
            AppError::Download(_) => "download",
            AppError::Archive(_) => "archive",
            AppError::Transform(_) => "transform",
            AppError::Layout(_) => "layout",
            AppError::Dataset(_) => "dataset",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Manifest result type alias
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Archive result type alias
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// Transform result type alias
pub type TransformResult<T> = std::result::Result<T, TransformError>;

/// Dataset result type alias
pub type DatasetResult<T> = std::result::Result<T, DatasetError>;

/// Layout result type alias
pub type LayoutResult<T> = std::result::Result<T, LayoutError>;

/// Config result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
