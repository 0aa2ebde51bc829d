//! Application constants for the geodata fetcher
//!
//! Constants are grouped by functional domain.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Overrides the layout root directory
    pub const ROOT: &str = "GEODATA_ROOT";

    /// Overrides the transform interpreter
    pub const INTERPRETER: &str = "GEODATA_INTERPRETER";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("Geodata-Fetcher/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Rate limiting configuration
pub mod limits {
    /// Default request rate (requests per second) across all providers
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 20;
}

/// Local file layout names
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// File name of a fetched dataset inside its download directory
    pub const DATASET_FILE_NAME: &str = "dataset";

    /// File name of a fetched transform program inside the provider directory
    pub const CONVERTER_FILE_NAME: &str = "converter.js";

    /// Extension of the canonical normalized output
    pub const OUTPUT_EXTENSION: &str = "json";

    /// Default layout root directory name
    pub const DEFAULT_ROOT_DIR: &str = "datasets";

    /// Project-local configuration file name
    pub const CONFIG_FILE_NAME: &str = "geodata-fetcher.toml";

    /// Application directory name under the user config dir
    pub const APP_DIR_NAME: &str = "geodata-fetcher";
}

/// Fetch concurrency
pub mod workers {
    /// Default number of fetches allowed in flight at once
    pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

    /// Upper bound accepted by configuration validation
    pub const MAX_CONCURRENT_FETCHES: usize = 256;
}

/// Transform program invocation
pub mod transform {
    use super::Duration;

    /// Default interpreter used to host transform programs
    pub const DEFAULT_INTERPRETER: &str = "node";

    /// Exported function every transform program must define
    pub const DEFAULT_ENTRY_POINT: &str = "convert";

    /// Default time budget for one program invocation
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Host exit code signalling a missing entry point
    pub const MISSING_ENTRY_POINT_EXIT_CODE: i32 = 3;
}

/// Logging constants
pub mod logging {
    /// Log level used when no verbosity flag is given
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
}

pub use files::{CONVERTER_FILE_NAME, DATASET_FILE_NAME, TEMP_FILE_SUFFIX};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::DEFAULT_RATE_LIMIT_RPS;
pub use workers::DEFAULT_MAX_CONCURRENT_FETCHES;
