//! Configuration management for the geodata fetcher
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! file (explicit `--config`, `./geodata-fetcher.toml`, or the user config
//! directory), environment variables, and finally CLI flags applied by the
//! command handlers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ClientConfig, LocalLayout, OrchestratorConfig, TransformConfig};
use crate::constants::{env, files, http, limits, logging, transform, workers};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Batch orchestration settings
    pub orchestrator: OrchestratorConfigToml,
    /// Transform program host settings
    pub transform: TransformConfigToml,
    /// Local dataset layout
    pub layout: LayoutConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// TCP keep-alive timeout in seconds (None = disabled)
    pub tcp_keepalive_secs: Option<u64>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
    /// Maximum connections per host
    pub pool_max_per_host: usize,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            tcp_keepalive_secs: Some(30),
            tcp_nodelay: true,
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// TOML-friendly orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfigToml {
    /// Fetches allowed in flight at once
    pub max_concurrent_fetches: usize,
    /// Re-fetch files that already exist
    pub overwrite: bool,
}

impl Default for OrchestratorConfigToml {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: workers::DEFAULT_MAX_CONCURRENT_FETCHES,
            overwrite: false,
        }
    }
}

/// TOML-friendly transform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfigToml {
    /// Interpreter executable
    pub interpreter: String,
    /// Exported function called on every program
    pub entry_point: String,
    /// Invocation timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TransformConfigToml {
    fn default() -> Self {
        Self {
            interpreter: transform::DEFAULT_INTERPRETER.to_string(),
            entry_point: transform::DEFAULT_ENTRY_POINT.to_string(),
            timeout_secs: transform::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// TOML-friendly layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfigToml {
    /// Root directory of the local dataset tree
    pub root: PathBuf,
}

impl Default for LayoutConfigToml {
    fn default() -> Self {
        Self {
            root: PathBuf::from(files::DEFAULT_ROOT_DIR),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed log level
    pub fn level(&self) -> ConfigResult<tracing::Level> {
        self.level
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.level.clone(),
                reason: "Expected one of error, warn, info, debug, trace".to_string(),
            })
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(
        &self,
    ) -> (ClientConfig, OrchestratorConfig, TransformConfig, LocalLayout) {
        (
            self.client.to_runtime_config(),
            self.orchestrator.to_runtime_config(),
            self.transform.to_runtime_config(),
            LocalLayout::new(&self.layout.root),
        )
    }

    /// Check every section against its runtime validation rules
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |field: &str, value: String, reason: String| ConfigError::InvalidValue {
            field: field.to_string(),
            value,
            reason,
        };

        let client = self.client.to_runtime_config();
        client.validate().map_err(|reason| {
            invalid(
                "client",
                format!(
                    "{} rps, {}s request / {}s connect timeout",
                    client.rate_limit_rps,
                    client.request_timeout.as_secs(),
                    client.connect_timeout.as_secs()
                ),
                reason,
            )
        })?;
        self.orchestrator
            .to_runtime_config()
            .validate()
            .map_err(|reason| {
                invalid(
                    "orchestrator.max_concurrent_fetches",
                    self.orchestrator.max_concurrent_fetches.to_string(),
                    reason,
                )
            })?;
        self.transform
            .to_runtime_config()
            .validate()
            .map_err(|reason| invalid("transform", self.transform.interpreter.clone(), reason))?;
        self.logging.level()?;
        Ok(())
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match &config_file_override {
            Some(path) => Some(path.clone()),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) if path.exists() => Self::load_from_file(&path).await?,
            Some(path) if config_file_override.is_some() => {
                return Err(ConfigError::NotFound { path })
            }
            _ => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(root) = lookup(env::ROOT).filter(|v| !v.is_empty()) {
            debug!("Layout root overridden by {}", env::ROOT);
            self.layout.root = PathBuf::from(root);
        }
        if let Some(interpreter) = lookup(env::INTERPRETER).filter(|v| !v.is_empty()) {
            debug!("Interpreter overridden by {}", env::INTERPRETER);
            self.transform.interpreter = interpreter;
        }
    }

    /// Write the commented default configuration to `path` (or the user
    /// config location) unless a file is already there
    ///
    /// Returns the path and whether a new file was written.
    pub async fn initialize(path: Option<PathBuf>) -> ConfigResult<(PathBuf, bool)> {
        let config_path = match path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            return Ok((config_path, false));
        }

        info!("Creating default configuration file...");
        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: config_path.clone(),
                source,
            })?;

        Ok((config_path, true))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(format!("./{}", files::CONFIG_FILE_NAME))];
        if let Ok(user_config) = Self::default_config_path() {
            search_paths.push(user_config);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(files::APP_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# Geodata Fetcher Configuration
# Customize any of these settings to suit your needs.

[client]
# HTTP client settings
tcp_keepalive_secs = 30
tcp_nodelay = true
pool_idle_timeout_secs = {}
pool_max_per_host = {}
request_timeout_secs = {}
connect_timeout_secs = {}
rate_limit_rps = {}

[orchestrator]
# Fetches allowed in flight at once
max_concurrent_fetches = {}
# Re-fetch files that already exist
overwrite = false

[transform]
# Interpreter hosting converter programs ({} overrides)
interpreter = "{}"
entry_point = "{}"
timeout_secs = {}

[layout]
# Root of the local dataset tree ({} overrides)
root = "{}"

[logging]
level = "{}"  # error, warn, info, debug, trace
"#,
            http::POOL_IDLE_TIMEOUT.as_secs(),
            http::POOL_MAX_PER_HOST,
            http::DEFAULT_TIMEOUT.as_secs(),
            http::CONNECT_TIMEOUT.as_secs(),
            limits::DEFAULT_RATE_LIMIT_RPS,
            workers::DEFAULT_MAX_CONCURRENT_FETCHES,
            env::INTERPRETER,
            transform::DEFAULT_INTERPRETER,
            transform::DEFAULT_ENTRY_POINT,
            transform::DEFAULT_TIMEOUT.as_secs(),
            env::ROOT,
            files::DEFAULT_ROOT_DIR,
            logging::DEFAULT_LOG_LEVEL,
        )
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            tcp_keepalive: self.tcp_keepalive_secs.map(Duration::from_secs),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            rate_limit_rps: self.rate_limit_rps,
        }
    }
}

impl OrchestratorConfigToml {
    /// Convert to runtime OrchestratorConfig
    pub fn to_runtime_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::default()
            .with_max_concurrent_fetches(self.max_concurrent_fetches)
            .with_overwrite(self.overwrite)
    }
}

impl TransformConfigToml {
    /// Convert to runtime TransformConfig
    pub fn to_runtime_config(&self) -> TransformConfig {
        TransformConfig {
            interpreter: self.interpreter.clone(),
            entry_point: self.entry_point.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();

        assert_eq!(
            config.orchestrator.max_concurrent_fetches,
            workers::DEFAULT_MAX_CONCURRENT_FETCHES
        );
        assert_eq!(config.client.rate_limit_rps, limits::DEFAULT_RATE_LIMIT_RPS);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.level().unwrap(), tracing::Level::WARN);
        assert_eq!(config.layout.root, PathBuf::from("datasets"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_generation() {
        let content = AppConfig::generate_default_config_content();

        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(
            parsed.orchestrator.max_concurrent_fetches,
            workers::DEFAULT_MAX_CONCURRENT_FETCHES
        );
        assert_eq!(parsed.transform.interpreter, "node");
        assert!(content.contains("[orchestrator]"));
        assert!(content.contains("[layout]"));
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_partial_config_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("geodata-fetcher.toml");
        tokio::fs::write(
            &config_path,
            "[orchestrator]\nmax_concurrent_fetches = 16\n\n[logging]\nlevel = \"debug\"\n",
        )
        .await
        .unwrap();

        let config = AppConfig::load_from_file(&config_path).await.unwrap();
        assert_eq!(config.orchestrator.max_concurrent_fetches, 16);
        assert_eq!(config.logging.level().unwrap(), tracing::Level::DEBUG);
        assert_eq!(config.client.rate_limit_rps, limits::DEFAULT_RATE_LIMIT_RPS);
        assert_eq!(config.transform.entry_point, "convert");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = AppConfig::default();
        config.logging.level = "chatty".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "logging.level"
        ));
    }

    #[tokio::test]
    async fn test_malformed_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        tokio::fs::write(&config_path, "[orchestrator\n").await.unwrap();

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            "GEODATA_ROOT" => Some("/srv/geodata".to_string()),
            "GEODATA_INTERPRETER" => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.layout.root, PathBuf::from("/srv/geodata"));
        assert_eq!(config.transform.interpreter, "node");
    }

    #[test]
    fn test_validation_rejects_zero_concurrency() {
        let mut config = AppConfig::default();
        config.orchestrator.max_concurrent_fetches = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_inverted_client_timeouts() {
        let mut config = AppConfig::default();
        config.client.request_timeout_secs = 10;
        config.client.connect_timeout_secs = 60;

        match config.validate() {
            Err(ConfigError::InvalidValue { field, reason, .. }) => {
                assert_eq!(field, "client");
                assert!(reason.contains("Connect timeout"));
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_initialize_writes_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.toml");

        let (written_path, created) = AppConfig::initialize(Some(path.clone())).await.unwrap();
        assert_eq!(written_path, path);
        assert!(created);

        let (_, created) = AppConfig::initialize(Some(path)).await.unwrap();
        assert!(!created);
    }
}
