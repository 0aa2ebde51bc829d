//! Orchestrator configuration

use serde::{Deserialize, Serialize};

use crate::constants::workers;

/// Settings for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Upper bound on fetches in flight at once
    pub max_concurrent_fetches: usize,
    /// Default overwrite policy for `run_entry`
    pub overwrite: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: workers::DEFAULT_MAX_CONCURRENT_FETCHES,
            overwrite: false,
        }
    }
}

impl OrchestratorConfig {
    /// Create new orchestrator configuration with custom concurrency
    pub fn with_max_concurrent_fetches(mut self, max_concurrent_fetches: usize) -> Self {
        self.max_concurrent_fetches = max_concurrent_fetches;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_fetches == 0 {
            return Err("Concurrent fetch limit must be greater than 0".to_string());
        }
        if self.max_concurrent_fetches > workers::MAX_CONCURRENT_FETCHES {
            return Err(format!(
                "Concurrent fetch limit cannot exceed {}",
                workers::MAX_CONCURRENT_FETCHES
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(OrchestratorConfig::default().validate().is_ok());
        assert!(OrchestratorConfig::default()
            .with_max_concurrent_fetches(0)
            .validate()
            .is_err());
        assert!(OrchestratorConfig::default()
            .with_max_concurrent_fetches(workers::MAX_CONCURRENT_FETCHES + 1)
            .validate()
            .is_err());
    }
}
