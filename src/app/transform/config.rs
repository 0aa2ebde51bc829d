//! Configuration for the transform program host

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::transform;

/// Settings for running transform programs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Interpreter executable hosting the programs
    pub interpreter: String,
    /// Function every program must define
    pub entry_point: String,
    /// Time budget for one invocation
    pub timeout: Duration,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            interpreter: transform::DEFAULT_INTERPRETER.to_string(),
            entry_point: transform::DEFAULT_ENTRY_POINT.to_string(),
            timeout: transform::DEFAULT_TIMEOUT,
        }
    }
}

impl TransformConfig {
    /// Use a different interpreter executable
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Set the invocation time budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.interpreter.trim().is_empty() {
            return Err("Transform interpreter cannot be empty".to_string());
        }
        if self.entry_point.trim().is_empty() {
            return Err("Transform entry point cannot be empty".to_string());
        }
        if self.timeout.is_zero() {
            return Err("Transform timeout cannot be zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TransformConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.entry_point, "convert");
    }

    #[test]
    fn test_config_validation() {
        let config = TransformConfig::default().with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = TransformConfig::default().with_interpreter(" ");
        assert!(config.validate().is_err());
    }
}
