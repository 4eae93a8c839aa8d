//! Error types for the core crate.
//!
//! Store and history operations report their results as outcome values; the
//! errors here only surface from configuration loading.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON/JSONC syntax.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// Config validation failed.
    #[error("config validation failed: {message}")]
    Validation { message: String },
}

impl ConfigError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err = CoreError::from(ConfigError::validation("max_entries must be at least 1"));
        assert!(matches!(err, CoreError::Config(ConfigError::Validation { .. })));
        assert_eq!(
            err.to_string(),
            "config error: config validation failed: max_entries must be at least 1"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let err = CoreError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err, CoreError::Io(_)));
        assert_eq!(err.to_string(), "io error: gone");
    }
}
