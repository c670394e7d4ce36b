//! Error types for loading reporter configuration.

use thiserror::Error;

/// Result type alias for configuration loading.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while reading a properties source.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read properties file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid properties document: {0}")]
    Toml(#[from] toml::de::Error),
}
