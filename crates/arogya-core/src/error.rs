use thiserror::Error;

/// Top-level error type for the Arogya system.
///
/// Subsystem crates define their own error types and convert from
/// `ArogyaError` so that the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArogyaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ArogyaError {
    fn from(err: toml::de::Error) -> Self {
        ArogyaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ArogyaError {
    fn from(err: toml::ser::Error) -> Self {
        ArogyaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ArogyaError {
    fn from(err: serde_json::Error) -> Self {
        ArogyaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Arogya operations.
pub type Result<T> = std::result::Result<T, ArogyaError>;
