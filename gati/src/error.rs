//! Error types for Gati

use thiserror::Error;

/// Gati error type
#[derive(Error, Debug)]
pub enum GatiError {
    /// Argument that makes a motion undefined (zero velocity, NaN, bad frequency)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Connection failed: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for GatiError {
    fn from(e: toml::de::Error) -> Self {
        GatiError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatiError>;
