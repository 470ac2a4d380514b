//! Error types for kinema-core.

use thiserror::Error;

/// Error type for kinema-core operations.
///
/// Every stage boundary returns `Result`; nothing here is fatal to the
/// process. A module that reports `DimensionMismatch` or `NotInitialized`
/// leaves its internal state unchanged, so the caller can recover by
/// re-`init` or re-`train`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Module has not been initialized")]
    NotInitialized,

    #[error("Predictor has not been trained")]
    NotTrained,

    #[error("Module type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Malformed settings: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
