//! Error types for device probing

use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// Errors raised while querying the CUDA runtime or handling settings.
///
/// "No device" is not an error: it is the `false` outcome of an
/// availability check.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The device query itself could not be performed (driver failed to
    /// initialize, binary built without CUDA support, ...)
    #[error("CUDA runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// A device index outside the visible range was selected
    #[error("Invalid device {index}: only {count} device(s) visible")]
    InvalidDevice { index: u32, count: u32 },

    /// A property query failed after availability was reported
    #[error("Failed to query {operation}: {source}")]
    Query {
        operation: &'static str,
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Settings could not be applied
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    pub fn query<E>(operation: &'static str, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        ProbeError::Query {
            operation,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
