//! Error types for seismic cube operations

use thiserror::Error;

/// Main error type for cube operations
#[derive(Error, Debug)]
pub enum CubeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("No trace stored at inline {inline}, crossline {crossline}")]
    TraceNotFound { inline: i32, crossline: i32 },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    #[error("Invalid survey format: {0}")]
    InvalidFormat(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

/// Specialized Result type for cube operations
pub type Result<T> = std::result::Result<T, CubeError>;

impl From<serde_json::Error> for CubeError {
    fn from(err: serde_json::Error) -> Self {
        CubeError::Metadata(err.to_string())
    }
}
