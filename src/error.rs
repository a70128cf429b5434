//! Error types for the proximity cache.

use thiserror::Error;

/// Invalid coordinate input. Coordinates are never clamped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("coordinate is not a finite number: ({latitude}, {longitude})")]
    NonFinite { latitude: f64, longitude: f64 },

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Failure of a routed-distance refinement call.
///
/// None of these reach the user: the orchestrator falls back to the
/// approximate distances it already has.
#[derive(Debug, Error)]
pub enum RefinementError {
    #[error("matrix request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("matrix service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("matrix service rejected the request: {0}")]
    Rejected(String),

    #[error("failed to parse matrix response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("candidate has invalid coordinates: {0}")]
    InvalidCoordinate(#[from] GeoError),

    #[error("no API key configured for the matrix service")]
    MissingCredential,

    #[error("matrix response contained no distance row")]
    EmptyMatrix,

    #[error("matrix returned {actual} distances, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("matrix returned an unusable distance at position {index}")]
    InvalidDistance { index: usize },
}

/// Persistence failure in a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid store key: {0:?}")]
    InvalidKey(String),
}
