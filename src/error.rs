//! Error types for geohash coding and the spatial cache.

use thiserror::Error;

/// Errors returned by the codec and the spatial cache.
#[derive(Debug, Error)]
pub enum GeohError {
    /// A code could not be read back: unknown symbol, malformed alphabet or
    /// non-binary serial.
    #[error("decode error: {0}")]
    Decode(String),

    /// Caller-supplied value out of range
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Category name outside the identifier-safe charset
    #[error("invalid category: {0}")]
    InvalidCategory(String),

    /// Configuration failed validation
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Operation attempted on a closed cache
    #[error("cache is closed")]
    CacheClosed,

    /// Embedded store failure
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for geoh operations
pub type Result<T> = std::result::Result<T, GeohError>;
