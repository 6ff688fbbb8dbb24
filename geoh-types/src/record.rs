use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A stored point row.
///
/// Unique per `(geohash, serial, category)`; inserting the same triple again
/// replaces the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPoint {
    /// Alphabet-encoded geohash at storage precision
    pub geohash: String,
    /// The same code as a zero-padded binary string, used for prefix lookups
    pub serial: String,
    pub category: String,
    pub payload: Bytes,
}

/// Number of insertions seen under one `(prefix, category)` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityBucket {
    /// Leading bits of the binary serial
    pub prefix: String,
    pub category: String,
    pub count: u64,
}

impl DensityBucket {
    pub fn new(prefix: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            category: category.into(),
            count: 0,
        }
    }
}
