use serde::{Deserialize, Serialize};

/// Spatial cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of stored point rows
    pub points: u64,
    /// Number of density buckets
    pub buckets: u64,
    /// Number of distinct categories among stored points
    pub categories: u64,
    /// Sum of all density counters, i.e. the number of insertions
    pub insertions: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }
}
