//! Cache builder for flexible configuration
//!
//! Chooses between a file-backed and an in-memory store and validates the
//! configuration before anything is opened.

use crate::alphabet::Alphabet;
use crate::cache::{CACHE_EXTENSION, SpatialCache};
use crate::config::CacheConfig;
use crate::error::{GeohError, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Builder for cache configuration with custom paths and settings.
#[derive(Debug)]
pub struct CacheBuilder {
    path: Option<PathBuf>,
    config: CacheConfig,
    in_memory: bool,
}

impl CacheBuilder {
    /// Create a new builder with default in-memory configuration.
    pub fn new() -> Self {
        Self {
            path: None,
            config: CacheConfig::default(),
            in_memory: true,
        }
    }

    /// Set the cache file. The `.gcache` extension is appended if missing.
    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self.in_memory = false;
        self
    }

    /// Configure for in-memory storage with no persistence.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self.path = None;
        self
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom alphabet for stored geohash strings.
    pub fn alphabet(mut self, alphabet: Alphabet) -> Self {
        self.config = self.config.with_alphabet(alphabet);
        self
    }

    /// Validate the configuration, open the store and start its transaction.
    pub fn build(self) -> Result<SpatialCache> {
        self.config.validate().map_err(GeohError::Config)?;

        match self.path {
            Some(path) if !self.in_memory => {
                let path = with_cache_extension(&path);
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let conn = Connection::open(&path)?;
                SpatialCache::from_connection(conn, Some(path), self.config)
            }
            _ => {
                let conn = Connection::open_in_memory()?;
                SpatialCache::from_connection(conn, None, self.config)
            }
        }
    }
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Append the cache extension unless the path already carries it.
pub(crate) fn with_cache_extension(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == CACHE_EXTENSION) {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(CACHE_EXTENSION);
    PathBuf::from(name)
}
