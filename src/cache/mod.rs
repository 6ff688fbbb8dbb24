//! Persistent spatial cache with adaptive nearest-neighbor search.
//!
//! Points are stored under a fixed-precision geohash together with its binary
//! serial, and every insertion bumps a density counter for the serial's first
//! bits. Queries estimate the local density to pick a starting depth, then
//! widen the search area depth by depth until something is found.
//!
//! # Lifecycle
//!
//! Opening a cache ensures the schema and starts a transaction. Writes stay in
//! that transaction, visible to this cache's own reads, until [`SpatialCache::save`]
//! or [`SpatialCache::close`]. Closing materializes one view per category,
//! commits and releases the connection. A cache dropped while open rolls its
//! pending writes back.
//!
//! There is no cross-connection coordination: concurrent writers to the same
//! file must be serialized by the caller (see `SyncCache` behind the `sync`
//! feature for in-process sharing).
//!
//! ```rust
//! use geoh::SpatialCache;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cache = SpatialCache::memory()?;
//! cache.add(-6.2603, 53.3498, "city", b"Dublin")?;
//! cache.add(-0.1278, 51.5074, "city", b"London")?;
//!
//! let closest = cache.get_closest(-6.25, 53.35, Some("city"))?.unwrap();
//! assert_eq!(closest.nearby.payload().as_ref(), b"Dublin");
//! cache.close()?;
//! # Ok(())
//! # }
//! ```

mod batch;
mod category;
mod schema;

pub use batch::PointRecord;
pub use category::{Category, MAX_CATEGORY_LEN};

use crate::alphabet::Alphabet;
use crate::bits::{parse, serialize};
use crate::builder::CacheBuilder;
use crate::codec::{Decoded, decode, encode, to_string};
use crate::config::CacheConfig;
use crate::distance::haversine;
use crate::error::{GeohError, Result};
use crate::search::{SearchArea, SearchPlanner};
use bytes::Bytes;
use geo::Point;
use geoh_types::record::{CachedPoint, DensityBucket};
use geoh_types::stats::CacheStats;
use rusqlite::{Connection, params};
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

/// Extension appended to cache file names that lack it.
pub const CACHE_EXTENSION: &str = "gcache";

/// A stored point found by a nearby query.
#[derive(Debug, Clone, PartialEq)]
pub struct Nearby {
    pub record: CachedPoint,
    /// Center of the stored cell and its half size
    pub position: Decoded,
}

impl Nearby {
    pub fn location(&self) -> Point {
        self.position.point()
    }

    pub fn payload(&self) -> &Bytes {
        &self.record.payload
    }

    pub fn category(&self) -> &str {
        &self.record.category
    }
}

/// The nearest stored point and its haversine distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Closest {
    pub nearby: Nearby,
    pub distance_km: f64,
}

/// Where a point lands in the store.
pub(crate) struct Placement {
    pub geohash: String,
    pub serial: String,
}

impl Placement {
    pub fn prefix(&self, bits: u32) -> &str {
        &self.serial[..bits as usize]
    }
}

/// Persistent geohash-bucketed point store.
///
/// Single-threaded: one connection is owned for the cache's whole open
/// lifetime and released on [`close`](SpatialCache::close).
pub struct SpatialCache {
    conn: Option<Connection>,
    path: Option<PathBuf>,
    config: CacheConfig,
    alphabet: Alphabet,
    planner: SearchPlanner,
}

impl std::fmt::Debug for SpatialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialCache")
            .field("path", &self.path)
            .field("open", &self.conn.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl SpatialCache {
    /// Open or create a cache file, appending the `.gcache` extension if absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        CacheBuilder::new().path(path.as_ref()).build()
    }

    pub fn open_with_config<P: AsRef<Path>>(path: P, config: CacheConfig) -> Result<Self> {
        CacheBuilder::new().path(path.as_ref()).config(config).build()
    }

    /// A cache held in memory only; nothing survives `close`.
    pub fn memory() -> Result<Self> {
        CacheBuilder::new().in_memory().build()
    }

    pub fn memory_with_config(config: CacheConfig) -> Result<Self> {
        CacheBuilder::new().in_memory().config(config).build()
    }

    /// Wrap a fresh connection: ensure the schema and open the write transaction.
    pub(crate) fn from_connection(
        conn: Connection,
        path: Option<PathBuf>,
        config: CacheConfig,
    ) -> Result<Self> {
        let planner = SearchPlanner::new(config.search.clone())?;

        schema::ensure(&conn, &config)?;
        conn.execute_batch("BEGIN")?;

        log::debug!(
            "opened spatial cache at {}",
            path.as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string())
        );

        Ok(Self {
            conn: Some(conn),
            path,
            alphabet: config.alphabet(),
            config,
            planner,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    pub(crate) fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(GeohError::CacheClosed)
    }

    pub(crate) fn place(&self, lon: f64, lat: f64) -> Result<Placement> {
        let code = encode(lon, lat, self.config.storage_bits())?;
        Ok(Placement {
            geohash: to_string(&code, &self.alphabet),
            serial: serialize(&code),
        })
    }

    /// Store one point and count it in its density bucket.
    ///
    /// Re-adding the same cell and category replaces the payload but still
    /// counts as a new insertion.
    pub fn add(
        &mut self,
        lon: f64,
        lat: f64,
        category: &str,
        payload: impl AsRef<[u8]>,
    ) -> Result<()> {
        let category = Category::parse(category)?;
        let placement = self.place(lon, lat)?;
        let prefix = placement.prefix(self.config.density_prefix_bits);
        let conn = self.conn()?;

        conn.prepare_cached(schema::INSERT_POINT)?.execute(params![
            placement.geohash,
            placement.serial,
            category.as_str(),
            payload.as_ref()
        ])?;
        conn.prepare_cached(schema::SEED_BUCKET)?
            .execute(params![prefix, category.as_str()])?;
        conn.prepare_cached(schema::BUMP_BUCKET)?
            .execute(params![prefix, category.as_str(), 1i64])?;

        Ok(())
    }

    /// Approximate number of insertions near a point.
    ///
    /// Sums the density buckets under a search area sized to one density
    /// cell. The area over-covers, so this may overcount; it only steers the
    /// starting depth of [`get_nearby`](Self::get_nearby).
    pub fn guess_density(&self, lon: f64, lat: f64, category: Option<&str>) -> Result<u64> {
        let category = category.map(Category::parse).transpose()?;
        let bits = self.config.density_prefix_bits;
        let radius_m = self.planner.table().cell(bits).diagonal();
        let area = self.planner.define(lon, lat, radius_m)?;

        let buckets: FxHashSet<&str> = area
            .iter()
            .map(|prefix| &prefix[..prefix.len().min(bits as usize)])
            .collect();

        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(schema::SUM_DENSITY_IN_PREFIX)?;
        let mut total: u64 = 0;
        for prefix in buckets {
            let count: i64 = stmt.query_row(
                params![
                    prefix,
                    schema::prefix_upper_bound(prefix),
                    category.as_ref().map(Category::as_str)
                ],
                |row| row.get(0),
            )?;
            total += count.max(0) as u64;
        }

        Ok(total)
    }

    /// Points near `(lon, lat)`, found by widening the search area.
    ///
    /// Starts at the sparse depth when the neighborhood looks empty and at the
    /// dense depth otherwise, then drops `depth_step` bits per round until a
    /// round finds points or the depth reaches zero. The result is empty, not
    /// an error, when nothing matches. Results come from a single depth, so no
    /// row appears twice.
    pub fn get_nearby(&self, lon: f64, lat: f64, category: Option<&str>) -> Result<Vec<Nearby>> {
        let density = self.guess_density(lon, lat, category)?;
        let mut depth = if density == 0 {
            self.config.sparse_start_depth
        } else {
            self.config.dense_start_depth
        };
        log::debug!(
            "nearby search at ({}, {}): density {}, starting at depth {}",
            lon,
            lat,
            density,
            depth
        );

        while depth > 0 {
            let area = self.planner.around(lon, lat, depth)?;
            let found = self.points_in(&area, category)?;
            log::trace!(
                "depth {}: {} prefixes, {} points",
                depth,
                area.len(),
                found.len()
            );
            if !found.is_empty() {
                return Ok(found);
            }
            depth = depth.saturating_sub(self.config.depth_step);
        }

        Ok(Vec::new())
    }

    /// The nearest point by haversine distance, or `None` when nothing is near.
    pub fn get_closest(&self, lon: f64, lat: f64, category: Option<&str>) -> Result<Option<Closest>> {
        let origin = Point::new(lon, lat);
        let radius = self.config.haversine_radius_km;

        let closest = self
            .get_nearby(lon, lat, category)?
            .into_iter()
            .map(|nearby| {
                let distance_km = haversine(&origin, &nearby.location(), radius);
                Closest {
                    nearby,
                    distance_km,
                }
            })
            .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        Ok(closest)
    }

    /// Stored points inside an area's buckets.
    pub fn points_in(&self, area: &SearchArea, category: Option<&str>) -> Result<Vec<Nearby>> {
        let category = category.map(Category::parse).transpose()?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(schema::SELECT_POINTS_IN_PREFIX)?;

        let mut prefixes: Vec<&str> = area.iter().collect();
        prefixes.sort_unstable();

        let mut found = Vec::new();
        for prefix in prefixes {
            let rows = stmt.query_map(
                params![
                    prefix,
                    schema::prefix_upper_bound(prefix),
                    category.as_ref().map(Category::as_str)
                ],
                |row| {
                    Ok(CachedPoint {
                        geohash: row.get(0)?,
                        serial: row.get(1)?,
                        category: row.get(2)?,
                        payload: Bytes::from(row.get::<_, Vec<u8>>(3)?),
                    })
                },
            )?;
            for record in rows {
                let record = record?;
                let position = decode(&parse(&record.serial)?, true);
                found.push(Nearby { record, position });
            }
        }

        Ok(found)
    }

    /// Distinct categories among stored points.
    pub fn categories(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached("SELECT DISTINCT category FROM points ORDER BY category")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let conn = self.conn()?;
        let (points, categories): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT category) FROM points",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let (buckets, insertions): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(count), 0) FROM density",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(CacheStats {
            points: points.max(0) as u64,
            buckets: buckets.max(0) as u64,
            categories: categories.max(0) as u64,
            insertions: insertions.max(0) as u64,
        })
    }

    /// Density counter for one bucket, zero when the bucket does not exist.
    pub fn bucket_count(&self, prefix: &str, category: &str) -> Result<u64> {
        let category = Category::parse(category)?;
        let count: i64 = self.conn()?.query_row(
            "SELECT COALESCE(SUM(count), 0) FROM density WHERE prefix = ?1 AND category = ?2",
            params![prefix, category.as_str()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// All density buckets, optionally for one category, ordered by prefix.
    pub fn density_buckets(&self, category: Option<&str>) -> Result<Vec<DensityBucket>> {
        let category = category.map(Category::parse).transpose()?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT prefix, category, count FROM density \
             WHERE ?1 IS NULL OR category = ?1 ORDER BY prefix, category",
        )?;
        let buckets = stmt
            .query_map(params![category.as_ref().map(Category::as_str)], |row| {
                Ok(DensityBucket {
                    prefix: row.get(0)?,
                    category: row.get(1)?,
                    count: row.get::<_, i64>(2)?.max(0) as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(buckets)
    }

    /// Commit pending writes and keep the cache open.
    pub fn save(&mut self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch("COMMIT; BEGIN")?;
        log::debug!("spatial cache saved");
        Ok(())
    }

    /// Materialize per-category views, commit and release the connection.
    ///
    /// A view that cannot be created is logged and skipped; it never keeps
    /// the pending writes from being committed. Closing an already closed
    /// cache does nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.as_ref() else {
            return Ok(());
        };

        for name in self.categories()? {
            let created = Category::parse(name.as_str())
                .and_then(|category| schema::create_category_view(conn, &category));
            if let Err(e) = created {
                log::warn!("skipping view for stored category {:?}: {}", name, e);
            }
        }
        conn.execute_batch("COMMIT")?;

        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| GeohError::Storage(e))?;
        }
        log::debug!("spatial cache closed");
        Ok(())
    }
}

impl Drop for SpatialCache {
    fn drop(&mut self) {
        if self.conn.is_some() && self.path.is_some() {
            log::warn!(
                "spatial cache {:?} dropped without close; pending writes are rolled back",
                self.path
            );
        }
    }
}
