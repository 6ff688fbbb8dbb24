//! Search areas: sets of serial prefixes covering a disk around a point.
//!
//! An area is built by sampling the query point and four corners offset
//! diagonally from it, encoding each a few bits deeper than the lookup depth,
//! expanding every sample to its neighbor ring and truncating all resulting
//! serials to the lookup depth. The union over-covers the disk; it is a bucket
//! filter, not an exact geometric test.

use crate::bits::{neighbors, serialize};
use crate::codec::{EARTH_RADIUS_M, cell_size, encode};
use crate::config::SearchConfig;
use crate::error::{GeohError, Result};
use geoh_types::extent::CellSize;
use geoh_types::geoh::GeoH;
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

static STANDARD_TABLE: Lazy<DepthTable> = Lazy::new(|| DepthTable::new(EARTH_RADIUS_M));

/// Cell sizes for every depth from 0 to 128 bits on one sphere.
#[derive(Debug, Clone)]
pub struct DepthTable {
    earth_radius_m: f64,
    cells: Vec<CellSize>,
}

impl DepthTable {
    pub fn new(earth_radius_m: f64) -> Self {
        let cells = (0..=GeoH::MAX_BITS)
            .map(|bits| cell_size(bits, earth_radius_m))
            .collect();
        Self {
            earth_radius_m,
            cells,
        }
    }

    /// Table for the EPSG:7059 sphere, computed once.
    pub fn standard() -> &'static DepthTable {
        &STANDARD_TABLE
    }

    pub fn earth_radius_m(&self) -> f64 {
        self.earth_radius_m
    }

    /// Cell size at `depth` bits, clamped to the deepest entry.
    pub fn cell(&self, depth: u32) -> CellSize {
        let index = (depth as usize).min(self.cells.len() - 1);
        self.cells[index]
    }

    /// The coarsest even depth whose cell half-diagonal is below `radius_m`,
    /// capped at `max_depth`.
    pub fn depth_for_radius(&self, radius_m: f64, max_depth: u32) -> u32 {
        let max_depth = max_depth - max_depth % 2;
        (0..=max_depth)
            .step_by(2)
            .find(|depth| self.cell(*depth).half_diagonal() < radius_m)
            .unwrap_or(max_depth)
    }
}

/// A deduplicated set of serial prefixes, all `depth` bits long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchArea {
    depth: u32,
    prefixes: FxHashSet<String>,
}

impl SearchArea {
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.prefixes.contains(prefix)
    }

    /// Whether a full serial falls inside one of the area's buckets.
    pub fn covers(&self, serial: &str) -> bool {
        serial
            .get(..self.depth as usize)
            .is_some_and(|head| self.prefixes.contains(head))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }

    pub fn into_prefixes(self) -> FxHashSet<String> {
        self.prefixes
    }
}

/// Builds search areas with one set of tuning constants.
#[derive(Debug, Clone)]
pub struct SearchPlanner {
    config: SearchConfig,
    table: DepthTable,
}

impl SearchPlanner {
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate().map_err(GeohError::Config)?;
        let table = if config.earth_radius_m == EARTH_RADIUS_M {
            DepthTable::standard().clone()
        } else {
            DepthTable::new(config.earth_radius_m)
        };
        Ok(Self { config, table })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn table(&self) -> &DepthTable {
        &self.table
    }

    /// Area covering a disk of `radius_m` meters, at the depth the radius picks.
    pub fn define(&self, lon: f64, lat: f64, radius_m: f64) -> Result<SearchArea> {
        if !(radius_m.is_finite() && radius_m > 0.0) {
            return Err(GeohError::InvalidInput(format!(
                "search radius must be a positive number of meters, got {}",
                radius_m
            )));
        }
        let depth = self.table.depth_for_radius(radius_m, self.config.max_depth);
        self.build(lon, lat, radius_m, depth)
    }

    /// Area at an explicit lookup depth, sized to that depth's cells.
    pub fn around(&self, lon: f64, lat: f64, depth: u32) -> Result<SearchArea> {
        if depth.saturating_add(self.config.extra_depth) > GeoH::MAX_BITS {
            return Err(GeohError::InvalidInput(format!(
                "search depth {} leaves no room for {} extra bits",
                depth, self.config.extra_depth
            )));
        }
        let radius_m = self.table.cell(depth).half_diagonal();
        self.build(lon, lat, radius_m, depth)
    }

    fn build(&self, lon: f64, lat: f64, radius_m: f64, depth: u32) -> Result<SearchArea> {
        let delta = (radius_m / self.config.earth_radius_m).to_degrees();
        let k = self.config.corner_scale * delta / self.config.corner_divisor;
        let samples = [
            (lon, lat),
            (lon - k, lat - k),
            (lon - k, lat + k),
            (lon + k, lat - k),
            (lon + k, lat + k),
        ];

        let mut prefixes = FxHashSet::default();
        for (x, y) in samples {
            let code = encode(x, y, depth + self.config.extra_depth)?;
            for cell in std::iter::once(code).chain(neighbors(&code)) {
                prefixes.insert(serialize(&cell.truncate(depth)));
            }
        }

        log::trace!(
            "search area at depth {} around ({}, {}): {} prefixes",
            depth,
            lon,
            lat,
            prefixes.len()
        );

        Ok(SearchArea { depth, prefixes })
    }
}

impl Default for SearchPlanner {
    fn default() -> Self {
        Self {
            config: SearchConfig::default(),
            table: DepthTable::standard().clone(),
        }
    }
}

/// Prefixes approximately covering a disk of `radius_m` meters around a point,
/// with the default tuning.
///
/// ```
/// use geoh::search::define_search_area;
///
/// let area = define_search_area(-6.2603, 53.3498, 1_000.0)?;
/// assert!(!area.is_empty());
/// assert!(area.iter().all(|p| p.len() == area.depth() as usize));
/// # Ok::<(), geoh::GeohError>(())
/// ```
pub fn define_search_area(lon: f64, lat: f64, radius_m: f64) -> Result<SearchArea> {
    SearchPlanner::default().define(lon, lat, radius_m)
}
