//! Geohash coding and a persistent spatial cache with adaptive nearest-neighbor search.
//!
//! Codes are bit strings of up to 128 bits built by interleaved bisection of
//! longitude and latitude. They render to text with a 32-symbol alphabet,
//! either the standard one or one derived from a secret.
//!
//! ```rust
//! use geoh::{Alphabet, SpatialCache, codec};
//!
//! let code = codec::encode(-6.272877, 53.344606, 50)?;
//! assert_eq!(codec::to_string(&code, &Alphabet::default()), "gc7x3r04z7");
//!
//! let mut cache = SpatialCache::memory()?;
//! cache.add(-6.272877, 53.344606, "poi", b"St Patrick's")?;
//! let nearby = cache.get_nearby(-6.2729, 53.3446, Some("poi"))?;
//! assert_eq!(nearby.len(), 1);
//! # Ok::<(), geoh::GeohError>(())
//! ```

pub mod alphabet;
pub mod bits;
pub mod builder;
pub mod cache;
pub mod codec;
pub mod config;
pub mod distance;
pub mod error;
pub mod search;

#[cfg(feature = "sync")]
mod sync;

pub use alphabet::{Alphabet, DEFAULT_ALPHABET};
pub use builder::CacheBuilder;
pub use cache::{Category, Closest, Nearby, PointRecord, SpatialCache};
pub use codec::{Decoded, decode, encode, from_string, geodesic, geohash, join, split, to_string};
pub use config::{CacheConfig, SearchConfig};
pub use error::{GeohError, Result};
pub use search::{DepthTable, SearchArea, SearchPlanner, define_search_area};

#[cfg(feature = "sync")]
pub use sync::SyncCache;

pub use geoh_types::extent::{CellSize, Precision};
pub use geoh_types::geoh::GeoH;
pub use geoh_types::record::{CachedPoint, DensityBucket};
pub use geoh_types::stats::CacheStats;

pub use geo::Point;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{CacheBuilder, GeohError, Result, SpatialCache};

    pub use crate::{Alphabet, GeoH};

    pub use crate::codec::{decode, encode, from_string, to_string};

    pub use crate::bits::{neighbors, next, prev};

    pub use crate::{CacheConfig, SearchConfig};

    pub use crate::{Closest, Nearby, PointRecord};

    #[cfg(feature = "sync")]
    pub use crate::SyncCache;

    pub use geo::Point;
}
