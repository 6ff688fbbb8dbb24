//! # geoh-types
//!
//! Core data types shared by the `geoh` geohash codec and spatial cache.
//!
//! - **Codes**: `GeoH`, an interleaved bit code that remembers its bit length
//! - **Extents**: `Precision` (degrees) and `CellSize` (meters)
//! - **Records**: `CachedPoint`, `DensityBucket`, `CacheStats`
//!
//! All types are serializable with Serde.
//!
//! ## Examples
//!
//! ```rust
//! use geoh_types::geoh::GeoH;
//!
//! let code = GeoH::new(0b0110, 4).unwrap();
//! assert_eq!(code.to_string(), "<0110>");
//! assert_eq!(code.truncate(2).value(), 0b01);
//! ```

pub mod extent;
pub mod geoh;
pub mod record;
pub mod stats;

pub use bytes::Bytes;
