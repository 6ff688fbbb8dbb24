//! Geohash encoding and decoding.
//!
//! A code is built by bisecting the longitude range `[-180, 180)` and the
//! latitude range `[-90, 90)` alternately, longitude first. Each step emits a
//! 1 when the coordinate lies in the upper half, else a 0. Odd bit lengths give
//! longitude one more bit than latitude.
//!
//! ```rust
//! use geoh::{Alphabet, codec};
//!
//! let dublin = codec::encode(-6.272877, 53.344606, 50)?;
//! assert_eq!(codec::to_string(&dublin, &Alphabet::default()), "gc7x3r04z7");
//!
//! let decoded = codec::decode(&dublin, true);
//! assert!((decoded.lon - -6.272877).abs() <= decoded.precision.lon);
//! assert!((decoded.lat - 53.344606).abs() <= decoded.precision.lat);
//! # Ok::<(), geoh::GeohError>(())
//! ```

use crate::alphabet::Alphabet;
use crate::error::{GeohError, Result};
use geo::Point;
use geoh_types::extent::{CellSize, Precision};
use geoh_types::geoh::GeoH;

/// Popular Visualisation Spheroid radius (EPSG:7059), in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Bits carried by one alphabet symbol.
pub const BITS_PER_SYMBOL: u32 = 5;

/// A decoded cell position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoded {
    pub lon: f64,
    pub lat: f64,
    /// Full cell size for corner decoding, half size for centered decoding
    pub precision: Precision,
}

impl Decoded {
    pub fn point(&self) -> Point {
        Point::new(self.lon, self.lat)
    }
}

/// Encode a longitude/latitude pair into a `bits`-long code.
///
/// Coordinates are treated as flat angles; values outside the world ranges
/// saturate to the first or last cell.
pub fn encode(lon: f64, lat: f64, bits: u32) -> Result<GeoH> {
    if !lon.is_finite() || !lat.is_finite() {
        return Err(GeohError::InvalidInput(format!(
            "coordinates must be finite, got ({}, {})",
            lon, lat
        )));
    }
    if bits > GeoH::MAX_BITS {
        return Err(GeohError::InvalidInput(format!(
            "bit length {} exceeds maximum of {}",
            bits,
            GeoH::MAX_BITS
        )));
    }

    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut value: u128 = 0;

    for i in 0..bits {
        let (coord, range) = if i % 2 == 0 {
            (lon, &mut lon_range)
        } else {
            (lat, &mut lat_range)
        };
        let mid = (range.0 + range.1) / 2.0;
        value <<= 1;
        if coord >= mid {
            value |= 1;
            range.0 = mid;
        } else {
            range.1 = mid;
        }
    }

    Ok(GeoH::wrapping(value, bits))
}

/// Decode a code back to a position.
///
/// With `centered == false` this returns the lower-left corner of the cell and
/// the full cell size; with `centered == true` the cell midpoint and half size.
pub fn decode(geoh: &GeoH, centered: bool) -> Decoded {
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut lat_range = (-90.0_f64, 90.0_f64);

    for (i, bit) in geoh.bits().enumerate() {
        let range = if i % 2 == 0 {
            &mut lon_range
        } else {
            &mut lat_range
        };
        let mid = (range.0 + range.1) / 2.0;
        if bit {
            range.0 = mid;
        } else {
            range.1 = mid;
        }
    }

    let size = Precision::new(lon_range.1 - lon_range.0, lat_range.1 - lat_range.0);
    if centered {
        let half = size.halved();
        Decoded {
            lon: lon_range.0 + half.lon,
            lat: lat_range.0 + half.lat,
            precision: half,
        }
    } else {
        Decoded {
            lon: lon_range.0,
            lat: lat_range.0,
            precision: size,
        }
    }
}

/// Render a code with `alphabet`.
///
/// The `bit_length % 5` trailing bits are dropped first, then each 5-bit group
/// from the most significant end becomes one symbol. Leading zero groups are
/// kept, so the output always has `bit_length / 5` symbols.
pub fn to_string(geoh: &GeoH, alphabet: &Alphabet) -> String {
    let digits = geoh.bit_length() / BITS_PER_SYMBOL;
    let value = geoh.value() >> (geoh.bit_length() % BITS_PER_SYMBOL);

    (0..digits)
        .rev()
        .map(|group| {
            let index = (value >> (group * BITS_PER_SYMBOL)) & 0b1_1111;
            alphabet.symbol(index as u8)
        })
        .collect()
}

/// Parse a text geohash written with `alphabet`.
///
/// The result is `5 * symbols` bits long.
pub fn from_string(code: &str, alphabet: &Alphabet) -> Result<GeoH> {
    let mut value: u128 = 0;
    let mut bit_length: u32 = 0;

    for c in code.chars() {
        let index = alphabet.index_of(c).ok_or_else(|| {
            GeohError::Decode(format!("symbol '{}' is not in alphabet '{}'", c, alphabet))
        })?;
        bit_length += BITS_PER_SYMBOL;
        if bit_length > GeoH::MAX_BITS {
            return Err(GeohError::Decode(format!(
                "geohash '{}' is longer than {} bits",
                code,
                GeoH::MAX_BITS
            )));
        }
        value = (value << BITS_PER_SYMBOL) | index as u128;
    }

    Ok(GeoH::wrapping(value, bit_length))
}

/// De-interleave a code into its longitude and latitude bits.
///
/// The longitude half is one bit longer when the code has an odd length.
pub fn split(geoh: &GeoH) -> (GeoH, GeoH) {
    let (mut lon, mut lon_bits) = (0u128, 0u32);
    let (mut lat, mut lat_bits) = (0u128, 0u32);

    for (i, bit) in geoh.bits().enumerate() {
        if i % 2 == 0 {
            lon = (lon << 1) | bit as u128;
            lon_bits += 1;
        } else {
            lat = (lat << 1) | bit as u128;
            lat_bits += 1;
        }
    }

    (GeoH::wrapping(lon, lon_bits), GeoH::wrapping(lat, lat_bits))
}

/// Interleave longitude and latitude bits back into one code.
///
/// The longitude part must be as long as the latitude part or one bit longer,
/// which is what [`split`] produces.
pub fn join(lon: &GeoH, lat: &GeoH) -> Result<GeoH> {
    let (lon_bits, lat_bits) = (lon.bit_length(), lat.bit_length());
    if lon_bits != lat_bits && lon_bits != lat_bits + 1 {
        return Err(GeohError::InvalidInput(format!(
            "cannot join {} longitude bits with {} latitude bits",
            lon_bits, lat_bits
        )));
    }
    Ok(interleave(lon, lat))
}

/// Interleave two axes whose lengths are known to be compatible.
pub(crate) fn interleave(lon: &GeoH, lat: &GeoH) -> GeoH {
    let mut value: u128 = 0;
    let mut lon_bits = lon.bits();
    let mut lat_bits = lat.bits();

    loop {
        match lon_bits.next() {
            Some(bit) => value = (value << 1) | bit as u128,
            None => break,
        }
        match lat_bits.next() {
            Some(bit) => value = (value << 1) | bit as u128,
            None => break,
        }
    }

    GeoH::wrapping(value, lon.bit_length() + lat.bit_length())
}

/// Encode straight to text with `digits` symbols.
pub fn geohash(lon: f64, lat: f64, digits: u32, alphabet: &Alphabet) -> Result<String> {
    let geoh = encode(lon, lat, digits * BITS_PER_SYMBOL)?;
    Ok(to_string(&geoh, alphabet))
}

/// Decode a text geohash straight to a position.
pub fn geodesic(code: &str, alphabet: &Alphabet, centered: bool) -> Result<Decoded> {
    let geoh = from_string(code, alphabet)?;
    Ok(decode(&geoh, centered))
}

/// Metric size of a cell at `bits` depth on a sphere of `earth_radius_m`.
pub fn cell_size(bits: u32, earth_radius_m: f64) -> CellSize {
    let lon_bits = bits.div_ceil(2);
    let lat_bits = bits / 2;
    let width = 360.0 / 2f64.powi(lon_bits as i32);
    let height = 180.0 / 2f64.powi(lat_bits as i32);
    CellSize::new(
        width.to_radians() * earth_radius_m,
        height.to_radians() * earth_radius_m,
    )
}

/// Metric size of the cell a code denotes, on the EPSG:7059 sphere.
pub fn precision_m(geoh: &GeoH) -> CellSize {
    cell_size(geoh.bit_length(), EARTH_RADIUS_M)
}
