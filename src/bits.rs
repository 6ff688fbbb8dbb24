//! Binary-string view of codes and the 8-cell neighbor ring.
//!
//! Serials are fixed-width counters: [`next`] and [`prev`] wrap modulo
//! `2^bit_length` and are never clamped to the real-world ±180°/±90° limits.
//! Neighbors of cells on the poles or the antimeridian therefore wrap to the
//! opposite edge of the grid and must be treated as approximate.

use crate::codec::{interleave, split};
use crate::error::{GeohError, Result};
use geoh_types::geoh::GeoH;

/// Zero-padded binary string of exactly `bit_length` characters.
pub fn serialize(geoh: &GeoH) -> String {
    geoh.bits().map(|bit| if bit { '1' } else { '0' }).collect()
}

/// Read a binary serial back into a code.
pub fn parse(serial: &str) -> Result<GeoH> {
    if serial.len() > GeoH::MAX_BITS as usize {
        return Err(GeohError::Decode(format!(
            "serial is longer than {} bits",
            GeoH::MAX_BITS
        )));
    }

    let mut value: u128 = 0;
    for c in serial.chars() {
        let bit = match c {
            '0' => 0,
            '1' => 1,
            other => {
                return Err(GeohError::Decode(format!(
                    "serial contains non-binary character '{}'",
                    other
                )));
            }
        };
        value = (value << 1) | bit;
    }

    Ok(GeoH::wrapping(value, serial.len() as u32))
}

/// The code one step up, wrapping to all zeros after all ones.
pub fn next(geoh: &GeoH) -> GeoH {
    GeoH::wrapping(geoh.value().wrapping_add(1), geoh.bit_length())
}

/// The code one step down, wrapping to all ones below zero.
pub fn prev(geoh: &GeoH) -> GeoH {
    GeoH::wrapping(geoh.value().wrapping_sub(1), geoh.bit_length())
}

/// The eight cells around `geoh` (its 3×3 Moore neighborhood minus itself).
///
/// Each axis is stepped independently on the de-interleaved grid, so cells on
/// the grid border get wrapped neighbors from the opposite side.
pub fn neighbors(geoh: &GeoH) -> [GeoH; 8] {
    let (lon, lat) = split(geoh);
    let lons = [prev(&lon), lon, next(&lon)];
    let lats = [prev(&lat), lat, next(&lat)];

    let mut ring = [GeoH::empty(); 8];
    let mut slot = 0;
    for (i, x) in lons.iter().enumerate() {
        for (j, y) in lats.iter().enumerate() {
            if i == 1 && j == 1 {
                continue;
            }
            ring[slot] = interleave(x, y);
            slot += 1;
        }
    }
    ring
}
