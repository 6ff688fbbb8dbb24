use serde::{Deserialize, Serialize};

/// Angular extent of a geohash cell, in degrees.
///
/// Depending on how a code is decoded this is either the full cell size or
/// its half-width around the cell center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Precision {
    /// Longitude extent in degrees
    pub lon: f64,
    /// Latitude extent in degrees
    pub lat: f64,
}

impl Precision {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn halved(&self) -> Self {
        Self {
            lon: self.lon / 2.0,
            lat: self.lat / 2.0,
        }
    }
}

/// Metric size of a geohash cell on a spherical Earth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    /// East-west extent in meters
    pub width_m: f64,
    /// North-south extent in meters
    pub height_m: f64,
}

impl CellSize {
    pub fn new(width_m: f64, height_m: f64) -> Self {
        Self { width_m, height_m }
    }

    pub fn diagonal(&self) -> f64 {
        self.width_m.hypot(self.height_m)
    }

    pub fn half_diagonal(&self) -> f64 {
        self.diagonal() / 2.0
    }
}
