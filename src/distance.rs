//! Great-circle distance on a spherical Earth.
//!
//! Results are ranked with the haversine formula on a sphere of configurable
//! radius (6371 km by default), not with an ellipsoidal model.

use geo::{Distance, HaversineMeasure, Point};

/// Mean Earth radius used for ranking, in kilometers.
pub const MEAN_EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two lon/lat points, in the unit of `radius`.
///
/// ```
/// use geoh::distance::{haversine, MEAN_EARTH_RADIUS_KM};
/// use geo::Point;
///
/// let dublin = Point::new(-6.2603, 53.3498);
/// let london = Point::new(-0.1278, 51.5074);
/// let km = haversine(&dublin, &london, MEAN_EARTH_RADIUS_KM);
/// assert!((km - 464.0).abs() < 5.0);
/// ```
pub fn haversine(a: &Point, b: &Point, radius: f64) -> f64 {
    HaversineMeasure::new(radius).distance(*a, *b)
}
