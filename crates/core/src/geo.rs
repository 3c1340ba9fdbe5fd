//! Great-circle distance between camera coordinates.
//!
//! Distances feed the subscription-candidate sort: cameras closer to the
//! query point rank first, and cameras without a known location are pushed
//! to the end via [`UNKNOWN_DISTANCE_KM`].

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Sentinel distance reported when either side has no geolocation.
///
/// Deliberately a literal large value rather than an absence: unlocated
/// cameras must sort after every located one, and persisted sort behavior
/// depends on this exact constant.
pub const UNKNOWN_DISTANCE_KM: f64 = 10000.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine great-circle distance in kilometres.
///
/// Symmetric in its arguments; `haversine_km(a, a)` is `0.0`.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = lat_b - lat_a;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * h.sqrt().asin()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
