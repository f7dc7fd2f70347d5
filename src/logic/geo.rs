//! Geographic primitives shared by the store filters, the dedup index and
//! the prediction grid.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BOUNDS_LAT_MAX, DEFAULT_BOUNDS_LAT_MIN, DEFAULT_BOUNDS_LON_MAX, DEFAULT_BOUNDS_LON_MIN,
};

/// Mean Earth radius (km)
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Axis-aligned bounding box in degrees, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self { lat_min, lat_max, lon_min, lon_max }
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.lat_min
            && latitude <= self.lat_max
            && longitude >= self.lon_min
            && longitude <= self.lon_max
    }
}

impl Default for BoundingBox {
    /// The default monitoring area (Northern India).
    fn default() -> Self {
        Self {
            lat_min: DEFAULT_BOUNDS_LAT_MIN,
            lat_max: DEFAULT_BOUNDS_LAT_MAX,
            lon_min: DEFAULT_BOUNDS_LON_MIN,
            lon_max: DEFAULT_BOUNDS_LON_MAX,
        }
    }
}

/// Great-circle distance between two WGS84 points, in km (haversine).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}
