//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change the default FIRMS endpoint or region, only edit this file.

use std::path::PathBuf;

/// Default NASA FIRMS API base URL
pub const DEFAULT_FIRMS_BASE_URL: &str = "https://firms.modaps.eosdis.nasa.gov";

/// Country code used by the FIRMS country endpoint
pub const DEFAULT_FIRMS_COUNTRY: &str = "IND";

/// Feed request timeout (seconds)
pub const DEFAULT_FEED_TIMEOUT_SECS: u64 = 30;

/// Acceptance band for stored detections (degrees, WGS84).
/// Records outside this band are rejected at the ingestion boundary.
pub const REGION_LAT_MIN: f64 = 15.0;
pub const REGION_LAT_MAX: f64 = 35.0;
pub const REGION_LON_MIN: f64 = 70.0;
pub const REGION_LON_MAX: f64 = 95.0;

/// Default query/prediction bounding box (Northern India monitoring area)
pub const DEFAULT_BOUNDS_LAT_MIN: f64 = 20.0;
pub const DEFAULT_BOUNDS_LAT_MAX: f64 = 32.0;
pub const DEFAULT_BOUNDS_LON_MIN: f64 = 78.0;
pub const DEFAULT_BOUNDS_LON_MAX: f64 = 88.0;

/// Default prediction grid cell size (degrees)
pub const DEFAULT_GRID_SIZE_DEG: f64 = 0.2;

/// Grid cell size used to build training samples (degrees). Matches the
/// 0.1-degree rounding the historical feature aggregation is defined on.
pub const TRAINING_GRID_SIZE_DEG: f64 = 0.1;

/// Forecast horizon for generated predictions (days)
pub const PREDICTION_HORIZON_DAYS: i64 = 7;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "FireWatch";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get FIRMS base URL from environment or use default
pub fn get_firms_base_url() -> String {
    std::env::var("FIRMS_BASE_URL").unwrap_or_else(|_| DEFAULT_FIRMS_BASE_URL.to_string())
}

/// Get FIRMS API key from environment (empty string when unset)
pub fn get_firms_api_key() -> String {
    std::env::var("FIRMS_API_KEY").unwrap_or_default()
}

/// Get FIRMS country code from environment or use default
pub fn get_firms_country() -> String {
    std::env::var("FIRMS_COUNTRY").unwrap_or_else(|_| DEFAULT_FIRMS_COUNTRY.to_string())
}

/// Get feed timeout from environment or use default
pub fn get_feed_timeout_secs() -> u64 {
    std::env::var("FIRMS_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_FEED_TIMEOUT_SECS)
}

/// Default database path: FIRE_CORE_DB_PATH, or the platform data dir
pub fn get_database_path() -> PathBuf {
    if let Ok(path) = std::env::var("FIRE_CORE_DB_PATH") {
        return PathBuf::from(path);
    }

    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("firewatch")
        .join("fire_detection.db")
}
