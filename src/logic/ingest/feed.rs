//! Hotspot Feed Seam
//!
//! The pipeline talks to the satellite feed through this trait so the
//! production client can be swapped for an in-memory feed in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::logic::detections::FireSource;

/// One raw hotspot row as parsed from the feed, before region validation
/// and deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHotspot {
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: i64,
    pub brightness: Option<f64>,
    pub bright_t31: Option<f64>,
    pub scan: Option<f64>,
    pub track: Option<f64>,
    pub acq_date: NaiveDate,
    pub acq_time: Option<String>,
    pub satellite: String,
    pub instrument: String,
    pub frp: Option<f64>,
    pub daynight: Option<String>,
}

/// Upstream hotspot source. `fetch` returns the raw rows for one product
/// over the trailing `days` window, or `FeedUnavailable` - partial data
/// must never masquerade as a complete refresh.
pub trait HotspotFeed: Send + Sync {
    fn fetch(&self, source: FireSource, days: u32) -> CoreResult<Vec<RawHotspot>>;
}
