//! Deduplication Filter
//!
//! Decides whether a freshly fetched detection re-reports a hotspot the
//! store already knows. Two detections describe the same physical event
//! when they fall in the same source bucket, within the bucket's spatial
//! tolerance (great-circle), and within a 2-hour window of each other
//! (closed interval: a detection exactly at the boundary is a duplicate).
//!
//! Comparison is pairwise against known records, never a global clustering.
//! A spatial hash over rounded lat/lon cells prunes candidates before any
//! distance is computed, keeping a refresh at O(batch) instead of
//! O(batch x stored).

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::logic::detections::{FireDetection, NewDetection, SourceBucket};
use crate::logic::geo::haversine_km;

/// Spatial hash cell size (degrees). Must stay >= the largest tolerance in
/// degrees so a 3x3 neighbourhood probe covers every possible match.
const INDEX_CELL_DEG: f64 = 0.02;

/// Per-bucket tolerances. Spatial tolerance tracks the satellite pixel
/// size: MODIS 1 km, VIIRS 375 m; user reports get the coarser 1 km.
#[derive(Debug, Clone)]
pub struct DedupConfig {
    pub modis_tolerance_km: f64,
    pub viirs_tolerance_km: f64,
    pub user_tolerance_km: f64,
    /// Temporal window, minutes; shared by all buckets
    pub time_window_minutes: i64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            modis_tolerance_km: 1.0,
            viirs_tolerance_km: 0.375,
            user_tolerance_km: 1.0,
            time_window_minutes: 120,
        }
    }
}

impl DedupConfig {
    fn tolerance_km(&self, bucket: SourceBucket) -> f64 {
        match bucket {
            SourceBucket::Modis => self.modis_tolerance_km,
            SourceBucket::Viirs => self.viirs_tolerance_km,
            SourceBucket::User => self.user_tolerance_km,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct KnownPoint {
    latitude: f64,
    longitude: f64,
    at: NaiveDateTime,
}

type CellKey = (SourceBucket, i64, i64);

/// Duplicate detector over the known record set. Accepted candidates are
/// fed back in, so later candidates of the same batch dedupe against them
/// and a repeated refresh yields zero new records.
pub struct DedupFilter {
    config: DedupConfig,
    cells: HashMap<CellKey, Vec<KnownPoint>>,
}

impl DedupFilter {
    pub fn new(config: DedupConfig) -> Self {
        Self { config, cells: HashMap::new() }
    }

    /// Seed the index with records already in the store (typically the
    /// batch's date span plus a day of slack on each side).
    pub fn with_existing(config: DedupConfig, existing: &[FireDetection]) -> Self {
        let mut filter = Self::new(config);
        for detection in existing {
            filter.insert(
                detection.latitude,
                detection.longitude,
                detection.source.bucket(),
                detection.acq_datetime(),
            );
        }
        filter
    }

    pub fn insert(&mut self, latitude: f64, longitude: f64, bucket: SourceBucket, at: NaiveDateTime) {
        let key = cell_key(bucket, latitude, longitude);
        self.cells.entry(key).or_default().push(KnownPoint { latitude, longitude, at });
    }

    /// True when some known record of the same bucket matches within the
    /// spatial tolerance and the closed temporal window.
    pub fn is_duplicate(
        &self,
        latitude: f64,
        longitude: f64,
        bucket: SourceBucket,
        at: NaiveDateTime,
    ) -> bool {
        let tolerance_km = self.config.tolerance_km(bucket);
        let (_, lat_cell, lon_cell) = cell_key(bucket, latitude, longitude);

        for dlat in -1..=1 {
            for dlon in -1..=1 {
                let Some(points) = self.cells.get(&(bucket, lat_cell + dlat, lon_cell + dlon))
                else {
                    continue;
                };
                for point in points {
                    let minutes = (at - point.at).num_minutes().abs();
                    if minutes > self.config.time_window_minutes {
                        continue;
                    }
                    if haversine_km(latitude, longitude, point.latitude, point.longitude)
                        <= tolerance_km
                    {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Check a candidate; when genuinely new, record it and return true.
    pub fn check_and_insert(&mut self, candidate: &NewDetection) -> bool {
        let bucket = candidate.source.bucket();
        let at = candidate.acq_datetime();
        if self.is_duplicate(candidate.latitude, candidate.longitude, bucket, at) {
            return false;
        }
        self.insert(candidate.latitude, candidate.longitude, bucket, at);
        true
    }
}

fn cell_key(bucket: SourceBucket, latitude: f64, longitude: f64) -> CellKey {
    (
        bucket,
        (latitude / INDEX_CELL_DEG).floor() as i64,
        (longitude / INDEX_CELL_DEG).floor() as i64,
    )
}
