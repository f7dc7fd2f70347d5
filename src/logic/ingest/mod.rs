//! Ingestion Pipeline
//!
//! Orchestrates one refresh: fetch raw hotspots per source, reject rows
//! outside the monitored region, dedupe against the store, persist the
//! survivors record by record. Feed failures propagate; duplicates do not.

pub mod client;
pub mod feed;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::logic::dedup::{DedupConfig, DedupFilter};
use crate::logic::detections::{in_region, FireSource, NewDetection};
use crate::logic::store::detections::DetectionFilter;
use crate::logic::store::FireStore;

pub use client::{FeedConfig, FirmsClient};
pub use feed::{HotspotFeed, RawHotspot};

/// The FIRMS country endpoint serves at most this many trailing days.
const MAX_FEED_DAYS: i64 = 10;

/// Outcome counts of one refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Genuinely new detections persisted
    pub new_fires: usize,
    /// Raw rows fetched across all requested sources
    pub total_fires: usize,
    /// Rows dropped by the region band before deduplication
    pub rejected_out_of_region: usize,
}

/// Run one refresh over `[start, end]` (inclusive) for the given sources.
///
/// Store mutation is append-only and per-record: a failure mid-batch leaves
/// earlier accepted records committed.
pub fn refresh(
    store: &FireStore,
    feed: &dyn HotspotFeed,
    sources: &[FireSource],
    start: NaiveDate,
    end: NaiveDate,
    dedup_config: &DedupConfig,
) -> CoreResult<RefreshReport> {
    let span_days = (end - start).num_days() + 1;
    let days = span_days.clamp(1, MAX_FEED_DAYS) as u32;
    if span_days > MAX_FEED_DAYS {
        log::warn!("Requested {span_days}-day range truncated to the feed's {MAX_FEED_DAYS}-day window");
    }

    // Fetch everything first; a feed failure aborts before any mutation.
    let mut total_fires = 0usize;
    let mut rejected_out_of_region = 0usize;
    let mut candidates: Vec<NewDetection> = Vec::new();

    for &source in sources {
        let hotspots = feed.fetch(source, days)?;
        total_fires += hotspots.len();

        for raw in hotspots {
            if !in_region(raw.latitude, raw.longitude) {
                rejected_out_of_region += 1;
                continue;
            }
            candidates.push(to_detection(raw, source));
        }
    }

    if candidates.is_empty() {
        log::info!("Refresh complete: no in-region candidates ({total_fires} fetched)");
        return Ok(RefreshReport { new_fires: 0, total_fires, rejected_out_of_region });
    }

    // Seed the dedup index with stored records overlapping the batch's
    // date span, plus a day of slack for the 2-hour window at midnight.
    let batch_min = candidates.iter().map(|c| c.acq_date).min().unwrap();
    let batch_max = candidates.iter().map(|c| c.acq_date).max().unwrap();
    let existing = store.query_detections(&DetectionFilter {
        start_date: Some(batch_min - Duration::days(1)),
        end_date: Some(batch_max + Duration::days(1)),
        ..Default::default()
    })?;

    let mut filter = DedupFilter::with_existing(dedup_config.clone(), &existing);
    let mut new_fires = 0usize;

    for candidate in &candidates {
        if filter.check_and_insert(candidate) {
            store.insert_detection(candidate)?;
            new_fires += 1;
        }
    }

    log::info!(
        "Refresh complete: {new_fires} new of {total_fires} fetched ({rejected_out_of_region} out of region, {} duplicate)",
        candidates.len() - new_fires
    );

    Ok(RefreshReport { new_fires, total_fires, rejected_out_of_region })
}

fn to_detection(raw: RawHotspot, source: FireSource) -> NewDetection {
    NewDetection {
        latitude: raw.latitude,
        longitude: raw.longitude,
        confidence: raw.confidence,
        brightness: raw.brightness,
        bright_t31: raw.bright_t31,
        scan: raw.scan,
        track: raw.track,
        acq_date: raw.acq_date,
        acq_time: raw.acq_time,
        satellite: raw.satellite,
        instrument: raw.instrument,
        source,
        frp: raw.frp,
        daynight: raw.daynight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::collections::HashMap;

    /// In-memory feed keyed by source.
    pub struct StaticFeed {
        pub hotspots: HashMap<FireSource, Vec<RawHotspot>>,
        pub fail: bool,
    }

    impl HotspotFeed for StaticFeed {
        fn fetch(&self, source: FireSource, _days: u32) -> CoreResult<Vec<RawHotspot>> {
            if self.fail {
                return Err(CoreError::FeedUnavailable("connection refused".to_string()));
            }
            Ok(self.hotspots.get(&source).cloned().unwrap_or_default())
        }
    }

    fn hotspot(lat: f64, lon: f64, date: &str, time: &str) -> RawHotspot {
        RawHotspot {
            latitude: lat,
            longitude: lon,
            confidence: 80,
            brightness: Some(320.0),
            bright_t31: None,
            scan: None,
            track: None,
            acq_date: date.parse().unwrap(),
            acq_time: Some(time.to_string()),
            satellite: "Terra".to_string(),
            instrument: "MODIS".to_string(),
            frp: Some(12.0),
            daynight: Some("D".to_string()),
        }
    }

    fn modis_feed(hotspots: Vec<RawHotspot>) -> StaticFeed {
        let mut map = HashMap::new();
        map.insert(FireSource::ModisC61, hotspots);
        StaticFeed { hotspots: map, fail: false }
    }

    fn run(store: &FireStore, feed: &StaticFeed) -> RefreshReport {
        refresh(
            store,
            feed,
            &[FireSource::ModisC61],
            "2025-11-03".parse().unwrap(),
            "2025-11-03".parse().unwrap(),
            &DedupConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_refresh_persists_new_detections() {
        let store = FireStore::open_in_memory().unwrap();
        let feed = modis_feed(vec![
            hotspot(28.5, 77.2, "2025-11-03", "0700"),
            hotspot(30.1, 75.5, "2025-11-03", "0700"),
        ]);

        let report = run(&store, &feed);
        assert_eq!(report.new_fires, 2);
        assert_eq!(report.total_fires, 2);
        assert_eq!(report.rejected_out_of_region, 0);
        assert_eq!(store.detection_count().unwrap(), 2);
    }

    #[test]
    fn test_refresh_scenario_two_duplicates_of_store() {
        let store = FireStore::open_in_memory().unwrap();

        // Two hotspots already known
        let seeded = modis_feed(vec![
            hotspot(28.5, 77.2, "2025-11-03", "0600"),
            hotspot(30.1, 75.5, "2025-11-03", "0630"),
        ]);
        run(&store, &seeded);

        // Feed returns 5; two re-report the stored fires within 90 minutes
        // and under 1 km
        let feed = modis_feed(vec![
            hotspot(28.5005, 77.2, "2025-11-03", "0730"),  // dup of first
            hotspot(30.1, 75.5005, "2025-11-03", "0800"),  // dup of second
            hotspot(26.0, 80.0, "2025-11-03", "0700"),
            hotspot(27.0, 81.0, "2025-11-03", "0700"),
            hotspot(25.0, 82.0, "2025-11-03", "0700"),
        ]);

        let report = run(&store, &feed);
        assert_eq!(report.new_fires, 3);
        assert_eq!(report.total_fires, 5);
        assert_eq!(store.detection_count().unwrap(), 5);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let store = FireStore::open_in_memory().unwrap();
        let feed = modis_feed(vec![
            hotspot(28.5, 77.2, "2025-11-03", "0700"),
            hotspot(30.1, 75.5, "2025-11-03", "0715"),
        ]);

        let first = run(&store, &feed);
        assert_eq!(first.new_fires, 2);

        let second = run(&store, &feed);
        assert_eq!(second.new_fires, 0);
        assert_eq!(second.total_fires, 2);
        assert_eq!(store.detection_count().unwrap(), 2);
    }

    #[test]
    fn test_out_of_region_rejected_before_dedup() {
        let store = FireStore::open_in_memory().unwrap();
        let feed = modis_feed(vec![
            hotspot(40.0, 77.2, "2025-11-03", "0700"), // north of the band
            hotspot(28.5, 77.2, "2025-11-03", "0700"),
        ]);

        let report = run(&store, &feed);
        assert_eq!(report.new_fires, 1);
        assert_eq!(report.total_fires, 2);
        assert_eq!(report.rejected_out_of_region, 1);
    }

    #[test]
    fn test_feed_failure_propagates_without_mutation() {
        let store = FireStore::open_in_memory().unwrap();
        let feed = StaticFeed { hotspots: HashMap::new(), fail: true };

        let err = refresh(
            &store,
            &feed,
            &[FireSource::ModisC61],
            "2025-11-03".parse().unwrap(),
            "2025-11-03".parse().unwrap(),
            &DedupConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::FeedUnavailable(_)));
        assert_eq!(store.detection_count().unwrap(), 0);
    }

    #[test]
    fn test_intra_batch_duplicates_collapse() {
        let store = FireStore::open_in_memory().unwrap();
        let feed = modis_feed(vec![
            hotspot(28.5, 77.2, "2025-11-03", "0700"),
            hotspot(28.5002, 77.2001, "2025-11-03", "0745"),
        ]);

        let report = run(&store, &feed);
        assert_eq!(report.new_fires, 1);
        assert_eq!(report.total_fires, 2);
    }
}
