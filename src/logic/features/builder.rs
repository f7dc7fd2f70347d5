//! Grid Feature Builder
//!
//! Produces one feature vector per (cell, day) sample for training, and
//! per grid cell at a forecast date for prediction. Both paths share the
//! same cell aggregates and the same layout, so the model never sees a
//! vector shaped differently from what it was fitted on.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use ndarray::{Array1, Array2};

use crate::logic::detections::FireDetection;

use super::grid::{CellCenter, Grid};
use super::history::CellHistoryIndex;
use super::layout::FEATURE_COUNT;
use super::vector::FeatureVector;

/// Forward window used to build the training target: detections observed
/// in the cell over the following week, normalised per day and capped.
pub const TARGET_WINDOW_DAYS: i64 = 7;

/// Months with elevated burning activity (stubble seasons)
const PEAK_SEASON_MONTHS: [u32; 6] = [3, 4, 5, 10, 11, 12];
/// Post-harvest months inside the peak seasons
const POST_HARVEST_MONTHS: [u32; 4] = [4, 5, 11, 12];

/// Rectangular training data: rows = (cell, day) samples in chronological
/// order, columns = the feature layout, plus the target column.
pub struct TrainingSet {
    pub matrix: Array2<f64>,
    pub targets: Array1<f64>,
    /// Sample day per row, ascending; drives the chronological split
    pub sample_days: Vec<NaiveDate>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.sample_days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_days.is_empty()
    }
}

/// One feature vector for a grid cell at a given date. Cells without
/// history fall back to the global means, never zero.
pub fn cell_feature_vector(
    index: &CellHistoryIndex,
    cell: &CellCenter,
    date: NaiveDate,
) -> FeatureVector {
    let global = index.global();
    let stats = index.cell(cell.lat_idx, cell.lon_idx);

    let month = date.month();
    let is_weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);

    let mut vector = FeatureVector::new();
    vector.set_by_name("latitude", cell.latitude);
    vector.set_by_name("longitude", cell.longitude);
    vector.set_by_name("month", month as f64);
    vector.set_by_name("day_of_year", date.ordinal() as f64);
    vector.set_by_name(
        "hour_of_day",
        stats.and_then(|s| s.mean_hour()).unwrap_or(global.mean_hour),
    );
    vector.set_by_name("is_weekend", is_weekend as u8 as f64);
    vector.set_by_name("is_peak_season", PEAK_SEASON_MONTHS.contains(&month) as u8 as f64);
    vector.set_by_name("is_post_harvest", POST_HARVEST_MONTHS.contains(&month) as u8 as f64);
    vector.set_by_name(
        "brightness_norm",
        stats
            .and_then(|s| s.mean_brightness())
            .map_or(global.mean_brightness_norm, |b| b / global.max_brightness),
    );
    vector.set_by_name(
        "confidence_norm",
        stats
            .and_then(|s| s.mean_confidence())
            .map_or(global.mean_confidence_norm, |c| c / 100.0),
    );
    vector.set_by_name(
        "frp_norm",
        stats
            .and_then(|s| s.mean_frp())
            .map_or(global.mean_frp_norm, |f| f / global.max_frp),
    );
    vector.set_by_name("cell_count", index.cell_count(cell.lat_idx, cell.lon_idx) as f64);
    vector.set_by_name(
        "neighborhood_count",
        index.neighborhood_count(cell.lat_idx, cell.lon_idx) as f64,
    );
    vector
}

/// Build the training matrix: one sample per (cell, day-with-detections),
/// target = detections in the same cell over the following
/// `TARGET_WINDOW_DAYS`, per day, capped at 1.0.
pub fn build_training_set(grid: &Grid, detections: &[FireDetection]) -> TrainingSet {
    let index = CellHistoryIndex::build(grid, detections);

    // Detections per (cell, day); BTreeMap keeps days ordered for the
    // forward-window scan.
    let mut day_counts: HashMap<(usize, usize), BTreeMap<NaiveDate, usize>> = HashMap::new();
    for detection in detections {
        let Some(key) = grid.cell_index(detection.latitude, detection.longitude) else {
            continue;
        };
        *day_counts.entry(key).or_default().entry(detection.acq_date).or_insert(0) += 1;
    }

    let mut samples: Vec<(NaiveDate, (usize, usize), f64)> = Vec::new();
    for (&key, days) in &day_counts {
        for (&day, _) in days {
            let window_end = day + Duration::days(TARGET_WINDOW_DAYS);
            let future: usize = days
                .range((std::ops::Bound::Excluded(day), std::ops::Bound::Included(window_end)))
                .map(|(_, &count)| count)
                .sum();
            let target = (future as f64 / TARGET_WINDOW_DAYS as f64).min(1.0);
            samples.push((day, key, target));
        }
    }

    // Chronological order; cell index breaks same-day ties deterministically
    samples.sort_by_key(|&(day, key, _)| (day, key));

    let mut flat = Vec::with_capacity(samples.len() * FEATURE_COUNT);
    let mut targets = Vec::with_capacity(samples.len());
    let mut sample_days = Vec::with_capacity(samples.len());

    for (day, (lat_idx, lon_idx), target) in samples {
        let cell = grid.center(lat_idx, lon_idx);
        let vector = cell_feature_vector(&index, &cell, day);
        flat.extend_from_slice(vector.as_slice());
        targets.push(target);
        sample_days.push(day);
    }

    let rows = sample_days.len();
    TrainingSet {
        matrix: Array2::from_shape_vec((rows, FEATURE_COUNT), flat)
            .expect("row construction guarantees the shape"),
        targets: Array1::from_vec(targets),
        sample_days,
    }
}
