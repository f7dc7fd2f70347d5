//! Cell History Aggregation
//!
//! Rolls historical detections up into per-cell statistics plus the global
//! statistics used to normalise features and to fill cells with no
//! history. Empty cells get the global mean - never zero, which would bias
//! unseen cells toward "no risk".

use std::collections::HashMap;

use crate::logic::detections::{hhmm_hour, FireDetection};

use super::grid::Grid;

/// Mean satellite overpass hour; the last-resort hour default when no
/// detection in the history carries a usable time.
pub const FALLBACK_HOUR: f64 = 13.5;

/// Running aggregates for one grid cell.
#[derive(Debug, Clone, Default)]
pub struct CellStats {
    pub count: usize,
    brightness_sum: f64,
    brightness_n: usize,
    confidence_sum: f64,
    frp_sum: f64,
    frp_n: usize,
    hour_sum: f64,
    hour_n: usize,
}

impl CellStats {
    fn add(&mut self, detection: &FireDetection) {
        self.count += 1;
        self.confidence_sum += detection.confidence as f64;
        if let Some(brightness) = detection.brightness {
            self.brightness_sum += brightness;
            self.brightness_n += 1;
        }
        if let Some(frp) = detection.frp {
            self.frp_sum += frp;
            self.frp_n += 1;
        }
        if let Some(hour) = hhmm_hour(detection.acq_time.as_deref()) {
            self.hour_sum += hour;
            self.hour_n += 1;
        }
    }

    pub fn mean_brightness(&self) -> Option<f64> {
        (self.brightness_n > 0).then(|| self.brightness_sum / self.brightness_n as f64)
    }

    pub fn mean_confidence(&self) -> Option<f64> {
        (self.count > 0).then(|| self.confidence_sum / self.count as f64)
    }

    pub fn mean_frp(&self) -> Option<f64> {
        (self.frp_n > 0).then(|| self.frp_sum / self.frp_n as f64)
    }

    pub fn mean_hour(&self) -> Option<f64> {
        (self.hour_n > 0).then(|| self.hour_sum / self.hour_n as f64)
    }
}

/// History-wide statistics: maxima for normalisation, means as the neutral
/// defaults for cells without history.
#[derive(Debug, Clone)]
pub struct GlobalStats {
    pub max_brightness: f64,
    pub max_frp: f64,
    pub mean_brightness_norm: f64,
    pub mean_confidence_norm: f64,
    pub mean_frp_norm: f64,
    pub mean_hour: f64,
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self {
            max_brightness: 1.0,
            max_frp: 1.0,
            mean_brightness_norm: 0.5,
            mean_confidence_norm: 0.5,
            mean_frp_norm: 0.5,
            mean_hour: FALLBACK_HOUR,
        }
    }
}

/// Per-cell aggregates for one grid over one detection history.
pub struct CellHistoryIndex {
    cells: HashMap<(usize, usize), CellStats>,
    global: GlobalStats,
}

impl CellHistoryIndex {
    pub fn build(grid: &Grid, detections: &[FireDetection]) -> Self {
        let mut cells: HashMap<(usize, usize), CellStats> = HashMap::new();

        for detection in detections {
            let Some(key) = grid.cell_index(detection.latitude, detection.longitude) else {
                continue; // outside this grid's bounds
            };
            cells.entry(key).or_default().add(detection);
        }

        let global = compute_global(&cells);
        Self { cells, global }
    }

    pub fn global(&self) -> &GlobalStats {
        &self.global
    }

    pub fn cell(&self, lat_idx: usize, lon_idx: usize) -> Option<&CellStats> {
        self.cells.get(&(lat_idx, lon_idx))
    }

    pub fn cell_count(&self, lat_idx: usize, lon_idx: usize) -> usize {
        self.cell(lat_idx, lon_idx).map_or(0, |c| c.count)
    }

    /// Detections in the cell and its eight neighbours.
    pub fn neighborhood_count(&self, lat_idx: usize, lon_idx: usize) -> usize {
        let mut total = 0;
        for dlat in -1i64..=1 {
            for dlon in -1i64..=1 {
                let lat = lat_idx as i64 + dlat;
                let lon = lon_idx as i64 + dlon;
                if lat < 0 || lon < 0 {
                    continue;
                }
                total += self.cell_count(lat as usize, lon as usize);
            }
        }
        total
    }

    /// Number of distinct cells that have any history.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}

fn compute_global(cells: &HashMap<(usize, usize), CellStats>) -> GlobalStats {
    let mut global = GlobalStats::default();
    if cells.is_empty() {
        return global;
    }

    let mut max_brightness: f64 = 0.0;
    let mut max_frp: f64 = 0.0;
    for stats in cells.values() {
        if let Some(b) = stats.mean_brightness() {
            max_brightness = max_brightness.max(b);
        }
        if let Some(f) = stats.mean_frp() {
            max_frp = max_frp.max(f);
        }
    }
    global.max_brightness = max_brightness.max(1.0);
    global.max_frp = max_frp.max(1.0);

    let mean_of = |values: Vec<f64>| -> Option<f64> {
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    };

    if let Some(mean) = mean_of(
        cells.values().filter_map(CellStats::mean_brightness).map(|b| b / global.max_brightness).collect(),
    ) {
        global.mean_brightness_norm = mean;
    }
    if let Some(mean) = mean_of(
        cells.values().filter_map(CellStats::mean_confidence).map(|c| c / 100.0).collect(),
    ) {
        global.mean_confidence_norm = mean;
    }
    if let Some(mean) = mean_of(
        cells.values().filter_map(CellStats::mean_frp).map(|f| f / global.max_frp).collect(),
    ) {
        global.mean_frp_norm = mean;
    }
    if let Some(mean) = mean_of(cells.values().filter_map(CellStats::mean_hour).collect()) {
        global.mean_hour = mean;
    }

    global
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::detections::FireSource;
    use crate::logic::geo::BoundingBox;

    fn detection(lat: f64, lon: f64, brightness: f64, confidence: i64) -> FireDetection {
        FireDetection {
            id: 0,
            latitude: lat,
            longitude: lon,
            confidence,
            brightness: Some(brightness),
            bright_t31: None,
            scan: None,
            track: None,
            acq_date: "2025-11-03".parse().unwrap(),
            acq_time: Some("1330".to_string()),
            satellite: "Terra".to_string(),
            instrument: "MODIS".to_string(),
            source: FireSource::ModisC61,
            frp: Some(10.0),
            daynight: Some("D".to_string()),
            created_at: chrono::Utc::now(),
        }
    }

    fn grid() -> Grid {
        Grid::new(BoundingBox::new(20.0, 32.0, 78.0, 88.0), 0.2)
    }

    #[test]
    fn test_cell_aggregation() {
        let grid = grid();
        let detections = vec![
            detection(20.1, 78.1, 300.0, 60),
            detection(20.15, 78.15, 320.0, 80),
            detection(25.1, 83.1, 340.0, 90),
        ];
        let index = CellHistoryIndex::build(&grid, &detections);

        assert_eq!(index.cell_count(0, 0), 2);
        let cell = index.cell(0, 0).unwrap();
        assert_eq!(cell.mean_brightness(), Some(310.0));
        assert_eq!(cell.mean_confidence(), Some(70.0));
        assert_eq!(cell.mean_hour(), Some(13.5));
        assert_eq!(index.occupied_cells(), 2);
    }

    #[test]
    fn test_neighborhood_count_spans_adjacent_cells() {
        let grid = grid();
        let detections = vec![
            detection(20.1, 78.1, 300.0, 60),  // cell (0,0)
            detection(20.3, 78.3, 300.0, 60),  // cell (1,1)
            detection(21.1, 83.1, 300.0, 60),  // far away
        ];
        let index = CellHistoryIndex::build(&grid, &detections);

        assert_eq!(index.neighborhood_count(0, 0), 2);
        assert_eq!(index.neighborhood_count(1, 1), 2);
    }

    #[test]
    fn test_empty_history_uses_neutral_defaults() {
        let index = CellHistoryIndex::build(&grid(), &[]);
        let global = index.global();
        assert_eq!(global.mean_brightness_norm, 0.5);
        assert_eq!(global.mean_confidence_norm, 0.5);
        assert_eq!(global.mean_hour, FALLBACK_HOUR);
        assert_eq!(index.cell_count(0, 0), 0);
    }

    #[test]
    fn test_out_of_grid_detections_ignored() {
        let detections = vec![detection(33.0, 78.1, 300.0, 60)]; // north of grid
        let index = CellHistoryIndex::build(&grid(), &detections);
        assert_eq!(index.occupied_cells(), 0);
    }
}
