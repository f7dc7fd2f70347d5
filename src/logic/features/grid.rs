//! Prediction Grid
//!
//! Pure mapping from (bounds, cell size) to a deterministic sequence of
//! cell centres. Feature building and prediction generation share this one
//! definition, so expected cell counts are exact and testable.

use crate::logic::geo::BoundingBox;

/// A fixed-resolution tiling of a bounding box. Cells are indexed
/// row-major from the south-west corner; only whole cells inside the box
/// are enumerated.
#[derive(Debug, Clone)]
pub struct Grid {
    pub bounds: BoundingBox,
    pub cell_size_deg: f64,
    lat_cells: usize,
    lon_cells: usize,
}

/// Centre of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellCenter {
    pub lat_idx: usize,
    pub lon_idx: usize,
    pub latitude: f64,
    pub longitude: f64,
}

impl Grid {
    pub fn new(bounds: BoundingBox, cell_size_deg: f64) -> Self {
        // Epsilon absorbs binary representation error on exact divisions
        // (12.0 / 0.2 must count 60 cells, not 59).
        let count = |span: f64| {
            if span <= 0.0 || cell_size_deg <= 0.0 {
                0
            } else {
                ((span / cell_size_deg) + 1e-9).floor() as usize
            }
        };

        Self {
            bounds,
            cell_size_deg,
            lat_cells: count(bounds.lat_max - bounds.lat_min),
            lon_cells: count(bounds.lon_max - bounds.lon_min),
        }
    }

    pub fn lat_cells(&self) -> usize {
        self.lat_cells
    }

    pub fn lon_cells(&self) -> usize {
        self.lon_cells
    }

    pub fn cell_count(&self) -> usize {
        self.lat_cells * self.lon_cells
    }

    /// Deterministic enumeration of every cell centre.
    pub fn centers(&self) -> impl Iterator<Item = CellCenter> + '_ {
        (0..self.lat_cells).flat_map(move |lat_idx| {
            (0..self.lon_cells).map(move |lon_idx| self.center(lat_idx, lon_idx))
        })
    }

    pub fn center(&self, lat_idx: usize, lon_idx: usize) -> CellCenter {
        CellCenter {
            lat_idx,
            lon_idx,
            latitude: self.bounds.lat_min + (lat_idx as f64 + 0.5) * self.cell_size_deg,
            longitude: self.bounds.lon_min + (lon_idx as f64 + 0.5) * self.cell_size_deg,
        }
    }

    /// Cell containing a point, when inside the grid. Points on the max
    /// edges belong to the last cell.
    pub fn cell_index(&self, latitude: f64, longitude: f64) -> Option<(usize, usize)> {
        if self.lat_cells == 0 || self.lon_cells == 0 {
            return None;
        }
        let lat_idx = index_on_axis(latitude, self.bounds.lat_min, self.bounds.lat_max, self.cell_size_deg, self.lat_cells)?;
        let lon_idx = index_on_axis(longitude, self.bounds.lon_min, self.bounds.lon_max, self.cell_size_deg, self.lon_cells)?;
        Some((lat_idx, lon_idx))
    }
}

fn index_on_axis(value: f64, min: f64, max: f64, size: f64, cells: usize) -> Option<usize> {
    if value < min || value > max {
        return None;
    }
    let idx = ((value - min) / size).floor() as usize;
    Some(idx.min(cells - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_region_cell_count_is_exact() {
        // 0.2 deg over lat [20,32] x lon [78,88]: 60 x 50 = 3000 cells
        let grid = Grid::new(BoundingBox::new(20.0, 32.0, 78.0, 88.0), 0.2);
        assert_eq!(grid.lat_cells(), 60);
        assert_eq!(grid.lon_cells(), 50);
        assert_eq!(grid.cell_count(), 3000);
        assert_eq!(grid.centers().count(), 3000);
    }

    #[test]
    fn test_centers_are_offset_by_half_a_cell() {
        let grid = Grid::new(BoundingBox::new(20.0, 21.0, 78.0, 79.0), 0.5);
        let centers: Vec<_> = grid.centers().collect();
        assert_eq!(centers.len(), 4);
        assert!((centers[0].latitude - 20.25).abs() < 1e-12);
        assert!((centers[0].longitude - 78.25).abs() < 1e-12);
        assert!((centers[3].latitude - 20.75).abs() < 1e-12);
        assert!((centers[3].longitude - 78.75).abs() < 1e-12);
    }

    #[test]
    fn test_enumeration_is_deterministic() {
        let grid = Grid::new(BoundingBox::default(), 0.5);
        let first: Vec<_> = grid.centers().collect();
        let second: Vec<_> = grid.centers().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cell_index_round_trips_centers() {
        let grid = Grid::new(BoundingBox::new(20.0, 32.0, 78.0, 88.0), 0.2);
        let center = grid.center(10, 20);
        assert_eq!(grid.cell_index(center.latitude, center.longitude), Some((10, 20)));
    }

    #[test]
    fn test_cell_index_edges() {
        let grid = Grid::new(BoundingBox::new(20.0, 32.0, 78.0, 88.0), 0.2);
        // Max edges fold into the last cell
        assert_eq!(grid.cell_index(32.0, 88.0), Some((59, 49)));
        assert_eq!(grid.cell_index(19.9, 80.0), None);
        assert_eq!(grid.cell_index(20.0, 88.1), None);
    }

    #[test]
    fn test_degenerate_bounds_yield_no_cells() {
        let grid = Grid::new(BoundingBox::new(20.0, 20.0, 78.0, 88.0), 0.2);
        assert_eq!(grid.cell_count(), 0);
        assert_eq!(grid.centers().count(), 0);
    }
}
