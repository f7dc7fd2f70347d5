//! Model Training
//!
//! Builds the feature matrix from history, fits the bagged ensemble, and
//! evaluates on a chronological hold-out. The split is never shuffled:
//! the target is strongly seasonal, and random cross-validation would
//! leak future seasons into training and overstate accuracy.

use ndarray::s;

use crate::error::{CoreError, CoreResult};
use crate::logic::detections::FireDetection;
use crate::logic::features::{build_training_set, Grid};

use super::artifact::{ModelMetrics, TrainedModel};
use super::forest::{ForestConfig, RandomForest};

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Minimum stored detections before training is attempted. Sized to
    /// roughly one seasonal cycle of daily coverage rather than an
    /// arbitrary small count.
    pub min_detections: usize,
    /// Minimum (cell, day) samples the feature builder must yield
    pub min_samples: usize,
    /// Fraction of the most recent samples held out for evaluation
    pub validation_fraction: f64,
    pub forest: ForestConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_detections: 360,
            min_samples: 100,
            validation_fraction: 0.2,
            forest: ForestConfig::default(),
        }
    }
}

/// Train a new artifact. Fails with `InsufficientData` before any fitting
/// work when history is too thin; on failure no artifact exists to publish,
/// so a previously published model is never affected.
pub fn train_model(
    grid: &Grid,
    detections: &[FireDetection],
    config: &TrainingConfig,
    version: String,
) -> CoreResult<TrainedModel> {
    if detections.len() < config.min_detections {
        return Err(CoreError::InsufficientData(format!(
            "{} detections stored, {} required",
            detections.len(),
            config.min_detections
        )));
    }

    let set = build_training_set(grid, detections);
    if set.len() < config.min_samples {
        return Err(CoreError::InsufficientData(format!(
            "{} training samples built, {} required",
            set.len(),
            config.min_samples
        )));
    }

    let (train_n, validation_n) = chronological_split(set.len(), config.validation_fraction);
    log::info!(
        "Training on {train_n} samples through {}, validating on {validation_n} from {}",
        set.sample_days[train_n - 1],
        set.sample_days[train_n]
    );

    let x_train = set.matrix.slice(s![..train_n, ..]).to_owned();
    let y_train = set.targets.slice(s![..train_n]).to_owned();
    let forest = RandomForest::fit(&x_train, &y_train, &config.forest);

    let mut residual_sq = 0.0;
    let mut actuals = Vec::with_capacity(validation_n);
    for row in train_n..set.len() {
        let features: Vec<f64> = set.matrix.row(row).to_vec();
        let predicted = forest.predict(&features);
        let actual = set.targets[row];
        residual_sq += (actual - predicted).powi(2);
        actuals.push(actual);
    }

    let mse = residual_sq / validation_n as f64;
    let mean_actual = actuals.iter().sum::<f64>() / validation_n as f64;
    let total_sq: f64 = actuals.iter().map(|a| (a - mean_actual).powi(2)).sum();
    let r2_score = if total_sq > 0.0 { 1.0 - residual_sq / total_sq } else { 0.0 };

    Ok(TrainedModel::new(version, forest, ModelMetrics { r2_score, mse }, set.len()))
}

/// Time-respecting split: the earliest samples train, the latest validate.
/// Both sides are always non-empty.
fn chronological_split(n: usize, validation_fraction: f64) -> (usize, usize) {
    let validation_n = ((n as f64) * validation_fraction).round() as usize;
    let validation_n = validation_n.clamp(1, n - 1);
    (n - validation_n, validation_n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::detections::FireSource;
    use crate::logic::geo::BoundingBox;
    use crate::logic::model::tree::TreeConfig;
    use chrono::{Duration, NaiveDate};

    fn detection(lat: f64, lon: f64, date: NaiveDate) -> FireDetection {
        FireDetection {
            id: 0,
            latitude: lat,
            longitude: lon,
            confidence: 70,
            brightness: Some(315.0),
            bright_t31: None,
            scan: None,
            track: None,
            acq_date: date,
            acq_time: Some("1030".to_string()),
            satellite: "Terra".to_string(),
            instrument: "MODIS".to_string(),
            source: FireSource::ModisC61,
            frp: Some(8.0),
            daynight: Some("D".to_string()),
            created_at: chrono::Utc::now(),
        }
    }

    /// Daily burning in a handful of cells over several weeks.
    fn synthetic_history(days: usize) -> Vec<FireDetection> {
        let start: NaiveDate = "2025-10-01".parse().unwrap();
        let mut detections = Vec::new();
        for day in 0..days {
            let date = start + Duration::days(day as i64);
            for cell in 0..4 {
                let lat = 28.1 + cell as f64 * 0.4;
                detections.push(detection(lat, 80.1, date));
                if day % 2 == 0 {
                    detections.push(detection(lat + 0.01, 80.11, date));
                }
            }
        }
        detections
    }

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            min_detections: 20,
            min_samples: 10,
            validation_fraction: 0.2,
            forest: ForestConfig {
                n_trees: 10,
                tree: TreeConfig { max_depth: 5, min_samples_split: 2, min_samples_leaf: 1 },
                seed: 3,
            },
        }
    }

    #[test]
    fn test_too_few_detections_is_insufficient_data() {
        let grid = Grid::new(BoundingBox::default(), 0.2);
        let detections = synthetic_history(2);
        let err = train_model(&grid, &detections, &TrainingConfig::default(), "v1".to_string())
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData(_)));
    }

    #[test]
    fn test_too_few_samples_is_insufficient_data() {
        let grid = Grid::new(BoundingBox::default(), 0.2);
        // Plenty of detections, but all on one day in one cell: one sample
        let date: NaiveDate = "2025-11-01".parse().unwrap();
        let detections: Vec<_> = (0..30).map(|_| detection(28.1, 80.1, date)).collect();

        let mut config = small_config();
        config.min_detections = 10;
        let err = train_model(&grid, &detections, &config, "v1".to_string()).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData(_)));
    }

    #[test]
    fn test_training_produces_finite_metrics() {
        let grid = Grid::new(BoundingBox::default(), 0.2);
        let detections = synthetic_history(30);

        let model =
            train_model(&grid, &detections, &small_config(), "v20251103-001".to_string()).unwrap();
        assert_eq!(model.version, "v20251103-001");
        assert!(model.metrics.mse.is_finite());
        assert!(model.metrics.mse >= 0.0);
        assert!(model.metrics.r2_score.is_finite());
        assert!(model.samples >= 10);
    }

    #[test]
    fn test_chronological_split_bounds() {
        assert_eq!(chronological_split(10, 0.2), (8, 2));
        assert_eq!(chronological_split(5, 0.2), (4, 1));
        // Both sides stay non-empty even at extremes
        assert_eq!(chronological_split(2, 0.01), (1, 1));
        assert_eq!(chronological_split(2, 0.99), (1, 1));
    }
}
