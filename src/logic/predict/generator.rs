//! Prediction Generator
//!
//! Walks every cell of the requested grid, builds the cell's feature
//! vector from stored history, asks the model for a probability, and
//! persists the cells at or above the low-risk floor. Sub-floor cells are
//! computed and discarded, keeping the prediction table sized to
//! actionable risk rather than the full grid.

use chrono::{Duration, NaiveDate};

use crate::constants::PREDICTION_HORIZON_DAYS;
use crate::error::CoreResult;
use crate::logic::features::{cell_feature_vector, CellHistoryIndex, Grid};
use crate::logic::geo::BoundingBox;
use crate::logic::model::TrainedModel;
use crate::logic::store::FireStore;

use super::risk::RiskLevel;
use super::NewPrediction;

/// Counts from one generation run.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub predictions_generated: usize,
    pub cells_evaluated: usize,
    pub model_version: String,
}

/// Run one generation pass with a completed model artifact. Prior
/// predictions are left in place; this run's rows carry the artifact's
/// version and readers default to the newest.
pub fn generate_predictions(
    store: &FireStore,
    model: &TrainedModel,
    bounds: BoundingBox,
    cell_size_deg: f64,
    today: NaiveDate,
) -> CoreResult<GenerationOutcome> {
    let grid = Grid::new(bounds, cell_size_deg);
    let detections = store.all_detections()?;
    let index = CellHistoryIndex::build(&grid, &detections);
    let forecast_date = today + Duration::days(PREDICTION_HORIZON_DAYS);

    log::info!(
        "Generating predictions over {} cells ({} deg) with model {}",
        grid.cell_count(),
        cell_size_deg,
        model.version
    );

    let mut generated = 0usize;
    let mut evaluated = 0usize;

    for cell in grid.centers() {
        evaluated += 1;
        let vector = cell_feature_vector(&index, &cell, forecast_date);
        let probability = model.predict(&vector)?;

        let Some(risk_level) = RiskLevel::from_probability(probability) else {
            continue; // below the persistence floor
        };

        store.insert_prediction(&NewPrediction {
            latitude: cell.latitude,
            longitude: cell.longitude,
            probability,
            risk_level,
            prediction_date: forecast_date,
            model_version: model.version.clone(),
        })?;
        generated += 1;
    }

    log::info!("Generation complete: {generated} of {evaluated} cells at or above the floor");

    Ok(GenerationOutcome {
        predictions_generated: generated,
        cells_evaluated: evaluated,
        model_version: model.version.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::detections::{FireSource, NewDetection};
    use crate::logic::model::{train_model, ForestConfig, TrainingConfig, TreeConfig};
    use crate::logic::store::predictions::PredictionFilter;
    use chrono::Duration;

    fn seeded_store(days: usize) -> FireStore {
        let store = FireStore::open_in_memory().unwrap();
        let start: NaiveDate = "2025-10-01".parse().unwrap();
        for day in 0..days {
            let date = start + Duration::days(day as i64);
            for cell in 0..3 {
                store
                    .insert_detection(&NewDetection {
                        latitude: 28.1 + cell as f64 * 0.4,
                        longitude: 80.1,
                        confidence: 80,
                        brightness: Some(330.0),
                        bright_t31: None,
                        scan: None,
                        track: None,
                        acq_date: date,
                        acq_time: Some("1030".to_string()),
                        satellite: "Terra".to_string(),
                        instrument: "MODIS".to_string(),
                        source: FireSource::ModisC61,
                        frp: Some(14.0),
                        daynight: Some("D".to_string()),
                    })
                    .unwrap();
            }
        }
        store
    }

    fn trained(store: &FireStore) -> TrainedModel {
        let grid = Grid::new(BoundingBox::default(), 0.2);
        let config = TrainingConfig {
            min_detections: 10,
            min_samples: 10,
            validation_fraction: 0.2,
            forest: ForestConfig {
                n_trees: 10,
                tree: TreeConfig { max_depth: 5, min_samples_split: 2, min_samples_leaf: 1 },
                seed: 11,
            },
        };
        train_model(&grid, &store.all_detections().unwrap(), &config, "v20251103000000-001".to_string())
            .unwrap()
    }

    #[test]
    fn test_generation_evaluates_every_cell_and_persists_above_floor() {
        let store = seeded_store(30);
        let model = trained(&store);

        let outcome = generate_predictions(
            &store,
            &model,
            BoundingBox::new(20.0, 32.0, 78.0, 88.0),
            0.2,
            "2025-11-03".parse().unwrap(),
        )
        .unwrap();

        assert_eq!(outcome.cells_evaluated, 3000);
        assert!(outcome.predictions_generated <= outcome.cells_evaluated);
        assert_eq!(store.prediction_count().unwrap() as usize, outcome.predictions_generated);

        // Everything persisted sits at or above the floor
        let stored = store.query_predictions(&PredictionFilter::default()).unwrap();
        assert_eq!(stored.len(), outcome.predictions_generated);
        assert!(stored.iter().all(|p| p.probability >= 0.30));
        assert!(stored.iter().all(|p| p.model_version == "v20251103000000-001"));
    }

    #[test]
    fn test_generation_runs_coexist_by_version() {
        let store = seeded_store(30);
        let model_a = trained(&store);
        let mut model_b = trained(&store);
        // Simulate a later run of the registry
        model_b.version = "v20251104000000-002".to_string();

        let bounds = BoundingBox::new(27.0, 30.0, 79.0, 82.0);
        let today: NaiveDate = "2025-11-03".parse().unwrap();
        let first = generate_predictions(&store, &model_a, bounds, 0.5, today).unwrap();
        let second = generate_predictions(&store, &model_b, bounds, 0.5, today).unwrap();

        let total = store.prediction_count().unwrap() as usize;
        assert_eq!(total, first.predictions_generated + second.predictions_generated);

        // Default queries see only the newest run
        let latest = store.query_predictions(&PredictionFilter::default()).unwrap();
        assert!(latest.iter().all(|p| p.model_version == model_b.version));
    }
}
