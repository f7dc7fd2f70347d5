//! Trained Model Artifacts
//!
//! A completed training run produces an immutable `TrainedModel`; the
//! registry is the single slot holding the current one. Generation takes
//! an `Arc` clone, so a concurrent retrain can never corrupt an in-flight
//! run - the old artifact simply lives until its last holder drops it.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::logic::features::{FeatureVector, LayoutInfo};

use super::forest::RandomForest;

/// Summary metrics from the chronological validation slice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub r2_score: f64,
    pub mse: f64,
}

/// Immutable artifact of one fully completed training run.
#[derive(Debug)]
pub struct TrainedModel {
    pub version: String,
    pub metrics: ModelMetrics,
    pub layout: LayoutInfo,
    pub samples: usize,
    pub trained_at: DateTime<Utc>,
    forest: RandomForest,
}

impl TrainedModel {
    pub fn new(
        version: String,
        forest: RandomForest,
        metrics: ModelMetrics,
        samples: usize,
    ) -> Self {
        Self {
            version,
            metrics,
            layout: LayoutInfo::current(),
            samples,
            trained_at: Utc::now(),
            forest,
        }
    }

    /// Probability for one feature vector, clipped to [0, 1]. The vector
    /// must carry the layout this model was fitted against.
    pub fn predict(&self, vector: &FeatureVector) -> CoreResult<f64> {
        if !vector.matches(&self.layout) {
            return Err(CoreError::Validation(format!(
                "feature layout mismatch: model fitted on v{} ({:08x})",
                self.layout.version, self.layout.hash
            )));
        }
        Ok(self.forest.predict(vector.as_slice()))
    }
}

/// Holder of the current model artifact. Publishing replaces the slot;
/// readers keep whatever Arc they already took.
pub struct ModelRegistry {
    current: RwLock<Option<Arc<TrainedModel>>>,
    sequence: AtomicU32,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self { current: RwLock::new(None), sequence: AtomicU32::new(0) }
    }

    /// Monotonically increasing version tag: UTC timestamp plus a
    /// per-process sequence, so back-to-back retrains stay ordered.
    pub fn next_version(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("v{}-{:03}", Utc::now().format("%Y%m%d%H%M%S"), seq)
    }

    /// Publish a fully trained artifact, discarding the prior one.
    pub fn publish(&self, model: TrainedModel) -> Arc<TrainedModel> {
        let model = Arc::new(model);
        log::info!(
            "Published model {} (r2={:.4}, mse={:.6}, {} samples)",
            model.version,
            model.metrics.r2_score,
            model.metrics.mse,
            model.samples
        );
        *self.current.write() = Some(Arc::clone(&model));
        model
    }

    /// The current artifact, if a training run has completed.
    pub fn current(&self) -> Option<Arc<TrainedModel>> {
        self.current.read().clone()
    }

    pub fn is_trained(&self) -> bool {
        self.current.read().is_some()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
