//! Risk Model
//!
//! - `tree` / `forest` - the bagged regression ensemble
//! - `training` - guards, chronological evaluation, artifact assembly
//! - `artifact` - immutable trained models and the registry slot

pub mod artifact;
pub mod forest;
pub mod training;
pub mod tree;

pub use artifact::{ModelMetrics, ModelRegistry, TrainedModel};
pub use forest::{ForestConfig, RandomForest};
pub use training::{train_model, TrainingConfig};
pub use tree::TreeConfig;
