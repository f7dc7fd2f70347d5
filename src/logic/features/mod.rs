//! Grid Feature Engineering
//!
//! - `layout` - authoritative feature schema (names, version, hash)
//! - `vector` - versioned feature vector
//! - `grid` - deterministic cell enumeration
//! - `history` - per-cell and global detection aggregates
//! - `builder` - training matrix and prediction vectors

pub mod builder;
pub mod grid;
pub mod history;
pub mod layout;
pub mod vector;

pub use builder::{build_training_set, cell_feature_vector, TrainingSet, TARGET_WINDOW_DAYS};
pub use grid::{CellCenter, Grid};
pub use history::{CellHistoryIndex, GlobalStats};
pub use layout::{LayoutInfo, FEATURE_COUNT};
pub use vector::FeatureVector;
