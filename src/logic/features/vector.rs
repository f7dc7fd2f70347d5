//! Feature Vector
//!
//! Versioned feature vector with layout metadata. All model input goes
//! through this type; raw slices carry no layout provenance.

use serde::{Deserialize, Serialize};

use super::layout::{feature_index, layout_hash, LayoutInfo, FEATURE_COUNT, FEATURE_VERSION};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub version: u8,
    pub layout_hash: u32,
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn new() -> Self {
        Self { version: FEATURE_VERSION, layout_hash: layout_hash(), values: [0.0; FEATURE_COUNT] }
    }

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { version: FEATURE_VERSION, layout_hash: layout_hash(), values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|i| self.values[i])
    }

    pub fn set_by_name(&mut self, name: &str, value: f64) -> bool {
        match feature_index(name) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    /// Compatible with a given artifact layout?
    pub fn matches(&self, layout: &LayoutInfo) -> bool {
        layout.is_compatible(self.version, self.layout_hash)
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}
