//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema.**
//!
//! Rules:
//! 1. Add feature -> increment FEATURE_VERSION
//! 2. Change order -> increment FEATURE_VERSION
//! 3. Remove feature -> increment FEATURE_VERSION
//!
//! Trained artifacts record the layout version and hash they were fitted
//! against; prediction refuses vectors from a different layout.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

/// Feature names in exact vector order. Single source of truth.
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Position (0-1): grid-cell centre ===
    "latitude",            // 0
    "longitude",           // 1

    // === Calendar (2-5) ===
    "month",               // 2: 1-12
    "day_of_year",         // 3: 1-366
    "hour_of_day",         // 4: mean acquisition hour for the cell
    "is_weekend",          // 5: 0/1

    // === Season (6-7): stubble-burning indicators ===
    "is_peak_season",      // 6: Mar-May, Oct-Dec
    "is_post_harvest",     // 7: Apr-May, Nov-Dec

    // === Cell history (8-12) ===
    "brightness_norm",     // 8: cell mean brightness / global max
    "confidence_norm",     // 9: cell mean confidence / 100
    "frp_norm",            // 10: cell mean FRP / global max
    "cell_count",          // 11: historical detections in the cell
    "neighborhood_count",  // 12: historical detections in the 3x3 block
];

/// Total number of features. Must match FEATURE_LAYOUT.len().
pub const FEATURE_COUNT: usize = 13;

/// CRC32 over version + ordered names; detects layout drift at runtime.
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

/// Complete layout information carried by trained artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self { version: FEATURE_VERSION, hash: layout_hash(), feature_count: FEATURE_COUNT }
    }

    pub fn is_compatible(&self, version: u8, hash: u32) -> bool {
        self.version == version && self.hash == hash
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

/// Feature index by name (O(n), features are few)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}
