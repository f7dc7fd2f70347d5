//! Risk Tiers
//!
//! Deterministic classification of a model probability into a risk tier.
//! The tier is always derived from the probability at these thresholds and
//! never stored or mutated independently.

use serde::{Deserialize, Serialize};

/// HIGH risk floor
pub const HIGH_THRESHOLD: f64 = 0.70;
/// MEDIUM risk floor
pub const MEDIUM_THRESHOLD: f64 = 0.40;
/// LOW risk floor; also the persistence floor - cells below this are
/// computed but never written
pub const PERSIST_FLOOR: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Classify a probability. Returns None below the persistence floor.
    pub fn from_probability(probability: f64) -> Option<Self> {
        if probability >= HIGH_THRESHOLD {
            Some(Self::High)
        } else if probability >= MEDIUM_THRESHOLD {
            Some(Self::Medium)
        } else if probability >= PERSIST_FLOOR {
            Some(Self::Low)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_is_pure_function_of_probability() {
        assert_eq!(RiskLevel::from_probability(0.75), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_probability(0.55), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::from_probability(0.35), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::from_probability(0.20), None);
    }

    #[test]
    fn test_risk_threshold_edges() {
        assert_eq!(RiskLevel::from_probability(0.70), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_probability(0.40), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::from_probability(0.30), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::from_probability(0.2999), None);
    }

    #[test]
    fn test_risk_label_round_trip() {
        for level in [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low] {
            assert_eq!(RiskLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(RiskLevel::parse("EXTREME"), None);
    }
}
