//! Prediction Generation
//!
//! Risk tiers, prediction record types, and the grid walk that turns a
//! trained model into persisted risk estimates.

pub mod generator;
pub mod risk;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use generator::{generate_predictions, GenerationOutcome};
pub use risk::RiskLevel;

/// A stored model-generated risk estimate for one grid cell. Superseded by
/// later generation runs (new model_version), never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirePrediction {
    pub id: i64,
    /// Grid-cell centre
    pub latitude: f64,
    pub longitude: f64,
    pub probability: f64,
    pub risk_level: RiskLevel,
    /// Forecast target date
    pub prediction_date: NaiveDate,
    pub model_version: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a prediction; the store assigns id and created_at.
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub latitude: f64,
    pub longitude: f64,
    pub probability: f64,
    pub risk_level: RiskLevel,
    pub prediction_date: NaiveDate,
    pub model_version: String,
}
