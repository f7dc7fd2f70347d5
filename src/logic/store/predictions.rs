//! Prediction persistence and filtered read access.
//!
//! Generation runs coexist in this table tagged by model_version; readers
//! default to the latest version unless they pin one explicitly.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params_from_iter, Row, ToSql};

use super::FireStore;
use crate::error::CoreResult;
use crate::logic::geo::BoundingBox;
use crate::logic::predict::{FirePrediction, NewPrediction, RiskLevel};

const PREDICTION_COLUMNS: &str =
    "id, latitude, longitude, probability, risk_level, prediction_date, model_version, created_at";

/// Read filters for `query_predictions`.
#[derive(Debug, Clone, Default)]
pub struct PredictionFilter {
    pub risk_level: Option<RiskLevel>,
    pub min_probability: Option<f64>,
    pub bbox: Option<BoundingBox>,
    /// None = latest generation run
    pub model_version: Option<String>,
    pub limit: Option<usize>,
}

impl FireStore {
    pub fn insert_prediction(&self, prediction: &NewPrediction) -> CoreResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO fire_predictions (latitude, longitude, probability, risk_level, \
             prediction_date, model_version, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                prediction.latitude,
                prediction.longitude,
                prediction.probability,
                prediction.risk_level.as_str(),
                prediction.prediction_date.to_string(),
                prediction.model_version,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Filtered, read-only query, highest probability first. When no
    /// model_version is pinned the latest one is used.
    pub fn query_predictions(&self, filter: &PredictionFilter) -> CoreResult<Vec<FirePrediction>> {
        let version = match &filter.model_version {
            Some(version) => Some(version.clone()),
            None => self.latest_model_version()?,
        };
        let Some(version) = version else {
            return Ok(Vec::new()); // nothing generated yet
        };

        let mut sql =
            format!("SELECT {PREDICTION_COLUMNS} FROM fire_predictions WHERE model_version = ?");
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(version)];

        if let Some(risk_level) = filter.risk_level {
            sql.push_str(" AND risk_level = ?");
            params.push(Box::new(risk_level.as_str()));
        }
        if let Some(min_probability) = filter.min_probability {
            sql.push_str(" AND probability >= ?");
            params.push(Box::new(min_probability));
        }
        if let Some(bbox) = &filter.bbox {
            sql.push_str(" AND latitude >= ? AND latitude <= ? AND longitude >= ? AND longitude <= ?");
            params.push(Box::new(bbox.lat_min));
            params.push(Box::new(bbox.lat_max));
            params.push(Box::new(bbox.lon_min));
            params.push(Box::new(bbox.lon_max));
        }

        sql.push_str(" ORDER BY probability DESC, id ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter().map(|p| p.as_ref())), row_to_prediction)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Version tag of the most recent generation run, if any. Tags are
    /// fixed-width and timestamp-prefixed, so MAX() is the newest.
    pub fn latest_model_version(&self) -> CoreResult<Option<String>> {
        let conn = self.conn();
        let version = conn.query_row(
            "SELECT MAX(model_version) FROM fire_predictions",
            [],
            |row| row.get::<_, Option<String>>(0),
        )?;
        Ok(version)
    }

    pub fn prediction_count(&self) -> CoreResult<i64> {
        let conn = self.conn();
        let count = conn.query_row("SELECT COUNT(*) FROM fire_predictions", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn row_to_prediction(row: &Row<'_>) -> rusqlite::Result<FirePrediction> {
    let risk_raw: String = row.get(4)?;
    let risk_level = RiskLevel::parse(&risk_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("unknown risk level '{risk_raw}'").into(),
        )
    })?;

    let date_raw: String = row.get(5)?;
    let prediction_date = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
    })?;

    let created_raw: String = row.get(7)?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(FirePrediction {
        id: row.get(0)?,
        latitude: row.get(1)?,
        longitude: row.get(2)?,
        probability: row.get(3)?,
        risk_level,
        prediction_date,
        model_version: row.get(6)?,
        created_at,
    })
}
