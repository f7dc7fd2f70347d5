//! Fire Statistics
//!
//! Simple aggregation over stored detections and predictions for the
//! boundary's statistics operation. No algorithmic weight here; the store
//! does the grouping in SQL.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::logic::store::FireStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    Day,
    Week,
    Month,
    All,
}

impl TimePeriod {
    pub fn parse(label: &str) -> CoreResult<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(CoreError::Validation(format!("unknown time period '{other}'"))),
        }
    }

    fn since(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => Some(today - Duration::days(1)),
            Self::Week => Some(today - Duration::days(7)),
            Self::Month => Some(today - Duration::days(30)),
            Self::All => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Source,
    Date,
    RiskLevel,
}

impl GroupBy {
    pub fn parse(label: &str) -> CoreResult<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "source" => Ok(Self::Source),
            "date" | "day" => Ok(Self::Date),
            "risk_level" | "risk" => Ok(Self::RiskLevel),
            other => Err(CoreError::Validation(format!("unknown group-by '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsGroup {
    pub label: String,
    pub count: i64,
    pub avg_confidence: Option<f64>,
    pub avg_frp: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireStatistics {
    pub time_period: TimePeriod,
    pub group_by: GroupBy,
    pub total_detections: i64,
    pub avg_confidence: Option<f64>,
    pub avg_frp: Option<f64>,
    pub groups: Vec<StatsGroup>,
}

pub fn fire_statistics(
    store: &FireStore,
    time_period: TimePeriod,
    group_by: GroupBy,
    today: NaiveDate,
) -> CoreResult<FireStatistics> {
    let since = time_period.since(today);

    let groups = match group_by {
        GroupBy::Source => store.detections_by_source(since)?,
        GroupBy::Date => store.detections_by_date(since)?,
        // Predictions are not date-windowed; the latest run is the answer
        GroupBy::RiskLevel => store.predictions_by_risk(None)?,
    };

    let summary = store.detection_summary(since)?;

    Ok(FireStatistics {
        time_period,
        group_by,
        total_detections: summary.count,
        avg_confidence: summary.avg_confidence,
        avg_frp: summary.avg_frp,
        groups: groups
            .into_iter()
            .map(|g| StatsGroup {
                label: g.label,
                count: g.count,
                avg_confidence: g.avg_confidence,
                avg_frp: g.avg_frp,
            })
            .collect(),
    })
}
