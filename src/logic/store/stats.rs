//! Aggregation queries backing the statistics operation.

use chrono::NaiveDate;
use rusqlite::OptionalExtension;

use super::FireStore;
use crate::error::CoreResult;

/// One aggregation bucket: a group label, its detection count, and the
/// group's mean confidence / mean FRP where present.
#[derive(Debug, Clone)]
pub struct GroupCount {
    pub label: String,
    pub count: i64,
    pub avg_confidence: Option<f64>,
    pub avg_frp: Option<f64>,
}

impl FireStore {
    /// Detection counts grouped by source, optionally limited to
    /// acquisitions on or after `since`.
    pub fn detections_by_source(&self, since: Option<NaiveDate>) -> CoreResult<Vec<GroupCount>> {
        self.grouped_detections("source", since)
    }

    /// Detection counts grouped by acquisition date.
    pub fn detections_by_date(&self, since: Option<NaiveDate>) -> CoreResult<Vec<GroupCount>> {
        self.grouped_detections("acq_date", since)
    }

    fn grouped_detections(&self, column: &str, since: Option<NaiveDate>) -> CoreResult<Vec<GroupCount>> {
        // `column` is one of two fixed identifiers chosen above, never input
        let mut sql = format!(
            "SELECT {column}, COUNT(*), AVG(confidence), AVG(frp) FROM fire_detections"
        );
        if since.is_some() {
            sql.push_str(" WHERE acq_date >= ?1");
        }
        sql.push_str(&format!(" GROUP BY {column} ORDER BY {column}"));

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let map_row = |row: &rusqlite::Row<'_>| {
            Ok(GroupCount {
                label: row.get(0)?,
                count: row.get(1)?,
                avg_confidence: row.get(2)?,
                avg_frp: row.get(3)?,
            })
        };
        let rows = match since {
            Some(since) => stmt.query_map([since.to_string()], map_row)?.collect::<Result<Vec<_>, _>>()?,
            None => stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?,
        };
        Ok(rows)
    }

    /// Prediction counts grouped by risk tier for one generation run
    /// (None = latest).
    pub fn predictions_by_risk(&self, model_version: Option<&str>) -> CoreResult<Vec<GroupCount>> {
        let version = match model_version {
            Some(version) => Some(version.to_string()),
            None => self.latest_model_version()?,
        };
        let Some(version) = version else { return Ok(Vec::new()) };

        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT risk_level, COUNT(*), AVG(probability) FROM fire_predictions \
             WHERE model_version = ?1 GROUP BY risk_level ORDER BY risk_level",
        )?;
        let rows = stmt
            .query_map([version], |row| {
                Ok(GroupCount {
                    label: row.get(0)?,
                    count: row.get(1)?,
                    avg_confidence: row.get(2)?,
                    avg_frp: None,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Overall detection count and averages for a trailing window.
    pub fn detection_summary(&self, since: Option<NaiveDate>) -> CoreResult<GroupCount> {
        let conn = self.conn();
        let mut sql =
            "SELECT COUNT(*), AVG(confidence), AVG(frp) FROM fire_detections".to_string();
        if since.is_some() {
            sql.push_str(" WHERE acq_date >= ?1");
        }
        let map_row = |row: &rusqlite::Row<'_>| {
            Ok(GroupCount {
                label: "total".to_string(),
                count: row.get(0)?,
                avg_confidence: row.get(1)?,
                avg_frp: row.get(2)?,
            })
        };
        let summary = match since {
            Some(since) => conn.query_row(&sql, [since.to_string()], map_row).optional()?,
            None => conn.query_row(&sql, [], map_row).optional()?,
        };
        Ok(summary.unwrap_or(GroupCount {
            label: "total".to_string(),
            count: 0,
            avg_confidence: None,
            avg_frp: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::detections::{FireSource, NewDetection};

    fn sample(date: &str, source: FireSource, confidence: i64) -> NewDetection {
        NewDetection {
            latitude: 28.0,
            longitude: 80.0,
            confidence,
            brightness: Some(315.0),
            bright_t31: None,
            scan: None,
            track: None,
            acq_date: date.parse().unwrap(),
            acq_time: Some("0700".to_string()),
            satellite: "Terra".to_string(),
            instrument: "MODIS".to_string(),
            source,
            frp: Some(10.0),
            daynight: Some("D".to_string()),
        }
    }

    #[test]
    fn test_detections_by_source() {
        let store = FireStore::open_in_memory().unwrap();
        store.insert_detection(&sample("2025-11-01", FireSource::ModisC61, 60)).unwrap();
        store.insert_detection(&sample("2025-11-02", FireSource::ModisC61, 80)).unwrap();
        store.insert_detection(&sample("2025-11-02", FireSource::ViirsSnppC2, 90)).unwrap();

        let groups = store.detections_by_source(None).unwrap();
        assert_eq!(groups.len(), 2);
        let modis = groups.iter().find(|g| g.label == "MODIS_C6_1").unwrap();
        assert_eq!(modis.count, 2);
        assert_eq!(modis.avg_confidence, Some(70.0));
    }

    #[test]
    fn test_since_filter_and_summary() {
        let store = FireStore::open_in_memory().unwrap();
        store.insert_detection(&sample("2025-10-01", FireSource::ModisC61, 60)).unwrap();
        store.insert_detection(&sample("2025-11-02", FireSource::ModisC61, 80)).unwrap();

        let recent = store.detections_by_date(Some("2025-11-01".parse().unwrap())).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].label, "2025-11-02");

        let summary = store.detection_summary(None).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.avg_frp, Some(10.0));
    }
}
