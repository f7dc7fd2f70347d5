//! Detection persistence and filtered read access.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params_from_iter, Row, ToSql};

use super::FireStore;
use crate::error::CoreResult;
use crate::logic::detections::{FireDetection, FireSource, NewDetection};
use crate::logic::geo::BoundingBox;

const DETECTION_COLUMNS: &str = "id, latitude, longitude, confidence, brightness, bright_t31, \
     scan, track, acq_date, acq_time, satellite, instrument, source, frp, daynight, created_at";

/// Read filters for `query_detections`. Date range edges are inclusive.
#[derive(Debug, Clone, Default)]
pub struct DetectionFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sources: Option<Vec<FireSource>>,
    pub min_confidence: Option<i64>,
    pub bbox: Option<BoundingBox>,
    pub limit: Option<usize>,
}

impl FireStore {
    /// Append one detection; its own commit (partial batches leave earlier
    /// rows intact). Returns the assigned id.
    pub fn insert_detection(&self, detection: &NewDetection) -> CoreResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO fire_detections (latitude, longitude, confidence, brightness, \
             bright_t31, scan, track, acq_date, acq_time, satellite, instrument, source, \
             frp, daynight, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            rusqlite::params![
                detection.latitude,
                detection.longitude,
                detection.confidence,
                detection.brightness,
                detection.bright_t31,
                detection.scan,
                detection.track,
                detection.acq_date.to_string(),
                detection.acq_time,
                detection.satellite,
                detection.instrument,
                detection.source.as_str(),
                detection.frp,
                detection.daynight,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Filtered, read-only query; ascending acquisition order.
    pub fn query_detections(&self, filter: &DetectionFilter) -> CoreResult<Vec<FireDetection>> {
        let mut sql = format!("SELECT {DETECTION_COLUMNS} FROM fire_detections WHERE 1=1");
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(start) = filter.start_date {
            sql.push_str(" AND acq_date >= ?");
            params.push(Box::new(start.to_string()));
        }
        if let Some(end) = filter.end_date {
            sql.push_str(" AND acq_date <= ?");
            params.push(Box::new(end.to_string()));
        }
        if let Some(sources) = &filter.sources {
            if !sources.is_empty() {
                let placeholders = vec!["?"; sources.len()].join(", ");
                sql.push_str(&format!(" AND source IN ({placeholders})"));
                for source in sources {
                    params.push(Box::new(source.as_str()));
                }
            }
        }
        if let Some(min_confidence) = filter.min_confidence {
            sql.push_str(" AND confidence >= ?");
            params.push(Box::new(min_confidence));
        }
        if let Some(bbox) = &filter.bbox {
            sql.push_str(" AND latitude >= ? AND latitude <= ? AND longitude >= ? AND longitude <= ?");
            params.push(Box::new(bbox.lat_min));
            params.push(Box::new(bbox.lat_max));
            params.push(Box::new(bbox.lon_min));
            params.push(Box::new(bbox.lon_max));
        }

        sql.push_str(" ORDER BY acq_date ASC, IFNULL(acq_time, '0000') ASC, id ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter().map(|p| p.as_ref())), row_to_detection)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// The `n` most recent detections: acquisition date/time descending,
    /// ties broken by insertion order descending.
    pub fn most_recent(&self, n: usize) -> CoreResult<Vec<FireDetection>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {DETECTION_COLUMNS} FROM fire_detections \
             ORDER BY acq_date DESC, IFNULL(acq_time, '0000') DESC, id DESC LIMIT ?1"
        ))?;
        let rows = stmt.query_map([n as i64], row_to_detection)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every stored detection, acquisition order. Training input.
    pub fn all_detections(&self) -> CoreResult<Vec<FireDetection>> {
        self.query_detections(&DetectionFilter::default())
    }

    pub fn detection_count(&self) -> CoreResult<i64> {
        let conn = self.conn();
        let count = conn.query_row("SELECT COUNT(*) FROM fire_detections", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn row_to_detection(row: &Row<'_>) -> rusqlite::Result<FireDetection> {
    let acq_date_raw: String = row.get(8)?;
    let acq_date = NaiveDate::parse_from_str(&acq_date_raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e))
    })?;

    let source_raw: String = row.get(12)?;
    let source = FireSource::canonicalize(&source_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            12,
            Type::Text,
            format!("unknown source label '{source_raw}'").into(),
        )
    })?;

    let created_raw: String = row.get(15)?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(15, Type::Text, Box::new(e)))?;

    Ok(FireDetection {
        id: row.get(0)?,
        latitude: row.get(1)?,
        longitude: row.get(2)?,
        confidence: row.get(3)?,
        brightness: row.get(4)?,
        bright_t31: row.get(5)?,
        scan: row.get(6)?,
        track: row.get(7)?,
        acq_date,
        acq_time: row.get(9)?,
        satellite: row.get(10)?,
        instrument: row.get(11)?,
        source,
        frp: row.get(13)?,
        daynight: row.get(14)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lat: f64, lon: f64, date: &str, time: Option<&str>, source: FireSource) -> NewDetection {
        NewDetection {
            latitude: lat,
            longitude: lon,
            confidence: 80,
            brightness: Some(320.5),
            bright_t31: Some(295.0),
            scan: Some(1.1),
            track: Some(1.0),
            acq_date: date.parse().unwrap(),
            acq_time: time.map(str::to_string),
            satellite: "Terra".to_string(),
            instrument: "MODIS".to_string(),
            source,
            frp: Some(12.4),
            daynight: Some("D".to_string()),
        }
    }

    #[test]
    fn test_insert_and_query_round_trip() {
        let store = FireStore::open_in_memory().unwrap();
        let id = store
            .insert_detection(&sample(28.5, 77.2, "2025-11-03", Some("0715"), FireSource::ModisC61))
            .unwrap();
        assert!(id > 0);

        let all = store.all_detections().unwrap();
        assert_eq!(all.len(), 1);
        let det = &all[0];
        assert_eq!(det.id, id);
        assert_eq!(det.latitude, 28.5);
        assert_eq!(det.source, FireSource::ModisC61);
        assert_eq!(det.acq_time.as_deref(), Some("0715"));
    }

    #[test]
    fn test_query_filters() {
        let store = FireStore::open_in_memory().unwrap();
        store.insert_detection(&sample(28.5, 77.2, "2025-11-01", Some("0700"), FireSource::ModisC61)).unwrap();
        store.insert_detection(&sample(30.1, 75.5, "2025-11-02", Some("0800"), FireSource::ViirsSnppC2)).unwrap();
        store.insert_detection(&sample(21.0, 86.0, "2025-11-05", None, FireSource::ModisC61)).unwrap();

        let by_date = store
            .query_detections(&DetectionFilter {
                start_date: Some("2025-11-02".parse().unwrap()),
                end_date: Some("2025-11-05".parse().unwrap()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_date.len(), 2);

        let by_source = store
            .query_detections(&DetectionFilter {
                sources: Some(vec![FireSource::ViirsSnppC2]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_source.len(), 1);
        assert_eq!(by_source[0].source, FireSource::ViirsSnppC2);

        let by_bbox = store
            .query_detections(&DetectionFilter {
                bbox: Some(BoundingBox::new(27.0, 31.0, 74.0, 78.0)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_bbox.len(), 2);

        let limited = store
            .query_detections(&DetectionFilter { limit: Some(1), ..Default::default() })
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_most_recent_ordering() {
        let store = FireStore::open_in_memory().unwrap();
        store.insert_detection(&sample(28.0, 77.0, "2025-11-01", Some("0700"), FireSource::ModisC61)).unwrap();
        store.insert_detection(&sample(28.1, 77.1, "2025-11-02", Some("0600"), FireSource::ModisC61)).unwrap();
        store.insert_detection(&sample(28.2, 77.2, "2025-11-02", Some("0900"), FireSource::ModisC61)).unwrap();
        // Same date/time as the previous row; insertion order breaks the tie
        store.insert_detection(&sample(28.3, 77.3, "2025-11-02", Some("0900"), FireSource::ModisC61)).unwrap();

        let recent = store.most_recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].latitude, 28.3);
        assert_eq!(recent[1].latitude, 28.2);
        assert_eq!(recent[2].latitude, 28.1);
    }
}
