//! Fire Store - Embedded Persistence
//!
//! rusqlite-backed store for detections and predictions. Detections are
//! append-only; each insert commits independently so a partial batch never
//! corrupts previously accepted records. All query operations are read-only.

pub mod detections;
pub mod predictions;
pub mod stats;

use std::fs;
use std::path::Path;

use parking_lot::Mutex;
use rusqlite::Connection;

use crate::error::CoreResult;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS fire_detections (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    latitude    REAL NOT NULL,
    longitude   REAL NOT NULL,
    confidence  INTEGER NOT NULL,
    brightness  REAL,
    bright_t31  REAL,
    scan        REAL,
    track       REAL,
    acq_date    TEXT NOT NULL,
    acq_time    TEXT,
    satellite   TEXT NOT NULL,
    instrument  TEXT NOT NULL,
    source      TEXT NOT NULL,
    frp         REAL,
    daynight    TEXT,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_detections_acq_date ON fire_detections (acq_date);
CREATE INDEX IF NOT EXISTS idx_detections_position ON fire_detections (latitude, longitude);

CREATE TABLE IF NOT EXISTS fire_predictions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    latitude        REAL NOT NULL,
    longitude       REAL NOT NULL,
    probability     REAL NOT NULL,
    risk_level      TEXT NOT NULL,
    prediction_date TEXT NOT NULL,
    model_version   TEXT NOT NULL,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_predictions_version ON fire_predictions (model_version);
";

/// Handle to the embedded database. Single connection behind a mutex; every
/// operation is a short blocking call.
pub struct FireStore {
    conn: Mutex<Connection>,
}

impl FireStore {
    /// Open (creating directories and schema as needed) at `path`.
    pub fn open(path: &Path) -> CoreResult<Self> {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Failed to create data directory {}: {}", parent.display(), e);
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        log::info!("Fire store opened at {}", path.display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory store, used by tests and throwaway pipelines.
    pub fn open_in_memory() -> CoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub(crate) fn conn(&self) -> parking_lot::MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}
