use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use crate::error::{TResult, TelemetryError};
use crate::sample::Sample;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS samples (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp_ms INTEGER NOT NULL,
    longitude    REAL NOT NULL,
    latitude     REAL NOT NULL,
    altitude     REAL NOT NULL,
    bearing      REAL NOT NULL,
    speed_mph    REAL NOT NULL,
    accel_x      REAL NOT NULL,
    accel_y      REAL NOT NULL,
    accel_z      REAL NOT NULL
)";

/// Append-only store of committed samples.
///
/// Rowid order is insertion order. Scans materialize a snapshot, so a scan
/// that races a clear sees the pre-clear view. The store outlives the
/// process; reopening the same path sees prior sessions' samples.
pub struct RecordStore {
    conn: Mutex<Connection>,
}

impl RecordStore {
    /// Open (or create) the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> TResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by tests
    pub fn open_in_memory() -> TResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> TResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TelemetryError::Internal("record store lock poisoned".to_string()))
    }

    /// Append one sample
    pub fn insert(&self, sample: &Sample) -> TResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO samples (timestamp_ms, longitude, latitude, altitude, bearing, \
             speed_mph, accel_x, accel_y, accel_z) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                sample.timestamp_ms,
                sample.longitude,
                sample.latitude,
                sample.altitude,
                sample.bearing,
                sample.speed_mph,
                sample.accel_x,
                sample.accel_y,
                sample.accel_z,
            ],
        )?;
        Ok(())
    }

    /// Every sample in insertion order
    pub fn scan_all(&self) -> TResult<Vec<Sample>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT timestamp_ms, longitude, latitude, altitude, bearing, \
             speed_mph, accel_x, accel_y, accel_z \
             FROM samples ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Sample {
                timestamp_ms: row.get(0)?,
                longitude: row.get(1)?,
                latitude: row.get(2)?,
                altitude: row.get(3)?,
                bearing: row.get(4)?,
                speed_mph: row.get(5)?,
                accel_x: row.get(6)?,
                accel_y: row.get(7)?,
                accel_z: row.get(8)?,
            })
        })?;

        let mut samples = Vec::new();
        for row in rows {
            samples.push(row?);
        }
        Ok(samples)
    }

    /// Remove every sample in one statement
    pub fn clear_all(&self) -> TResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM samples", [])?;
        Ok(())
    }

    pub fn len(&self) -> TResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM samples", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> TResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp_ms: i64, latitude: f64) -> Sample {
        Sample {
            timestamp_ms,
            longitude: -87.9,
            latitude,
            altitude: 200.0,
            bearing: 90.0,
            speed_mph: 22.37,
            accel_x: 0.1,
            accel_y: 0.0,
            accel_z: 9.8,
        }
    }

    #[test]
    fn test_scan_preserves_insertion_order() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert(&sample(1, 43.0)).unwrap();
        store.insert(&sample(2, 43.001)).unwrap();
        store.insert(&sample(3, 43.002)).unwrap();

        let scanned = store.scan_all().unwrap();
        assert_eq!(scanned.len(), 3);
        assert_eq!(scanned[0], sample(1, 43.0));
        assert_eq!(scanned[1], sample(2, 43.001));
        assert_eq!(scanned[2], sample(3, 43.002));
    }

    #[test]
    fn test_clear_then_scan_is_empty() {
        let store = RecordStore::open_in_memory().unwrap();
        store.insert(&sample(1, 43.0)).unwrap();
        store.insert(&sample(2, 43.001)).unwrap();

        store.clear_all().unwrap();
        assert!(store.scan_all().unwrap().is_empty());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_reopen_sees_prior_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.db");

        {
            let store = RecordStore::open(&path).unwrap();
            store.insert(&sample(1, 43.0)).unwrap();
        }

        let store = RecordStore::open(&path).unwrap();
        let scanned = store.scan_all().unwrap();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].timestamp_ms, 1);
    }

    #[test]
    fn test_len_counts_rows() {
        let store = RecordStore::open_in_memory().unwrap();
        assert_eq!(store.len().unwrap(), 0);
        store.insert(&sample(1, 43.0)).unwrap();
        store.insert(&sample(2, 43.001)).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }
}
