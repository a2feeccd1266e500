use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Value pushed to the display collaborator on every relevant event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiveUpdate {
    /// Current speed in mph, integer-rounded for the readout
    Speed(i64),
    /// Acceleration X/Z pair for the G-meter scatter
    AccelPoint { x: f64, z: f64 },
}

/// Snapshot of the live pipeline, written as JSON for external dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveStatus {
    pub timestamp_ms: i64,
    pub speed_mph: i64,
    pub accel_x: f64,
    pub accel_z: f64,
    pub samples_committed: u64,
    pub logging: bool,
    pub uptime_seconds: u64,
}

impl LiveStatus {
    pub fn new() -> Self {
        Self {
            timestamp_ms: 0,
            speed_mph: 0,
            accel_x: 0.0,
            accel_z: 0.0,
            samples_committed: 0,
            logging: false,
            uptime_seconds: 0,
        }
    }

    /// Fold one display update into the snapshot
    pub fn apply(&mut self, update: LiveUpdate) {
        match update {
            LiveUpdate::Speed(mph) => self.speed_mph = mph,
            LiveUpdate::AccelPoint { x, z } => {
                self.accel_x = x;
                self.accel_z = z;
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for LiveStatus {
    fn default() -> Self {
        Self::new()
    }
}
