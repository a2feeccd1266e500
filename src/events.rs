use serde::{Deserialize, Serialize};

/// Location fix from the platform location service
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocationFix {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
    /// Degrees, 0-360
    pub bearing: f64,
    /// Meters per second, as delivered by the provider
    pub speed_mps: f64,
}

impl LocationFix {
    pub fn new(longitude: f64, latitude: f64, altitude: f64, bearing: f64, speed_mps: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude,
            bearing,
            speed_mps,
        }
    }
}

/// Linear-acceleration reading from the motion sensor, m/s^2
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccelReading {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AccelReading {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Tagged input event; both streams feed one fuser entry point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum TelemetryEvent {
    Location(LocationFix),
    Acceleration(AccelReading),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accel_magnitude() {
        let reading = AccelReading::new(3.0, 4.0, 0.0);
        assert_eq!(reading.magnitude(), 5.0);
    }
}
