use serde::{Deserialize, Serialize};

/// m/s to mph. Applied exactly once, when a sample is committed.
pub const MPH_PER_MPS: f64 = 2.23694;

/// One fused, timestamped record of location + acceleration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock milliseconds; non-decreasing across commits in a session
    pub timestamp_ms: i64,
    pub longitude: f64,
    pub latitude: f64,
    /// Meters
    pub altitude: f64,
    /// Degrees, 0-360
    pub bearing: f64,
    /// Mph, converted at commit time
    pub speed_mph: f64,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
}

/// Latest value from each input stream, merged into one record at commit.
///
/// Both update methods are unconditional overwrites and values pass through
/// exactly as the producing subsystem delivered them. Acceleration starts at
/// zero; a commit that lands before the first reading carries those zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleBuffer {
    longitude: f64,
    latitude: f64,
    altitude: f64,
    bearing: f64,
    speed_mps: f64,
    accel_x: f64,
    accel_y: f64,
    accel_z: f64,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_acceleration(&mut self, x: f64, y: f64, z: f64) {
        self.accel_x = x;
        self.accel_y = y;
        self.accel_z = z;
    }

    pub fn update_location(
        &mut self,
        longitude: f64,
        latitude: f64,
        altitude: f64,
        bearing: f64,
        speed_mps: f64,
    ) {
        self.longitude = longitude;
        self.latitude = latitude;
        self.altitude = altitude;
        self.bearing = bearing;
        self.speed_mps = speed_mps;
    }

    /// Current merged state as a complete sample, speed converted to mph
    pub fn snapshot(&self, timestamp_ms: i64) -> Sample {
        Sample {
            timestamp_ms,
            longitude: self.longitude,
            latitude: self.latitude,
            altitude: self.altitude,
            bearing: self.bearing,
            speed_mph: self.speed_mps * MPH_PER_MPS,
            accel_x: self.accel_x,
            accel_y: self.accel_y,
            accel_z: self.accel_z,
        }
    }

    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_snapshot_before_first_accel_uses_zeros() {
        let mut buffer = SampleBuffer::new();
        buffer.update_location(-87.9, 43.0, 200.0, 90.0, 10.0);

        let sample = buffer.snapshot(1);
        assert_eq!(sample.accel_x, 0.0);
        assert_eq!(sample.accel_y, 0.0);
        assert_eq!(sample.accel_z, 0.0);
        assert_eq!(sample.latitude, 43.0);
    }

    #[test]
    fn test_speed_converts_to_mph_at_snapshot() {
        let mut buffer = SampleBuffer::new();
        buffer.update_location(0.0, 0.0, 0.0, 0.0, 10.0);

        let sample = buffer.snapshot(0);
        assert_relative_eq!(sample.speed_mph, 22.3694, epsilon = 1e-9);
    }

    #[test]
    fn test_updates_are_overwrites() {
        let mut buffer = SampleBuffer::new();
        buffer.update_acceleration(0.1, 0.2, 9.8);
        buffer.update_acceleration(0.5, 0.0, 9.6);
        buffer.update_location(-87.9, 43.0, 200.0, 90.0, 10.0);
        buffer.update_location(-87.91, 43.001, 201.0, 91.0, 11.0);

        let sample = buffer.snapshot(2);
        assert_eq!(sample.accel_x, 0.5);
        assert_eq!(sample.accel_z, 9.6);
        assert_eq!(sample.longitude, -87.91);
        assert_eq!(sample.bearing, 91.0);
    }
}
