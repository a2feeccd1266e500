use chrono::{DateTime, Utc};

use crate::sample::Sample;

/// GPX track for mapping applications
#[derive(Debug)]
pub struct GpxTrack {
    pub name: String,
    pub track_points: Vec<GpxPoint>,
}

#[derive(Debug)]
pub struct GpxPoint {
    pub lat: f64,
    pub lon: f64,
    /// Elevation, meters
    pub ele: f64,
    pub time: String,
}

impl GpxTrack {
    /// Generate the GPX document XML string
    pub fn to_gpx_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<gpx version=\"1.1\" creator=\"trackday\">\n");
        xml.push_str("  <trk>\n");
        xml.push_str(&format!("    <name>{}</name>\n", self.name));
        xml.push_str("    <trkseg>\n");

        for point in &self.track_points {
            xml.push_str(&format!(
                "      <trkpt lat=\"{}\" lon=\"{}\">\n",
                point.lat, point.lon
            ));
            xml.push_str(&format!("        <ele>{}</ele>\n", point.ele));
            xml.push_str(&format!("        <time>{}</time>\n", point.time));
            xml.push_str("      </trkpt>\n");
        }

        xml.push_str("    </trkseg>\n");
        xml.push_str("  </trk>\n");
        xml.push_str("</gpx>\n");

        xml
    }
}

/// Build a track from a store scan, one point per committed sample
pub fn from_samples(name: &str, samples: &[Sample]) -> GpxTrack {
    let track_points = samples
        .iter()
        .map(|sample| {
            let time = DateTime::<Utc>::from_timestamp_millis(sample.timestamp_ms)
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();

            GpxPoint {
                lat: sample.latitude,
                lon: sample.longitude,
                ele: sample.altitude,
                time,
            }
        })
        .collect();

    GpxTrack {
        name: name.to_string(),
        track_points,
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
    fn test_one_trackpoint_per_sample() {
        let samples = [sample(1000, 43.0), sample(2000, 43.001)];
        let track = from_samples("morning run", &samples);
        let xml = track.to_gpx_xml();

        assert_eq!(track.track_points.len(), 2);
        assert_eq!(xml.matches("<trkpt").count(), 2);
        assert!(xml.contains("lat=\"43\""));
        assert!(xml.contains("lon=\"-87.9\""));
        assert!(xml.contains("morning run"));
    }

    #[test]
    fn test_times_are_rfc3339() {
        let track = from_samples("t", &[sample(0, 43.0)]);
        assert_eq!(track.track_points[0].time, "1970-01-01T00:00:00+00:00");
    }
}
