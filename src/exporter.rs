use std::fs::OpenOptions;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{TResult, TelemetryError};
use crate::sample::Sample;

/// Fixed CSV header, one column per persisted field
pub const EXPORT_HEADER: [&str; 9] = [
    "Timestamp",
    "Latitude",
    "Longitude",
    "Altitude (m)",
    "Bearing (Degrees)",
    "Speed (mph)",
    "Accel X-Axis (m/s^2)",
    "Accel Y-Axis (m/s^2)",
    "Accel Z-Axis (m/s^2)",
];

/// Timestamped file name so per-session exports never collide
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("log_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Write `samples` to `path` in scan order.
///
/// A fresh file gets the header as its first row; an existing file gets the
/// data rows appended after its current content, header untouched. Numeric
/// fields use the shortest decimal form that parses back to the same value.
pub fn export<P: AsRef<Path>>(samples: &[Sample], path: P) -> TResult<()> {
    let path = path.as_ref();
    let fresh = !path.exists();

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::Writer::from_writer(file);

    if fresh {
        writer.write_record(EXPORT_HEADER)?;
    }
    for sample in samples {
        writer.write_record(&row(sample))?;
    }
    writer.flush()?;
    Ok(())
}

fn row(sample: &Sample) -> [String; 9] {
    [
        sample.timestamp_ms.to_string(),
        sample.latitude.to_string(),
        sample.longitude.to_string(),
        sample.altitude.to_string(),
        sample.bearing.to_string(),
        sample.speed_mph.to_string(),
        sample.accel_x.to_string(),
        sample.accel_y.to_string(),
        sample.accel_z.to_string(),
    ]
}

/// Parse an exported file's data rows back into samples, in file order
pub fn import<P: AsRef<Path>>(path: P) -> TResult<Vec<Sample>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record?;
        samples.push(Sample {
            timestamp_ms: int_field(&record, 0)?,
            latitude: float_field(&record, 1)?,
            longitude: float_field(&record, 2)?,
            altitude: float_field(&record, 3)?,
            bearing: float_field(&record, 4)?,
            speed_mph: float_field(&record, 5)?,
            accel_x: float_field(&record, 6)?,
            accel_y: float_field(&record, 7)?,
            accel_z: float_field(&record, 8)?,
        });
    }
    Ok(samples)
}

fn int_field(record: &csv::StringRecord, idx: usize) -> TResult<i64> {
    raw_field(record, idx)?
        .parse()
        .map_err(|_| TelemetryError::MalformedRow(format!("bad integer in column {idx}")))
}

fn float_field(record: &csv::StringRecord, idx: usize) -> TResult<f64> {
    raw_field(record, idx)?
        .parse()
        .map_err(|_| TelemetryError::MalformedRow(format!("bad number in column {idx}")))
}

fn raw_field<'a>(record: &'a csv::StringRecord, idx: usize) -> TResult<&'a str> {
    record
        .get(idx)
        .ok_or_else(|| TelemetryError::MalformedRow(format!("missing column {idx}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_a() -> Sample {
        Sample {
            timestamp_ms: 1,
            longitude: -87.9,
            latitude: 43.0,
            altitude: 200.0,
            bearing: 90.0,
            speed_mph: 22.37,
            accel_x: 0.1,
            accel_y: 0.0,
            accel_z: 9.8,
        }
    }

    fn sample_b() -> Sample {
        Sample {
            timestamp_ms: 2,
            longitude: -87.901,
            latitude: 43.001,
            altitude: 200.5,
            bearing: 91.0,
            speed_mph: 24.5,
            accel_x: 0.2,
            accel_y: 0.05,
            accel_z: 9.79,
        }
    }

    #[test]
    fn test_fresh_export_writes_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        export(&[sample_a(), sample_b()], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Timestamp,Latitude,Longitude,Altitude (m),Bearing (Degrees),Speed (mph),\
             Accel X-Axis (m/s^2),Accel Y-Axis (m/s^2),Accel Z-Axis (m/s^2)"
        );
        assert_eq!(lines[1], "1,43,-87.9,200,90,22.37,0.1,0,9.8");
        assert_eq!(lines[2], "2,43.001,-87.901,200.5,91,24.5,0.2,0.05,9.79");
    }

    #[test]
    fn test_append_does_not_repeat_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        export(&[sample_a()], &path).unwrap();
        export(&[sample_b()], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Timestamp,"));
        assert!(lines[1].starts_with("1,"));
        assert!(lines[2].starts_with("2,"));
    }

    #[test]
    fn test_export_is_idempotent_on_content() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");

        let samples = [sample_a(), sample_b()];
        export(&samples, &first).unwrap();
        export(&samples, &second).unwrap();

        let a = std::fs::read(&first).unwrap();
        let b = std::fs::read(&second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_round_trip_reproduces_samples_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        // Values with no short decimal form still have to survive the trip
        let awkward = Sample {
            timestamp_ms: 1699999999123,
            longitude: -87.90000000000001,
            latitude: 43.0 + 1.0 / 3.0,
            altitude: 200.123456789,
            bearing: 359.99999,
            speed_mph: 10.0 * crate::sample::MPH_PER_MPS,
            accel_x: 0.1 + 0.2,
            accel_y: -0.0000001,
            accel_z: 9.80665,
        };
        let samples = vec![sample_a(), sample_b(), awkward];

        export(&samples, &path).unwrap();
        let imported = import(&path).unwrap();
        assert_eq!(imported, samples);
    }

    #[test]
    fn test_export_file_name_embeds_wall_clock() {
        let now = Utc.with_ymd_and_hms(2021, 5, 15, 14, 30, 5).unwrap();
        assert_eq!(export_file_name(now), "log_20210515_143005.csv");
    }
}
