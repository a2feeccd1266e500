use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};
use serde::Deserialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, Duration};

use crate::events::{AccelReading, LocationFix, TelemetryEvent};

pub async fn accel_loop(tx: Sender<TelemetryEvent>) {
    let mut interval = interval(Duration::from_millis(20)); // ~50Hz sampling
    let mut sample_count = 0u64;

    loop {
        interval.tick().await;

        // Try to read from termux-sensor, fall back to mock data
        let reading = match read_accelerometer() {
            Some(reading) => reading,
            None => mock_accel_reading(),
        };

        match tx.try_send(TelemetryEvent::Acceleration(reading)) {
            Ok(_) => {
                sample_count += 1;
                if sample_count % 500 == 0 {
                    debug!("[accel] {} samples", sample_count);
                }
            }
            Err(TrySendError::Closed(_)) => {
                warn!("[accel] channel closed after {} samples", sample_count);
                break;
            }
            Err(TrySendError::Full(_)) => {
                // Channel full, drop this sample
            }
        }
    }
}

pub async fn location_loop(tx: Sender<TelemetryEvent>) {
    let mut interval = interval(Duration::from_millis(1000));
    let mut fix_count = 0u64;

    loop {
        interval.tick().await;

        // Try to read from termux-location, fall back to mock
        let fix = match read_location() {
            Some(fix) => fix,
            None => mock_location_fix(),
        };

        match tx.try_send(TelemetryEvent::Location(fix)) {
            Ok(_) => {
                fix_count += 1;
                if fix_count % 60 == 0 {
                    debug!("[location] {} fixes", fix_count);
                }
            }
            Err(TrySendError::Closed(_)) => {
                warn!("[location] channel closed after {} fixes", fix_count);
                break;
            }
            Err(TrySendError::Full(_)) => {
                // Channel full, drop this fix
            }
        }
    }
}

fn read_accelerometer() -> Option<AccelReading> {
    // Format: Accelerometer event: x=X, y=Y, z=Z, accuracy=0, timestamp=TS
    match Command::new("termux-sensor")
        .arg("-n")
        .arg("1")
        .arg("-s")
        .arg("linear_acceleration")
        .output()
    {
        Ok(output) => {
            let text = String::from_utf8_lossy(&output.stdout);
            parse_accel_output(&text)
        }
        Err(_) => None,
    }
}

#[derive(Deserialize)]
struct TermuxLocation {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
    #[serde(default)]
    altitude: f64,
    #[serde(default)]
    bearing: f64,
    #[serde(default)]
    speed: f64,
}

fn read_location() -> Option<LocationFix> {
    let output = Command::new("termux-location")
        .arg("-p")
        .arg("gps")
        .output()
        .ok()?;

    let loc: TermuxLocation = serde_json::from_slice(&output.stdout).ok()?;
    Some(LocationFix::new(
        loc.longitude,
        loc.latitude,
        loc.altitude,
        loc.bearing,
        loc.speed,
    ))
}

fn parse_accel_output(output: &str) -> Option<AccelReading> {
    let mut x = None;
    let mut y = None;
    let mut z = None;

    for part in output.split(',') {
        if let Some((key, value)) = part.split_once('=') {
            // Keys arrive as "x" or embedded like "Accelerometer event: x"
            let axis = key.rsplit([' ', ':']).next().unwrap_or(key);
            match axis {
                "x" => x = value.trim().parse().ok(),
                "y" => y = value.trim().parse().ok(),
                "z" => z = value.trim().parse().ok(),
                _ => {}
            }
        }
    }

    Some(AccelReading::new(x?, y?, z?))
}

fn mock_accel_reading() -> AccelReading {
    use std::f64::consts::PI;
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let t = COUNTER.fetch_add(1, Ordering::Relaxed) as f64 * 0.02;

    AccelReading::new(
        (t * 2.0 * PI).sin() * 0.5,
        (t * 2.0 * PI).cos() * 0.3,
        9.81 + (t * PI).sin() * 0.1,
    )
}

fn mock_location_fix() -> LocationFix {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed) as f64;

    LocationFix::new(
        -122.4194 + seq * 0.00001,
        37.7749 + seq * 0.00001,
        16.0 + (seq * 0.2).sin(),
        (seq * 3.0) % 360.0,
        10.0 + (seq * 0.5).sin() * 5.0,
    )
}
