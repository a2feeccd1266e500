use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use trackday_rs::{
    sensors, track, Fuser, LiveStatus, LiveUpdate, RecordStore, SessionController, TelemetryEvent,
};

#[derive(Parser, Debug)]
#[command(name = "trackday")]
#[command(about = "Driving-session telemetry logger - fused GPS + G-force capture", long_about = None)]
struct Args {
    /// Duration in seconds (0 = continuous)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// Sample database path
    #[arg(long, default_value = "trackday.db")]
    database: String,

    /// Directory for session logs and live status
    #[arg(long, default_value = "trackday_sessions")]
    output_dir: String,

    /// Write a GPX track of the stored route on exit
    #[arg(long)]
    gpx: bool,

    /// Drop every stored sample and exit
    #[arg(long)]
    clear: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    std::fs::create_dir_all(&args.output_dir)?;
    let store = Arc::new(RecordStore::open(&args.database)?);
    let controller = SessionController::new(store.clone(), &args.output_dir);

    if args.clear {
        controller.clear_database()?;
        println!("[{}] Sample database cleared", ts_now());
        return Ok(());
    }

    println!("[{}] Trackday starting", ts_now());
    println!("  Duration: {} seconds (0=continuous)", args.duration);
    println!("  Database: {}", args.database);
    println!("  Output Dir: {}", args.output_dir);

    // One channel carries both streams as tagged events
    let (event_tx, mut event_rx) = mpsc::channel::<TelemetryEvent>(500);
    let (live_tx, mut live_rx) = mpsc::channel::<LiveUpdate>(100);

    let fuser = Fuser::new(store.clone(), controller.logging_flag()).with_live(live_tx);

    // Spawn sensor producer tasks (hold handles to keep tasks alive)
    let _accel_handle = tokio::spawn(sensors::accel_loop(event_tx.clone()));
    let _location_handle = tokio::spawn(sensors::location_loop(event_tx.clone()));
    drop(event_tx);

    controller.set_logging(true)?;
    println!("[{}] Logging enabled", ts_now());

    let start = Utc::now();
    let mut status = LiveStatus::new();
    let mut last_status_save = Utc::now();
    let status_path = format!("{}/live_status.json", args.output_dir);

    loop {
        if args.duration > 0 {
            let elapsed = Utc::now().signed_duration_since(start);
            if elapsed.num_seconds() as u64 >= args.duration {
                println!("[{}] Duration reached, stopping...", ts_now());
                break;
            }
        }

        // Drain available events into the fuser
        while let Ok(event) = event_rx.try_recv() {
            if let Err(err) = fuser.handle_event(event) {
                eprintln!("[{}] {err}; disabling logging", ts_now());
                if let Err(stop_err) = controller.set_logging(false) {
                    eprintln!("[{}] stop failed: {stop_err}", ts_now());
                }
            }
        }

        while let Ok(update) = live_rx.try_recv() {
            status.apply(update);
        }

        // Refresh the dashboard snapshot every 2 seconds
        let now = Utc::now();
        if now.signed_duration_since(last_status_save).num_seconds() >= 2 {
            status.timestamp_ms = now.timestamp_millis();
            status.samples_committed = fuser.committed();
            status.logging = controller.is_logging();
            status.uptime_seconds = now.signed_duration_since(start).num_seconds().max(0) as u64;
            let _ = status.save(&status_path);
            last_status_save = now;
        }

        sleep(Duration::from_millis(1)).await;
    }

    // Stop logging; flushes the session to a timestamped CSV
    if let Some(path) = controller.set_logging(false)? {
        println!("[{}] Session log -> {}", ts_now(), path.display());
    }
    controller.wait_for_export()?;

    if args.gpx {
        let samples = store.scan_all()?;
        let name = format!("trackday {}", start.format("%Y-%m-%d %H:%M"));
        let gpx_path = format!(
            "{}/track_{}.gpx",
            args.output_dir,
            start.format("%Y%m%d_%H%M%S")
        );
        std::fs::write(&gpx_path, track::from_samples(&name, &samples).to_gpx_xml())?;
        println!("[{}] GPX track -> {}", ts_now(), gpx_path);
    }

    println!("\n=== Session Stats ===");
    println!("Samples committed: {}", fuser.committed());
    println!("Samples stored: {}", store.len()?);

    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
