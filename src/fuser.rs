use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::mpsc::Sender;

use crate::error::{TResult, TelemetryError};
use crate::events::{AccelReading, LocationFix, TelemetryEvent};
use crate::live::LiveUpdate;
use crate::sample::{SampleBuffer, MPH_PER_MPS};
use crate::store::RecordStore;

/// Merge cursor. Guarded as one unit: snapshot -> build -> insert must not
/// interleave with a concurrent stream update.
struct FuseState {
    buffer: SampleBuffer,
    last_commit_ms: i64,
}

/// Reacts to both input streams, keeps the merge buffer current, and while
/// the shared logging flag is set commits one sample per location event.
pub struct Fuser {
    state: Mutex<FuseState>,
    store: Arc<RecordStore>,
    logging: Arc<AtomicBool>,
    committed: AtomicU64,
    live_tx: Option<Sender<LiveUpdate>>,
}

impl Fuser {
    pub fn new(store: Arc<RecordStore>, logging: Arc<AtomicBool>) -> Self {
        Self {
            state: Mutex::new(FuseState {
                buffer: SampleBuffer::new(),
                last_commit_ms: 0,
            }),
            store,
            logging,
            committed: AtomicU64::new(0),
            live_tx: None,
        }
    }

    /// Attach the display collaborator's channel
    pub fn with_live(mut self, tx: Sender<LiveUpdate>) -> Self {
        self.live_tx = Some(tx);
        self
    }

    /// Single entry point for both streams
    pub fn handle_event(&self, event: TelemetryEvent) -> TResult<()> {
        match event {
            TelemetryEvent::Acceleration(reading) => self.on_acceleration(reading),
            TelemetryEvent::Location(fix) => self.on_location(fix),
        }
    }

    /// Samples committed since construction
    pub fn committed(&self) -> u64 {
        self.committed.load(Ordering::Relaxed)
    }

    fn on_acceleration(&self, reading: AccelReading) -> TResult<()> {
        {
            let mut state = self.lock_state()?;
            state.buffer.update_acceleration(reading.x, reading.y, reading.z);
        }
        // G-meter point updates regardless of logging state
        self.push_live(LiveUpdate::AccelPoint {
            x: reading.x,
            z: reading.z,
        });
        Ok(())
    }

    fn on_location(&self, fix: LocationFix) -> TResult<()> {
        {
            let mut state = self.lock_state()?;
            state
                .buffer
                .update_location(fix.longitude, fix.latitude, fix.altitude, fix.bearing, fix.speed_mps);

            if self.logging.load(Ordering::SeqCst) {
                // Wall clock may step; commit timestamps never go backwards
                let now_ms = Utc::now().timestamp_millis().max(state.last_commit_ms);
                state.last_commit_ms = now_ms;

                let sample = state.buffer.snapshot(now_ms);
                self.store.insert(&sample)?;
                self.committed.fetch_add(1, Ordering::Relaxed);
            }
        }
        // Speed readout updates regardless of logging state
        self.push_live(LiveUpdate::Speed((fix.speed_mps * MPH_PER_MPS).round() as i64));
        Ok(())
    }

    fn push_live(&self, update: LiveUpdate) {
        if let Some(tx) = &self.live_tx {
            // Display is advisory; drop the update if it lags
            let _ = tx.try_send(update);
        }
    }

    fn lock_state(&self) -> TResult<MutexGuard<'_, FuseState>> {
        self.state
            .lock()
            .map_err(|_| TelemetryError::Internal("fuse state lock poisoned".to_string()))
    }
}
