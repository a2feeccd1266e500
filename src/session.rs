use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use chrono::Utc;
use log::{error, info};

use crate::error::{TResult, TelemetryError};
use crate::exporter;
use crate::store::RecordStore;

/// Owns the logging on/off flag and coordinates start/stop.
///
/// Stopping a logging run flushes the store to a fresh timestamped CSV.
/// The file write happens on a worker thread so it never stalls the
/// event-processing context; the handle is kept so shutdown can join it.
pub struct SessionController {
    store: Arc<RecordStore>,
    logging: Arc<AtomicBool>,
    export_dir: PathBuf,
    export_worker: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new<P: Into<PathBuf>>(store: Arc<RecordStore>, export_dir: P) -> Self {
        Self {
            store,
            logging: Arc::new(AtomicBool::new(false)),
            export_dir: export_dir.into(),
            export_worker: Mutex::new(None),
        }
    }

    /// Flag shared with the fuser, read on every location tick
    pub fn logging_flag(&self) -> Arc<AtomicBool> {
        self.logging.clone()
    }

    pub fn is_logging(&self) -> bool {
        self.logging.load(Ordering::SeqCst)
    }

    /// Enable or disable logging.
    ///
    /// Disabling after a logging run scans the store, hands the rows to the
    /// export worker, then clears the flag; the chosen destination is
    /// returned. The store itself is left untouched, so a failed export can
    /// be retried. Disabling while already idle does nothing.
    pub fn set_logging(&self, enabled: bool) -> TResult<Option<PathBuf>> {
        if enabled {
            self.logging.store(true, Ordering::SeqCst);
            return Ok(None);
        }
        if !self.is_logging() {
            return Ok(None);
        }

        let samples = match self.store.scan_all() {
            Ok(samples) => samples,
            Err(err) => {
                // Storage failure still ends the session; nothing to flush
                self.logging.store(false, Ordering::SeqCst);
                return Err(err);
            }
        };

        let path = self.export_dir.join(exporter::export_file_name(Utc::now()));
        let dest = path.clone();
        let handle = std::thread::spawn(move || match exporter::export(&samples, &dest) {
            Ok(()) => info!("exported {} samples to {}", samples.len(), dest.display()),
            Err(err) => error!("export to {} failed: {}", dest.display(), err),
        });

        {
            let mut worker = self.lock_worker()?;
            if let Some(previous) = worker.take() {
                let _ = previous.join();
            }
            *worker = Some(handle);
        }

        self.logging.store(false, Ordering::SeqCst);
        Ok(Some(path))
    }

    /// Drop every stored sample. Driven by the explicit clear-database
    /// action only; independent of session start/stop.
    pub fn clear_database(&self) -> TResult<()> {
        self.store.clear_all()
    }

    /// Block until the most recent export worker finishes
    pub fn wait_for_export(&self) -> TResult<()> {
        let handle = self.lock_worker()?.take();
        if let Some(handle) = handle {
            handle
                .join()
                .map_err(|_| TelemetryError::Internal("export worker panicked".to_string()))?;
        }
        Ok(())
    }

    fn lock_worker(&self) -> TResult<MutexGuard<'_, Option<JoinHandle<()>>>> {
        self.export_worker
            .lock()
            .map_err(|_| TelemetryError::Internal("export worker lock poisoned".to_string()))
    }
}
