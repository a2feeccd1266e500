// Driving-session telemetry core
// Fuses location and linear-acceleration streams into persisted samples,
// exports sessions to CSV, and serves the map-review read path

pub mod error;
pub mod events;
pub mod exporter;
pub mod fuser;
pub mod live;
pub mod sample;
pub mod sensors;
pub mod session;
pub mod store;
pub mod track;

pub use error::{TResult, TelemetryError};
pub use events::{AccelReading, LocationFix, TelemetryEvent};
pub use fuser::Fuser;
pub use live::{LiveStatus, LiveUpdate};
pub use sample::{Sample, SampleBuffer, MPH_PER_MPS};
pub use session::SessionController;
pub use store::RecordStore;
