use thiserror::Error;

/// Telemetry pipeline error types
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),

    #[error("export failed: {0}")]
    ExportIo(#[from] std::io::Error),

    #[error("export failed: {0}")]
    ExportCsv(#[from] csv::Error),

    #[error("malformed log row: {0}")]
    MalformedRow(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for pipeline operations
pub type TResult<T> = Result<T, TelemetryError>;
