use thiserror::Error;

/// Errors that can occur while managing a recording session.
///
/// Every variant is caught at the operation boundary that raised it
/// (start/stop/mix/encode/persist), reported through the delegate, and the
/// state machine is returned to idle. None are process-fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("recording format not supported by capture backend: {0}")]
    UnsupportedFormat(String),

    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("captured audio could not be decoded: {0}")]
    DecodeError(String),

    #[error("no audio was captured on any track")]
    NoAudioCaptured,

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("capture stream fault: {0}")]
    CaptureError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
