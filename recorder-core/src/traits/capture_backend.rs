use std::sync::Arc;

use crate::models::config::RecordingFormat;
use crate::models::error::RecorderError;

/// Callback invoked for every binary chunk a stream delivers.
///
/// Chunks arrive in order; the sink must be O(1) (a buffer append) because
/// it runs on the backend's capture thread. Zero-length chunks may be passed
/// and are ignored downstream.
pub type ChunkSink = Arc<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// Parameters for opening one capture stream.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Device to bind, or empty for the backend's default device.
    pub device_id: String,
    /// Requested sample rate in Hz; the stream reports what it negotiated.
    pub sample_rate: u32,
    /// Encoding the chunks should be delivered in.
    pub format: RecordingFormat,
    /// Encoder bitrate hint in bits/s; ignored by uncompressed backends.
    pub bitrate: u32,
}

/// Format a stream actually negotiated with its device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// One open capture stream bound to one device.
pub trait CaptureStream: Send {
    /// The negotiated format. May differ from the requested sample rate;
    /// downstream consumers must honor this rate, not the requested one.
    fn format(&self) -> StreamFormat;

    /// Begin delivering chunks to the sink.
    fn start(&mut self) -> Result<(), RecorderError>;

    /// Suspend chunk delivery without closing the device.
    fn pause(&mut self) -> Result<(), RecorderError>;

    /// Resume chunk delivery after a pause.
    fn resume(&mut self) -> Result<(), RecorderError>;

    /// Stop the stream. Returns only after the final chunk has been handed
    /// to the sink; once this returns the track's payload is complete.
    fn stop(&mut self) -> Result<(), RecorderError>;
}

/// Interface for platform capture backends.
pub trait CaptureBackend: Send + Sync {
    /// Whether the backend can deliver chunks in the given format.
    /// Checked before any stream is opened.
    fn supports_format(&self, format: RecordingFormat) -> bool;

    /// Open a stream for the requested device. Fails with
    /// [`RecorderError::DeviceUnavailable`] if the device cannot be bound.
    fn open(
        &self,
        request: &StreamRequest,
        sink: ChunkSink,
    ) -> Result<Box<dyn CaptureStream>, RecorderError>;
}
