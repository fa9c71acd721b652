use crate::models::config::RecordingFormat;
use crate::models::error::RecorderError;
use crate::processing::mixer::DecodedTrack;
use crate::traits::capture_backend::StreamFormat;

/// Interface for turning a track's accumulated payload into raw samples.
pub trait DecodeBackend: Send + Sync {
    /// Decode `bytes` (the concatenation of one track's chunks) into
    /// per-channel float sample arrays.
    ///
    /// `hint` carries the format the stream was captured with; containered
    /// formats may override it with what the payload itself declares. The
    /// returned track reports the native sample rate of the decoded audio.
    ///
    /// Fails with [`RecorderError::DecodeError`] if the payload is not a
    /// valid encoding of `format` (corrupt or partial chunk).
    fn decode(
        &self,
        bytes: &[u8],
        format: RecordingFormat,
        hint: StreamFormat,
    ) -> Result<DecodedTrack, RecorderError>;
}
