//! Decoding for raw s16le capture payloads.

use recorder_core::{DecodeBackend, DecodedTrack, RecorderError, RecordingFormat, StreamFormat};

/// Decodes the interleaved 16-bit little-endian PCM payloads produced by
/// [`crate::mic_capture::CpalCaptureBackend`].
pub struct PcmDecoder;

impl DecodeBackend for PcmDecoder {
    fn decode(
        &self,
        bytes: &[u8],
        format: RecordingFormat,
        hint: StreamFormat,
    ) -> Result<DecodedTrack, RecorderError> {
        if format != RecordingFormat::PcmS16le {
            return Err(RecorderError::DecodeError(format!(
                "cannot decode '{}' payloads",
                format.mime()
            )));
        }

        let channels = hint.channels.max(1) as usize;
        let frame_bytes = channels * 2;
        if bytes.len() % frame_bytes != 0 {
            return Err(RecorderError::DecodeError(format!(
                "payload of {} bytes is not a whole number of {}-byte frames",
                bytes.len(),
                frame_bytes
            )));
        }

        let frame_count = bytes.len() / frame_bytes;
        let mut out = vec![Vec::with_capacity(frame_count); channels];
        for frame in bytes.chunks_exact(frame_bytes) {
            for (c, sample) in frame.chunks_exact(2).enumerate() {
                out[c].push(dequantize(i16::from_le_bytes([sample[0], sample[1]])));
            }
        }

        Ok(DecodedTrack {
            channels: out,
            sample_rate: hint.sample_rate,
        })
    }
}

/// Inverse of the encoder's asymmetric quantization: negatives span -32768,
/// positives span 32767, so both full-scale endpoints map back to ±1.0.
fn dequantize(value: i16) -> f32 {
    if value < 0 {
        value as f32 / 32768.0
    } else {
        value as f32 / 32767.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(channels: u16) -> StreamFormat {
        StreamFormat {
            sample_rate: 48_000,
            channels,
        }
    }

    fn bytes_of(samples: &[i16]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn mono_decode() {
        let bytes = bytes_of(&[0, 32_767, -32_768]);
        let track = PcmDecoder.decode(&bytes, RecordingFormat::PcmS16le, hint(1)).unwrap();

        assert_eq!(track.channels.len(), 1);
        assert_eq!(track.sample_rate, 48_000);
        assert_eq!(track.channels[0], vec![0.0, 1.0, -1.0]);
    }

    #[test]
    fn stereo_deinterleave() {
        let bytes = bytes_of(&[100, -100, 200, -200]);
        let track = PcmDecoder.decode(&bytes, RecordingFormat::PcmS16le, hint(2)).unwrap();

        assert_eq!(track.channels.len(), 2);
        assert_eq!(track.sample_count(), 2);
        assert!(track.channels[0][0] > 0.0 && track.channels[0][1] > 0.0);
        assert!(track.channels[1][0] < 0.0 && track.channels[1][1] < 0.0);
    }

    #[test]
    fn partial_frame_is_a_decode_error() {
        let bytes = bytes_of(&[1, 2, 3]);
        let result = PcmDecoder.decode(&bytes[..5], RecordingFormat::PcmS16le, hint(1));
        assert!(matches!(result, Err(RecorderError::DecodeError(_))));

        // Stereo needs 4-byte frames; 6 bytes is one and a half.
        let result = PcmDecoder.decode(&bytes, RecordingFormat::PcmS16le, hint(2));
        assert!(matches!(result, Err(RecorderError::DecodeError(_))));
    }

    #[test]
    fn foreign_format_rejected() {
        let result = PcmDecoder.decode(&[0, 0], RecordingFormat::OpusWebm, hint(1));
        assert!(matches!(result, Err(RecorderError::DecodeError(_))));
    }

    #[test]
    fn empty_payload_decodes_to_empty_track() {
        let track = PcmDecoder.decode(&[], RecordingFormat::PcmS16le, hint(2)).unwrap();
        assert!(track.is_empty());
    }
}
