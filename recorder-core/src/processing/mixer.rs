//! Multi-track summation onto a fixed two-channel bed.
//!
//! Pure math over decoded sample buffers, no platform dependencies. Tracks
//! are aligned to the longest track (shorter tracks contribute silence past
//! their end), summed without normalization, and hard-clamped to [-1.0, 1.0]
//! so quantization at encode time cannot overflow.

use crate::models::error::RecorderError;

/// Number of channels in every mix output.
pub const MIX_CHANNELS: usize = 2;

/// Raw per-channel samples decoded from one track's payload. Ephemeral:
/// exists only between decode and encode.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTrack {
    /// One sample array per channel, all the same length for a well-formed
    /// decode.
    pub channels: Vec<Vec<f32>>,
    /// Native rate reported by the decoder. May differ from the rate capture
    /// was configured with; output files must honor this one.
    pub sample_rate: u32,
}

impl DecodedTrack {
    pub fn sample_count(&self) -> usize {
        self.channels.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count() as f64 / self.sample_rate as f64
    }
}

/// Interleaved two-channel mix of a session's tracks, clamped to [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct MixedSignal {
    /// Interleaved stereo samples `[L0, R0, L1, R1, ...]`.
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MixedSignal {
    pub fn frames(&self) -> usize {
        self.samples.len() / MIX_CHANNELS
    }

    pub fn channels(&self) -> u16 {
        MIX_CHANNELS as u16
    }
}

/// Sum decoded tracks into one stereo signal.
///
/// Output channel `c`, sample `n` is the sum over tracks of
/// `channels[c % channel_count][n]`, zero past a track's end. A mono track
/// therefore lands on both output channels via the modulo wrap. The mix
/// length is the longest track's length; nothing is truncated.
///
/// Fails with [`RecorderError::NoAudioCaptured`] when no track carries
/// samples.
pub fn mix_tracks(tracks: &[DecodedTrack]) -> Result<MixedSignal, RecorderError> {
    let usable: Vec<&DecodedTrack> = tracks
        .iter()
        .filter(|t| !t.channels.is_empty() && !t.is_empty())
        .collect();

    if usable.is_empty() {
        return Err(RecorderError::NoAudioCaptured);
    }

    let sample_rate = usable[0].sample_rate;
    for track in &usable[1..] {
        if track.sample_rate != sample_rate {
            log::warn!(
                "track sample rate mismatch: {} Hz vs {} Hz, using the first",
                track.sample_rate,
                sample_rate
            );
        }
    }

    let target_len = usable.iter().map(|t| t.sample_count()).max().unwrap_or(0);
    let mut samples = vec![0.0f32; target_len * MIX_CHANNELS];

    for track in &usable {
        for c in 0..MIX_CHANNELS {
            let channel = &track.channels[c % track.channels.len()];
            for (n, &value) in channel.iter().enumerate() {
                samples[n * MIX_CHANNELS + c] += value;
            }
        }
    }

    for sample in &mut samples {
        *sample = sample.clamp(-1.0, 1.0);
    }

    Ok(MixedSignal { samples, sample_rate })
}
