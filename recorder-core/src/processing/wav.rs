//! Canonical PCM WAVE serialization.
//!
//! Pure, deterministic transforms with no I/O: a fixed 44-byte little-endian
//! RIFF header plus 16-bit interleaved sample data. Output is byte-exact for
//! a given `(samples, sample_rate, channels)` input.

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Output bit depth. The container always carries 16-bit PCM.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Generate the 44-byte RIFF header for a PCM data section of `data_size`
/// bytes.
///
/// Layout (all little-endian):
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    data_size + 36
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * 2
/// [32-33]  block_align = channels * 2
/// [34-35]  16 (bits per sample)
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn wav_header(sample_rate: u32, channels: u16, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let bytes_per_frame = channels as u32 * (BITS_PER_SAMPLE as u32 / 8);
    let byte_rate = sample_rate * bytes_per_frame;
    let block_align = channels * (BITS_PER_SAMPLE / 8);

    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(data_size + 36).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Quantize one float sample to signed 16-bit.
///
/// Clamps to [-1.0, 1.0], then scales asymmetrically: negative samples map
/// onto the full -32768 range, positive onto 32767, so both endpoints are
/// exactly representable.
pub fn quantize_sample(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}

/// Serialize interleaved float samples into a complete WAV file.
pub fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    let data_size = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(WAV_HEADER_SIZE + samples.len() * 2);

    out.extend_from_slice(&wav_header(sample_rate, channels, data_size));
    for &sample in samples {
        out.extend_from_slice(&quantize_sample(sample).to_le_bytes());
    }
    out
}
