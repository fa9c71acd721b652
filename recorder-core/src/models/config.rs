use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::RecorderError;

/// Codec/container requested from the capture backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordingFormat {
    /// Raw 16-bit little-endian PCM, interleaved.
    PcmS16le,
    /// Opus in a WebM container.
    OpusWebm,
    /// AAC in an MP4 container.
    AacMp4,
}

impl RecordingFormat {
    /// MIME identifier handed to the capture backend.
    pub fn mime(self) -> &'static str {
        match self {
            Self::PcmS16le => "audio/pcm",
            Self::OpusWebm => "audio/webm;codecs=opus",
            Self::AacMp4 => "audio/mp4;codecs=aac",
        }
    }

    /// File extension used when a track is persisted in its native format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::PcmS16le => "pcm",
            Self::OpusWebm => "webm",
            Self::AacMp4 => "m4a",
        }
    }
}

/// Whether a session produces one merged file or one file per track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Single,
    Multiple,
}

/// Persisted recorder settings.
///
/// All fields have defaults so a partial settings file loads cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecorderConfig {
    /// Format requested from the capture backend.
    pub recording_format: RecordingFormat,

    /// Folder prefix for output files, relative to the vault root.
    /// Empty means the vault root itself.
    pub save_folder: String,

    /// Leading component of every output file name.
    pub file_prefix: String,

    /// Device for single-track capture. Empty selects the default device.
    pub audio_device_id: String,

    /// Requested capture sample rate in Hz. The backend reports the rate it
    /// actually negotiated; output files honor the negotiated rate.
    pub sample_rate: u32,

    /// Requested encoder bitrate in bits/s. Ignored by uncompressed backends.
    pub bitrate: u32,

    /// Capture one stream per configured track instead of a single stream.
    pub enable_multi_track: bool,

    /// Number of tracks in multi-track mode (1–8).
    pub max_tracks: usize,

    /// Merged WAV vs. per-track native files.
    pub output_mode: OutputMode,

    /// Device assignment per track index (1-based). A missing entry selects
    /// the default device for that track.
    pub track_audio_sources: BTreeMap<usize, String>,

    /// Gates verbose diagnostic logging only; never affects control flow.
    pub debug: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            recording_format: RecordingFormat::PcmS16le,
            save_folder: String::new(),
            file_prefix: "recording".into(),
            audio_device_id: String::new(),
            sample_rate: 44_100,
            bitrate: 128_000,
            enable_multi_track: false,
            max_tracks: 2,
            output_mode: OutputMode::Single,
            track_audio_sources: BTreeMap::new(),
            debug: false,
        }
    }
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), RecorderError> {
        if self.sample_rate == 0 {
            return Err(RecorderError::InvalidConfig(
                "sample rate must be positive".into(),
            ));
        }
        if self.bitrate == 0 {
            return Err(RecorderError::InvalidConfig("bitrate must be positive".into()));
        }
        if self.file_prefix.is_empty() {
            return Err(RecorderError::InvalidConfig(
                "file prefix must not be empty".into(),
            ));
        }
        if !(1..=8).contains(&self.max_tracks) {
            return Err(RecorderError::InvalidConfig(format!(
                "max tracks must be 1–8, got {}",
                self.max_tracks
            )));
        }
        Ok(())
    }

    /// Number of streams a session opens under this configuration.
    pub fn track_count(&self) -> usize {
        if self.enable_multi_track {
            self.max_tracks
        } else {
            1
        }
    }

    /// Device id for the given 1-based track index. Empty = default device.
    pub fn source_for_track(&self, index: usize) -> &str {
        if self.enable_multi_track {
            self.track_audio_sources
                .get(&index)
                .map(String::as_str)
                .unwrap_or("")
        } else {
            &self.audio_device_id
        }
    }

    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RecorderError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| RecorderError::StorageError(format!("failed to read settings: {}", e)))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| RecorderError::InvalidConfig(format!("failed to parse settings: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Persist settings to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), RecorderError> {
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| RecorderError::InvalidConfig(format!("failed to serialize settings: {}", e)))?;
        std::fs::write(path, data)
            .map_err(|e| RecorderError::StorageError(format!("failed to write settings: {}", e)))
    }
}
