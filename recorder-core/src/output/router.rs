//! Decides how a finished session's tracks become files.
//!
//! Single-file mode runs decode → mix → WAV encode and persists one merged
//! bounce; multi-file mode persists each track's accumulated bytes verbatim
//! in the backend's native format. Persistence goes through the `Vault`
//! collaborator; saved files are linked into the active document through the
//! `NoteSink` collaborator.

use chrono::{DateTime, Utc};

use crate::capture::track_buffer::TrackCapture;
use crate::models::config::{OutputMode, RecorderConfig};
use crate::models::error::RecorderError;
use crate::models::outcome::{SavedFile, SessionOutcome};
use crate::output::filename;
use crate::processing::{mixer, wav};
use crate::traits::capture_backend::StreamFormat;
use crate::traits::decode_backend::DecodeBackend;
use crate::traits::vault::{NoteSink, Vault};

pub struct OutputRouter<'a> {
    vault: &'a dyn Vault,
    notes: &'a dyn NoteSink,
    decoder: &'a dyn DecodeBackend,
}

impl<'a> OutputRouter<'a> {
    pub fn new(vault: &'a dyn Vault, notes: &'a dyn NoteSink, decoder: &'a dyn DecodeBackend) -> Self {
        Self { vault, notes, decoder }
    }

    /// Persist a session's output files.
    ///
    /// Tracks with zero captured chunks are excluded up front and never
    /// produce files; if every track is empty this fails with
    /// [`RecorderError::NoAudioCaptured`] before anything is written.
    ///
    /// In multi-file mode each track's save attempt is independent: a failed
    /// track is counted in `failed_tracks` and its siblings still save.
    pub fn deliver(
        &self,
        config: &RecorderConfig,
        tracks: &[TrackCapture],
        now: DateTime<Utc>,
        duration_secs: f64,
    ) -> Result<SessionOutcome, RecorderError> {
        let non_empty: Vec<&TrackCapture> = tracks.iter().filter(|t| !t.is_empty()).collect();
        if non_empty.is_empty() {
            return Err(RecorderError::NoAudioCaptured);
        }

        let timestamp = filename::timestamp_slug(now);
        let (saved, failed_tracks) = match config.output_mode {
            OutputMode::Single => {
                let file = self.deliver_mixdown(config, &non_empty, &timestamp)?;
                (vec![file], 0)
            }
            OutputMode::Multiple => self.deliver_tracks(config, &non_empty, &timestamp),
        };

        if !saved.is_empty() {
            let links: Vec<String> = saved.iter().map(|f| markdown_link(&f.path)).collect();
            self.notes.insert_at_cursor(&links.join("\n"));
        }

        Ok(SessionOutcome {
            saved,
            failed_tracks,
            duration_secs,
        })
    }

    fn deliver_mixdown(
        &self,
        config: &RecorderConfig,
        tracks: &[&TrackCapture],
        timestamp: &str,
    ) -> Result<SavedFile, RecorderError> {
        let mut decoded = Vec::with_capacity(tracks.len());
        for track in tracks {
            let payload = track.payload();
            let hint = StreamFormat {
                sample_rate: track.sample_rate,
                channels: track.channel_count,
            };
            let samples = self.decoder.decode(&payload, config.recording_format, hint)?;
            if config.debug {
                log::debug!(
                    "track {}: {} bytes → {} ch, {} samples at {} Hz",
                    track.index,
                    payload.len(),
                    samples.channels.len(),
                    samples.sample_count(),
                    samples.sample_rate
                );
            }
            decoded.push(samples);
        }

        let mix = mixer::mix_tracks(&decoded)?;
        if config.debug {
            log::debug!("mixdown: {} frames at {} Hz", mix.frames(), mix.sample_rate);
        }

        // Encode at the decoders' native rate, not the configured capture rate.
        let bytes = wav::encode_wav(&mix.samples, mix.sample_rate, mix.channels());

        let name = filename::mixdown_file_name(&config.file_prefix, timestamp);
        let target = filename::vault_path(&config.save_folder, &name);
        let path = filename::resolve_collision(self.vault, &target)?;
        self.vault.write_binary(&path, &bytes)?;

        Ok(SavedFile {
            path,
            track_index: None,
            bytes: bytes.len() as u64,
        })
    }

    fn deliver_tracks(
        &self,
        config: &RecorderConfig,
        tracks: &[&TrackCapture],
        timestamp: &str,
    ) -> (Vec<SavedFile>, usize) {
        let ext = config.recording_format.extension();
        let mut saved = Vec::new();
        let mut failed = 0;

        for track in tracks {
            let name =
                filename::track_file_name(&config.file_prefix, &track.source_label, timestamp, ext);
            let target = filename::vault_path(&config.save_folder, &name);
            match self.save_track(track, &target) {
                Ok(file) => saved.push(file),
                Err(e) => {
                    log::error!("track {} save failed: {}", track.index, e);
                    failed += 1;
                }
            }
        }

        (saved, failed)
    }

    fn save_track(&self, track: &TrackCapture, target: &str) -> Result<SavedFile, RecorderError> {
        let path = filename::resolve_collision(self.vault, target)?;
        let payload = track.payload();
        self.vault.write_binary(&path, &payload)?;
        Ok(SavedFile {
            path,
            track_index: Some(track.index),
            bytes: payload.len() as u64,
        })
    }
}

fn markdown_link(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    format!("[{}]({})", name, path)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use parking_lot::Mutex;

    use super::*;
    use crate::models::config::RecordingFormat;
    use crate::traits::vault::MemoryVault;

    /// Decodes interleaved s16le using the stream-format hint.
    struct S16Decoder;

    impl DecodeBackend for S16Decoder {
        fn decode(
            &self,
            bytes: &[u8],
            _format: RecordingFormat,
            hint: StreamFormat,
        ) -> Result<mixer::DecodedTrack, RecorderError> {
            if bytes.len() % 2 != 0 {
                return Err(RecorderError::DecodeError("truncated sample".into()));
            }
            let ch = hint.channels.max(1) as usize;
            let mut channels = vec![Vec::new(); ch];
            for (i, frame) in bytes.chunks_exact(2).enumerate() {
                let value = i16::from_le_bytes([frame[0], frame[1]]) as f32 / 32767.0;
                channels[i % ch].push(value);
            }
            Ok(mixer::DecodedTrack {
                channels,
                sample_rate: hint.sample_rate,
            })
        }
    }

    #[derive(Default)]
    struct RecordedNotes {
        inserted: Mutex<Vec<String>>,
    }

    impl NoteSink for RecordedNotes {
        fn insert_at_cursor(&self, text: &str) {
            self.inserted.lock().push(text.to_string());
        }
    }

    /// Vault whose writes fail for paths containing a marker substring.
    struct FlakyVault {
        inner: MemoryVault,
        fail_marker: &'static str,
    }

    impl Vault for FlakyVault {
        fn exists(&self, path: &str) -> Result<bool, RecorderError> {
            self.inner.exists(path)
        }

        fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<(), RecorderError> {
            if path.contains(self.fail_marker) {
                return Err(RecorderError::StorageError("disk full".into()));
            }
            self.inner.write_binary(path, bytes)
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 45).unwrap()
    }

    fn track_with_samples(index: usize, label: &str, samples: &[i16], rate: u32) -> TrackCapture {
        let mut track = TrackCapture::new(index, String::new(), label.into());
        track.sample_rate = rate;
        track.channel_count = 1;
        let mut bytes = Vec::new();
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        track.buffer.lock().append(&bytes);
        track
    }

    fn config(mode: OutputMode) -> RecorderConfig {
        let mut config = RecorderConfig::default();
        config.file_prefix = "rec".into();
        config.output_mode = mode;
        config
    }

    #[test]
    fn single_mode_produces_one_wav_at_native_rate() {
        let vault = MemoryVault::new();
        let notes = RecordedNotes::default();
        let router = OutputRouter::new(&vault, &notes, &S16Decoder);

        // Native rate differs from the configured 44.1 kHz request.
        let track = track_with_samples(1, "Mic", &[1000, -1000, 500], 48_000);
        let outcome = router
            .deliver(&config(OutputMode::Single), &[track], fixed_now(), 1.0)
            .unwrap();

        assert_eq!(outcome.saved_count(), 1);
        assert_eq!(outcome.failed_tracks, 0);

        let file = &outcome.saved[0];
        assert_eq!(file.path, "rec-multitrack-2024-03-05T14-30-45-000Z.wav");

        let bytes = vault.get(&file.path).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        let rate = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);
        assert_eq!(rate, 48_000); // decoder-reported, not configured
        let channels = u16::from_le_bytes([bytes[22], bytes[23]]);
        assert_eq!(channels, 2);
        assert_eq!(bytes.len(), 44 + 3 * 2 * 2); // 3 frames, stereo, 16-bit
    }

    #[test]
    fn single_mode_excludes_empty_tracks() {
        let vault = MemoryVault::new();
        let notes = RecordedNotes::default();
        let router = OutputRouter::new(&vault, &notes, &S16Decoder);

        let silent = TrackCapture::new(2, String::new(), "Silent".into());
        let track = track_with_samples(1, "Mic", &[100], 44_100);

        let outcome = router
            .deliver(&config(OutputMode::Single), &[track, silent], fixed_now(), 0.1)
            .unwrap();
        assert_eq!(outcome.saved_count(), 1);
    }

    #[test]
    fn all_tracks_empty_is_no_audio_captured() {
        let vault = MemoryVault::new();
        let notes = RecordedNotes::default();
        let router = OutputRouter::new(&vault, &notes, &S16Decoder);

        let silent = TrackCapture::new(1, String::new(), "Silent".into());
        let result = router.deliver(&config(OutputMode::Multiple), &[silent], fixed_now(), 0.0);

        assert_eq!(result, Err(RecorderError::NoAudioCaptured));
        assert!(vault.is_empty());
        assert!(notes.inserted.lock().is_empty());
    }

    #[test]
    fn multi_mode_writes_untouched_track_bytes() {
        let vault = MemoryVault::new();
        let notes = RecordedNotes::default();
        let router = OutputRouter::new(&vault, &notes, &S16Decoder);

        let a = track_with_samples(1, "USB Mic", &[1, 2, 3], 44_100);
        let b = track_with_samples(2, "Line In", &[-4, -5], 44_100);
        let a_payload = a.payload();
        let b_payload = b.payload();

        let outcome = router
            .deliver(&config(OutputMode::Multiple), &[a, b], fixed_now(), 2.0)
            .unwrap();

        assert_eq!(outcome.saved_count(), 2);
        let paths: Vec<&str> = outcome.saved.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "rec-USBMic-2024-03-05T14-30-45-000Z.pcm",
                "rec-LineIn-2024-03-05T14-30-45-000Z.pcm",
            ]
        );
        assert_eq!(vault.get(paths[0]).unwrap(), a_payload);
        assert_eq!(vault.get(paths[1]).unwrap(), b_payload);
        assert_eq!(outcome.saved[0].track_index, Some(1));
        assert_eq!(outcome.saved[1].track_index, Some(2));
    }

    #[test]
    fn multi_mode_save_failures_do_not_abort_siblings() {
        let vault = FlakyVault {
            inner: MemoryVault::new(),
            fail_marker: "Broken",
        };
        let notes = RecordedNotes::default();
        let router = OutputRouter::new(&vault, &notes, &S16Decoder);

        let good = track_with_samples(1, "Good Mic", &[1], 44_100);
        let bad = track_with_samples(2, "Broken Mic", &[2], 44_100);

        let outcome = router
            .deliver(&config(OutputMode::Multiple), &[bad, good], fixed_now(), 1.0)
            .unwrap();

        assert_eq!(outcome.saved_count(), 1);
        assert_eq!(outcome.failed_tracks, 1);
        assert_eq!(outcome.saved[0].track_index, Some(1));
    }

    #[test]
    fn collision_appends_counter() {
        let vault = MemoryVault::new();
        vault.insert("rec-multitrack-2024-03-05T14-30-45-000Z.wav", vec![0]);
        let notes = RecordedNotes::default();
        let router = OutputRouter::new(&vault, &notes, &S16Decoder);

        let track = track_with_samples(1, "Mic", &[100], 44_100);
        let outcome = router
            .deliver(&config(OutputMode::Single), &[track], fixed_now(), 0.5)
            .unwrap();

        assert_eq!(
            outcome.saved[0].path,
            "rec-multitrack-2024-03-05T14-30-45-000Z_1.wav"
        );
    }

    #[test]
    fn links_inserted_in_file_order() {
        let vault = MemoryVault::new();
        let notes = RecordedNotes::default();
        let router = OutputRouter::new(&vault, &notes, &S16Decoder);

        let a = track_with_samples(1, "A", &[1], 44_100);
        let b = track_with_samples(2, "B", &[2], 44_100);

        let mut cfg = config(OutputMode::Multiple);
        cfg.save_folder = "takes".into();
        router.deliver(&cfg, &[a, b], fixed_now(), 1.0).unwrap();

        let inserted = notes.inserted.lock();
        assert_eq!(inserted.len(), 1);
        let lines: Vec<&str> = inserted[0].lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[rec-A-"));
        assert!(lines[0].contains("](takes/rec-A-"));
        assert!(lines[1].starts_with("[rec-B-"));
    }

    #[test]
    fn decode_error_propagates_in_single_mode() {
        let vault = MemoryVault::new();
        let notes = RecordedNotes::default();
        let router = OutputRouter::new(&vault, &notes, &S16Decoder);

        let mut track = TrackCapture::new(1, String::new(), "Mic".into());
        track.sample_rate = 44_100;
        track.channel_count = 1;
        track.buffer.lock().append(&[0x01]); // half a sample

        let result = router.deliver(&config(OutputMode::Single), &[track], fixed_now(), 0.1);
        assert!(matches!(result, Err(RecorderError::DecodeError(_))));
        assert!(vault.is_empty());
    }
}
