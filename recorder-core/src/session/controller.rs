//! State-gated session orchestrator.
//!
//! Owns at most one [`RecordingSession`] and routes every command through
//! the state machine before touching streams. Data flow:
//!
//! ```text
//! [CaptureBackend] → per-track chunk sinks → [TrackBuffer]s ─┐
//!                                                            ├→ [OutputRouter]
//!              toggle_recording / toggle_pause ──────────────┘      ↓
//!                                                       [Vault] + [NoteSink]
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use uuid::Uuid;

use crate::capture::driver::StreamCaptureDriver;
use crate::capture::track_buffer::TrackCapture;
use crate::models::config::RecorderConfig;
use crate::models::device::AudioDevice;
use crate::models::error::RecorderError;
use crate::models::outcome::SessionOutcome;
use crate::models::state::{RecorderState, SessionEvent};
use crate::output::router::OutputRouter;
use crate::traits::capture_backend::{CaptureBackend, CaptureStream};
use crate::traits::decode_backend::DecodeBackend;
use crate::traits::delegate::RecorderDelegate;
use crate::traits::devices::DeviceRegistry;
use crate::traits::vault::{NoteSink, Vault};

/// One Start→Stop capture lifetime, covering all tracks.
///
/// Only the controller ever holds one of these, so at most one session can
/// exist process-wide by construction.
pub struct RecordingSession {
    pub id: Uuid,
    tracks: Vec<TrackCapture>,
    streams: Vec<Box<dyn CaptureStream>>,
    started_at: Instant,
    paused_total: Duration,
    paused_since: Option<Instant>,
}

impl RecordingSession {
    fn new(tracks: Vec<TrackCapture>, streams: Vec<Box<dyn CaptureStream>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
            streams,
            started_at: Instant::now(),
            paused_total: Duration::ZERO,
            paused_since: None,
        }
    }

    /// Active capture time, excluding paused spans.
    fn elapsed_secs(&self) -> f64 {
        let mut paused = self.paused_total;
        if let Some(since) = self.paused_since {
            paused += since.elapsed();
        }
        self.started_at
            .elapsed()
            .checked_sub(paused)
            .unwrap_or(Duration::ZERO)
            .as_secs_f64()
    }
}

/// Plugin-level controller gating all recording commands.
pub struct RecordingController {
    config: RecorderConfig,
    state: RecorderState,
    session: Option<RecordingSession>,
    driver: StreamCaptureDriver,
    registry: Arc<dyn DeviceRegistry>,
    decoder: Arc<dyn DecodeBackend>,
    vault: Arc<dyn Vault>,
    notes: Arc<dyn NoteSink>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
}

impl RecordingController {
    pub fn new(
        config: RecorderConfig,
        backend: Arc<dyn CaptureBackend>,
        registry: Arc<dyn DeviceRegistry>,
        decoder: Arc<dyn DecodeBackend>,
        vault: Arc<dyn Vault>,
        notes: Arc<dyn NoteSink>,
    ) -> Result<Self, RecorderError> {
        config.validate()?;
        Ok(Self {
            config,
            state: RecorderState::Idle,
            session: None,
            driver: StreamCaptureDriver::new(backend),
            registry,
            decoder,
            vault,
            notes,
            delegate: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Replace the configuration. Only valid while idle; a live session keeps
    /// the settings it was started with.
    pub fn update_config(&mut self, config: RecorderConfig) -> Result<(), RecorderError> {
        if !self.state.is_idle() {
            return Err(RecorderError::InvalidConfig(
                "settings can only change while idle".into(),
            ));
        }
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// List capture sources through the registry collaborator.
    pub fn input_devices(&self) -> Result<Vec<AudioDevice>, RecorderError> {
        self.registry.list_input_devices()
    }

    /// Bind the default (single-track) capture source to a device.
    pub fn select_input_device(&mut self, device_id: &str) -> Result<(), RecorderError> {
        if !self.state.is_idle() {
            return Err(RecorderError::InvalidConfig(
                "device selection requires an idle recorder".into(),
            ));
        }
        self.config.audio_device_id = device_id.to_string();
        self.notify("Input device updated");
        Ok(())
    }

    /// Start when idle; stop (and produce output) when recording or paused.
    ///
    /// A toggle while recording is always interpreted as Stop, never as a
    /// second concurrent session.
    pub fn toggle_recording(&mut self) -> Result<Option<SessionOutcome>, RecorderError> {
        if self.state.is_idle() {
            self.start_session()?;
            Ok(None)
        } else {
            self.stop_session().map(Some)
        }
    }

    /// Pause when recording, resume when paused. From idle this is a no-op
    /// with a user-visible notice.
    pub fn toggle_pause(&mut self) -> Result<(), RecorderError> {
        let event = if self.state.is_paused() {
            SessionEvent::Resume
        } else {
            SessionEvent::Pause
        };
        let Some(next) = self.state.next(event) else {
            self.notify("No recording in progress to pause or resume");
            return Ok(());
        };

        let result = match self.session.as_mut() {
            Some(session) => match event {
                SessionEvent::Pause => {
                    let r = StreamCaptureDriver::pause_all(&mut session.streams);
                    if r.is_ok() {
                        session.paused_since = Some(Instant::now());
                    }
                    r
                }
                SessionEvent::Resume => {
                    let r = StreamCaptureDriver::resume_all(&mut session.streams);
                    if r.is_ok() {
                        if let Some(since) = session.paused_since.take() {
                            session.paused_total += since.elapsed();
                        }
                    }
                    r
                }
                _ => unreachable!("pause toggle only emits Pause or Resume"),
            },
            None => Err(RecorderError::CaptureError("no active session".into())),
        };

        match result {
            Ok(()) => {
                self.set_state(next);
                self.notify(match event {
                    SessionEvent::Pause => "Recording paused",
                    _ => "Recording resumed",
                });
                Ok(())
            }
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    fn start_session(&mut self) -> Result<(), RecorderError> {
        // Pre-flight: reject an unsupported format before any stream is
        // opened; the state machine is untouched.
        let format = self.config.recording_format;
        if !self.driver.backend().supports_format(format) {
            let err = RecorderError::UnsupportedFormat(format.mime().to_string());
            self.report(&err);
            return Err(err);
        }

        let (tracks, mut streams) = match self.driver.open_tracks(&self.config, self.registry.as_ref()) {
            Ok(opened) => opened,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };

        if let Err(e) = StreamCaptureDriver::start_all(&mut streams) {
            StreamCaptureDriver::stop_all(&mut streams).ok();
            self.report(&e);
            return Err(e);
        }

        let session = RecordingSession::new(tracks, streams);
        log::info!(
            "session {} started with {} track(s)",
            session.id,
            session.tracks.len()
        );
        self.session = Some(session);
        self.set_state(RecorderState::Recording);
        self.notify("Recording started");
        Ok(())
    }

    fn stop_session(&mut self) -> Result<SessionOutcome, RecorderError> {
        let Some(mut session) = self.session.take() else {
            // State said active but no session exists; recover to idle.
            self.set_state(RecorderState::Idle);
            return Err(RecorderError::CaptureError("no active session".into()));
        };

        // Joined wait across every track's stop. A stream fault is reported
        // but never discards chunks already captured by sibling tracks.
        if let Err(e) = StreamCaptureDriver::stop_all(&mut session.streams) {
            self.report(&e);
        }

        let duration = session.elapsed_secs();
        let result = OutputRouter::new(self.vault.as_ref(), self.notes.as_ref(), self.decoder.as_ref())
            .deliver(&self.config, &session.tracks, Utc::now(), duration);

        // The session and its buffers are discarded either way; a failed
        // delivery leaves nothing to retry.
        self.set_state(RecorderState::Idle);

        match result {
            Ok(outcome) => {
                log::info!(
                    "session {} complete: {} file(s), {:.1}s",
                    session.id,
                    outcome.saved_count(),
                    outcome.duration_secs
                );
                if let Some(delegate) = &self.delegate {
                    delegate.on_session_complete(&outcome);
                }
                self.notify(&format!("Saved {} file(s)", outcome.saved_count()));
                Ok(outcome)
            }
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    fn set_state(&mut self, state: RecorderState) {
        self.state = state;
        if let Some(delegate) = &self.delegate {
            delegate.on_state_changed(state);
        }
    }

    fn notify(&self, message: &str) {
        match &self.delegate {
            Some(delegate) => delegate.on_notice(message),
            None => log::info!("{}", message),
        }
    }

    fn report(&self, error: &RecorderError) {
        match &self.delegate {
            Some(delegate) => delegate.on_error(error),
            None => log::error!("{}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::models::config::{OutputMode, RecordingFormat};
    use crate::processing::mixer::DecodedTrack;
    use crate::traits::capture_backend::{ChunkSink, StreamFormat, StreamRequest};
    use crate::traits::vault::{MemoryVault, NullNoteSink};

    /// Stream that emits one scripted chunk on start and a trailing chunk on
    /// stop, mirroring a backend that flushes its encoder at stop time.
    struct ScriptedStream {
        sink: ChunkSink,
        on_start: Vec<u8>,
        on_stop: Vec<u8>,
    }

    impl CaptureStream for ScriptedStream {
        fn format(&self) -> StreamFormat {
            StreamFormat {
                sample_rate: 44_100,
                channels: 1,
            }
        }

        fn start(&mut self) -> Result<(), RecorderError> {
            (self.sink)(&self.on_start);
            Ok(())
        }

        fn pause(&mut self) -> Result<(), RecorderError> {
            Ok(())
        }

        fn resume(&mut self) -> Result<(), RecorderError> {
            Ok(())
        }

        fn stop(&mut self) -> Result<(), RecorderError> {
            (self.sink)(&self.on_stop);
            Ok(())
        }
    }

    struct ScriptedBackend {
        on_start: Vec<u8>,
        on_stop: Vec<u8>,
        fail_open: bool,
    }

    impl CaptureBackend for ScriptedBackend {
        fn supports_format(&self, format: RecordingFormat) -> bool {
            matches!(format, RecordingFormat::PcmS16le)
        }

        fn open(
            &self,
            _request: &StreamRequest,
            sink: ChunkSink,
        ) -> Result<Box<dyn CaptureStream>, RecorderError> {
            if self.fail_open {
                return Err(RecorderError::DeviceUnavailable("unplugged".into()));
            }
            Ok(Box::new(ScriptedStream {
                sink,
                on_start: self.on_start.clone(),
                on_stop: self.on_stop.clone(),
            }))
        }
    }

    struct OneMic;

    impl DeviceRegistry for OneMic {
        fn list_input_devices(&self) -> Result<Vec<AudioDevice>, RecorderError> {
            Ok(vec![AudioDevice {
                id: "mic".into(),
                label: "Test Mic".into(),
                is_default: true,
            }])
        }
    }

    /// Decoder that returns two samples per payload byte pair, mono.
    struct ByteDecoder;

    impl DecodeBackend for ByteDecoder {
        fn decode(
            &self,
            bytes: &[u8],
            _format: RecordingFormat,
            hint: StreamFormat,
        ) -> Result<DecodedTrack, RecorderError> {
            let samples = bytes.iter().map(|&b| b as f32 / 255.0).collect();
            Ok(DecodedTrack {
                channels: vec![samples],
                sample_rate: hint.sample_rate,
            })
        }
    }

    #[derive(Default)]
    struct Collecting {
        notices: Mutex<Vec<String>>,
        states: Mutex<Vec<RecorderState>>,
    }

    impl RecorderDelegate for Collecting {
        fn on_state_changed(&self, state: RecorderState) {
            self.states.lock().push(state);
        }

        fn on_notice(&self, message: &str) {
            self.notices.lock().push(message.to_string());
        }

        fn on_error(&self, _error: &RecorderError) {}

        fn on_session_complete(&self, _outcome: &SessionOutcome) {}
    }

    fn controller_with(
        backend: ScriptedBackend,
        vault: Arc<MemoryVault>,
        config: RecorderConfig,
    ) -> RecordingController {
        RecordingController::new(
            config,
            Arc::new(backend),
            Arc::new(OneMic),
            Arc::new(ByteDecoder),
            vault,
            Arc::new(NullNoteSink),
        )
        .unwrap()
    }

    fn default_backend() -> ScriptedBackend {
        ScriptedBackend {
            on_start: vec![10, 20, 30],
            on_stop: vec![40],
            fail_open: false,
        }
    }

    #[test]
    fn toggle_starts_then_stops_never_two_sessions() {
        let vault = Arc::new(MemoryVault::new());
        let mut controller =
            controller_with(default_backend(), Arc::clone(&vault), RecorderConfig::default());

        assert!(controller.toggle_recording().unwrap().is_none());
        assert!(controller.state().is_recording());

        // Second toggle stops; it never opens a concurrent session.
        let outcome = controller.toggle_recording().unwrap().unwrap();
        assert!(controller.state().is_idle());
        assert_eq!(outcome.saved_count(), 1);
        assert_eq!(vault.len(), 1);
    }

    #[test]
    fn stop_includes_chunks_flushed_during_stop() {
        let vault = Arc::new(MemoryVault::new());
        let mut config = RecorderConfig::default();
        config.output_mode = OutputMode::Multiple;
        let mut controller = controller_with(default_backend(), Arc::clone(&vault), config);

        controller.toggle_recording().unwrap();
        let outcome = controller.toggle_recording().unwrap().unwrap();

        let path = &outcome.saved[0].path;
        // on_start chunk plus the chunk flushed by stop, in order.
        assert_eq!(vault.get(path).unwrap(), vec![10, 20, 30, 40]);
    }

    #[test]
    fn unsupported_format_fails_preflight_without_state_change() {
        let vault = Arc::new(MemoryVault::new());
        let mut config = RecorderConfig::default();
        config.recording_format = RecordingFormat::OpusWebm;
        let mut controller = controller_with(default_backend(), Arc::clone(&vault), config);

        let result = controller.toggle_recording();
        assert!(matches!(result, Err(RecorderError::UnsupportedFormat(_))));
        assert!(controller.state().is_idle());
        assert!(vault.is_empty());
    }

    #[test]
    fn device_failure_at_start_keeps_idle() {
        let vault = Arc::new(MemoryVault::new());
        let backend = ScriptedBackend {
            fail_open: true,
            ..default_backend()
        };
        let mut controller = controller_with(backend, Arc::clone(&vault), RecorderConfig::default());

        let result = controller.toggle_recording();
        assert!(matches!(result, Err(RecorderError::DeviceUnavailable(_))));
        assert!(controller.state().is_idle());
    }

    #[test]
    fn pause_resume_cycle() {
        let vault = Arc::new(MemoryVault::new());
        let mut controller =
            controller_with(default_backend(), Arc::clone(&vault), RecorderConfig::default());

        controller.toggle_recording().unwrap();
        controller.toggle_pause().unwrap();
        assert!(controller.state().is_paused());

        controller.toggle_pause().unwrap();
        assert!(controller.state().is_recording());

        // Stop is accepted from paused as well.
        controller.toggle_pause().unwrap();
        let outcome = controller.toggle_recording().unwrap().unwrap();
        assert!(controller.state().is_idle());
        assert_eq!(outcome.saved_count(), 1);
    }

    #[test]
    fn pause_from_idle_is_a_noop_notice() {
        let vault = Arc::new(MemoryVault::new());
        let mut controller =
            controller_with(default_backend(), Arc::clone(&vault), RecorderConfig::default());
        let delegate = Arc::new(Collecting::default());
        controller.set_delegate(Arc::clone(&delegate) as Arc<dyn RecorderDelegate>);

        controller.toggle_pause().unwrap();

        assert!(controller.state().is_idle());
        assert!(delegate.states.lock().is_empty());
        assert_eq!(delegate.notices.lock().len(), 1);
    }

    #[test]
    fn empty_capture_reports_no_audio_and_resets() {
        let vault = Arc::new(MemoryVault::new());
        let backend = ScriptedBackend {
            on_start: Vec::new(),
            on_stop: Vec::new(),
            fail_open: false,
        };
        let mut controller = controller_with(backend, Arc::clone(&vault), RecorderConfig::default());

        controller.toggle_recording().unwrap();
        let result = controller.toggle_recording();

        assert!(matches!(result, Err(RecorderError::NoAudioCaptured)));
        assert!(controller.state().is_idle());
        assert!(vault.is_empty());
    }

    #[test]
    fn multi_track_opens_one_stream_per_track() {
        let vault = Arc::new(MemoryVault::new());
        let mut config = RecorderConfig::default();
        config.enable_multi_track = true;
        config.max_tracks = 3;
        config.output_mode = OutputMode::Multiple;
        let mut controller = controller_with(default_backend(), Arc::clone(&vault), config);

        controller.toggle_recording().unwrap();
        let outcome = controller.toggle_recording().unwrap().unwrap();

        assert_eq!(outcome.saved_count(), 3);
        assert_eq!(vault.len(), 3);
    }

    #[test]
    fn config_updates_rejected_while_active() {
        let vault = Arc::new(MemoryVault::new());
        let mut controller =
            controller_with(default_backend(), Arc::clone(&vault), RecorderConfig::default());

        controller.toggle_recording().unwrap();
        let result = controller.update_config(RecorderConfig::default());
        assert!(matches!(result, Err(RecorderError::InvalidConfig(_))));

        controller.toggle_recording().unwrap();
        assert!(controller.update_config(RecorderConfig::default()).is_ok());
    }

    #[test]
    fn select_device_updates_single_track_source() {
        let vault = Arc::new(MemoryVault::new());
        let mut controller =
            controller_with(default_backend(), Arc::clone(&vault), RecorderConfig::default());

        controller.select_input_device("mic-7").unwrap();
        assert_eq!(controller.config().audio_device_id, "mic-7");
    }
}
