//! # recorder-core
//!
//! Platform-agnostic multi-track recording core.
//!
//! Coordinates N simultaneous capture streams behind an idle/recording/paused
//! state machine and, on stop, either bounces all tracks into one interleaved
//! stereo WAV or persists each track's native bytes separately. Platform
//! capture, decoding, persistence, and document insertion plug in through
//! traits; `recorder-cpal` ships the reference implementations.
//!
//! ## Architecture
//!
//! ```text
//! recorder-core (this crate)
//! ├── traits/       ← CaptureBackend, DecodeBackend, Vault, NoteSink,
//! │                   DeviceRegistry, RecorderDelegate
//! ├── models/       ← RecorderState, RecorderError, RecorderConfig,
//! │                   AudioDevice, SessionOutcome
//! ├── capture/      ← TrackBuffer store, StreamCaptureDriver
//! ├── processing/   ← track mixing, WAV serialization
//! ├── output/       ← file naming + collision probing, OutputRouter
//! └── session/      ← RecordingController (state-gated orchestrator)
//! ```

pub mod capture;
pub mod models;
pub mod output;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use capture::driver::StreamCaptureDriver;
pub use capture::track_buffer::{SharedTrackBuffer, TrackBuffer, TrackCapture};
pub use models::config::{OutputMode, RecorderConfig, RecordingFormat};
pub use models::device::{AudioDevice, UNKNOWN_DEVICE_LABEL};
pub use models::error::RecorderError;
pub use models::outcome::{SavedFile, SessionOutcome};
pub use models::state::{RecorderState, SessionEvent};
pub use output::router::OutputRouter;
pub use processing::mixer::{mix_tracks, DecodedTrack, MixedSignal};
pub use processing::wav::{encode_wav, WAV_HEADER_SIZE};
pub use session::controller::{RecordingController, RecordingSession};
pub use traits::capture_backend::{
    CaptureBackend, CaptureStream, ChunkSink, StreamFormat, StreamRequest,
};
pub use traits::decode_backend::DecodeBackend;
pub use traits::delegate::{LogDelegate, RecorderDelegate};
pub use traits::devices::DeviceRegistry;
pub use traits::vault::{MemoryVault, NoteSink, NullNoteSink, Vault};
