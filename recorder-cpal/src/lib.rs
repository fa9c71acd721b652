//! # recorder-cpal
//!
//! Reference collaborators for `recorder-core`:
//!
//! - [`CpalCaptureBackend`]: microphone capture via cpal, delivering
//!   interleaved s16le chunks.
//! - [`CpalDeviceRegistry`]: input-device enumeration.
//! - [`PcmDecoder`]: decoding for the backend's raw-PCM payloads.
//! - [`FsVault`]: filesystem persistence under a root directory.
//! - [`SessionLog`]: markdown file standing in for editor insertion.
//!
//! The `trackrec` binary wires these into a small command-line recorder.

pub mod device_registry;
pub mod mic_capture;
pub mod note_log;
pub mod pcm_decode;
pub mod vault;

pub use device_registry::CpalDeviceRegistry;
pub use mic_capture::{CpalCaptureBackend, CpalCaptureStream};
pub use note_log::SessionLog;
pub use pcm_decode::PcmDecoder;
pub use vault::FsVault;
