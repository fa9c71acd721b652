use serde::{Deserialize, Serialize};

/// Label used wherever a track's device cannot be resolved.
pub const UNKNOWN_DEVICE_LABEL: &str = "UnknownDevice";

/// An audio input device available for capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Opaque backend identifier. An empty id means "default device" when
    /// used in a stream request.
    pub id: String,
    /// Human-readable label, used in per-track file names.
    pub label: String,
    /// Whether the backend considers this the default input.
    pub is_default: bool,
}
