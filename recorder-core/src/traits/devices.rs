use crate::models::device::AudioDevice;
use crate::models::error::RecorderError;

/// Device-enumeration collaborator, a thin wrapper over platform listing.
pub trait DeviceRegistry: Send + Sync {
    /// List the capture sources currently available.
    fn list_input_devices(&self) -> Result<Vec<AudioDevice>, RecorderError>;
}
