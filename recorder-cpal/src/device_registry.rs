//! Input-device enumeration via cpal.
//!
//! cpal exposes no stable device identifier, so the device name doubles as
//! the id; an empty id in a stream request selects the default device.

use cpal::traits::{DeviceTrait, HostTrait};

use recorder_core::{AudioDevice, DeviceRegistry, RecorderError};

pub struct CpalDeviceRegistry;

impl DeviceRegistry for CpalDeviceRegistry {
    fn list_input_devices(&self) -> Result<Vec<AudioDevice>, RecorderError> {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let devices = host.input_devices().map_err(|e| {
            RecorderError::DeviceUnavailable(format!("device enumeration failed: {}", e))
        })?;

        let mut out = Vec::new();
        for device in devices {
            let Ok(name) = device.name() else {
                continue;
            };
            let is_default = default_name.as_deref() == Some(name.as_str());
            out.push(AudioDevice {
                id: name.clone(),
                label: name,
                is_default,
            });
        }
        Ok(out)
    }
}
