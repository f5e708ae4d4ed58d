use crate::audio::error::{AudioError, AudioResult};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};
use serde::{Deserialize, Serialize};

/// Information about an audio device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Device identifier (unique name)
    pub id: String,
    /// Human-readable device name
    pub name: String,
    /// Whether this is the default device for its direction
    pub is_default: bool,
    /// Supported sample rates
    pub sample_rates: Vec<u32>,
}

/// List all available input devices
///
/// # Errors
/// Returns `AudioError::DeviceUnavailable` if no input devices exist.
pub fn list_input_devices() -> AudioResult<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let devices: Vec<Device> = host.input_devices()?.collect();

    if devices.is_empty() {
        return Err(AudioError::DeviceUnavailable(
            "no input devices found".to_string(),
        ));
    }

    let default_name = host
        .default_input_device()
        .as_ref()
        .and_then(|d| d.name().ok());

    let mut audio_devices = Vec::new();
    for device in devices {
        let name = device.name().map_err(|_| AudioError::InvalidDeviceName)?;
        let is_default = default_name.as_ref().is_some_and(|dn| dn == &name);
        let sample_rates = supported_input_rates(&device);

        audio_devices.push(AudioDevice {
            id: name.clone(),
            name,
            is_default,
            sample_rates,
        });
    }

    Ok(audio_devices)
}

/// Find an input device by its identifier (name)
pub fn find_input_device(host: &Host, device_id: &str) -> AudioResult<Device> {
    host.input_devices()?
        .find(|d| d.name().map(|n| n == device_id).unwrap_or(false))
        .ok_or_else(|| {
            AudioError::DeviceUnavailable(format!("input device '{}' not found", device_id))
        })
}

/// Get the default input device, or the named one when an id is given
pub fn default_or_named_input(device_id: Option<&str>) -> AudioResult<Device> {
    let host = cpal::default_host();
    match device_id {
        Some(id) => find_input_device(&host, id),
        None => host.default_input_device().ok_or_else(|| {
            AudioError::DeviceUnavailable("no default input device".to_string())
        }),
    }
}

/// Get the default output device for playback
pub fn default_output_device() -> AudioResult<Device> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceUnavailable("no default output device".to_string()))
}

fn supported_input_rates(device: &Device) -> Vec<u32> {
    // Report the common rates the device's supported ranges cover.
    const PROBE_RATES: [u32; 6] = [8000, 16000, 24000, 44100, 48000, 96000];

    let Ok(configs) = device.supported_input_configs() else {
        return Vec::new();
    };

    let ranges: Vec<_> = configs.collect();
    PROBE_RATES
        .iter()
        .copied()
        .filter(|&rate| {
            ranges.iter().any(|range| {
                range.min_sample_rate().0 <= rate && rate <= range.max_sample_rate().0
            })
        })
        .collect()
}
