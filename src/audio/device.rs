//! Audio input device enumeration
//!
//! Stable, cross-platform listing of capture devices for source
//! selection. Enumeration never starts a capture stream.

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};

use crate::errors::StreamError;

/// Audio input device information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Stable-ish device identifier (index + name hash)
    pub id: String,
    /// Human-readable device name
    pub name: String,
    /// Default sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Whether this is the system default input device
    pub is_default: bool,
}

// cpal doesn't expose unique device IDs on all platforms, so an index
// plus a name hash stands in for one.
fn device_id(index: usize, name: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    format!("audio_{}_{:08x}", index, hasher.finish() & 0xFFFF_FFFF)
}

/// List all available audio input devices
///
/// Returns devices in deterministic order: default device first, then
/// alphabetically by name.
///
/// # Errors
/// Returns an error if the audio host cannot enumerate inputs.
pub fn list_audio_devices() -> Result<Vec<AudioDevice>, StreamError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let mut devices: Vec<AudioDevice> = host
        .input_devices()
        .map_err(|e| StreamError::Device(format!("failed to enumerate inputs: {}", e)))?
        .enumerate()
        .filter_map(|(index, device)| {
            let name = device.name().ok()?;
            let config = device.default_input_config().ok()?;
            Some(AudioDevice {
                id: device_id(index, &name),
                is_default: default_name.as_ref() == Some(&name),
                sample_rate: config.sample_rate().0,
                channels: config.channels(),
                name,
            })
        })
        .collect();

    devices.sort_by(|a, b| match (a.is_default, b.is_default) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });

    Ok(devices)
}

/// Get the default audio input device
///
/// # Errors
/// Returns an error if no default input is configured.
pub fn get_default_audio_device() -> Result<AudioDevice, StreamError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| StreamError::Device("no default audio input device".to_string()))?;

    let name = device
        .name()
        .map_err(|e| StreamError::Device(format!("failed to get device name: {}", e)))?;
    let config = device
        .default_input_config()
        .map_err(|e| StreamError::Device(format!("failed to get device config: {}", e)))?;

    Ok(AudioDevice {
        id: device_id(0, &name),
        sample_rate: config.sample_rate().0,
        channels: config.channels(),
        is_default: true,
        name,
    })
}

/// Find an audio input device by ID or name
///
/// An empty string or `"default"` selects the default device.
pub fn find_audio_device(device: &str) -> Result<AudioDevice, StreamError> {
    if device.is_empty() || device == "default" {
        return get_default_audio_device();
    }

    list_audio_devices()?
        .into_iter()
        .find(|d| d.id == device || d.name == device)
        .ok_or_else(|| StreamError::Device(format!("audio device not found: {}", device)))
}
