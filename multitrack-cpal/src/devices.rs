//! Input device enumeration and lookup through the default cpal host.
//!
//! Device ids are the host's device names, plus the sentinel
//! [`DEFAULT_DEVICE_ID`] for whatever the host reports as its default input.

use cpal::traits::{DeviceTrait, HostTrait};

use multitrack_core::models::audio_models::AudioDevice;
use multitrack_core::models::error::TrackError;
use multitrack_core::models::track::DEFAULT_DEVICE_ID;

/// List the host's input devices, default first.
pub fn list_input_devices() -> Result<Vec<AudioDevice>, TrackError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let mut devices = Vec::new();
    if let Some(name) = &default_name {
        devices.push(AudioDevice {
            id: DEFAULT_DEVICE_ID.to_string(),
            label: format!("Default ({})", name),
            is_default: true,
        });
    }

    let inputs = host
        .input_devices()
        .map_err(|e| TrackError::Backend(format!("failed to enumerate input devices: {}", e)))?;
    for device in inputs {
        let Ok(name) = device.name() else {
            continue;
        };
        devices.push(AudioDevice {
            is_default: default_name.as_deref() == Some(name.as_str()),
            label: name.clone(),
            id: name,
        });
    }

    log::debug!("Found {} input devices", devices.len());
    Ok(devices)
}

/// Resolve a device id to a cpal input device.
pub(crate) fn find_input_device(device_id: &str) -> Result<cpal::Device, TrackError> {
    let host = cpal::default_host();
    if device_id == DEFAULT_DEVICE_ID {
        return host
            .default_input_device()
            .ok_or_else(|| TrackError::DeviceUnavailable("no default input device".into()));
    }

    host.input_devices()
        .map_err(|e| TrackError::Backend(format!("failed to enumerate input devices: {}", e)))?
        .find(|d| d.name().map(|n| n == device_id).unwrap_or(false))
        .ok_or_else(|| TrackError::DeviceUnavailable(device_id.to_string()))
}

pub(crate) fn find_default_output_device() -> Result<cpal::Device, TrackError> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| TrackError::DeviceUnavailable("no default output device".into()))
}

/// Classify a backend error message for `device_id`.
///
/// Hosts report busy or forbidden devices only through backend-specific
/// text, so this matches on the usual wording.
pub(crate) fn classify_backend_error(device_id: &str, description: &str) -> TrackError {
    let lower = description.to_lowercase();
    if lower.contains("busy") || lower.contains("in use") || lower.contains("exclusive") {
        TrackError::DeviceAlreadyInUse(device_id.to_string())
    } else if lower.contains("permission") || lower.contains("access denied") || lower.contains("not authorized") {
        TrackError::PermissionDenied
    } else {
        TrackError::Backend(format!("{}: {}", device_id, description))
    }
}

pub(crate) fn map_build_error(device_id: &str, error: cpal::BuildStreamError) -> TrackError {
    match error {
        cpal::BuildStreamError::DeviceNotAvailable => TrackError::DeviceUnavailable(device_id.to_string()),
        cpal::BuildStreamError::BackendSpecific { err } => classify_backend_error(device_id, &err.description),
        other => TrackError::Backend(format!("{}: {}", device_id, other)),
    }
}

pub(crate) fn map_config_error(device_id: &str, error: cpal::DefaultStreamConfigError) -> TrackError {
    match error {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => {
            TrackError::DeviceUnavailable(device_id.to_string())
        }
        cpal::DefaultStreamConfigError::BackendSpecific { err } => {
            classify_backend_error(device_id, &err.description)
        }
        other => TrackError::Backend(format!("{}: {}", device_id, other)),
    }
}

pub(crate) fn map_play_error(device_id: &str, error: cpal::PlayStreamError) -> TrackError {
    match error {
        cpal::PlayStreamError::DeviceNotAvailable => TrackError::DeviceUnavailable(device_id.to_string()),
        cpal::PlayStreamError::BackendSpecific { err } => classify_backend_error(device_id, &err.description),
        #[allow(unreachable_patterns)]
        other => TrackError::Backend(format!("{}: {}", device_id, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_devices_are_in_use() {
        assert_eq!(
            classify_backend_error("hw:1", "Device or resource busy"),
            TrackError::DeviceAlreadyInUse("hw:1".into())
        );
    }

    #[test]
    fn access_errors_are_permission_denied() {
        assert_eq!(
            classify_backend_error("mic", "Access denied by privacy settings"),
            TrackError::PermissionDenied
        );
    }

    #[test]
    fn other_errors_keep_their_text() {
        assert_eq!(
            classify_backend_error("mic", "unexpected format"),
            TrackError::Backend("mic: unexpected format".into())
        );
    }

    #[test]
    fn missing_device_is_unavailable() {
        assert_eq!(
            map_build_error("mic", cpal::BuildStreamError::DeviceNotAvailable),
            TrackError::DeviceUnavailable("mic".into())
        );
    }
}
