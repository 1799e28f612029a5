// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera discovery and session constraints

use serde::{Deserialize, Serialize};

/// Kind of media device reported by enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Camera or other video capture source
    VideoInput,
    /// Microphone
    AudioInput,
    /// Anything else the host lists (metadata nodes, codecs, outputs)
    Other,
}

/// Raw enumeration record as the host reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDeviceInfo {
    /// Opaque device handle (a V4L2 node path on Linux)
    pub device_id: String,
    /// Human readable name, empty when the host withholds it
    pub label: String,
    pub kind: DeviceKind,
}

impl MediaDeviceInfo {
    pub fn video_input(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            kind: DeviceKind::VideoInput,
        }
    }
}

/// A camera discovered on the host
///
/// Cameras are only discovered, never created or destroyed by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraDevice {
    /// Opaque device handle
    pub id: String,
    /// Human readable label (may be empty before permission is granted)
    pub label: String,
}

impl CameraDevice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Build a camera from an enumeration record, skipping non-video devices
    pub fn from_media(info: MediaDeviceInfo) -> Option<Self> {
        match info.kind {
            DeviceKind::VideoInput => Some(Self {
                id: info.device_id,
                label: info.label,
            }),
            DeviceKind::AudioInput | DeviceKind::Other => None,
        }
    }

    /// Label for display, falling back to the device id when the label is empty
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

impl std::fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Which camera a decoding session should open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraConstraint {
    /// Open exactly this device
    ExactDevice(String),
    /// No device known; ask the host for an outward facing camera
    FacingEnvironment,
}

impl CameraConstraint {
    pub fn for_device(device_id: Option<&str>) -> Self {
        match device_id {
            Some(id) => Self::ExactDevice(id.to_string()),
            None => Self::FacingEnvironment,
        }
    }
}

impl std::fmt::Display for CameraConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraConstraint::ExactDevice(id) => write!(f, "device {}", id),
            CameraConstraint::FacingEnvironment => write!(f, "environment-facing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_media_keeps_only_video_inputs() {
        let mic = MediaDeviceInfo {
            device_id: "hw:0".to_string(),
            label: "Built-in Microphone".to_string(),
            kind: DeviceKind::AudioInput,
        };
        assert!(CameraDevice::from_media(mic).is_none());

        let cam = MediaDeviceInfo::video_input("/dev/video0", "Integrated Camera");
        assert_eq!(
            CameraDevice::from_media(cam),
            Some(CameraDevice::new("/dev/video0", "Integrated Camera"))
        );
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let camera = CameraDevice::new("/dev/video2", "");
        assert_eq!(camera.display_name(), "/dev/video2");
    }

    #[test]
    fn test_constraint_for_device() {
        assert_eq!(
            CameraConstraint::for_device(Some("/dev/video0")),
            CameraConstraint::ExactDevice("/dev/video0".to_string())
        );
        assert_eq!(
            CameraConstraint::for_device(None),
            CameraConstraint::FacingEnvironment
        );
    }
}
