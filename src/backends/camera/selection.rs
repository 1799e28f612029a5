// SPDX-License-Identifier: GPL-3.0-only

//! Camera selection heuristics
//!
//! Hosts rarely say which way a camera faces, so the default pick is made
//! from the device label alone. The rules are heuristics, not a guaranteed
//! selector:
//!
//! 1. the first camera whose label hints at the rear (`back`, `rear`,
//!    `environment`, or a bare trailing `0` token as in `"Camera 0"`)
//! 2. otherwise the first camera whose label does not hint at the front
//!    (`front`, `user`)
//! 3. otherwise the first camera

use super::types::CameraDevice;
use crate::constants::{FRONT_CAMERA_HINTS, REAR_CAMERA_HINTS};

/// Whether a label suggests an outward facing camera
pub fn is_rear_facing(label: &str) -> bool {
    let lower = label.to_lowercase();
    if REAR_CAMERA_HINTS.iter().any(|hint| lower.contains(hint)) {
        return true;
    }
    // "Camera 0" style labels; matches any device whose final token is a lone 0
    lower.split_whitespace().next_back() == Some("0")
}

/// Whether a label suggests a user facing camera
pub fn is_front_facing(label: &str) -> bool {
    let lower = label.to_lowercase();
    FRONT_CAMERA_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Pick the default camera index, or `None` for an empty list
pub fn select_default_camera(devices: &[CameraDevice]) -> Option<usize> {
    if devices.is_empty() {
        return None;
    }

    devices
        .iter()
        .position(|d| is_rear_facing(&d.label))
        .or_else(|| devices.iter().position(|d| !is_front_facing(&d.label)))
        .or(Some(0))
}

/// Index of the camera after `current`, wrapping around
///
/// Returns `None` when there is nothing to switch to.
pub fn next_camera_index(current: usize, len: usize) -> Option<usize> {
    if len <= 1 {
        None
    } else {
        Some((current + 1) % len)
    }
}

/// Ordered list of discovered cameras plus the current selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraRoster {
    devices: Vec<CameraDevice>,
    selected: Option<usize>,
}

impl CameraRoster {
    /// Build a roster and apply the default selection policy
    pub fn new(devices: Vec<CameraDevice>) -> Self {
        let selected = select_default_camera(&devices);
        Self { devices, selected }
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&CameraDevice> {
        self.selected.and_then(|index| self.devices.get(index))
    }

    /// Select the camera with `id`; unknown ids leave the selection alone
    pub fn select_device(&mut self, id: &str) -> bool {
        match self.devices.iter().position(|device| device.id == id) {
            Some(index) => {
                self.selected = Some(index);
                true
            }
            None => false,
        }
    }

    /// Whether switching cameras can do anything
    pub fn can_switch(&self) -> bool {
        self.devices.len() > 1
    }

    /// Move the selection to the next camera
    ///
    /// Returns the newly selected camera, or `None` (selection unchanged)
    /// when fewer than two cameras are known.
    pub fn advance(&mut self) -> Option<&CameraDevice> {
        let next = next_camera_index(self.selected.unwrap_or(0), self.devices.len())?;
        self.selected = Some(next);
        self.devices.get(next)
    }
}
