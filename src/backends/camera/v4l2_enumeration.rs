// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 device enumeration
//!
//! Lists `/dev/video*` nodes and classifies them by their capabilities.
//! Nodes are opened only to query capabilities; no stream is started, so
//! the camera indicator stays off.

use super::DeviceEnumerator;
use super::types::{DeviceKind, MediaDeviceInfo};
use crate::errors::{ScannerError, ScannerResult};
use futures::future::BoxFuture;
use tracing::{debug, info};
use v4l::Device;
use v4l::capability::Flags;

/// Enumerates cameras through the V4L2 device tree
#[derive(Debug, Clone, Copy, Default)]
pub struct V4l2Enumerator;

impl V4l2Enumerator {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceEnumerator for V4l2Enumerator {
    fn enumerate_devices(&self) -> BoxFuture<'_, ScannerResult<Vec<MediaDeviceInfo>>> {
        Box::pin(async {
            tokio::task::spawn_blocking(enumerate_sync)
                .await
                .map_err(|e| ScannerError::DiscoveryFailed(e.to_string()))
        })
    }
}

/// Blocking enumeration, ordered by node index
fn enumerate_sync() -> Vec<MediaDeviceInfo> {
    let mut nodes = v4l::context::enum_devices();
    nodes.sort_by_key(|node| node.index());

    let devices: Vec<MediaDeviceInfo> = nodes
        .iter()
        .map(|node| {
            let path = node.path().to_string_lossy().to_string();
            let sysfs_name = node.name().unwrap_or_default();
            describe_node(path, sysfs_name)
        })
        .collect();

    info!(count = devices.len(), "Enumerated V4L2 nodes");
    devices
}

fn describe_node(path: String, sysfs_name: String) -> MediaDeviceInfo {
    match Device::with_path(&path).and_then(|dev| dev.query_caps()) {
        Ok(caps) => {
            let kind = if caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                DeviceKind::VideoInput
            } else {
                DeviceKind::Other
            };
            let label = if sysfs_name.is_empty() {
                caps.card
            } else {
                sysfs_name
            };
            debug!(path = %path, label = %label, ?kind, driver = %caps.driver, "Queried V4L2 node");
            MediaDeviceInfo {
                device_id: path,
                label,
                kind,
            }
        }
        Err(e) => {
            // Without access we cannot tell capture from metadata nodes
            debug!(path = %path, error = %e, "Cannot query V4L2 node, assuming video input");
            MediaDeviceInfo {
                device_id: path,
                label: sysfs_name,
                kind: DeviceKind::VideoInput,
            }
        }
    }
}
