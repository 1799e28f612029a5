// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │    CameraScanner    │  ← Session lifecycle, camera switching
//! └──────────┬──────────┘
//!            │
//!     ┌──────┴───────┐
//!     ▼              ▼
//! ┌──────────┐  ┌──────────────┐
//! │ Device   │  │ Decoding     │  ← Traits the scanner is generic over
//! │Enumerator│  │ Widget       │
//! └────┬─────┘  └──────┬───────┘
//!      ▼               ▼
//! ┌──────────┐  ┌──────────────┐
//! │   V4L2   │  │ V4L2 capture │  ← Concrete Linux implementations
//! │ nodes    │  │ + rqrr       │
//! └──────────┘  └──────────────┘
//! ```

pub mod selection;
pub mod types;
pub mod v4l2_enumeration;
pub mod v4l2_widget;

pub use selection::{
    CameraRoster, is_front_facing, is_rear_facing, next_camera_index, select_default_camera,
};
pub use types::*;
pub use v4l2_enumeration::V4l2Enumerator;
pub use v4l2_widget::{V4l2Session, V4l2Widget};

use crate::errors::ScannerResult;
use futures::future::BoxFuture;

/// Host query listing media devices
///
/// Enumeration must not start capture. Labels may be empty when the host
/// has not granted camera access yet.
pub trait DeviceEnumerator: Send + Sync {
    fn enumerate_devices(&self) -> BoxFuture<'_, ScannerResult<Vec<MediaDeviceInfo>>>;
}

/// Enumerate and keep only video inputs, in host order
pub async fn enumerate_cameras<E>(enumerator: &E) -> ScannerResult<Vec<CameraDevice>>
where
    E: DeviceEnumerator + ?Sized,
{
    let devices = enumerator.enumerate_devices().await?;
    Ok(devices
        .into_iter()
        .filter_map(CameraDevice::from_media)
        .collect())
}
