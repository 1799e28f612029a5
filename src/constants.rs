// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Name of the scan target a session binds to when none is configured
pub const DEFAULT_TARGET_ID: &str = "reader";

/// Frames per second handed to the decoder
pub const DEFAULT_SCAN_FPS: u32 = 10;

/// Edge length in pixels of the square decode region centred in the frame
pub const DEFAULT_DECODE_REGION: u32 = 250;

/// Capture resolution requested from the camera
pub const DEFAULT_RESOLUTION: (u32, u32) = (640, 480);

/// Number of mmap buffers queued on the capture stream
pub const CAPTURE_BUFFER_COUNT: u32 = 4;

/// Directory name under the user's config dir
pub const APP_DIR_NAME: &str = "ayurtrace-scanner";

/// Label fragments that suggest an outward (environment) facing camera
pub const REAR_CAMERA_HINTS: [&str; 3] = ["back", "rear", "environment"];

/// Label fragments that suggest a user facing camera
pub const FRONT_CAMERA_HINTS: [&str; 2] = ["front", "user"];

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Longest wait for a single frame before the capture stream is restarted
    ///
    /// Also bounds how long a stop waits on a camera that stopped delivering.
    pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(2);

    /// Interval between decode attempts for a given frame rate
    ///
    /// A zero frame rate is treated as one frame per second.
    pub fn decode_interval(frame_rate: u32) -> Duration {
        Duration::from_secs(1) / frame_rate.max(1)
    }
}

/// Pixel formats the capture thread can turn into luma frames
pub mod fourcc {
    pub const YUYV: [u8; 4] = *b"YUYV";
    pub const GREY: [u8; 4] = *b"GREY";
    pub const MJPG: [u8; 4] = *b"MJPG";
}
