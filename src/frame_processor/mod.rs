// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing for QR decoding
//!
//! Converts raw capture buffers into luma frames and searches the decode
//! region for QR codes.

pub mod qr_detector;
pub mod types;

pub use qr_detector::QrDetector;
pub use types::{CropRect, DecodeRegion, LumaFrame, PixelLayout};

#[cfg(test)]
pub(crate) mod test_frames;
