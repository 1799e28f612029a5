// SPDX-License-Identifier: GPL-3.0-only

//! Frame types consumed by the QR detector
//!
//! Camera frames arrive in whatever format the driver negotiated. The
//! detector only needs luminance, so every supported layout is reduced to a
//! tightly packed 8-bit greyscale [`LumaFrame`] first.

use crate::constants::fourcc;
use crate::errors::{ScannerError, ScannerResult};

/// Pixel layouts the capture thread can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// 8-bit greyscale
    Grey,
    /// Packed 4:2:2, `Y0 U Y1 V`
    Yuyv,
    /// Motion JPEG, one JPEG image per frame
    Mjpeg,
}

impl PixelLayout {
    pub fn from_fourcc(code: [u8; 4]) -> Option<Self> {
        match code {
            fourcc::GREY => Some(Self::Grey),
            fourcc::YUYV => Some(Self::Yuyv),
            fourcc::MJPG => Some(Self::Mjpeg),
            _ => None,
        }
    }

    /// Bytes per pixel for packed layouts
    fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Grey => 1,
            Self::Yuyv => 2,
            Self::Mjpeg => 0,
        }
    }
}

/// Tightly packed 8-bit luminance frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl LumaFrame {
    /// Wrap packed luma data, checking it matches the dimensions
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() == width as usize * height as usize {
            Some(Self {
                width,
                height,
                data,
            })
        } else {
            None
        }
    }

    /// Convert a raw capture buffer into a luma frame
    ///
    /// `stride` is the driver's bytes-per-line; zero means tightly packed.
    /// It is ignored for MJPEG, whose dimensions come from the JPEG header.
    pub fn from_capture(
        data: &[u8],
        layout: PixelLayout,
        width: u32,
        height: u32,
        stride: u32,
    ) -> ScannerResult<Self> {
        match layout {
            PixelLayout::Mjpeg => Self::from_mjpeg(data),
            PixelLayout::Grey | PixelLayout::Yuyv => {
                Self::from_packed(data, layout, width, height, stride)
            }
        }
    }

    fn from_packed(
        data: &[u8],
        layout: PixelLayout,
        width: u32,
        height: u32,
        stride: u32,
    ) -> ScannerResult<Self> {
        let bpp = layout.bytes_per_pixel();
        let row_bytes = width as usize * bpp;
        let stride = if stride == 0 {
            row_bytes
        } else {
            stride as usize
        };

        let mut luma = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as usize {
            let start = y * stride;
            let row = data.get(start..start + row_bytes).ok_or_else(|| {
                ScannerError::UnsupportedFormat(format!(
                    "short {:?} frame: {} bytes for {}x{}",
                    layout,
                    data.len(),
                    width,
                    height
                ))
            })?;
            // Y samples sit at even offsets in YUYV
            luma.extend(row.iter().step_by(bpp).copied());
        }

        Ok(Self {
            width,
            height,
            data: luma,
        })
    }

    fn from_mjpeg(data: &[u8]) -> ScannerResult<Self> {
        let image = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
            .map_err(|e| ScannerError::UnsupportedFormat(format!("MJPEG decode: {}", e)))?
            .to_luma8();
        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            data: image.into_raw(),
        })
    }

    /// Load a still image (PNG, JPEG, ...) from disk as a luma frame
    pub fn from_image_file(path: &std::path::Path) -> ScannerResult<Self> {
        let image = image::open(path)
            .map_err(|e| {
                ScannerError::UnsupportedFormat(format!("{}: {}", path.display(), e))
            })?
            .to_luma8();
        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            data: image.into_raw(),
        })
    }

    /// Luma at (x, y); out of range reads as black
    pub fn luma(&self, x: usize, y: usize) -> u8 {
        if x >= self.width as usize {
            return 0;
        }
        self.data
            .get(y * self.width as usize + x)
            .copied()
            .unwrap_or(0)
    }
}

/// Size of the centred region searched for a QR code
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DecodeRegion {
    pub width: u32,
    pub height: u32,
}

impl DecodeRegion {
    pub fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
        }
    }

    /// Pixel rectangle of this region centred in a frame, clamped to it
    pub fn crop_rect(&self, frame_width: u32, frame_height: u32) -> CropRect {
        let width = self.width.min(frame_width);
        let height = self.height.min(frame_height);
        CropRect {
            x: (frame_width - width) / 2,
            y: (frame_height - height) / 2,
            width,
            height,
        }
    }
}

/// Pixel rectangle inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn full(frame_width: u32, frame_height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: frame_width,
            height: frame_height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
