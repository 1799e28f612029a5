// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera frames carrying a QR code

use qrcode::QrCode;

/// Pixels per QR module
const MODULE_PX: usize = 4;
/// Quiet zone around the symbol, in modules
const QUIET_MODULES: usize = 4;

/// White `width` x `height` luma buffer with `text` encoded at its centre
pub(crate) fn qr_luma(text: &str, width: u32, height: u32) -> Vec<u8> {
    let code = QrCode::new(text.as_bytes()).unwrap();
    let modules = code.width();
    let colors = code.to_colors();

    let (width, height) = (width as usize, height as usize);
    let side = (modules + 2 * QUIET_MODULES) * MODULE_PX;
    assert!(side <= width && side <= height, "QR code does not fit the frame");
    let origin_x = (width - side) / 2 + QUIET_MODULES * MODULE_PX;
    let origin_y = (height - side) / 2 + QUIET_MODULES * MODULE_PX;

    let mut data = vec![255u8; width * height];
    for my in 0..modules {
        for mx in 0..modules {
            let value = colors[my * modules + mx].select(0u8, 255u8);
            for dy in 0..MODULE_PX {
                let row = (origin_y + my * MODULE_PX + dy) * width;
                let start = row + origin_x + mx * MODULE_PX;
                data[start..start + MODULE_PX].fill(value);
            }
        }
    }
    data
}

/// Pack luma into YUYV rows of `stride` bytes, chroma neutral, padding zeroed
pub(crate) fn luma_to_yuyv(luma: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let (width, height, stride) = (width as usize, height as usize, stride as usize);
    assert!(stride >= width * 2);

    let mut data = vec![0u8; stride * height];
    for y in 0..height {
        for x in 0..width {
            data[y * stride + x * 2] = luma[y * width + x];
            data[y * stride + x * 2 + 1] = 128;
        }
    }
    data
}
