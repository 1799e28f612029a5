// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection on luma frames
//!
//! Each frame is cropped to the decode region and handed to rqrr. A frame
//! without a readable code simply yields `None`.

use super::types::{CropRect, DecodeRegion, LumaFrame};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// QR code detector
#[derive(Debug, Clone, Default)]
pub struct QrDetector {
    /// Centred region to search, `None` for the full frame
    region: Option<DecodeRegion>,
}

impl QrDetector {
    pub fn new(region: Option<DecodeRegion>) -> Self {
        Self { region }
    }

    /// Rectangle of `frame` this detector searches
    pub fn search_rect(&self, frame: &LumaFrame) -> CropRect {
        match self.region {
            Some(region) => region.crop_rect(frame.width, frame.height),
            None => CropRect::full(frame.width, frame.height),
        }
    }

    /// Decode the first readable QR code in the frame
    pub fn detect(&self, frame: &LumaFrame) -> Option<String> {
        let start = std::time::Instant::now();
        let rect = self.search_rect(frame);
        if rect.is_empty() {
            return None;
        }

        let (x0, y0) = (rect.x as usize, rect.y as usize);
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            rect.width as usize,
            rect.height as usize,
            |x, y| frame.luma(x0 + x, y0 + y),
        );

        let grids = prepared.detect_grids();
        trace!(
            grids = grids.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "QR grid detection complete"
        );

        for grid in grids {
            match grid.decode() {
                Ok((_, content)) => {
                    debug!(content = %content, "Decoded QR code");
                    return Some(content);
                }
                Err(e) => debug!(error = ?e, "Failed to decode QR grid"),
            }
        }

        None
    }

    /// Decode on the blocking pool, for callers on the async runtime
    pub async fn detect_async(&self, frame: Arc<LumaFrame>) -> Option<String> {
        let detector = self.clone();
        tokio::task::spawn_blocking(move || detector.detect(&frame))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "QR detection task panicked");
                None
            })
    }
}
