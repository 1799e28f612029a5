// SPDX-License-Identifier: GPL-3.0-only

//! Interpretation of scanned AyurTrace labels

pub mod payload;
pub mod sample;

pub use payload::TracePayload;
pub use sample::{SAMPLE_PRODUCT_ID, TraceRecord, lookup_trace, sample_trace};
