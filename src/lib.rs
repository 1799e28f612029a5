// SPDX-License-Identifier: GPL-3.0-only

//! AyurTrace Scanner - QR scanning for herb provenance labels
//!
//! This library provides camera discovery, the QR scanning session
//! lifecycle, and interpretation of AyurTrace label payloads.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`scanner`]: The camera scanner state machine and decoding widget trait
//! - [`backends`]: V4L2 device enumeration and the capture-based widget
//! - [`frame_processor`]: Luma conversion and QR decoding of frames
//! - [`provenance`]: Payload classification and the sample trace record
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```no_run
//! use ayurtrace_scanner::backends::camera::{V4l2Enumerator, V4l2Widget};
//! use ayurtrace_scanner::scanner::{CameraScanner, ScanConfig};
//!
//! # async fn run() -> Result<(), ayurtrace_scanner::errors::ScannerError> {
//! let mut scanner = CameraScanner::new(
//!     V4l2Enumerator::new(),
//!     V4l2Widget::new(),
//!     ScanConfig::default(),
//!     |text| println!("Scanned {}", text),
//! );
//! scanner.open_scanner().await?;
//! scanner.run_until_closed().await;
//! scanner.unmount().await;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame_processor;
pub mod provenance;
pub mod scanner;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult, ScannerError, ScannerResult};
pub use provenance::{TracePayload, TraceRecord};
pub use scanner::{CameraScanner, ScanConfig, ScannerPhase};
