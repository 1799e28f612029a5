// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner and the command-line front end

use std::fmt;

/// Result type alias using ScannerError
pub type ScannerResult<T> = Result<T, ScannerError>;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Errors raised while discovering cameras or driving a decoding session
///
/// None of these are fatal to the host application. The scanner recovers
/// from each one locally and ends up either without a selectable camera
/// or in the closed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerError {
    /// Device enumeration was rejected or is unsupported on this host
    DiscoveryFailed(String),
    /// Camera permission denied, device missing or stream could not start
    SessionStartFailed(String),
    /// Tearing down the decoding session failed
    SessionStopFailed(String),
    /// Another session already owns the scan target
    MountBusy(String),
    /// Camera negotiated a pixel format the decoder cannot read
    UnsupportedFormat(String),
    /// The scanner has been unmounted and accepts no further work
    Unmounted,
}

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Scanner lifecycle errors
    Scanner(ScannerError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

impl fmt::Display for ScannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerError::DiscoveryFailed(msg) => write!(f, "Camera discovery failed: {}", msg),
            ScannerError::SessionStartFailed(msg) => {
                write!(f, "Failed to start scan session: {}", msg)
            }
            ScannerError::SessionStopFailed(msg) => {
                write!(f, "Failed to stop scan session: {}", msg)
            }
            ScannerError::MountBusy(target) => {
                write!(f, "Scan target '{}' is already in use", target)
            }
            ScannerError::UnsupportedFormat(msg) => write!(f, "Unsupported pixel format: {}", msg),
            ScannerError::Unmounted => write!(f, "Scanner has been unmounted"),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Scanner(e) => write!(f, "Scanner error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ScannerError {}
impl std::error::Error for AppError {}

impl From<ScannerError> for AppError {
    fn from(err: ScannerError) -> Self {
        AppError::Scanner(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
