// SPDX-License-Identifier: GPL-3.0-only

//! Scanner state types

use super::widget::SessionId;
use crate::backends::camera::CameraRoster;

/// Camera discovery progress
///
/// Discovery runs at most once per scanner; a failed attempt still moves to
/// `Complete` with an empty roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Discovery {
    #[default]
    Pending,
    Complete(CameraRoster),
}

impl Discovery {
    pub fn roster(&self) -> Option<&CameraRoster> {
        match self {
            Discovery::Pending => None,
            Discovery::Complete(roster) => Some(roster),
        }
    }
}

/// A running decoding session owned by the scanner
#[derive(Debug)]
pub struct ActiveSession<H> {
    pub id: SessionId,
    /// Device the session was bound to, `None` for the environment-facing request
    pub device_id: Option<String>,
    pub handle: H,
}

/// Lifecycle state of one scanner
///
/// The widget handle lives inside `Scanning`, so a scanner can hold at most
/// one session and cannot be scanning without one.
#[derive(Debug)]
pub enum ScannerState<H> {
    /// Scanner closed, no session
    Idle,
    /// Enumerating devices ahead of the first open
    Discovering,
    /// Session active, waiting for a decode
    Scanning(ActiveSession<H>),
    /// Terminal; reached through unmount
    Unmounted,
}

impl<H> ScannerState<H> {
    pub fn phase(&self) -> ScannerPhase {
        match self {
            ScannerState::Idle => ScannerPhase::Idle,
            ScannerState::Discovering => ScannerPhase::Discovering,
            ScannerState::Scanning(_) => ScannerPhase::Scanning,
            ScannerState::Unmounted => ScannerPhase::Unmounted,
        }
    }

    pub fn session(&self) -> Option<&ActiveSession<H>> {
        match self {
            ScannerState::Scanning(session) => Some(session),
            _ => None,
        }
    }
}

/// Externally visible phase, without the session payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScannerPhase {
    Idle,
    Discovering,
    Scanning,
    Unmounted,
}

impl std::fmt::Display for ScannerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScannerPhase::Idle => "idle",
            ScannerPhase::Discovering => "discovering",
            ScannerPhase::Scanning => "scanning",
            ScannerPhase::Unmounted => "unmounted",
        };
        write!(f, "{}", name)
    }
}
