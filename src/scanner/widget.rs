// SPDX-License-Identifier: GPL-3.0-only

//! Decoding widget abstraction
//!
//! A decoding widget repeatedly tries to decode a QR payload from camera
//! frames and reports back through a [`ScanSink`]. The scanner only sees
//! `start -> handle` and `stop(handle)`; how the widget captures and
//! decodes frames is its own business.

use crate::backends::camera::CameraConstraint;
use crate::constants::{
    DEFAULT_DECODE_REGION, DEFAULT_RESOLUTION, DEFAULT_SCAN_FPS, DEFAULT_TARGET_ID,
};
use crate::errors::ScannerResult;
use crate::frame_processor::DecodeRegion;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tracing::trace;

/// Parameters for one decoding session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Scan target the session binds to; only one session may hold it
    pub target_id: String,
    /// Decode attempts per second
    pub frame_rate: u32,
    /// Centred region searched for a QR code, `None` for the full frame
    pub decode_region: Option<DecodeRegion>,
    /// Capture resolution requested from the camera
    pub resolution: (u32, u32),
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target_id: DEFAULT_TARGET_ID.to_string(),
            frame_rate: DEFAULT_SCAN_FPS,
            decode_region: Some(DecodeRegion::square(DEFAULT_DECODE_REGION)),
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

/// Identifier of one decoding session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// What happened inside a decoding session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEventKind {
    /// A QR payload was decoded
    Decoded(String),
    /// The session broke after it started (stream error, device unplugged)
    Failed(String),
}

/// Event emitted by a widget, tagged with the session that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub session: SessionId,
    pub kind: ScanEventKind,
}

/// Callbacks handed to a widget when a session starts
#[derive(Debug, Clone)]
pub struct ScanSink {
    session: SessionId,
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ScanSink {
    pub fn new(session: SessionId, tx: mpsc::UnboundedSender<ScanEvent>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Success callback
    ///
    /// Returns false when the scanner is gone and nobody will read the event.
    pub fn decoded(&self, text: impl Into<String>) -> bool {
        self.send(ScanEventKind::Decoded(text.into()))
    }

    /// Report that the session cannot continue
    pub fn failed(&self, reason: impl Into<String>) -> bool {
        self.send(ScanEventKind::Failed(reason.into()))
    }

    /// Per-frame failure callback
    ///
    /// A frame without a QR code is not an error, so nothing is reported.
    pub fn frame_missed(&self, reason: &str) {
        trace!(session = %self.session, reason, "No QR code in frame");
    }

    fn send(&self, kind: ScanEventKind) -> bool {
        self.tx
            .send(ScanEvent {
                session: self.session,
                kind,
            })
            .is_ok()
    }
}

/// An external QR decoding capability bound to a scan target
///
/// Implementations must not run two sessions on the same `target_id` at
/// once. Dropping a handle without calling [`DecodingWidget::stop`] must
/// still release the camera, even if not synchronously.
pub trait DecodingWidget: Send + Sync {
    /// Owned token for a running session
    type Handle: Send;

    /// Start decoding frames from the camera matching `constraint`
    ///
    /// Resolves once the camera stream is live, or with
    /// `SessionStartFailed` when it cannot be opened.
    fn start<'a>(
        &'a self,
        config: &'a ScanConfig,
        constraint: CameraConstraint,
        sink: ScanSink,
    ) -> BoxFuture<'a, ScannerResult<Self::Handle>>;

    /// Stop a session and release its camera and scan target
    fn stop(&self, handle: Self::Handle) -> BoxFuture<'_, ScannerResult<()>>;
}
