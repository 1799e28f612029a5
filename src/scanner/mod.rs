// SPDX-License-Identifier: GPL-3.0-only

//! QR camera scanner
//!
//! [`CameraScanner`] owns camera selection and the lifecycle of one decoding
//! widget. It reports each successful decode to the `on_decoded` callback
//! supplied by its owner.
//!
//! ```text
//!            open_scanner()
//!   Idle ──────────────────────► Discovering ──► Scanning ◄──┐
//!    ▲        (first open only)                   │  │       │ switch_camera()
//!    │                                            │  └───────┘ (stop, then start)
//!    └──── decode / stop_session() / failure ─────┘
//!
//!   any ── unmount() ──► Unmounted (terminal)
//! ```
//!
//! Every path that leaves `Scanning` awaits the widget's stop before the
//! next start is issued, so a scan target never has two sessions.

pub mod state;
pub mod widget;

#[cfg(test)]
mod test_support;

pub use state::{ActiveSession, Discovery, ScannerPhase, ScannerState};
pub use widget::{DecodingWidget, ScanConfig, ScanEvent, ScanEventKind, ScanSink, SessionId};

use crate::backends::camera::{
    CameraConstraint, CameraDevice, CameraRoster, DeviceEnumerator, enumerate_cameras,
};
use crate::errors::{ScannerError, ScannerResult};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Callback invoked with each decoded QR payload
pub type DecodedCallback = Box<dyn FnMut(String) + Send>;

/// Camera selection plus decoding session lifecycle
pub struct CameraScanner<E, W: DecodingWidget> {
    enumerator: E,
    widget: W,
    config: ScanConfig,
    on_decoded: DecodedCallback,
    discovery: Discovery,
    state: ScannerState<W::Handle>,
    events_tx: mpsc::UnboundedSender<ScanEvent>,
    events_rx: mpsc::UnboundedReceiver<ScanEvent>,
    next_session: u64,
}

impl<E, W> CameraScanner<E, W>
where
    E: DeviceEnumerator,
    W: DecodingWidget,
{
    pub fn new(
        enumerator: E,
        widget: W,
        config: ScanConfig,
        on_decoded: impl FnMut(String) + Send + 'static,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            enumerator,
            widget,
            config,
            on_decoded: Box::new(on_decoded),
            discovery: Discovery::Pending,
            state: ScannerState::Idle,
            events_tx,
            events_rx,
            next_session: 1,
        }
    }

    pub fn phase(&self) -> ScannerPhase {
        self.state.phase()
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self.state, ScannerState::Scanning(_))
    }

    pub fn is_unmounted(&self) -> bool {
        matches!(self.state, ScannerState::Unmounted)
    }

    /// Cameras found by discovery, `None` until discovery has run
    pub fn roster(&self) -> Option<&CameraRoster> {
        self.discovery.roster()
    }

    /// Id of the running session, if any
    pub fn active_session(&self) -> Option<SessionId> {
        self.state.session().map(|session| session.id)
    }

    /// Device the running session is bound to
    pub fn active_device(&self) -> Option<&str> {
        self.state
            .session()
            .and_then(|session| session.device_id.as_deref())
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Enumerate video inputs and apply the default selection
    ///
    /// Never fails: an enumeration error is logged and leaves an empty
    /// roster, and discovery is not attempted again implicitly.
    pub async fn discover_cameras(&mut self) -> &[CameraDevice] {
        if self.is_unmounted() {
            return &[];
        }

        let was_idle = matches!(self.state, ScannerState::Idle);
        if was_idle {
            self.state = ScannerState::Discovering;
        }

        let cameras = match enumerate_cameras(&self.enumerator).await {
            Ok(cameras) => {
                info!(count = cameras.len(), "Discovered cameras");
                cameras
            }
            Err(e) => {
                warn!(error = %e, "Camera discovery failed, falling back to environment-facing request");
                Vec::new()
            }
        };

        let roster = CameraRoster::new(cameras);
        if let Some(camera) = roster.selected() {
            info!(camera = %camera, id = %camera.id, "Default camera selected");
        }
        self.discovery = Discovery::Complete(roster);

        if matches!(self.state, ScannerState::Discovering) {
            self.state = ScannerState::Idle;
        }

        self.discovery
            .roster()
            .map(CameraRoster::devices)
            .unwrap_or_default()
    }

    /// Open the scanner on the selected camera
    ///
    /// Runs discovery first if it has not happened yet. Does nothing when a
    /// session is already running.
    pub async fn open_scanner(&mut self) -> ScannerResult<()> {
        match self.state {
            ScannerState::Unmounted => return Err(ScannerError::Unmounted),
            ScannerState::Scanning(_) => {
                debug!("Scanner already open");
                return Ok(());
            }
            ScannerState::Idle | ScannerState::Discovering => {}
        }

        if matches!(self.discovery, Discovery::Pending) {
            self.discover_cameras().await;
        }

        let device_id = self
            .discovery
            .roster()
            .and_then(CameraRoster::selected)
            .map(|camera| camera.id.clone());

        self.start_session(device_id).await
    }

    /// Replace any running session with one bound to `device_id`
    ///
    /// With no device id the widget is asked for an environment-facing
    /// camera instead. A discovered device becomes the roster selection, so
    /// the next switch continues from it.
    pub async fn start_session(&mut self, device_id: Option<String>) -> ScannerResult<()> {
        if self.is_unmounted() {
            return Err(ScannerError::Unmounted);
        }

        self.stop_session().await;

        let id = SessionId(self.next_session);
        self.next_session += 1;
        let constraint = CameraConstraint::for_device(device_id.as_deref());
        let sink = ScanSink::new(id, self.events_tx.clone());

        info!(session = %id, %constraint, "Starting scan session");
        match self.widget.start(&self.config, constraint, sink).await {
            Ok(handle) => {
                if let (Some(id), Discovery::Complete(roster)) =
                    (device_id.as_deref(), &mut self.discovery)
                {
                    roster.select_device(id);
                }
                self.state = ScannerState::Scanning(ActiveSession {
                    id,
                    device_id,
                    handle,
                });
                Ok(())
            }
            Err(e) => {
                error!(session = %id, error = %e, "Scan session failed to start");
                self.state = ScannerState::Idle;
                Err(e)
            }
        }
    }

    /// Move the running session to the next discovered camera
    ///
    /// No-op unless a session is running and more than one camera is known.
    pub async fn switch_camera(&mut self) -> ScannerResult<()> {
        if self.is_unmounted() {
            return Err(ScannerError::Unmounted);
        }
        if !self.is_scanning() {
            debug!("Scanner closed, nothing to switch");
            return Ok(());
        }

        let Discovery::Complete(roster) = &mut self.discovery else {
            debug!("Cameras not discovered, cannot switch");
            return Ok(());
        };
        if !roster.can_switch() {
            info!("Only one camera available, cannot switch");
            return Ok(());
        }

        let next = roster.advance().map(|camera| camera.id.clone());
        info!(camera = ?next, "Switching camera");
        self.start_session(next).await
    }

    /// Stop the running session, if any
    ///
    /// Safe to call at any time. A failed teardown is logged and the
    /// scanner is still considered closed.
    pub async fn stop_session(&mut self) {
        let previous = std::mem::replace(&mut self.state, ScannerState::Idle);
        match previous {
            ScannerState::Scanning(ActiveSession { id, handle, .. }) => {
                debug!(session = %id, "Stopping scan session");
                if let Err(e) = self.widget.stop(handle).await {
                    warn!(session = %id, error = %e, "Failed to stop scan session, closing anyway");
                }
            }
            ScannerState::Unmounted => self.state = ScannerState::Unmounted,
            ScannerState::Idle | ScannerState::Discovering => {}
        }
    }

    /// Release everything and refuse further work
    pub async fn unmount(&mut self) {
        if self.is_unmounted() {
            return;
        }
        self.stop_session().await;
        self.state = ScannerState::Unmounted;
        info!("Scanner unmounted");
    }

    /// Wait for the next event from the running session
    ///
    /// Returns `None` immediately when no session is running. Cancel safe.
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        if !self.is_scanning() {
            return None;
        }
        self.events_rx.recv().await
    }

    /// Apply a widget event to the scanner
    ///
    /// Events from sessions that are no longer active are dropped, so each
    /// session reports at most one decode.
    pub async fn handle_event(&mut self, event: ScanEvent) {
        if self.active_session() != Some(event.session) {
            debug!(session = %event.session, "Ignoring event from inactive session");
            return;
        }

        match event.kind {
            ScanEventKind::Decoded(text) => {
                info!(session = %event.session, payload = %text, "QR code decoded");
                (self.on_decoded)(text);
                self.stop_session().await;
            }
            ScanEventKind::Failed(reason) => {
                error!(session = %event.session, reason = %reason, "Scan session failed");
                self.stop_session().await;
            }
        }
    }

    /// Pump events until the scanner closes
    pub async fn run_until_closed(&mut self) {
        while let Some(event) = self.next_event().await {
            self.handle_event(event).await;
        }
    }
}

impl<E, W: DecodingWidget> Drop for CameraScanner<E, W> {
    fn drop(&mut self) {
        if let ScannerState::Scanning(session) = &self.state {
            warn!(
                session = %session.id,
                "Scanner dropped while scanning, releasing session without awaiting stop"
            );
        }
    }
}
