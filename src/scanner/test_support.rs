// SPDX-License-Identifier: GPL-3.0-only

//! Test doubles for the scanner lifecycle

use super::widget::{DecodingWidget, ScanConfig, ScanSink, SessionId};
use crate::backends::camera::{CameraConstraint, DeviceEnumerator, MediaDeviceInfo};
use crate::errors::{ScannerError, ScannerResult};
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Enumerator returning a fixed device list, or failing
#[derive(Clone)]
pub struct StaticEnumerator {
    devices: Option<Vec<MediaDeviceInfo>>,
    calls: Arc<AtomicUsize>,
}

impl StaticEnumerator {
    pub fn with_labels(labels: &[&str]) -> Self {
        let devices = labels
            .iter()
            .enumerate()
            .map(|(i, label)| MediaDeviceInfo::video_input(format!("/dev/video{}", i * 2), *label))
            .collect();
        Self {
            devices: Some(devices),
            calls: Arc::default(),
        }
    }

    pub fn with_devices(devices: Vec<MediaDeviceInfo>) -> Self {
        Self {
            devices: Some(devices),
            calls: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            devices: None,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DeviceEnumerator for StaticEnumerator {
    fn enumerate_devices(&self) -> BoxFuture<'_, ScannerResult<Vec<MediaDeviceInfo>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.devices.clone().ok_or_else(|| {
            ScannerError::DiscoveryFailed("device enumeration not supported".to_string())
        });
        Box::pin(async move {
            tokio::task::yield_now().await;
            result
        })
    }
}

/// Everything the recording widget observed
#[derive(Debug, Default)]
pub struct WidgetLog {
    pub starts: Vec<(SessionId, CameraConstraint)>,
    pub stops: Vec<SessionId>,
    pub active: HashSet<SessionId>,
    pub max_active: usize,
    pub sinks: Vec<ScanSink>,
}

/// Widget double that records starts and stops and exposes its sinks
#[derive(Clone)]
pub struct RecordingWidget {
    log: Arc<Mutex<WidgetLog>>,
    fail_start: Arc<AtomicBool>,
    fail_stop: Arc<AtomicBool>,
    /// While true, starts stay pending before the stream is ready
    hold_start: Arc<watch::Sender<bool>>,
}

impl Default for RecordingWidget {
    fn default() -> Self {
        Self {
            log: Arc::default(),
            fail_start: Arc::default(),
            fail_stop: Arc::default(),
            hold_start: Arc::new(watch::Sender::new(false)),
        }
    }
}

/// Counts a start as active until it completes or its future is dropped
struct PendingStart {
    log: Arc<Mutex<WidgetLog>>,
    id: SessionId,
    armed: bool,
}

impl PendingStart {
    fn complete(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingStart {
    fn drop(&mut self) {
        if self.armed {
            self.log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .active
                .remove(&self.id);
        }
    }
}

#[derive(Debug)]
pub struct RecordingHandle(pub SessionId);

impl RecordingWidget {
    pub fn log(&self) -> MutexGuard<'_, WidgetLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fail_starts(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn fail_stops(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    /// Keep subsequent starts pending until released
    pub fn hold_starts(&self, hold: bool) {
        self.hold_start.send_replace(hold);
    }

    /// Sink handed to the `index`-th successful start
    pub fn sink(&self, index: usize) -> ScanSink {
        self.log().sinks[index].clone()
    }

    /// Fire the success callback of the most recent session
    pub fn emit_decoded(&self, text: &str) -> bool {
        let sink = self.log().sinks.last().cloned();
        sink.is_some_and(|sink| sink.decoded(text))
    }

    pub fn start_count(&self) -> usize {
        self.log().starts.len()
    }

    pub fn stop_count(&self) -> usize {
        self.log().stops.len()
    }
}

impl DecodingWidget for RecordingWidget {
    type Handle = RecordingHandle;

    fn start<'a>(
        &'a self,
        _config: &'a ScanConfig,
        constraint: CameraConstraint,
        sink: ScanSink,
    ) -> BoxFuture<'a, ScannerResult<RecordingHandle>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            if self.fail_start.load(Ordering::SeqCst) {
                return Err(ScannerError::SessionStartFailed(
                    "camera permission denied".to_string(),
                ));
            }

            let id = sink.session();
            {
                let mut log = self.log();
                log.active.insert(id);
                log.max_active = log.max_active.max(log.active.len());
            }
            let pending = PendingStart {
                log: Arc::clone(&self.log),
                id,
                armed: true,
            };

            let mut hold = self.hold_start.subscribe();
            let _ = hold.wait_for(|held| !*held).await;
            pending.complete();

            let mut log = self.log();
            log.starts.push((id, constraint));
            log.sinks.push(sink);
            Ok(RecordingHandle(id))
        })
    }

    fn stop(&self, handle: RecordingHandle) -> BoxFuture<'_, ScannerResult<()>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            let mut log = self.log();
            log.stops.push(handle.0);
            log.active.remove(&handle.0);
            if self.fail_stop.load(Ordering::SeqCst) {
                Err(ScannerError::SessionStopFailed("teardown rejected".to_string()))
            } else {
                Ok(())
            }
        })
    }
}
