// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 capture thread acting as the QR decoding widget
//!
//! Each session owns one capture thread. The thread opens the camera,
//! reports readiness back to `start`, then decodes frames at the configured
//! rate until it is cancelled, decodes a payload, or the stream fails.
//!
//! Scan targets are leased: a second session on the same `target_id` is
//! refused until the first thread has exited. The lease lives on the
//! capture thread, so it is released on every exit path.

use super::selection::select_default_camera;
use super::types::CameraConstraint;
use super::{V4l2Enumerator, enumerate_cameras};
use crate::constants::{CAPTURE_BUFFER_COUNT, fourcc, timing};
use crate::errors::{ScannerError, ScannerResult};
use crate::frame_processor::{LumaFrame, PixelLayout, QrDetector};
use crate::scanner::widget::{DecodingWidget, ScanConfig, ScanSink, SessionId};
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

type MountTable = Arc<Mutex<HashSet<String>>>;

/// Exclusive hold on a scan target, released on drop
struct MountLease {
    table: MountTable,
    target: String,
}

impl MountLease {
    fn acquire(table: &MountTable, target: &str) -> ScannerResult<Self> {
        let mut held = table.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(target.to_string()) {
            return Err(ScannerError::MountBusy(target.to_string()));
        }
        Ok(Self {
            table: Arc::clone(table),
            target: target.to_string(),
        })
    }
}

impl Drop for MountLease {
    fn drop(&mut self) {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.target);
        debug!(target_id = %self.target, "Released scan target");
    }
}

/// QR decoding widget backed by V4L2 capture and rqrr
#[derive(Clone, Default)]
pub struct V4l2Widget {
    mounts: MountTable,
    enumerator: V4l2Enumerator,
}

impl V4l2Widget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session currently holds `target_id`
    pub fn is_mounted(&self, target_id: &str) -> bool {
        self.mounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(target_id)
    }

    async fn resolve_device(&self, constraint: CameraConstraint) -> ScannerResult<String> {
        match constraint {
            CameraConstraint::ExactDevice(id) => Ok(id),
            CameraConstraint::FacingEnvironment => {
                let cameras = enumerate_cameras(&self.enumerator)
                    .await
                    .map_err(|e| ScannerError::SessionStartFailed(e.to_string()))?;
                select_default_camera(&cameras)
                    .and_then(|index| cameras.into_iter().nth(index))
                    .map(|camera| camera.id)
                    .ok_or_else(|| {
                        ScannerError::SessionStartFailed("no video input devices found".to_string())
                    })
            }
        }
    }
}

impl std::fmt::Debug for V4l2Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mounts = self.mounts.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("V4l2Widget")
            .field("mounted", &*mounts)
            .finish()
    }
}

/// Handle to a running V4L2 decoding session
///
/// Dropping the handle raises the cancel flag; the capture thread exits
/// after its current frame and releases the camera.
pub struct V4l2Session {
    session: SessionId,
    device_path: String,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl V4l2Session {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Cancel the capture thread and wait for it on the blocking pool
    async fn finish(mut self) -> ScannerResult<()> {
        self.cancel.store(true, Ordering::Release);
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let session = self.session;

        tokio::task::spawn_blocking(move || worker.join())
            .await
            .map_err(|e| ScannerError::SessionStopFailed(e.to_string()))?
            .map_err(|_| {
                ScannerError::SessionStopFailed(format!("capture thread for {} panicked", session))
            })
    }
}

impl Drop for V4l2Session {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
        if self.worker.is_some() {
            debug!(session = %self.session, "Session handle dropped without stop, capture thread will exit");
        }
    }
}

impl DecodingWidget for V4l2Widget {
    type Handle = V4l2Session;

    fn start<'a>(
        &'a self,
        config: &'a ScanConfig,
        constraint: CameraConstraint,
        sink: ScanSink,
    ) -> BoxFuture<'a, ScannerResult<V4l2Session>> {
        Box::pin(async move {
            let lease = MountLease::acquire(&self.mounts, &config.target_id)?;
            let device_path = self.resolve_device(constraint).await?;
            let session = sink.session();
            let cancel = Arc::new(AtomicBool::new(false));
            let (ready_tx, ready_rx) = oneshot::channel();

            let job = CaptureJob {
                device_path: device_path.clone(),
                config: config.clone(),
                sink,
                cancel: Arc::clone(&cancel),
                ready: ready_tx,
                lease,
            };
            let worker = std::thread::Builder::new()
                .name(format!("qr-{}", session))
                .spawn(move || run_capture(job))
                .map_err(|e| {
                    ScannerError::SessionStartFailed(format!("spawn capture thread: {}", e))
                })?;

            let handle = V4l2Session {
                session,
                device_path,
                cancel,
                worker: Some(worker),
            };

            match ready_rx.await {
                Ok(Ok(())) => {
                    info!(%session, device = %handle.device_path, "Scan session started");
                    Ok(handle)
                }
                Ok(Err(e)) => {
                    // Join so the scan target is free again before reporting
                    let _ = handle.finish().await;
                    Err(e)
                }
                Err(_) => {
                    let _ = handle.finish().await;
                    Err(ScannerError::SessionStartFailed(
                        "capture thread exited before the stream was ready".to_string(),
                    ))
                }
            }
        })
    }

    fn stop(&self, handle: V4l2Session) -> BoxFuture<'_, ScannerResult<()>> {
        Box::pin(async move {
            let session = handle.session;
            handle.finish().await?;
            info!(%session, "Scan session stopped");
            Ok(())
        })
    }
}

/// Everything the capture thread owns
struct CaptureJob {
    device_path: String,
    config: ScanConfig,
    sink: ScanSink,
    cancel: Arc<AtomicBool>,
    ready: oneshot::Sender<ScannerResult<()>>,
    lease: MountLease,
}

fn open_device(path: &str, config: &ScanConfig) -> ScannerResult<(Device, v4l::Format, PixelLayout)> {
    let device = Device::with_path(path)
        .map_err(|e| ScannerError::SessionStartFailed(format!("{}: {}", path, e)))?;

    let mut requested = device
        .format()
        .map_err(|e| ScannerError::SessionStartFailed(format!("{}: {}", path, e)))?;
    requested.width = config.resolution.0;
    requested.height = config.resolution.1;
    requested.fourcc = FourCC::new(&fourcc::YUYV);

    let format = match device.set_format(&requested) {
        Ok(format) => format,
        Err(e) => {
            warn!(path, error = %e, "Could not set capture format, keeping driver default");
            device
                .format()
                .map_err(|e| ScannerError::SessionStartFailed(format!("{}: {}", path, e)))?
        }
    };

    let layout = PixelLayout::from_fourcc(format.fourcc.repr)
        .ok_or_else(|| ScannerError::UnsupportedFormat(format.fourcc.to_string()))?;

    Ok((device, format, layout))
}

fn open_stream<'a>(device: &'a Device, path: &str) -> ScannerResult<Stream<'a>> {
    let mut stream = Stream::with_buffers(device, Type::VideoCapture, CAPTURE_BUFFER_COUNT)
        .map_err(|e| ScannerError::SessionStartFailed(format!("{}: {}", path, e)))?;
    stream.set_timeout(timing::CAPTURE_TIMEOUT);
    Ok(stream)
}

/// Source of raw capture buffers
trait FrameSource {
    /// Next filled buffer, trimmed to the bytes the driver wrote
    ///
    /// Fails with `ErrorKind::TimedOut` when no frame arrived in time.
    fn next_frame(&mut self) -> io::Result<&[u8]>;
}

impl FrameSource for Stream<'_> {
    fn next_frame(&mut self) -> io::Result<&[u8]> {
        let (buf, meta) = CaptureStream::next(self)?;
        let used = match meta.bytesused as usize {
            0 => buf.len(),
            n => n.min(buf.len()),
        };
        Ok(&buf[..used])
    }
}

/// Why the frame loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopExit {
    /// Decoded, failed, or cancelled; the session is over
    Finished,
    /// No frame within the capture timeout
    Stalled,
}

/// Throttled decode loop over one capture stream
struct FrameLoop<'j> {
    sink: &'j ScanSink,
    cancel: &'j AtomicBool,
    detector: QrDetector,
    interval: Duration,
    layout: PixelLayout,
    width: u32,
    height: u32,
    stride: u32,
    last_attempt: Option<Instant>,
}

impl FrameLoop<'_> {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    fn run(&mut self, source: &mut impl FrameSource) -> LoopExit {
        let session = self.sink.session();

        while !self.cancelled() {
            let data = match source.next_frame() {
                Ok(data) => data,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return LoopExit::Stalled,
                Err(e) => {
                    if !self.cancelled() {
                        warn!(%session, error = %e, "Capture stream failed");
                        self.sink.failed(format!("capture error: {}", e));
                    }
                    return LoopExit::Finished;
                }
            };

            if self
                .last_attempt
                .is_some_and(|at| at.elapsed() < self.interval)
            {
                continue;
            }
            self.last_attempt = Some(Instant::now());

            let frame =
                match LumaFrame::from_capture(data, self.layout, self.width, self.height, self.stride)
                {
                    Ok(frame) => frame,
                    Err(e) if self.layout == PixelLayout::Mjpeg => {
                        // Corrupt MJPEG frames are common right after stream start
                        self.sink.frame_missed(&e.to_string());
                        continue;
                    }
                    Err(e) => {
                        self.sink.failed(e.to_string());
                        return LoopExit::Finished;
                    }
                };

            match self.detector.detect(&frame) {
                Some(text) => {
                    self.sink.decoded(text);
                    return LoopExit::Finished;
                }
                None => self.sink.frame_missed("no QR code in decode region"),
            }
        }

        LoopExit::Finished
    }
}

fn run_capture(job: CaptureJob) {
    let CaptureJob {
        device_path,
        config,
        sink,
        cancel,
        ready,
        lease: _lease,
    } = job;
    let session = sink.session();

    if cancel.load(Ordering::Acquire) {
        let _ = ready.send(Err(ScannerError::SessionStartFailed(
            "cancelled before start".to_string(),
        )));
        return;
    }

    let (device, format, layout) = match open_device(&device_path, &config) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut stream = match open_stream(&device, &device_path) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if ready.send(Ok(())).is_err() {
        debug!(%session, "Start abandoned before the stream was ready");
        return;
    }

    info!(
        %session,
        device = %device_path,
        width = format.width,
        height = format.height,
        fourcc = %format.fourcc,
        fps = config.frame_rate,
        "Capture stream running"
    );

    let mut frames = FrameLoop {
        sink: &sink,
        cancel: &cancel,
        detector: QrDetector::new(config.decode_region),
        interval: timing::decode_interval(config.frame_rate),
        layout,
        width: format.width,
        height: format.height,
        stride: format.stride,
        last_attempt: None,
    };

    while frames.run(&mut stream) == LoopExit::Stalled {
        if cancel.load(Ordering::Acquire) {
            break;
        }
        // A timed out dequeue leaves the stream's buffer queue unusable
        warn!(%session, timeout = ?timing::CAPTURE_TIMEOUT, "No frame from camera, restarting stream");
        drop(stream);
        stream = match open_stream(&device, &device_path) {
            Ok(stream) => stream,
            Err(e) => {
                sink.failed(e.to_string());
                break;
            }
        };
    }

    debug!(%session, "Capture thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_processor::DecodeRegion;
    use crate::frame_processor::test_frames::qr_luma;
    use crate::scanner::widget::{ScanEvent, ScanEventKind};
    use std::collections::VecDeque;
    use tokio::sync::mpsc;

    fn sink(id: u64) -> ScanSink {
        let (tx, _rx) = mpsc::unbounded_channel();
        ScanSink::new(SessionId(id), tx)
    }

    fn sink_with_events(id: u64) -> (ScanSink, mpsc::UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ScanSink::new(SessionId(id), tx), rx)
    }

    /// Plays back a fixed list of buffers, then times out like a stalled camera
    #[derive(Default)]
    struct ScriptedSource {
        frames: VecDeque<io::Result<Vec<u8>>>,
        current: Vec<u8>,
        pulls: usize,
    }

    impl ScriptedSource {
        fn new(frames: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                frames: frames.into(),
                ..Self::default()
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> io::Result<&[u8]> {
            self.pulls += 1;
            match self.frames.pop_front() {
                Some(Ok(data)) => {
                    self.current = data;
                    Ok(self.current.as_slice())
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "VIDIOC_DQBUF")),
            }
        }
    }

    fn grey_loop<'j>(sink: &'j ScanSink, cancel: &'j AtomicBool) -> FrameLoop<'j> {
        FrameLoop {
            sink,
            cancel,
            detector: QrDetector::new(Some(DecodeRegion::square(250))),
            interval: Duration::ZERO,
            layout: PixelLayout::Grey,
            width: 640,
            height: 480,
            stride: 0,
            last_attempt: None,
        }
    }

    #[test]
    fn test_stalled_camera_is_not_a_failure() {
        let (sink, mut events) = sink_with_events(1);
        let cancel = AtomicBool::new(false);
        let mut source = ScriptedSource::new(vec![Ok(vec![255; 640 * 480])]);

        assert_eq!(grey_loop(&sink, &cancel).run(&mut source), LoopExit::Stalled);
        assert_eq!(source.pulls, 2);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_stream_error_fails_session() {
        let (sink, mut events) = sink_with_events(2);
        let cancel = AtomicBool::new(false);
        let mut source = ScriptedSource::new(vec![Err(io::Error::other("device unplugged"))]);

        assert_eq!(grey_loop(&sink, &cancel).run(&mut source), LoopExit::Finished);
        let event = events.try_recv().unwrap();
        assert!(matches!(event.kind, ScanEventKind::Failed(_)));
    }

    #[test]
    fn test_cancelled_loop_reads_no_frames() {
        let (sink, mut events) = sink_with_events(3);
        let cancel = AtomicBool::new(true);
        let mut source = ScriptedSource::default();

        assert_eq!(grey_loop(&sink, &cancel).run(&mut source), LoopExit::Finished);
        assert_eq!(source.pulls, 0);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_decodes_after_blank_frames() {
        let (sink, mut events) = sink_with_events(4);
        let cancel = AtomicBool::new(false);
        let mut source = ScriptedSource::new(vec![
            Ok(vec![255; 640 * 480]),
            Ok(vec![255; 640 * 480]),
            Ok(qr_luma("AYR-ASH-2024-001", 640, 480)),
        ]);

        assert_eq!(grey_loop(&sink, &cancel).run(&mut source), LoopExit::Finished);
        assert_eq!(source.pulls, 3);
        assert_eq!(
            events.try_recv().unwrap(),
            ScanEvent {
                session: SessionId(4),
                kind: ScanEventKind::Decoded("AYR-ASH-2024-001".to_string()),
            }
        );
    }

    #[test]
    fn test_lease_is_exclusive_and_released_on_drop() {
        let table = MountTable::default();
        let lease = MountLease::acquire(&table, "reader").unwrap();
        assert!(matches!(
            MountLease::acquire(&table, "reader"),
            Err(ScannerError::MountBusy(_))
        ));
        assert!(MountLease::acquire(&table, "other").is_ok());

        drop(lease);
        assert!(MountLease::acquire(&table, "reader").is_ok());
    }

    #[tokio::test]
    async fn test_start_refuses_busy_target() {
        let widget = V4l2Widget::new();
        let _held = MountLease::acquire(&widget.mounts, "reader").unwrap();

        let result = widget
            .start(
                &ScanConfig::default(),
                CameraConstraint::ExactDevice("/dev/video0".to_string()),
                sink(1),
            )
            .await;
        assert!(matches!(result, Err(ScannerError::MountBusy(_))));
    }

    #[tokio::test]
    async fn test_failed_open_releases_target() {
        let widget = V4l2Widget::new();
        let result = widget
            .start(
                &ScanConfig::default(),
                CameraConstraint::ExactDevice("/nonexistent/video42".to_string()),
                sink(2),
            )
            .await;

        assert!(matches!(result, Err(ScannerError::SessionStartFailed(_))));
        assert!(!widget.is_mounted("reader"));
    }
}
