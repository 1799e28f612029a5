// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Scanning a QR code interactively
//! - Decoding a QR code from an image file
//! - Printing the provenance record for a code

use ayurtrace_scanner::backends::camera::{
    CameraRoster, DeviceEnumerator, V4l2Enumerator, V4l2Widget, enumerate_cameras,
};
use ayurtrace_scanner::frame_processor::{LumaFrame, QrDetector};
use ayurtrace_scanner::provenance::{TracePayload, lookup_trace};
use ayurtrace_scanner::scanner::{CameraScanner, DecodingWidget, ScanEvent};
use ayurtrace_scanner::{AppError, AppResult, Config};
use chrono::Local;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::warn;

/// List all available cameras
pub async fn list_cameras() -> AppResult<()> {
    let cameras = enumerate_cameras(&V4l2Enumerator::new()).await?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    let roster = CameraRoster::new(cameras);

    println!("Available cameras:");
    println!();
    for (index, camera) in roster.devices().iter().enumerate() {
        let marker = if roster.selected_index() == Some(index) {
            "*"
        } else {
            " "
        };
        println!(" {}[{}] {}", marker, index, camera.display_name());
        println!("      Device: {}", camera.id);
    }
    println!();
    println!("* used by default when scanning");

    Ok(())
}

#[derive(Debug)]
enum ScanCommand {
    Switch,
    Cancel,
}

enum ScanInput {
    Event(Option<ScanEvent>),
    Command(Option<ScanCommand>),
    Interrupted,
    TimedOut,
}

/// How an interactive scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanOutcome {
    /// The session closed by itself, after a decode or a failure
    Closed,
    /// Cancelled from the keyboard or by Ctrl-C
    Cancelled,
    /// Nothing decoded before the deadline
    TimedOut,
}

/// Read scan commands from stdin on a dedicated thread
///
/// The thread is detached; blocking stdin reads must not hold up runtime
/// shutdown.
fn spawn_command_reader() -> mpsc::UnboundedReceiver<ScanCommand> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "s" | "switch" => ScanCommand::Switch,
                "q" | "quit" | "cancel" => ScanCommand::Cancel,
                "" => continue,
                other => {
                    eprintln!("Unknown command '{}' (s = switch camera, q = cancel)", other);
                    continue;
                }
            };
            if tx.send(command).is_err() {
                break;
            }
        }
    });

    rx
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Pump scanner events and user input until the session closes
///
/// `interrupt` is polled across iterations, so an interrupt raised while an
/// event or a camera switch is being handled is seen on the next pass.
async fn drive_scan<E, W>(
    scanner: &mut CameraScanner<E, W>,
    commands: &mut mpsc::UnboundedReceiver<ScanCommand>,
    interrupt: impl Future<Output = ()>,
    deadline: Option<Instant>,
) -> AppResult<ScanOutcome>
where
    E: DeviceEnumerator,
    W: DecodingWidget,
{
    tokio::pin!(interrupt);
    let mut commands_open = true;

    while scanner.is_scanning() {
        let input = tokio::select! {
            event = scanner.next_event() => ScanInput::Event(event),
            command = commands.recv(), if commands_open => ScanInput::Command(command),
            _ = &mut interrupt => ScanInput::Interrupted,
            _ = wait_for_deadline(deadline) => ScanInput::TimedOut,
        };

        match input {
            ScanInput::Event(Some(event)) => scanner.handle_event(event).await,
            ScanInput::Event(None) => break,
            ScanInput::Command(Some(ScanCommand::Switch)) => {
                scanner.switch_camera().await?;
                if let Some(device) = scanner.active_device() {
                    println!("Scanning on {}", device);
                }
            }
            ScanInput::Command(Some(ScanCommand::Cancel)) | ScanInput::Interrupted => {
                scanner.stop_session().await;
                return Ok(ScanOutcome::Cancelled);
            }
            ScanInput::Command(None) => commands_open = false,
            ScanInput::TimedOut => {
                scanner.stop_session().await;
                return Ok(ScanOutcome::TimedOut);
            }
        }
    }

    Ok(ScanOutcome::Closed)
}

/// Scan a single QR code with the default camera
pub async fn scan(config: &Config, timeout: Option<u64>) -> AppResult<()> {
    let (decoded_tx, mut decoded_rx) = mpsc::unbounded_channel();
    let mut scanner = CameraScanner::new(
        V4l2Enumerator::new(),
        V4l2Widget::new(),
        config.scan_config(),
        move |text: String| {
            let _ = decoded_tx.send(text);
        },
    );

    let camera_count = scanner.discover_cameras().await.len();
    if let Err(e) = scanner.open_scanner().await {
        scanner.unmount().await;
        return Err(e.into());
    }

    println!(
        "Scanning for a QR code on {}...",
        scanner
            .active_device()
            .unwrap_or("the environment-facing camera")
    );
    if camera_count > 1 {
        println!(
            "Type 's' + Enter to switch camera ({} available), 'q' + Enter or Ctrl-C to cancel.",
            camera_count
        );
    } else {
        println!("Type 'q' + Enter or press Ctrl-C to cancel.");
    }

    let mut commands = spawn_command_reader();
    let deadline = timeout.map(|secs| Instant::now() + Duration::from_secs(secs));
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let outcome = drive_scan(&mut scanner, &mut commands, interrupt, deadline).await;
    scanner.unmount().await;

    match outcome? {
        ScanOutcome::Closed => {}
        ScanOutcome::Cancelled => println!("Scan cancelled."),
        ScanOutcome::TimedOut => println!(
            "No QR code found within {} seconds.",
            timeout.unwrap_or_default()
        ),
    }

    if let Ok(text) = decoded_rx.try_recv() {
        print_scan_result(&text, config.print_trace)?;
    }

    Ok(())
}

/// Decode a QR code from a still image
pub async fn decode_file(config: &Config, path: &Path) -> AppResult<()> {
    let frame = LumaFrame::from_image_file(path)?;

    // Still images are searched whole, not just the camera decode region
    match QrDetector::new(None).detect_async(Arc::new(frame)).await {
        Some(text) => print_scan_result(&text, config.print_trace),
        None => Err(AppError::Other(format!(
            "No QR code found in {}",
            path.display()
        ))),
    }
}

/// Print the provenance record for a code
pub fn print_trace(code: &str) -> AppResult<()> {
    let payload = TracePayload::parse(code);
    let reference = payload.reference().unwrap_or(code);
    let record = lookup_trace(reference)
        .ok_or_else(|| AppError::Other("Enter a product code to trace".to_string()))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Show (and optionally create) the configuration file
pub fn show_config(config: &Config, path: Option<&Path>, init: bool) -> AppResult<()> {
    if init {
        let path = path.ok_or_else(|| {
            AppError::Config("no config directory available on this system".to_string())
        })?;
        if path.exists() {
            println!("Config already exists at {}", path.display());
        } else {
            Config::default().save(path)?;
            println!("Wrote default config to {}", path.display());
        }
    }

    match path {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none)"),
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn print_scan_result(text: &str, print_trace: bool) -> AppResult<()> {
    let payload = TracePayload::parse(text);

    println!();
    println!("Scanned Result");
    println!("  Payload:    {}", text);
    println!("  Type:       {}", payload.kind_label());
    if let Some(reference) = payload.reference() {
        println!("  Reference:  {}", reference);
    }
    println!("  Scanned at: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    if print_trace {
        if let Some(record) = lookup_trace(payload.reference().unwrap_or(text)) {
            println!();
            println!("Provenance");
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ayurtrace_scanner::backends::camera::{CameraConstraint, MediaDeviceInfo};
    use ayurtrace_scanner::scanner::{ScanConfig, ScanSink};
    use ayurtrace_scanner::ScannerResult;
    use futures::future::BoxFuture;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    struct TwoCameras;

    impl DeviceEnumerator for TwoCameras {
        fn enumerate_devices(&self) -> BoxFuture<'_, ScannerResult<Vec<MediaDeviceInfo>>> {
            Box::pin(async {
                Ok(vec![
                    MediaDeviceInfo::video_input("/dev/video0", "Back Camera"),
                    MediaDeviceInfo::video_input("/dev/video2", "Front Camera"),
                ])
            })
        }
    }

    /// Widget that never decodes; raises Ctrl-C when its second session starts
    #[derive(Default)]
    struct SilentWidget {
        starts: AtomicUsize,
        stops: AtomicUsize,
        interrupt_on_switch: Mutex<Option<oneshot::Sender<()>>>,
    }

    impl DecodingWidget for SilentWidget {
        type Handle = ();

        fn start<'a>(
            &'a self,
            _config: &'a ScanConfig,
            _constraint: CameraConstraint,
            _sink: ScanSink,
        ) -> BoxFuture<'a, ScannerResult<()>> {
            Box::pin(async move {
                if self.starts.fetch_add(1, Ordering::SeqCst) == 1 {
                    if let Some(tx) = self.interrupt_on_switch.lock().unwrap().take() {
                        let _ = tx.send(());
                    }
                }
                Ok(())
            })
        }

        fn stop(&self, _handle: ()) -> BoxFuture<'_, ScannerResult<()>> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        }
    }

    async fn open_scanner(widget: SilentWidget) -> CameraScanner<TwoCameras, SilentWidget> {
        let mut scanner = CameraScanner::new(TwoCameras, widget, ScanConfig::default(), |_| {});
        scanner.open_scanner().await.unwrap();
        scanner
    }

    #[tokio::test]
    async fn test_interrupt_cancels_scan() {
        let mut scanner = open_scanner(SilentWidget::default()).await;
        let (_commands_tx, mut commands) = mpsc::unbounded_channel();

        let outcome = drive_scan(&mut scanner, &mut commands, async {}, None)
            .await
            .unwrap();

        assert_eq!(outcome, ScanOutcome::Cancelled);
        assert!(!scanner.is_scanning());
        assert_eq!(scanner.widget().stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_interrupt_during_camera_switch_is_not_lost() {
        let (interrupt_tx, interrupt_rx) = oneshot::channel();
        let widget = SilentWidget {
            interrupt_on_switch: Mutex::new(Some(interrupt_tx)),
            ..SilentWidget::default()
        };
        let mut scanner = open_scanner(widget).await;
        let (commands_tx, mut commands) = mpsc::unbounded_channel();
        commands_tx.send(ScanCommand::Switch).unwrap();

        let interrupt = async {
            let _ = interrupt_rx.await;
        };
        let outcome = drive_scan(&mut scanner, &mut commands, interrupt, None)
            .await
            .unwrap();

        assert_eq!(outcome, ScanOutcome::Cancelled);
        assert_eq!(scanner.widget().starts.load(Ordering::SeqCst), 2);
        assert_eq!(scanner.widget().stops.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_deadline_ends_scan() {
        let mut scanner = open_scanner(SilentWidget::default()).await;
        let (_commands_tx, mut commands) = mpsc::unbounded_channel();
        let deadline = Some(Instant::now() + Duration::from_millis(20));

        let outcome = drive_scan(&mut scanner, &mut commands, std::future::pending(), deadline)
            .await
            .unwrap();

        assert_eq!(outcome, ScanOutcome::TimedOut);
        assert!(!scanner.is_scanning());
    }
}
