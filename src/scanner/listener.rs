//! Input-device listener for the card scanner
//!
//! Reads raw key events from the scanner's evdev node on a dedicated
//! thread and forwards decoded characters to the run loop over a channel.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use evdev::{Device, EventType};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::keys::char_for_code;

/// Errors that can occur in the scanner listener
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    #[error("scanner listener is already running")]
    AlreadyRunning,

    #[error("failed to open input device {path}: {source} (is the user in the `input` group?)")]
    DeviceOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),
}

/// Listener that reads key-down events from the scanner device
pub struct ScannerListener {
    device_path: PathBuf,
    key_tx: mpsc::Sender<char>,
    running: Arc<AtomicBool>,
}

impl ScannerListener {
    /// Create a new listener for the given evdev node
    pub fn new(device_path: &Path, key_tx: mpsc::Sender<char>) -> Self {
        Self {
            device_path: device_path.to_owned(),
            key_tx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the listener
    ///
    /// Opens the device up front so permission problems surface here,
    /// then spawns a dedicated thread that blocks on the event stream
    /// until `stop()` is called or the channel closes.
    pub fn start(&self) -> Result<(), ScannerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ScannerError::AlreadyRunning);
        }

        let device = Device::open(&self.device_path).map_err(|source| {
            self.running.store(false, Ordering::SeqCst);
            ScannerError::DeviceOpen {
                path: self.device_path.clone(),
                source,
            }
        })?;

        if let Some(name) = device.name() {
            info!(device = name, path = ?self.device_path, "scanner device opened");
        }

        let key_tx = self.key_tx.clone();
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("scanner-listener".to_string())
            .spawn(move || {
                info!("scanner listener thread started");
                run_read_loop(device, key_tx, &running);
                running.store(false, Ordering::SeqCst);
                info!("scanner listener thread stopped");
            })
            .map_err(|e| ScannerError::ThreadSpawn(e.to_string()))?;

        Ok(())
    }

    /// Stop the listener; the read loop exits after its next event batch.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the listener is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Blocking read loop over the device's event stream.
///
/// Only key-down transitions are consumed; codes outside the translation
/// table are silently ignored.
fn run_read_loop(mut device: Device, key_tx: mpsc::Sender<char>, running: &Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        let events = match device.fetch_events() {
            Ok(events) => events,
            Err(e) => {
                error!(?e, "failed to read scanner events");
                return;
            }
        };

        for event in events {
            if event.event_type() != EventType::KEY || event.value() != 1 {
                continue;
            }

            let Some(ch) = char_for_code(event.code()) else {
                debug!(code = event.code(), "ignoring unmapped key code");
                continue;
            };

            if key_tx.blocking_send(ch).is_err() {
                warn!("run loop closed the key channel, stopping listener");
                return;
            }
        }
    }
}
