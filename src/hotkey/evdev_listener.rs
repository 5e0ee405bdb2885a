//! evdev-based paste chord listener
//!
//! Uses the Linux evdev interface to detect key presses at the kernel level.
//! This works on all Wayland compositors because it bypasses the display server.
//! Devices are only read, never grabbed, so the paste still reaches the
//! focused application.
//!
//! The user must be in the 'input' group to access /dev/input/* devices.

use super::{ChordKey, ChordTracker, HotkeyEvent, PasteChordListener};
use crate::error::HotkeyError;
use evdev::{Device, InputEventKind, Key};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// How long the reader thread sleeps between device polls
const DEVICE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// evdev-based paste chord listener
pub struct EvdevListener {
    /// Paths to keyboard devices
    device_paths: Vec<PathBuf>,
    /// Signal to stop the reader thread
    stop_signal: Option<oneshot::Sender<()>>,
    /// Reader thread; joined on stop so device handles are closed
    reader: Option<JoinHandle<()>>,
}

impl EvdevListener {
    /// Create a new evdev listener over every keyboard in /dev/input
    pub fn new() -> Result<Self, HotkeyError> {
        let device_paths = find_keyboard_devices()?;

        if device_paths.is_empty() {
            return Err(HotkeyError::NoKeyboard);
        }

        tracing::debug!(
            "Found {} keyboard device(s): {:?}",
            device_paths.len(),
            device_paths
        );

        Ok(Self {
            device_paths,
            stop_signal: None,
            reader: None,
        })
    }
}

#[async_trait::async_trait]
impl PasteChordListener for EvdevListener {
    async fn start(&mut self) -> Result<mpsc::Receiver<HotkeyEvent>, HotkeyError> {
        // A previous run that was never stopped is released first
        self.stop().await?;

        let devices = open_devices(&self.device_paths);
        if devices.is_empty() {
            return Err(HotkeyError::DeviceAccess(
                "no keyboard device could be opened".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(8);
        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_signal = Some(stop_tx);

        self.reader = Some(tokio::task::spawn_blocking(move || {
            evdev_listener_loop(devices, tx, stop_rx);
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), HotkeyError> {
        if let Some(stop) = self.stop_signal.take() {
            let _ = stop.send(());
        }
        if let Some(reader) = self.reader.take() {
            if let Err(e) = reader.await {
                tracing::warn!("Paste chord reader thread failed: {}", e);
            }
            tracing::trace!("evdev devices released");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "evdev"
    }
}

/// Open keyboard devices in non-blocking mode
fn open_devices(paths: &[PathBuf]) -> Vec<Device> {
    paths
        .iter()
        .filter_map(|path| match Device::open(path) {
            Ok(device) => {
                // Set device to non-blocking mode so fetch_events doesn't block
                let fd = device.as_raw_fd();
                unsafe {
                    let flags = libc::fcntl(fd, libc::F_GETFL);
                    if flags != -1 {
                        libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
                    }
                }
                tracing::trace!("Opened device (non-blocking): {:?}", path);
                Some(device)
            }
            Err(e) => {
                tracing::warn!("Failed to open {:?}: {}", path, e);
                None
            }
        })
        .collect()
}

/// Map an evdev key to its role in the paste chord
fn chord_key(key: Key) -> ChordKey {
    if key == Key::KEY_LEFTCTRL {
        ChordKey::LeftModifier
    } else if key == Key::KEY_RIGHTCTRL {
        ChordKey::RightModifier
    } else if key == Key::KEY_V {
        ChordKey::V
    } else {
        ChordKey::Other
    }
}

/// Reader loop running in a blocking task; devices drop when it returns
fn evdev_listener_loop(
    mut devices: Vec<Device>,
    tx: mpsc::Sender<HotkeyEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut tracker = ChordTracker::default();

    tracing::debug!("Listening for Ctrl+V on {} device(s)", devices.len());

    loop {
        match stop_rx.try_recv() {
            Ok(_) | Err(oneshot::error::TryRecvError::Closed) => {
                tracing::debug!("Paste chord listener stopping");
                return;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
        }

        for device in &mut devices {
            // fetch_events returns immediately if no events (non-blocking)
            if let Ok(events) = device.fetch_events() {
                for event in events {
                    if let InputEventKind::Key(key) = event.kind() {
                        // 1 = press, 0 = release, 2 = repeat
                        let pressed = match event.value() {
                            0 => false,
                            1 | 2 => true,
                            _ => continue,
                        };

                        if tracker.update(chord_key(key), pressed) {
                            tracing::debug!("Ctrl+V pressed");
                            if tx.blocking_send(HotkeyEvent::PasteChord).is_err() {
                                return; // Channel closed
                            }
                        }
                    }
                }
            }
        }

        std::thread::sleep(DEVICE_POLL_INTERVAL);
    }
}

/// Find all keyboard input devices
fn find_keyboard_devices() -> Result<Vec<PathBuf>, HotkeyError> {
    let mut keyboards = Vec::new();

    let input_dir = std::fs::read_dir("/dev/input")
        .map_err(|e| HotkeyError::DeviceAccess(format!("/dev/input: {}", e)))?;

    for entry in input_dir {
        let entry = entry.map_err(|e| HotkeyError::DeviceAccess(e.to_string()))?;
        let path = entry.path();

        if !is_event_device(&path) {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => {
                // A keyboard that can paste has Ctrl and V
                let can_paste = device
                    .supported_keys()
                    .map(|keys| {
                        keys.contains(Key::KEY_V)
                            && (keys.contains(Key::KEY_LEFTCTRL)
                                || keys.contains(Key::KEY_RIGHTCTRL))
                    })
                    .unwrap_or(false);

                if can_paste {
                    tracing::trace!(
                        "Found keyboard: {:?} ({:?})",
                        path,
                        device.name().unwrap_or("unknown")
                    );
                    keyboards.push(path);
                }
            }
            Err(e) => {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    return Err(HotkeyError::DeviceAccess(path.display().to_string()));
                }
                tracing::trace!("Skipping {:?}: {}", path, e);
            }
        }
    }

    Ok(keyboards)
}

/// Only /dev/input/event* nodes carry key events
fn is_event_device(path: &std::path::Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("event"))
        .unwrap_or(false)
}
