//! Paste shortcut detection
//!
//! Watches for the platform paste chord anywhere on the system:
//! Ctrl+V on Linux and Windows, Cmd+V on macOS.
//!
//! On Linux, key events are read at the kernel level through evdev, which
//! works on every Wayland compositor and on X11. The user must be in the
//! 'input' group.
//!
//! On macOS, a listen-only CGEventTap is created for every run (needs
//! Accessibility permission). On Windows, a low-level keyboard hook is
//! installed for every run. Both are removed again by `stop`.
//!
//! When no listener can be created the caller falls back to clipboard
//! watching, so every error from [`create_listener`] means "not available
//! here" rather than "abort".

#[cfg(target_os = "linux")]
pub mod evdev_listener;
#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "windows")]
pub mod windows;

use crate::error::HotkeyError;
use tokio::sync::mpsc;

/// Events emitted by a paste chord listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// The paste chord went down (repeats are not reported)
    PasteChord,
}

/// Trait for paste chord listener implementations
///
/// A listener can be started and stopped repeatedly. `stop` must not
/// return until the OS-level hook for that run has been released.
#[async_trait::async_trait]
pub trait PasteChordListener: Send {
    /// Start listening for the paste chord
    /// Returns a channel receiver for events
    async fn start(&mut self) -> Result<mpsc::Receiver<HotkeyEvent>, HotkeyError>;

    /// Stop listening and release the hook
    async fn stop(&mut self) -> Result<(), HotkeyError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Create the paste chord listener for this platform
///
/// On Linux, uses evdev for kernel-level key event detection.
#[cfg(target_os = "linux")]
pub fn create_listener() -> Result<Box<dyn PasteChordListener>, HotkeyError> {
    Ok(Box::new(evdev_listener::EvdevListener::new()?))
}

/// Create the paste chord listener for this platform
///
/// On macOS, uses a Quartz event tap.
#[cfg(target_os = "macos")]
pub fn create_listener() -> Result<Box<dyn PasteChordListener>, HotkeyError> {
    Ok(Box::new(macos::MacOSListener::new()?))
}

/// Create the paste chord listener for this platform
///
/// On Windows, uses a low-level keyboard hook.
#[cfg(target_os = "windows")]
pub fn create_listener() -> Result<Box<dyn PasteChordListener>, HotkeyError> {
    Ok(Box::new(windows::WindowsListener::new()?))
}

/// Create the paste chord listener for this platform
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub fn create_listener() -> Result<Box<dyn PasteChordListener>, HotkeyError> {
    Err(HotkeyError::Unavailable(format!(
        "no global key hook on {}",
        std::env::consts::OS
    )))
}

/// Human-readable paste chord for this platform
pub fn paste_chord_label() -> &'static str {
    if cfg!(target_os = "macos") {
        "Cmd+V"
    } else {
        "Ctrl+V"
    }
}

/// Tracks modifier state and reports when the paste chord goes down
///
/// Shared by the platform listeners so the chord logic is written once.
#[derive(Debug, Default)]
pub(crate) struct ChordTracker {
    left_modifier: bool,
    right_modifier: bool,
    v_down: bool,
}

/// Which physical key a raw event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChordKey {
    LeftModifier,
    RightModifier,
    V,
    Other,
}

impl ChordTracker {
    /// Feed one key transition; returns true when the chord fires
    pub(crate) fn update(&mut self, key: ChordKey, pressed: bool) -> bool {
        match key {
            ChordKey::LeftModifier => self.left_modifier = pressed,
            ChordKey::RightModifier => self.right_modifier = pressed,
            ChordKey::V => {
                let fired = pressed && !self.v_down && (self.left_modifier || self.right_modifier);
                self.v_down = pressed;
                return fired;
            }
            ChordKey::Other => {}
        }
        false
    }
}
