//! macOS paste chord listener using CGEventTap
//!
//! Each run creates a listen-only Quartz event tap on its own thread and
//! drives that thread's CFRunLoop until asked to stop. Stopping removes the
//! tap's run loop source, releases the tap and joins the thread, so no
//! global key hook survives between waits.
//!
//! Requires Accessibility permission for the terminal or app running
//! step-paster (System Settings > Privacy & Security > Accessibility).

use super::{ChordKey, ChordTracker, HotkeyEvent, PasteChordListener};
use crate::error::HotkeyError;
use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventTapProxy, CGEventType, EventField,
};
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// kVK_ANSI_V in Carbon HIToolbox Events.h
const KEY_V: u16 = 0x09;

/// How often the run loop wakes up to check for a stop request
const RUN_LOOP_SLICE: Duration = Duration::from_millis(50);

/// CGEventTap-based paste chord listener
pub struct MacOSListener {
    /// Tells the tap thread to tear down
    stop_flag: Arc<AtomicBool>,
    /// Thread owning the tap for the current run
    tap_thread: Option<JoinHandle<()>>,
}

impl MacOSListener {
    /// Create a new macOS listener
    pub fn new() -> Result<Self, HotkeyError> {
        if !accessibility_granted() {
            return Err(HotkeyError::Unavailable(
                "Accessibility permission not granted. Grant access in:\n  \
                 System Settings > Privacy & Security > Accessibility\n  \
                 Add your terminal application, then restart step-paster."
                    .to_string(),
            ));
        }

        Ok(Self {
            stop_flag: Arc::new(AtomicBool::new(false)),
            tap_thread: None,
        })
    }
}

/// Check Accessibility permission without prompting
fn accessibility_granted() -> bool {
    #[link(name = "ApplicationServices", kind = "framework")]
    extern "C" {
        fn AXIsProcessTrusted() -> bool;
    }

    unsafe { AXIsProcessTrusted() }
}

#[async_trait::async_trait]
impl PasteChordListener for MacOSListener {
    async fn start(&mut self) -> Result<mpsc::Receiver<HotkeyEvent>, HotkeyError> {
        self.stop().await?;

        let (tx, rx) = mpsc::channel(8);
        let (ready_tx, ready_rx) = oneshot::channel();
        self.stop_flag.store(false, Ordering::SeqCst);
        let stop_flag = self.stop_flag.clone();

        let handle = std::thread::Builder::new()
            .name("paste-chord-tap".to_string())
            .spawn(move || tap_thread(tx, ready_tx, stop_flag))
            .map_err(|e| HotkeyError::Unavailable(format!("cannot spawn tap thread: {}", e)))?;

        match ready_rx.await {
            Ok(Ok(())) => {
                self.tap_thread = Some(handle);
                Ok(rx)
            }
            Ok(Err(e)) => {
                join_tap_thread(handle).await;
                Err(e)
            }
            Err(_) => {
                join_tap_thread(handle).await;
                Err(HotkeyError::Unavailable(
                    "event tap thread exited during setup".to_string(),
                ))
            }
        }
    }

    async fn stop(&mut self) -> Result<(), HotkeyError> {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.tap_thread.take() {
            join_tap_thread(handle).await;
            tracing::debug!("Paste chord event tap removed");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "CGEventTap"
    }
}

async fn join_tap_thread(handle: JoinHandle<()>) {
    match tokio::task::spawn_blocking(move || handle.join()).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => tracing::warn!("Paste chord tap thread panicked"),
        Err(e) => tracing::warn!("Could not join paste chord tap thread: {}", e),
    }
}

/// Map a virtual key code to its role in the paste chord
fn chord_key(key_code: u16) -> ChordKey {
    if key_code == KEY_V {
        ChordKey::V
    } else {
        ChordKey::Other
    }
}

/// Feed one tapped event to the tracker; returns true when the chord fires
///
/// Command keys arrive as FlagsChanged rather than KeyDown/KeyUp, and every
/// event carries the current flags, so the modifier is synced from them.
fn observe(
    tracker: &mut ChordTracker,
    event_type: CGEventType,
    key_code: u16,
    flags: CGEventFlags,
) -> bool {
    tracker.update(
        ChordKey::LeftModifier,
        flags.contains(CGEventFlags::CGEventFlagCommand),
    );
    match event_type {
        CGEventType::KeyDown => tracker.update(chord_key(key_code), true),
        CGEventType::KeyUp => tracker.update(chord_key(key_code), false),
        _ => false,
    }
}

/// Owns the event tap for one run
fn tap_thread(
    tx: mpsc::Sender<HotkeyEvent>,
    ready: oneshot::Sender<Result<(), HotkeyError>>,
    stop_flag: Arc<AtomicBool>,
) {
    let tracker = RefCell::new(ChordTracker::default());

    let callback = move |_proxy: CGEventTapProxy,
                         event_type: CGEventType,
                         event: &CGEvent|
          -> Option<CGEvent> {
        let key_code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
        let fired = observe(
            &mut tracker.borrow_mut(),
            event_type,
            key_code,
            event.get_flags(),
        );

        if fired {
            tracing::debug!("Paste chord (macOS)");
            // A full channel means a chord is already pending
            let _ = tx.try_send(HotkeyEvent::PasteChord);
        }

        // Listen-only: hand the event on unchanged
        Some(event.clone())
    };

    let tap = match CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![
            CGEventType::KeyDown,
            CGEventType::KeyUp,
            CGEventType::FlagsChanged,
        ],
        callback,
    ) {
        Ok(tap) => tap,
        Err(()) => {
            let _ = ready.send(Err(HotkeyError::Unavailable(
                "Failed to create event tap. Ensure Accessibility permission is granted."
                    .to_string(),
            )));
            return;
        }
    };

    let source = match tap.mach_port.create_runloop_source(0) {
        Ok(source) => source,
        Err(()) => {
            let _ = ready.send(Err(HotkeyError::Unavailable(
                "Failed to create run loop source".to_string(),
            )));
            return;
        }
    };

    let run_loop = CFRunLoop::get_current();
    run_loop.add_source(&source, unsafe { kCFRunLoopCommonModes });
    tap.enable();

    if ready.send(Ok(())).is_err() {
        stop_flag.store(true, Ordering::SeqCst);
    }

    while !stop_flag.load(Ordering::SeqCst) {
        CFRunLoop::run_in_mode(unsafe { kCFRunLoopDefaultMode }, RUN_LOOP_SLICE, true);
    }

    // Detach from the run loop before the tap's mach port is released
    run_loop.remove_source(&source, unsafe { kCFRunLoopCommonModes });
    drop(source);
    drop(tap);
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMAND: CGEventFlags = CGEventFlags::CGEventFlagCommand;

    #[test]
    fn test_chord_key_mapping() {
        assert_eq!(chord_key(KEY_V), ChordKey::V);
        // kVK_ANSI_C
        assert_eq!(chord_key(0x08), ChordKey::Other);
    }

    #[test]
    fn test_command_v_fires_once_per_press() {
        let mut tracker = ChordTracker::default();

        assert!(!observe(&mut tracker, CGEventType::FlagsChanged, 0x37, COMMAND));
        assert!(observe(&mut tracker, CGEventType::KeyDown, KEY_V, COMMAND));
        // Auto-repeat
        assert!(!observe(&mut tracker, CGEventType::KeyDown, KEY_V, COMMAND));
        assert!(!observe(&mut tracker, CGEventType::KeyUp, KEY_V, COMMAND));
        assert!(observe(&mut tracker, CGEventType::KeyDown, KEY_V, COMMAND));
    }

    #[test]
    fn test_plain_v_after_command_release_does_not_fire() {
        let mut tracker = ChordTracker::default();
        let empty = CGEventFlags::empty();

        observe(&mut tracker, CGEventType::FlagsChanged, 0x37, COMMAND);
        observe(&mut tracker, CGEventType::FlagsChanged, 0x37, empty);
        assert!(!observe(&mut tracker, CGEventType::KeyDown, KEY_V, empty));
    }

    #[test]
    fn test_command_held_before_tap_is_picked_up_from_flags() {
        let mut tracker = ChordTracker::default();
        assert!(observe(&mut tracker, CGEventType::KeyDown, KEY_V, COMMAND));
    }
}
