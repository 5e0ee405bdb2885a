//! Windows paste chord listener using a low-level keyboard hook
//!
//! Each run installs a `WH_KEYBOARD_LL` hook on a dedicated thread that
//! pumps messages until it receives `WM_QUIT`. Stopping posts `WM_QUIT`,
//! and the thread unhooks before it exits; `stop` joins it.

use super::{ChordKey, ChordTracker, HotkeyEvent, PasteChordListener};
use crate::error::HotkeyError;
use std::cell::RefCell;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use winapi::shared::minwindef::{DWORD, LPARAM, LRESULT, WPARAM};
use winapi::um::libloaderapi::GetModuleHandleW;
use winapi::um::processthreadsapi::GetCurrentThreadId;
use winapi::um::winuser::{
    CallNextHookEx, GetMessageW, PeekMessageW, PostThreadMessageW, SetWindowsHookExW,
    UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, MSG, PM_NOREMOVE, VK_LCONTROL, VK_RCONTROL,
    WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN, WM_SYSKEYUP, WM_USER,
};

/// Virtual key code of the V key
const VK_V: DWORD = 0x56;

/// Chord state for the hook thread; the hook procedure has no user data
struct HookState {
    tracker: ChordTracker,
    tx: mpsc::Sender<HotkeyEvent>,
}

thread_local! {
    static HOOK_STATE: RefCell<Option<HookState>> = RefCell::new(None);
}

/// The hook thread of the current run
struct HookThread {
    thread_id: DWORD,
    handle: JoinHandle<()>,
}

/// Low-level keyboard hook listener
pub struct WindowsListener {
    hook_thread: Option<HookThread>,
}

impl WindowsListener {
    /// Create a new Windows listener
    pub fn new() -> Result<Self, HotkeyError> {
        Ok(Self { hook_thread: None })
    }
}

#[async_trait::async_trait]
impl PasteChordListener for WindowsListener {
    async fn start(&mut self) -> Result<mpsc::Receiver<HotkeyEvent>, HotkeyError> {
        self.stop().await?;

        let (tx, rx) = mpsc::channel(8);
        let (ready_tx, ready_rx) = oneshot::channel();

        let handle = std::thread::Builder::new()
            .name("paste-chord-hook".to_string())
            .spawn(move || hook_thread(tx, ready_tx))
            .map_err(|e| HotkeyError::Unavailable(format!("cannot spawn hook thread: {}", e)))?;

        match ready_rx.await {
            Ok(Ok(thread_id)) => {
                self.hook_thread = Some(HookThread { thread_id, handle });
                Ok(rx)
            }
            Ok(Err(e)) => {
                join_hook_thread(handle).await;
                Err(e)
            }
            Err(_) => {
                join_hook_thread(handle).await;
                Err(HotkeyError::Unavailable(
                    "keyboard hook thread exited during setup".to_string(),
                ))
            }
        }
    }

    async fn stop(&mut self) -> Result<(), HotkeyError> {
        if let Some(HookThread { thread_id, handle }) = self.hook_thread.take() {
            // A failed post means the thread's queue is gone, i.e. it already exited
            if unsafe { PostThreadMessageW(thread_id, WM_QUIT, 0, 0) } == 0 {
                tracing::debug!(
                    "WM_QUIT not delivered: {}",
                    std::io::Error::last_os_error()
                );
            }
            join_hook_thread(handle).await;
            tracing::debug!("Paste chord keyboard hook removed");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "keyboard hook"
    }
}

async fn join_hook_thread(handle: JoinHandle<()>) {
    match tokio::task::spawn_blocking(move || handle.join()).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => tracing::warn!("Paste chord hook thread panicked"),
        Err(e) => tracing::warn!("Could not join paste chord hook thread: {}", e),
    }
}

/// Map a virtual key code to its role in the paste chord
fn chord_key(vk_code: DWORD) -> ChordKey {
    match vk_code {
        vk if vk == VK_LCONTROL as DWORD => ChordKey::LeftModifier,
        vk if vk == VK_RCONTROL as DWORD => ChordKey::RightModifier,
        VK_V => ChordKey::V,
        _ => ChordKey::Other,
    }
}

/// Key transition carried by a hook message, if it is one
fn key_transition(message: u32) -> Option<bool> {
    match message {
        WM_KEYDOWN | WM_SYSKEYDOWN => Some(true),
        WM_KEYUP | WM_SYSKEYUP => Some(false),
        _ => None,
    }
}

unsafe extern "system" fn keyboard_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION {
        if let Some(pressed) = key_transition(wparam as u32) {
            let info = &*(lparam as *const KBDLLHOOKSTRUCT);
            HOOK_STATE.with(|state| {
                if let Some(state) = state.borrow_mut().as_mut() {
                    if state.tracker.update(chord_key(info.vkCode), pressed) {
                        tracing::debug!("Paste chord (Windows)");
                        let _ = state.tx.try_send(HotkeyEvent::PasteChord);
                    }
                }
            });
        }
    }

    CallNextHookEx(std::ptr::null_mut(), code, wparam, lparam)
}

/// Owns the keyboard hook for one run
fn hook_thread(
    tx: mpsc::Sender<HotkeyEvent>,
    ready: oneshot::Sender<Result<DWORD, HotkeyError>>,
) {
    HOOK_STATE.with(|state| {
        *state.borrow_mut() = Some(HookState {
            tracker: ChordTracker::default(),
            tx,
        });
    });

    unsafe {
        let mut msg: MSG = std::mem::zeroed();
        // Create this thread's message queue so WM_QUIT can be posted to it
        PeekMessageW(&mut msg, std::ptr::null_mut(), WM_USER, WM_USER, PM_NOREMOVE);

        let hook = SetWindowsHookExW(
            WH_KEYBOARD_LL,
            Some(keyboard_proc),
            GetModuleHandleW(std::ptr::null()),
            0,
        );
        if hook.is_null() {
            let error = std::io::Error::last_os_error();
            HOOK_STATE.with(|state| state.borrow_mut().take());
            let _ = ready.send(Err(HotkeyError::Unavailable(format!(
                "SetWindowsHookExW failed: {}",
                error
            ))));
            return;
        }

        if ready.send(Ok(GetCurrentThreadId())).is_ok() {
            // Hook callbacks run inside GetMessageW; 0 is WM_QUIT, -1 an error
            while GetMessageW(&mut msg, std::ptr::null_mut(), 0, 0) > 0 {}
        }

        if UnhookWindowsHookEx(hook) == 0 {
            tracing::warn!(
                "UnhookWindowsHookEx failed: {}",
                std::io::Error::last_os_error()
            );
        }
    }

    HOOK_STATE.with(|state| state.borrow_mut().take());
}
