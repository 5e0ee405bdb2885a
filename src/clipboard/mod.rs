//! Clipboard access
//!
//! Reads and writes the system clipboard through external tools, the same
//! way on every platform: spawn the tool, pipe text in or read text out.
//!
//! Selection order for `backend = "auto"`:
//! 1. wl-copy / wl-paste - Wayland
//! 2. xclip - X11
//! 3. pbcopy / pbpaste - macOS
//! 4. native clipboard - Windows

pub mod pbcopy;
pub mod wayland;
#[cfg(windows)]
pub mod windows;
pub mod xclip;

use crate::config::{ClipboardBackend, ClipboardConfig};
use crate::error::ClipboardError;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Trait for clipboard implementations
#[async_trait::async_trait]
pub trait Clipboard: Send + Sync {
    /// Current clipboard text
    async fn read(&self) -> Result<String, ClipboardError>;

    /// Replace the clipboard text
    async fn write(&self, text: &str) -> Result<(), ClipboardError>;

    /// Check if this clipboard tool is available
    async fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Candidate backends for the configured selection, in preference order
fn candidates(backend: ClipboardBackend) -> Vec<Arc<dyn Clipboard>> {
    let wayland: Arc<dyn Clipboard> = Arc::new(wayland::WaylandClipboard::new());
    let x11: Arc<dyn Clipboard> = Arc::new(xclip::XclipClipboard::new());
    let macos: Arc<dyn Clipboard> = Arc::new(pbcopy::PbcopyClipboard::new());

    match backend {
        ClipboardBackend::Wayland => vec![wayland],
        ClipboardBackend::X11 => vec![x11],
        ClipboardBackend::Macos => vec![macos],
        #[cfg(windows)]
        ClipboardBackend::Windows => vec![Arc::new(windows::WindowsClipboard::new())],
        #[cfg(not(windows))]
        ClipboardBackend::Windows => vec![],
        ClipboardBackend::Auto => {
            let mut chain = Vec::new();
            if cfg!(target_os = "macos") {
                chain.push(macos);
            } else {
                // Prefer Wayland tools only inside a Wayland session
                if std::env::var_os("WAYLAND_DISPLAY").is_some() {
                    chain.push(wayland);
                    chain.push(x11);
                } else {
                    chain.push(x11);
                    chain.push(wayland);
                }
            }
            #[cfg(windows)]
            chain.push(Arc::new(windows::WindowsClipboard::new()));
            chain
        }
    }
}

/// Pick the first available clipboard backend
pub async fn create_clipboard(
    config: &ClipboardConfig,
) -> Result<Arc<dyn Clipboard>, ClipboardError> {
    for clipboard in candidates(config.backend) {
        if clipboard.is_available().await {
            tracing::debug!("Using clipboard backend: {}", clipboard.name());
            return Ok(clipboard);
        }
        tracing::debug!("{} not available, trying next", clipboard.name());
    }

    Err(ClipboardError::NoBackend)
}

/// True if `tool` can be found in PATH
pub(crate) fn tool_exists(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Spawn `program` and write `text` to its stdin
pub(crate) async fn pipe_to(
    program: &'static str,
    args: &[&str],
    text: &str,
) -> Result<(), ClipboardError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ClipboardError::ToolNotFound(program)
            } else {
                ClipboardError::WriteFailed(e.to_string())
            }
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()))?;

        // Close stdin to signal EOF
        drop(stdin);
    }

    let status = child
        .wait()
        .await
        .map_err(|e| ClipboardError::WriteFailed(e.to_string()))?;

    if !status.success() {
        return Err(ClipboardError::WriteFailed(format!(
            "{} exited with {}",
            program, status
        )));
    }

    Ok(())
}

/// Run `program` and return its stdout as text
///
/// `empty_marker` is a stderr fragment the tool prints when the clipboard
/// holds nothing; that case reads as an empty string.
pub(crate) async fn capture(
    program: &'static str,
    args: &[&str],
    empty_marker: Option<&str>,
) -> Result<String, ClipboardError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ClipboardError::ToolNotFound(program)
            } else {
                ClipboardError::ReadFailed(e.to_string())
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if empty_marker.is_some_and(|marker| stderr.contains(marker)) {
            return Ok(String::new());
        }
        return Err(ClipboardError::ReadFailed(format!(
            "{}: {}",
            program,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
