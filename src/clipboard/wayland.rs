//! Wayland clipboard via wl-clipboard
//!
//! Uses wl-copy to set the clipboard and wl-paste to read it back.
//! Works on all Wayland compositors.
//!
//! Requires: wl-clipboard package installed

use super::{capture, pipe_to, tool_exists, Clipboard};
use crate::error::ClipboardError;

/// Clipboard backed by wl-copy / wl-paste
#[derive(Debug, Default)]
pub struct WaylandClipboard;

impl WaylandClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Clipboard for WaylandClipboard {
    async fn read(&self) -> Result<String, ClipboardError> {
        // --no-newline keeps the text byte-identical to what was copied
        capture("wl-paste", &["--no-newline"], Some("Nothing is copied")).await
    }

    async fn write(&self, text: &str) -> Result<(), ClipboardError> {
        pipe_to("wl-copy", &[], text).await?;
        tracing::debug!("Copied to clipboard via wl-copy ({} chars)", text.len());
        Ok(())
    }

    async fn is_available(&self) -> bool {
        std::env::var_os("WAYLAND_DISPLAY").is_some()
            && tool_exists("wl-copy")
            && tool_exists("wl-paste")
    }

    fn name(&self) -> &'static str {
        "clipboard (wl-copy)"
    }
}
