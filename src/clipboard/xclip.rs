//! xclip-based clipboard for X11
//!
//! Uses xclip on the CLIPBOARD selection (the one Ctrl+V pastes from).
//!
//! Requires: xclip package installed

use super::{capture, pipe_to, tool_exists, Clipboard};
use crate::error::ClipboardError;

/// Clipboard backed by xclip
#[derive(Debug, Default)]
pub struct XclipClipboard;

impl XclipClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Clipboard for XclipClipboard {
    async fn read(&self) -> Result<String, ClipboardError> {
        capture(
            "xclip",
            &["-selection", "clipboard", "-o"],
            Some("target STRING not available"),
        )
        .await
    }

    async fn write(&self, text: &str) -> Result<(), ClipboardError> {
        pipe_to("xclip", &["-selection", "clipboard"], text).await?;
        tracing::debug!("Copied to clipboard via xclip ({} chars)", text.len());
        Ok(())
    }

    async fn is_available(&self) -> bool {
        std::env::var_os("DISPLAY").is_some() && tool_exists("xclip")
    }

    fn name(&self) -> &'static str {
        "clipboard (xclip)"
    }
}
