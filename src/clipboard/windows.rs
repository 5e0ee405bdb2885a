//! Native Windows clipboard via arboard
//!
//! Windows has no stock command-line tool that reads the clipboard, so this
//! backend talks to the clipboard API directly on a blocking thread.

use super::Clipboard;
use crate::error::ClipboardError;

/// Clipboard backed by the Win32 clipboard API
#[derive(Debug, Default)]
pub struct WindowsClipboard;

impl WindowsClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Clipboard for WindowsClipboard {
    async fn read(&self) -> Result<String, ClipboardError> {
        tokio::task::spawn_blocking(|| {
            arboard::Clipboard::new()
                .and_then(|mut clipboard| clipboard.get_text())
                .map_err(|e| ClipboardError::ReadFailed(e.to_string()))
        })
        .await
        .map_err(|e| ClipboardError::ReadFailed(e.to_string()))?
    }

    async fn write(&self, text: &str) -> Result<(), ClipboardError> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            arboard::Clipboard::new()
                .and_then(|mut clipboard| clipboard.set_text(text))
                .map_err(|e| ClipboardError::WriteFailed(e.to_string()))
        })
        .await
        .map_err(|e| ClipboardError::WriteFailed(e.to_string()))?
    }

    async fn is_available(&self) -> bool {
        arboard::Clipboard::new().is_ok()
    }

    fn name(&self) -> &'static str {
        "clipboard (windows)"
    }
}
