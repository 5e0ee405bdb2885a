//! macOS clipboard via pbcopy / pbpaste

use super::{capture, pipe_to, tool_exists, Clipboard};
use crate::error::ClipboardError;

/// Clipboard backed by pbcopy / pbpaste
#[derive(Debug, Default)]
pub struct PbcopyClipboard;

impl PbcopyClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Clipboard for PbcopyClipboard {
    async fn read(&self) -> Result<String, ClipboardError> {
        capture("pbpaste", &[], None).await
    }

    async fn write(&self, text: &str) -> Result<(), ClipboardError> {
        pipe_to("pbcopy", &[], text).await?;
        tracing::debug!("Copied to clipboard via pbcopy ({} chars)", text.len());
        Ok(())
    }

    async fn is_available(&self) -> bool {
        cfg!(target_os = "macos") && tool_exists("pbcopy") && tool_exists("pbpaste")
    }

    fn name(&self) -> &'static str {
        "clipboard (pbcopy)"
    }
}
