//! macOS Enter key via osascript/AppleScript
//!
//! Uses System Events to press Return in the frontmost application.
//! Requires Accessibility permissions for the terminal/app running step-paster.

use super::{run_key_tool, CommitKey};
use crate::error::CommitError;

/// AppleScript that presses Return (virtual key code 36)
const PRESS_RETURN: &str = r#"tell application "System Events" to key code 36"#;

/// macOS commit key using osascript
pub struct OsascriptKey;

impl OsascriptKey {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OsascriptKey {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommitKey for OsascriptKey {
    async fn press(&self) -> Result<(), CommitError> {
        run_key_tool("osascript", &["-e", PRESS_RETURN]).await
    }

    async fn is_available(&self) -> bool {
        which::which("osascript").is_ok()
    }

    fn name(&self) -> &'static str {
        "osascript"
    }
}
