//! ydotool-based Enter key
//!
//! Uses the uinput kernel interface, so it works on X11, Wayland and TTYs.
//!
//! Requires:
//! - ydotool installed
//! - ydotoold daemon running (systemctl --user start ydotool)
//! - User in 'input' group

use super::{run_key_tool, CommitKey};
use crate::error::CommitError;

/// Linux input event code for the Enter key
const KEY_ENTER: u16 = 28;

/// ydotool-based commit key
pub struct YdotoolKey;

impl YdotoolKey {
    pub fn new() -> Self {
        Self
    }

    /// `key` arguments for a press and release of `code`
    fn key_args(code: u16) -> [String; 3] {
        ["key".to_string(), format!("{}:1", code), format!("{}:0", code)]
    }
}

impl Default for YdotoolKey {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommitKey for YdotoolKey {
    async fn press(&self) -> Result<(), CommitError> {
        let args = Self::key_args(KEY_ENTER);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_key_tool("ydotool", &args).await
    }

    async fn is_available(&self) -> bool {
        which::which("ydotool").is_ok()
    }

    fn name(&self) -> &'static str {
        "ydotool"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_key_args() {
        assert_eq!(YdotoolKey::key_args(KEY_ENTER), ["key", "28:1", "28:0"]);
    }
}
