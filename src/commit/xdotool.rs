//! xdotool-based Enter key for X11 sessions

use super::{run_key_tool, CommitKey};
use crate::error::CommitError;

/// xdotool-based commit key
pub struct XdotoolKey;

impl XdotoolKey {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XdotoolKey {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommitKey for XdotoolKey {
    async fn press(&self) -> Result<(), CommitError> {
        run_key_tool("xdotool", &["key", "Return"]).await
    }

    async fn is_available(&self) -> bool {
        std::env::var_os("DISPLAY").is_some() && which::which("xdotool").is_ok()
    }

    fn name(&self) -> &'static str {
        "xdotool"
    }
}
