//! wtype-based Enter key
//!
//! Preferred on Wayland: no daemon required.
//!
//! Requires:
//! - wtype installed
//! - Running on Wayland (WAYLAND_DISPLAY set)

use super::{run_key_tool, CommitKey};
use crate::error::CommitError;

/// wtype-based commit key
pub struct WtypeKey;

impl WtypeKey {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WtypeKey {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommitKey for WtypeKey {
    async fn press(&self) -> Result<(), CommitError> {
        run_key_tool("wtype", &["-k", "Return"]).await
    }

    async fn is_available(&self) -> bool {
        // wtype only talks to Wayland compositors
        std::env::var_os("WAYLAND_DISPLAY").is_some() && which::which("wtype").is_ok()
    }

    fn name(&self) -> &'static str {
        "wtype"
    }
}
