//! Commit key simulation
//!
//! After a paste is detected the session can press Enter on the user's
//! behalf, e.g. to submit a chat message or move to the next spreadsheet
//! row. This is best effort: a failure is logged and the session moves on.
//!
//! Fallback chain:
//! - Linux: wtype (Wayland), ydotool (uinput, needs ydotoold), xdotool (X11)
//! - macOS: osascript / System Events (needs Accessibility permission)
//! - Windows: rdev key simulation

#[cfg(target_os = "macos")]
pub mod osascript;
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub mod rdev_key;
#[cfg(target_os = "linux")]
pub mod wtype;
#[cfg(target_os = "linux")]
pub mod xdotool;
#[cfg(target_os = "linux")]
pub mod ydotool;

use crate::error::CommitError;
use std::process::Stdio;
use tokio::process::Command;

/// Trait for commit key implementations
#[async_trait::async_trait]
pub trait CommitKey: Send + Sync {
    /// Press and release Enter
    async fn press(&self) -> Result<(), CommitError>;

    /// Check if this method is available
    async fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Factory function that returns the fallback chain for this platform
pub fn create_commit_chain() -> Vec<Box<dyn CommitKey>> {
    let mut chain: Vec<Box<dyn CommitKey>> = Vec::new();

    #[cfg(target_os = "linux")]
    {
        // Wayland-native, no daemon
        chain.push(Box::new(wtype::WtypeKey::new()));
        // Works on X11/Wayland/TTY, requires daemon
        chain.push(Box::new(ydotool::YdotoolKey::new()));
        chain.push(Box::new(xdotool::XdotoolKey::new()));
    }

    #[cfg(target_os = "macos")]
    chain.push(Box::new(osascript::OsascriptKey::new()));

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    chain.push(Box::new(rdev_key::RdevKey::new()));

    chain
}

/// Try each method in the chain until one succeeds
pub async fn press_with_fallback(chain: &[Box<dyn CommitKey>]) -> Result<(), CommitError> {
    for key in chain {
        if !key.is_available().await {
            tracing::debug!("{} not available, trying next", key.name());
            continue;
        }

        match key.press().await {
            Ok(()) => {
                tracing::debug!("Enter pressed via {}", key.name());
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("{} failed: {}, trying next", key.name(), e);
            }
        }
    }

    Err(CommitError::AllMethodsFailed)
}

/// Run a key tool to completion, mapping spawn and exit failures
#[cfg_attr(not(any(target_os = "linux", target_os = "macos")), allow(dead_code))]
pub(crate) async fn run_key_tool(program: &'static str, args: &[&str]) -> Result<(), CommitError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommitError::ToolNotFound(program)
            } else {
                CommitError::PressFailed(format!("{}: {}", program, e))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CommitError::PressFailed(format!(
            "{} failed: {}",
            program,
            stderr.trim()
        )));
    }

    Ok(())
}
