//! Enter key through rdev's input simulation (Windows)

use super::CommitKey;
use crate::error::CommitError;
use rdev::{simulate, EventType, Key};
use std::time::Duration;

/// Pause between synthetic events so the target sees both
const EVENT_GAP: Duration = Duration::from_millis(20);

/// rdev-based commit key
pub struct RdevKey;

impl RdevKey {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RdevKey {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommitKey for RdevKey {
    async fn press(&self) -> Result<(), CommitError> {
        tokio::task::spawn_blocking(|| {
            for event in [EventType::KeyPress(Key::Return), EventType::KeyRelease(Key::Return)] {
                simulate(&event)
                    .map_err(|e| CommitError::PressFailed(format!("rdev: {:?}", e)))?;
                std::thread::sleep(EVENT_GAP);
            }
            Ok(())
        })
        .await
        .map_err(|e| CommitError::PressFailed(e.to_string()))?
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "rdev"
    }
}
