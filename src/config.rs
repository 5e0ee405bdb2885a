//! Configuration loading and types for step-paster
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/step-paster/config.toml)
//! 3. Environment variables (STEP_PASTER_*)
//! 4. CLI arguments (highest priority)

use crate::error::StepPasterError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the saved list, relative to the working directory
pub const DEFAULT_QUEUE_FILE: &str = "step_paster_list.txt";

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# Step Paster Configuration
#
# Location: ~/.config/step-paster/config.toml
# All settings can be overridden via CLI flags

[detector]
# How often the clipboard is checked for changes, in milliseconds
# 100 = about ten checks per second
poll_interval_ms = 100

# How long to wait for a paste before giving up on a sentence, in seconds
# The default is large enough to mean "wait as long as it takes"
timeout_secs = 999999

# Watch for the paste shortcut (Ctrl+V, or Cmd+V on macOS) anywhere on the system
# On Linux this needs access to /dev/input (user in the 'input' group)
# When unavailable, clipboard watching is used on its own
use_hotkey = true

[session]
# Press Enter automatically after each paste
auto_commit = false

# Pause before pressing Enter, in milliseconds
commit_delay_ms = 200

# After a paste shortcut is seen, wait this long before copying the next
# sentence so the target app has finished reading the clipboard
paste_settle_ms = 150

# Move on to the next sentence when waiting times out
# Set to false to offer the same sentence again instead
advance_on_timeout = true

# Where the remaining sentences are saved (relative to the working directory)
# queue_file = "step_paster_list.txt"

[clipboard]
# Clipboard tool: "auto", "wayland" (wl-copy/wl-paste), "x11" (xclip),
# "macos" (pbcopy/pbpaste) or "windows"
backend = "auto"
"#;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub detector: DetectorConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub clipboard: ClipboardConfig,
}

/// Paste detection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// Clipboard poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on a single wait, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Arm the global paste chord listener when the platform supports it
    #[serde(default = "default_true")]
    pub use_hotkey: bool,
}

impl DetectorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
            use_hotkey: true,
        }
    }
}

/// Session loop configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Press the commit key after every detected paste
    #[serde(default)]
    pub auto_commit: bool,

    /// Delay between detection and the commit key press (ms)
    #[serde(default = "default_commit_delay_ms")]
    pub commit_delay_ms: u64,

    /// Pause after a paste chord before the clipboard is touched again (ms)
    #[serde(default = "default_paste_settle_ms")]
    pub paste_settle_ms: u64,

    /// Pop the current sentence when the detector times out
    #[serde(default = "default_true")]
    pub advance_on_timeout: bool,

    /// Saved list location; None uses DEFAULT_QUEUE_FILE in the working directory
    #[serde(default)]
    pub queue_file: Option<PathBuf>,
}

impl SessionConfig {
    pub fn commit_delay(&self) -> Duration {
        Duration::from_millis(self.commit_delay_ms)
    }

    pub fn paste_settle(&self) -> Duration {
        Duration::from_millis(self.paste_settle_ms)
    }

    /// Resolve the saved list path
    pub fn queue_path(&self) -> PathBuf {
        self.queue_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_QUEUE_FILE))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_commit: false,
            commit_delay_ms: default_commit_delay_ms(),
            paste_settle_ms: default_paste_settle_ms(),
            advance_on_timeout: true,
            queue_file: None,
        }
    }
}

/// Clipboard backend selection
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardBackend {
    /// Pick the first available tool for this platform
    #[default]
    Auto,
    /// wl-copy / wl-paste
    Wayland,
    /// xclip
    X11,
    /// pbcopy / pbpaste
    Macos,
    /// Native Windows clipboard
    Windows,
}

/// Clipboard configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClipboardConfig {
    #[serde(default)]
    pub backend: ClipboardBackend,
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_timeout_secs() -> u64 {
    999_999
}

fn default_commit_delay_ms() -> u64 {
    200
}

fn default_paste_settle_ms() -> u64 {
    150
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "step-paster")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the runtime directory for ephemeral files (lock file)
    pub fn runtime_dir() -> PathBuf {
        // Use XDG_RUNTIME_DIR if available, otherwise fall back to the temp dir
        std::env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir())
            .join("step-paster")
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, StepPasterError> {
    let mut config = Config::default();

    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| StepPasterError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| StepPasterError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Apply STEP_PASTER_* overrides using the given variable lookup
fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(ms) = var("STEP_PASTER_POLL_MS") {
        match ms.parse() {
            Ok(ms) => config.detector.poll_interval_ms = ms,
            Err(_) => tracing::warn!("Ignoring STEP_PASTER_POLL_MS={:?}: not a number", ms),
        }
    }
    if let Some(file) = var("STEP_PASTER_QUEUE_FILE") {
        config.session.queue_file = Some(PathBuf::from(file));
    }
    if let Some(hotkey) = var("STEP_PASTER_HOTKEY") {
        config.detector.use_hotkey = !matches!(
            hotkey.to_lowercase().as_str(),
            "0" | "false" | "off" | "no" | "disabled"
        );
    }
}
