//! Error types for step-paster
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the step-paster application
#[derive(Error, Debug)]
pub enum StepPasterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid sentence settings: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Saved list error: {0}")]
    Queue(#[from] QueueError),

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    #[error("Could not read your answer: {0}")]
    Prompt(String),

    #[error("Another step-paster session is already running (lock: {0})")]
    Locked(PathBuf),
}

/// Errors raised while building the list of sentences
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("the end number ({end}) must not be smaller than the start number ({start})")]
    InvalidRange { start: i64, end: i64 },

    #[error("the words before the number cannot be empty")]
    EmptyPrefix,

    #[error("counting from {start} to {end} makes too many sentences")]
    RangeTooLarge { start: i64, end: i64 },
}

/// Errors from the on-disk list of remaining sentences
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("cannot access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl QueueError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        QueueError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors related to clipboard access
#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("{0} not found in PATH. Install it via your package manager.")]
    ToolNotFound(&'static str),

    #[error("Reading the clipboard failed: {0}")]
    ReadFailed(String),

    #[error("Copying to the clipboard failed: {0}")]
    WriteFailed(String),

    #[error("No clipboard tool available. Install wl-clipboard (Wayland) or xclip (X11).")]
    NoBackend,
}

/// Errors related to global paste chord detection
#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("Cannot open input device '{0}'. Is the user in the 'input' group?\n  Run: sudo usermod -aG input $USER\n  Then log out and back in.")]
    DeviceAccess(String),

    #[error("No keyboard device found in /dev/input/")]
    NoKeyboard,

    #[error("Global key hook not available: {0}")]
    Unavailable(String),
}

/// Errors related to simulating the commit (Enter) key
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("{0} not found in PATH")]
    ToolNotFound(&'static str),

    #[error("Key press simulation failed: {0}")]
    PressFailed(String),

    #[error("All key press methods failed. Install wtype, ydotool or xdotool.")]
    AllMethodsFailed,
}

/// Result type alias using StepPasterError
pub type Result<T> = std::result::Result<T, StepPasterError>;
