//! Step Paster: paste a series of numbered sentences, one at a time
//!
//! This library provides the core functionality for:
//! - Generating numbered sentences with singular/plural wording
//! - Saving the remaining sentences so an interrupted session can resume
//! - Copying each sentence to the clipboard (wl-copy/xclip/pbcopy/native)
//! - Detecting the paste via the global Ctrl/Cmd+V chord (evdev on Linux,
//!   CGEventTap on macOS, a low-level keyboard hook on Windows) racing a
//!   clipboard-change poller
//! - Optionally pressing Enter after each paste (wtype/ydotool/xdotool/osascript)
//!
//! # Architecture
//!
//! ```text
//!          ┌──────────────┐        ┌──────────────┐
//!          │   Sequence   │──────▶ │ Durable list │ (step_paster_list.txt)
//!          │  Generator   │  save  └──────────────┘
//!          └──────────────┘            ▲     │ peek front
//!                                 pop  │     ▼
//!                            ┌─────────────────────────┐
//!                            │   Session Controller    │
//!                            └─────────────────────────┘
//!                              │ copy     │ wait      │ press Enter
//!                              ▼          ▼           ▼
//!                     ┌───────────┐ ┌───────────┐ ┌───────────┐
//!                     │ Clipboard │ │  Paste    │ │  Commit   │
//!                     │           │ │ Detector  │ │   Key     │
//!                     └───────────┘ └───────────┘ └───────────┘
//!                                     │        │
//!                         ┌───────────┘        └──────────┐
//!                         ▼                               ▼
//!                 ┌──────────────┐                ┌──────────────┐
//!                 │ Paste chord  │    first wins  │  Clipboard   │
//!                 │ OS key hook  │ ◀────────────▶ │   polling    │
//!                 └──────────────┘                └──────────────┘
//! ```

pub mod cli;
pub mod clipboard;
pub mod commit;
pub mod config;
pub mod detector;
pub mod error;
pub mod hotkey;
pub mod prompt;
pub mod queue;
pub mod sequence;
pub mod session;
pub mod state;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use detector::{PasteDetector, PasteOutcome};
pub use error::{Result, StepPasterError};
pub use queue::DurableQueue;
pub use sequence::PhraseTemplate;
pub use session::{SessionController, SessionReport, SessionReporter};
