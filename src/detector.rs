//! Paste detection
//!
//! Waits until the user pastes the sentence currently on the clipboard.
//! Two independent watchers can race for each wait:
//!
//! - the paste chord listener (Ctrl+V / Cmd+V anywhere on the system)
//! - clipboard polling, which fires when the clipboard no longer holds the
//!   text it held when the wait started
//!
//! Which watchers run is decided once by [`probe_sources`]. A wait ends in
//! exactly one [`PasteOutcome`], and every watcher has released its OS
//! resources by the time [`PasteDetector::detect`] returns.

use crate::clipboard::Clipboard;
use crate::config::DetectorConfig;
use crate::hotkey::{self, HotkeyEvent, PasteChordListener};
use crate::state::{DetectorPhase, OutcomeSlot};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// How a single wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteOutcome {
    /// The user pasted (or the clipboard changed); carries the winning signal
    Detected(PasteSignal),
    /// Nothing happened before the deadline
    TimedOut,
    /// The session was cancelled while waiting
    Cancelled,
}

impl PasteOutcome {
    fn from_phase(phase: DetectorPhase, winner: Option<PasteSignal>) -> Option<Self> {
        match phase {
            DetectorPhase::Detected => winner.map(PasteOutcome::Detected),
            DetectorPhase::TimedOut => Some(PasteOutcome::TimedOut),
            DetectorPhase::Cancelled => Some(PasteOutcome::Cancelled),
            DetectorPhase::Idle | DetectorPhase::Watching => None,
        }
    }
}

/// Which watcher reported a paste
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteSignal {
    Hotkey,
    ClipboardChanged,
}

impl std::fmt::Display for PasteSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasteSignal::Hotkey => write!(f, "paste shortcut"),
            PasteSignal::ClipboardChanged => write!(f, "clipboard change"),
        }
    }
}

/// How a watcher's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchResult {
    /// The watcher saw its signal
    Observed,
    /// Asked to stop before seeing anything
    Stopped,
    /// The watcher could not run this time
    Unavailable,
}

/// A strategy for noticing a paste
#[derive(Clone)]
pub enum PasteSignalSource {
    Hotkey(HotkeyWatcher),
    ClipboardPoll(ClipboardPollWatcher),
}

impl PasteSignalSource {
    pub fn signal(&self) -> PasteSignal {
        match self {
            PasteSignalSource::Hotkey(_) => PasteSignal::Hotkey,
            PasteSignalSource::ClipboardPoll(_) => PasteSignal::ClipboardChanged,
        }
    }

    /// Human-readable description for the console
    pub fn describe(&self) -> String {
        match self {
            PasteSignalSource::Hotkey(watcher) => {
                format!("{} via {}", hotkey::paste_chord_label(), watcher.name)
            }
            PasteSignalSource::ClipboardPoll(watcher) => {
                format!("clipboard changes via {}", watcher.clipboard.name())
            }
        }
    }

    async fn watch(&self, stop: CancellationToken) -> WatchResult {
        match self {
            PasteSignalSource::Hotkey(watcher) => watcher.watch(stop).await,
            PasteSignalSource::ClipboardPoll(watcher) => watcher.watch(stop).await,
        }
    }
}

/// Watches the global paste chord
///
/// The listener is armed at the start of every wait and stopped at its end,
/// so no key hook stays installed between sentences.
#[derive(Clone)]
pub struct HotkeyWatcher {
    listener: Arc<Mutex<Box<dyn PasteChordListener>>>,
    name: &'static str,
}

impl HotkeyWatcher {
    pub fn new(listener: Box<dyn PasteChordListener>) -> Self {
        let name = listener.name();
        Self {
            listener: Arc::new(Mutex::new(listener)),
            name,
        }
    }

    async fn watch(&self, stop: CancellationToken) -> WatchResult {
        let mut listener = self.listener.lock().await;

        let mut events = match listener.start().await {
            Ok(events) => events,
            Err(e) => {
                tracing::info!("Paste shortcut listener could not start: {}", e);
                return WatchResult::Unavailable;
            }
        };

        let result = tokio::select! {
            _ = stop.cancelled() => WatchResult::Stopped,
            event = events.recv() => match event {
                Some(HotkeyEvent::PasteChord) => WatchResult::Observed,
                None => WatchResult::Unavailable,
            },
        };

        drop(events);
        if let Err(e) = listener.stop().await {
            tracing::warn!("Failed to stop {} listener: {}", self.name, e);
        }

        result
    }
}

/// Polls the clipboard and fires when it differs from the baseline
#[derive(Clone)]
pub struct ClipboardPollWatcher {
    clipboard: Arc<dyn Clipboard>,
    interval: Duration,
}

impl ClipboardPollWatcher {
    pub fn new(clipboard: Arc<dyn Clipboard>, interval: Duration) -> Self {
        Self {
            clipboard,
            interval,
        }
    }

    async fn watch(&self, stop: CancellationToken) -> WatchResult {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first successful read is the baseline
        let mut baseline: Option<String> = None;

        loop {
            tokio::select! {
                _ = stop.cancelled() => return WatchResult::Stopped,
                _ = ticker.tick() => {}
            }

            let snapshot = tokio::select! {
                _ = stop.cancelled() => return WatchResult::Stopped,
                read = self.clipboard.read() => read,
            };

            match snapshot {
                Ok(current) => match &baseline {
                    None => baseline = Some(current),
                    Some(previous) if *previous != current => return WatchResult::Observed,
                    Some(_) => {}
                },
                Err(e) => {
                    tracing::trace!("Clipboard read failed, treating as unchanged: {}", e);
                }
            }
        }
    }
}

/// Pick the watchers this machine can run
///
/// Clipboard polling is always included. The paste chord listener is added
/// when enabled and the platform hook can be created.
pub fn probe_sources(
    config: &DetectorConfig,
    clipboard: Arc<dyn Clipboard>,
) -> Vec<PasteSignalSource> {
    let mut sources = Vec::new();

    if config.use_hotkey {
        match hotkey::create_listener() {
            Ok(listener) => {
                tracing::debug!("Paste shortcut listener: {}", listener.name());
                sources.push(PasteSignalSource::Hotkey(HotkeyWatcher::new(listener)));
            }
            Err(e) => {
                tracing::info!(
                    "Paste shortcut detection unavailable, watching the clipboard only: {}",
                    e
                );
            }
        }
    } else {
        tracing::debug!("Paste shortcut detection disabled");
    }

    sources.push(PasteSignalSource::ClipboardPoll(ClipboardPollWatcher::new(
        clipboard,
        config.poll_interval(),
    )));

    sources
}

/// Races the configured watchers against a deadline
pub struct PasteDetector {
    config: DetectorConfig,
    sources: Vec<PasteSignalSource>,
}

impl PasteDetector {
    pub fn new(config: DetectorConfig, sources: Vec<PasteSignalSource>) -> Self {
        Self { config, sources }
    }

    /// Build a detector from the capability probe
    pub fn probe(config: DetectorConfig, clipboard: Arc<dyn Clipboard>) -> Self {
        let sources = probe_sources(&config, clipboard);
        Self::new(config, sources)
    }

    pub fn sources(&self) -> &[PasteSignalSource] {
        &self.sources
    }

    /// Wait for one paste
    ///
    /// Returns `Cancelled` if `cancel` fires first, `TimedOut` once the
    /// configured timeout has elapsed, otherwise `Detected`.
    pub async fn detect(&self, cancel: &CancellationToken) -> PasteOutcome {
        let slot = Arc::new(OutcomeSlot::new());
        let winner = Arc::new(OnceLock::new());
        slot.arm();

        let stop = cancel.child_token();
        let mut watchers = JoinSet::new();

        for source in &self.sources {
            let source = source.clone();
            let slot = slot.clone();
            let winner = winner.clone();
            let stop = stop.clone();

            watchers.spawn(async move {
                let result = source.watch(stop.clone()).await;
                if result == WatchResult::Observed && slot.claim(DetectorPhase::Detected) {
                    let _ = winner.set(source.signal());
                    tracing::debug!("Paste detected by {}", source.signal());
                    stop.cancel();
                }
                result
            });
        }

        let deadline = tokio::time::sleep(self.config.timeout());
        tokio::pin!(deadline);

        tokio::select! {
            _ = stop.cancelled() => {}
            _ = &mut deadline => {}
        }

        // Whatever won already holds the slot; these only land when nothing did
        if cancel.is_cancelled() {
            slot.claim(DetectorPhase::Cancelled);
        } else {
            slot.claim(DetectorPhase::TimedOut);
        }

        stop.cancel();
        while let Some(joined) = watchers.join_next().await {
            match joined {
                Ok(WatchResult::Unavailable) => {
                    tracing::debug!("A paste watcher was unavailable for this wait");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Paste watcher task failed: {}", e),
            }
        }

        let phase = slot.get();
        tracing::trace!("Wait finished: {}", phase);
        PasteOutcome::from_phase(phase, winner.get().copied())
            .unwrap_or(PasteOutcome::Cancelled)
    }
}
