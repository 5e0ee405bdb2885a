//! Session controller
//!
//! Drives one session: offer the sentence at the front of the saved list,
//! wait for the paste, optionally press Enter, drop the sentence from the
//! list, repeat until the list is empty.
//!
//! The saved list is only shortened after a sentence has been handled, so
//! an interrupted session resumes with the sentence that was on offer.

use crate::clipboard::Clipboard;
use crate::commit::{self, CommitKey};
use crate::config::SessionConfig;
use crate::detector::{PasteDetector, PasteOutcome, PasteSignal};
use crate::error::Result;
use crate::queue::DurableQueue;
use crate::sequence::{self, PhraseTemplate};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// How a session run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionReport {
    /// Every sentence was handled and the saved list is gone
    Completed { pasted: usize },
    /// Cancelled; `remaining` sentences are still saved for a resume
    Stopped { pasted: usize, remaining: usize },
}

/// Receives progress from the controller
pub trait SessionReporter: Send + Sync {
    /// A sentence is on the clipboard. `index` is 1-based within this run.
    fn on_phrase(&self, index: usize, total: usize, phrase: &str);

    /// The sentence at `index` was pasted
    fn on_pasted(&self, index: usize, total: usize);

    /// Waiting for the sentence at `index` timed out
    fn on_timed_out(&self, _index: usize, _advancing: bool) {}

    /// The list is empty
    fn on_complete(&self, pasted: usize);

    /// The run was cancelled with `remaining` sentences saved
    fn on_stopped(&self, pasted: usize, remaining: usize);
}

/// Generate the sentences for a new session and save them, replacing any
/// previous list
pub fn start_new_session(
    queue: &DurableQueue,
    template: &PhraseTemplate,
    start: i64,
    end: i64,
) -> Result<Vec<String>> {
    let phrases = sequence::generate(template, start, end)?;
    queue.save_full(&phrases)?;
    tracing::info!(
        "Saved {} sentence(s) to {}",
        phrases.len(),
        queue.path().display()
    );
    Ok(phrases)
}

/// Runs the offer / detect / pop loop over a saved list
pub struct SessionController {
    queue: DurableQueue,
    clipboard: Arc<dyn Clipboard>,
    detector: PasteDetector,
    commit: Vec<Box<dyn CommitKey>>,
    config: SessionConfig,
}

impl SessionController {
    pub fn new(
        queue: DurableQueue,
        clipboard: Arc<dyn Clipboard>,
        detector: PasteDetector,
        commit: Vec<Box<dyn CommitKey>>,
        config: SessionConfig,
    ) -> Self {
        Self {
            queue,
            clipboard,
            detector,
            commit,
            config,
        }
    }

    pub fn queue(&self) -> &DurableQueue {
        &self.queue
    }

    /// Run until the saved list is empty or `cancel` fires
    ///
    /// Clipboard write failures and storage failures end the run with an
    /// error; the saved list keeps the sentence that was on offer.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        reporter: &dyn SessionReporter,
    ) -> Result<SessionReport> {
        let total = self.queue.load()?.len();
        let mut pasted = 0usize;

        tracing::debug!("Session starting with {} sentence(s)", total);

        loop {
            if cancel.is_cancelled() {
                return self.stopped(pasted, reporter);
            }

            let phrase = match self.queue.peek_front()? {
                Some(phrase) => phrase,
                None => {
                    reporter.on_complete(pasted);
                    tracing::info!("Session complete: {} sentence(s) pasted", pasted);
                    return Ok(SessionReport::Completed { pasted });
                }
            };
            let index = pasted + 1;

            self.clipboard.write(&phrase).await?;
            tracing::debug!("Offered [{}/{}] {:?}", index, total, phrase);
            reporter.on_phrase(index, total, &phrase);

            match self.detector.detect(cancel).await {
                PasteOutcome::Detected(signal) => {
                    reporter.on_pasted(index, total);
                    if signal == PasteSignal::Hotkey {
                        self.settle_after_chord(cancel).await;
                    }
                }
                PasteOutcome::TimedOut => {
                    let advancing = self.config.advance_on_timeout;
                    tracing::info!(
                        "No paste before the timeout, {}",
                        if advancing {
                            "moving on"
                        } else {
                            "offering it again"
                        }
                    );
                    reporter.on_timed_out(index, advancing);
                    if !advancing {
                        continue;
                    }
                }
                PasteOutcome::Cancelled => return self.stopped(pasted, reporter),
            }

            if self.config.auto_commit {
                self.press_commit_key().await;
            }

            self.queue.pop_front()?;
            pasted += 1;
        }
    }

    /// The chord fires on key-down, while the target app may still be
    /// reading the clipboard; hold off before anything writes to it again
    async fn settle_after_chord(&self, cancel: &CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.config.paste_settle()) => {}
        }
    }

    /// Wait the configured delay, then press Enter; failures are only logged
    async fn press_commit_key(&self) {
        tokio::time::sleep(self.config.commit_delay()).await;
        if let Err(e) = commit::press_with_fallback(&self.commit).await {
            tracing::warn!("Could not press Enter: {}", e);
        }
    }

    fn stopped(&self, pasted: usize, reporter: &dyn SessionReporter) -> Result<SessionReport> {
        let remaining = self.queue.load()?.len();
        reporter.on_stopped(pasted, remaining);
        tracing::info!(
            "Session stopped: {} pasted, {} remaining in {}",
            pasted,
            remaining,
            self.queue.path().display()
        );
        Ok(SessionReport::Stopped { pasted, remaining })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use crate::detector::{ClipboardPollWatcher, HotkeyWatcher, PasteSignalSource};
    use crate::error::{ClipboardError, CommitError, HotkeyError, StepPasterError};
    use crate::hotkey::{HotkeyEvent, PasteChordListener};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    /// Clipboard that records writes and never changes by itself
    #[derive(Default)]
    struct RecordingClipboard {
        writes: Mutex<Vec<String>>,
        written_at: Mutex<Vec<Instant>>,
        fail_writes: bool,
    }

    #[async_trait::async_trait]
    impl Clipboard for RecordingClipboard {
        async fn read(&self) -> std::result::Result<String, ClipboardError> {
            Ok(self.writes.lock().unwrap().last().cloned().unwrap_or_default())
        }

        async fn write(&self, text: &str) -> std::result::Result<(), ClipboardError> {
            if self.fail_writes {
                return Err(ClipboardError::WriteFailed("locked".to_string()));
            }
            self.writes.lock().unwrap().push(text.to_string());
            self.written_at.lock().unwrap().push(Instant::now());
            Ok(())
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    struct CountingKey(Arc<AtomicUsize>);

    #[async_trait::async_trait]
    impl CommitKey for CountingKey {
        async fn press(&self) -> std::result::Result<(), CommitError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    /// Presses the paste chord 100ms after every arming
    struct ChordPresser;

    #[async_trait::async_trait]
    impl PasteChordListener for ChordPresser {
        async fn start(
            &mut self,
        ) -> std::result::Result<mpsc::Receiver<HotkeyEvent>, HotkeyError> {
            let (tx, rx) = mpsc::channel(1);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                let _ = tx.send(HotkeyEvent::PasteChord).await;
            });
            Ok(rx)
        }

        async fn stop(&mut self) -> std::result::Result<(), HotkeyError> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "presser"
        }
    }

    #[derive(Default)]
    struct NullReporter {
        timeouts: AtomicUsize,
    }

    impl SessionReporter for NullReporter {
        fn on_phrase(&self, _index: usize, _total: usize, _phrase: &str) {}
        fn on_pasted(&self, _index: usize, _total: usize) {}
        fn on_timed_out(&self, _index: usize, _advancing: bool) {
            self.timeouts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_complete(&self, _pasted: usize) {}
        fn on_stopped(&self, _pasted: usize, _remaining: usize) {}
    }

    /// A controller whose detector only polls an unchanging clipboard, so
    /// every wait ends in a one-second timeout
    fn timing_out_controller(
        dir: &TempDir,
        clipboard: Arc<RecordingClipboard>,
        session: SessionConfig,
        commit: Vec<Box<dyn CommitKey>>,
    ) -> SessionController {
        let detector_config = DetectorConfig {
            poll_interval_ms: 100,
            timeout_secs: 1,
            use_hotkey: false,
        };
        let detector = PasteDetector::new(
            detector_config,
            vec![PasteSignalSource::ClipboardPoll(ClipboardPollWatcher::new(
                clipboard.clone(),
                Duration::from_millis(100),
            ))],
        );
        SessionController::new(
            DurableQueue::new(dir.path().join("list.txt")),
            clipboard,
            detector,
            commit,
            session,
        )
    }

    fn chord_controller(
        dir: &TempDir,
        clipboard: Arc<RecordingClipboard>,
        session: SessionConfig,
    ) -> SessionController {
        let detector = PasteDetector::new(
            DetectorConfig::default(),
            vec![PasteSignalSource::Hotkey(HotkeyWatcher::new(Box::new(
                ChordPresser,
            )))],
        );
        SessionController::new(
            DurableQueue::new(dir.path().join("list.txt")),
            clipboard,
            detector,
            vec![],
            session,
        )
    }

    #[test]
    fn test_start_new_session_saves_every_sentence() {
        let dir = TempDir::new().unwrap();
        let queue = DurableQueue::new(dir.path().join("list.txt"));
        let template = PhraseTemplate::new("I climbed", "step", "steps", "");

        let phrases = start_new_session(&queue, &template, 1, 3).unwrap();

        assert_eq!(phrases.len(), 3);
        assert_eq!(queue.load().unwrap(), phrases);
    }

    #[test]
    fn test_start_new_session_rejects_reversed_range() {
        let dir = TempDir::new().unwrap();
        let queue = DurableQueue::new(dir.path().join("list.txt"));
        let template = PhraseTemplate::new("I climbed", "step", "steps", "");

        let result = start_new_session(&queue, &template, 5, 2);

        assert!(matches!(result, Err(StepPasterError::Sequence(_))));
        assert!(!queue.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_advances_by_default() {
        let dir = TempDir::new().unwrap();
        let clipboard = Arc::new(RecordingClipboard::default());
        let controller =
            timing_out_controller(&dir, clipboard.clone(), SessionConfig::default(), vec![]);
        controller.queue().save_full(&["a", "b"]).unwrap();
        let reporter = NullReporter::default();

        let report = controller
            .run(&CancellationToken::new(), &reporter)
            .await
            .unwrap();

        assert_eq!(report, SessionReport::Completed { pasted: 2 });
        assert_eq!(reporter.timeouts.load(Ordering::SeqCst), 2);
        assert_eq!(*clipboard.writes.lock().unwrap(), vec!["a", "b"]);
        assert!(!controller.queue().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_repeats_when_not_advancing() {
        let dir = TempDir::new().unwrap();
        let clipboard = Arc::new(RecordingClipboard::default());
        let session = SessionConfig {
            advance_on_timeout: false,
            ..Default::default()
        };
        let controller = timing_out_controller(&dir, clipboard.clone(), session, vec![]);
        controller.queue().save_full(&["a", "b"]).unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });

        let report = controller
            .run(&cancel, &NullReporter::default())
            .await
            .unwrap();

        assert_eq!(
            report,
            SessionReport::Stopped {
                pasted: 0,
                remaining: 2
            }
        );
        assert_eq!(*clipboard.writes.lock().unwrap(), vec!["a", "a", "a"]);
        assert_eq!(controller.queue().load().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_commit_presses_enter_once_per_sentence() {
        let dir = TempDir::new().unwrap();
        let clipboard = Arc::new(RecordingClipboard::default());
        let presses = Arc::new(AtomicUsize::new(0));
        let session = SessionConfig {
            auto_commit: true,
            ..Default::default()
        };
        let controller = timing_out_controller(
            &dir,
            clipboard,
            session,
            vec![Box::new(CountingKey(presses.clone()))],
        );
        controller.queue().save_full(&["a", "b", "c"]).unwrap();

        controller
            .run(&CancellationToken::new(), &NullReporter::default())
            .await
            .unwrap();

        assert_eq!(presses.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_commit_key_does_not_stop_session() {
        let dir = TempDir::new().unwrap();
        let clipboard = Arc::new(RecordingClipboard::default());
        let session = SessionConfig {
            auto_commit: true,
            ..Default::default()
        };
        // An empty chain always fails
        let controller = timing_out_controller(&dir, clipboard, session, vec![]);
        controller.queue().save_full(&["a"]).unwrap();

        let report = controller
            .run(&CancellationToken::new(), &NullReporter::default())
            .await
            .unwrap();

        assert_eq!(report, SessionReport::Completed { pasted: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_sentence_waits_for_paste_to_settle() {
        let dir = TempDir::new().unwrap();
        let clipboard = Arc::new(RecordingClipboard::default());
        let session = SessionConfig {
            paste_settle_ms: 400,
            ..Default::default()
        };
        let controller = chord_controller(&dir, clipboard.clone(), session);
        controller.queue().save_full(&["a", "b"]).unwrap();

        let report = controller
            .run(&CancellationToken::new(), &NullReporter::default())
            .await
            .unwrap();

        assert_eq!(report, SessionReport::Completed { pasted: 2 });
        assert_eq!(*clipboard.writes.lock().unwrap(), vec!["a", "b"]);

        // Chord at +100ms, then the settle pause, before "b" is copied
        let times = clipboard.written_at.lock().unwrap();
        assert!(times[1] - times[0] >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_settle_still_pops_pasted_sentence() {
        let dir = TempDir::new().unwrap();
        let clipboard = Arc::new(RecordingClipboard::default());
        let session = SessionConfig {
            paste_settle_ms: 10_000,
            ..Default::default()
        };
        let controller = chord_controller(&dir, clipboard.clone(), session);
        controller.queue().save_full(&["a", "b"]).unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let report = controller
            .run(&cancel, &NullReporter::default())
            .await
            .unwrap();

        assert_eq!(
            report,
            SessionReport::Stopped {
                pasted: 1,
                remaining: 1
            }
        );
        assert_eq!(*clipboard.writes.lock().unwrap(), vec!["a"]);
        assert_eq!(controller.queue().load().unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_clipboard_write_failure_keeps_sentence() {
        let dir = TempDir::new().unwrap();
        let clipboard = Arc::new(RecordingClipboard {
            fail_writes: true,
            ..Default::default()
        });
        let controller =
            timing_out_controller(&dir, clipboard, SessionConfig::default(), vec![]);
        controller.queue().save_full(&["a", "b"]).unwrap();

        let result = controller
            .run(&CancellationToken::new(), &NullReporter::default())
            .await;

        assert!(matches!(result, Err(StepPasterError::Clipboard(_))));
        assert_eq!(controller.queue().load().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_list_completes_immediately() {
        let dir = TempDir::new().unwrap();
        let clipboard = Arc::new(RecordingClipboard::default());
        let controller =
            timing_out_controller(&dir, clipboard.clone(), SessionConfig::default(), vec![]);

        let report = controller
            .run(&CancellationToken::new(), &NullReporter::default())
            .await
            .unwrap();

        assert_eq!(report, SessionReport::Completed { pasted: 0 });
        assert!(clipboard.writes.lock().unwrap().is_empty());
    }
}
