//! End-to-end session tests with in-memory collaborators
//!
//! A fake clipboard records what was offered and a fake paste chord
//! listener plays the user, so whole sessions run without a desktop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use step_paster::clipboard::Clipboard;
use step_paster::config::{DetectorConfig, SessionConfig};
use step_paster::detector::{
    ClipboardPollWatcher, HotkeyWatcher, PasteDetector, PasteSignalSource,
};
use step_paster::error::{ClipboardError, HotkeyError};
use step_paster::hotkey::{HotkeyEvent, PasteChordListener};
use step_paster::session::{self, SessionController, SessionReport, SessionReporter};
use step_paster::{DurableQueue, PhraseTemplate};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Clipboard that remembers every sentence written to it
#[derive(Default)]
struct MemoryClipboard {
    writes: Mutex<Vec<String>>,
}

impl MemoryClipboard {
    fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Clipboard for MemoryClipboard {
    async fn read(&self) -> Result<String, ClipboardError> {
        Ok(self.writes.lock().unwrap().last().cloned().unwrap_or_default())
    }

    async fn write(&self, text: &str) -> Result<(), ClipboardError> {
        self.writes.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Presses the paste chord shortly after each arming, for the first
/// `pastes` armings only
struct PastingUser {
    pastes: usize,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl PastingUser {
    fn new(pastes: usize) -> Self {
        Self {
            pastes,
            starts: Arc::new(AtomicUsize::new(0)),
            stops: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl PasteChordListener for PastingUser {
    async fn start(&mut self) -> Result<mpsc::Receiver<HotkeyEvent>, HotkeyError> {
        let run = self.starts.fetch_add(1, Ordering::SeqCst);
        let paste = run < self.pastes;
        let (tx, rx) = mpsc::channel(1);

        tokio::spawn(async move {
            if paste {
                tokio::time::sleep(Duration::from_millis(100)).await;
                let _ = tx.send(HotkeyEvent::PasteChord).await;
            } else {
                tx.closed().await;
            }
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), HotkeyError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "pasting user"
    }
}

/// Reporter that records the progress calls it receives
#[derive(Default)]
struct RecordingReporter {
    offered: Mutex<Vec<(usize, usize, String)>>,
    pasted: AtomicUsize,
    completed: Mutex<Option<usize>>,
    stopped: Mutex<Option<(usize, usize)>>,
}

impl SessionReporter for RecordingReporter {
    fn on_phrase(&self, index: usize, total: usize, phrase: &str) {
        self.offered
            .lock()
            .unwrap()
            .push((index, total, phrase.to_string()));
    }

    fn on_pasted(&self, _index: usize, _total: usize) {
        self.pasted.fetch_add(1, Ordering::SeqCst);
    }

    fn on_complete(&self, pasted: usize) {
        *self.completed.lock().unwrap() = Some(pasted);
    }

    fn on_stopped(&self, pasted: usize, remaining: usize) {
        *self.stopped.lock().unwrap() = Some((pasted, remaining));
    }
}

struct Harness {
    controller: SessionController,
    clipboard: Arc<MemoryClipboard>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

/// Controller over `queue` whose user pastes `pastes` times, racing a
/// clipboard poller
fn harness(queue: DurableQueue, pastes: usize) -> Harness {
    let clipboard = Arc::new(MemoryClipboard::default());
    let user = PastingUser::new(pastes);
    let starts = user.starts.clone();
    let stops = user.stops.clone();

    let detector = PasteDetector::new(
        DetectorConfig::default(),
        vec![
            PasteSignalSource::Hotkey(HotkeyWatcher::new(Box::new(user))),
            PasteSignalSource::ClipboardPoll(ClipboardPollWatcher::new(
                clipboard.clone(),
                Duration::from_millis(100),
            )),
        ],
    );

    let controller = SessionController::new(
        queue,
        clipboard.clone(),
        detector,
        Vec::new(),
        SessionConfig::default(),
    );

    Harness {
        controller,
        clipboard,
        starts,
        stops,
    }
}

fn climbing() -> PhraseTemplate {
    PhraseTemplate::new("I climbed", "step", "steps", "")
}

fn cancel_after(ms: u64) -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        trigger.cancel();
    });
    cancel
}

#[tokio::test(start_paused = true)]
async fn test_full_session_pastes_every_sentence_in_order() {
    let dir = TempDir::new().unwrap();
    let queue = DurableQueue::new(dir.path().join("step_paster_list.txt"));
    session::start_new_session(&queue, &climbing(), 1, 3).unwrap();

    let h = harness(queue.clone(), usize::MAX);
    let reporter = RecordingReporter::default();

    let report = h
        .controller
        .run(&CancellationToken::new(), &reporter)
        .await
        .unwrap();

    assert_eq!(report, SessionReport::Completed { pasted: 3 });
    assert_eq!(
        h.clipboard.writes(),
        vec!["I climbed 1 step", "I climbed 2 steps", "I climbed 3 steps"]
    );
    assert_eq!(
        *reporter.offered.lock().unwrap(),
        vec![
            (1, 3, "I climbed 1 step".to_string()),
            (2, 3, "I climbed 2 steps".to_string()),
            (3, 3, "I climbed 3 steps".to_string()),
        ]
    );
    assert_eq!(reporter.pasted.load(Ordering::SeqCst), 3);
    assert_eq!(*reporter.completed.lock().unwrap(), Some(3));
    assert!(!queue.exists());
    assert!(!queue.path().exists());

    // Every arming of the key hook was matched by a release
    assert_eq!(h.starts.load(Ordering::SeqCst), 3);
    assert_eq!(h.stops.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_resume_continues_from_saved_list() {
    let dir = TempDir::new().unwrap();
    let queue = DurableQueue::new(dir.path().join("step_paster_list.txt"));
    queue
        .save_full(&["I climbed 4 steps", "I climbed 5 steps"])
        .unwrap();

    let h = harness(queue.clone(), usize::MAX);
    let reporter = RecordingReporter::default();

    let report = h
        .controller
        .run(&CancellationToken::new(), &reporter)
        .await
        .unwrap();

    assert_eq!(report, SessionReport::Completed { pasted: 2 });
    assert_eq!(
        h.clipboard.writes(),
        vec!["I climbed 4 steps", "I climbed 5 steps"]
    );
    assert_eq!(reporter.offered.lock().unwrap()[0].1, 2);
    assert!(!queue.exists());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_keeps_in_flight_sentence_at_front() {
    let dir = TempDir::new().unwrap();
    let queue = DurableQueue::new(dir.path().join("step_paster_list.txt"));
    session::start_new_session(&queue, &climbing(), 1, 3).unwrap();

    // The user pastes twice, then walks away while the third is on offer
    let h = harness(queue.clone(), 2);
    let reporter = RecordingReporter::default();

    let report = h.controller.run(&cancel_after(1_000), &reporter).await.unwrap();

    assert_eq!(
        report,
        SessionReport::Stopped {
            pasted: 2,
            remaining: 1
        }
    );
    assert_eq!(*reporter.stopped.lock().unwrap(), Some((2, 1)));
    assert_eq!(queue.load().unwrap(), vec!["I climbed 3 steps"]);
    assert_eq!(h.starts.load(Ordering::SeqCst), 3);
    assert_eq!(h.stops.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_session_resumes_without_skipping_or_repeating() {
    let dir = TempDir::new().unwrap();
    let queue = DurableQueue::new(dir.path().join("step_paster_list.txt"));
    session::start_new_session(&queue, &climbing(), 1, 4).unwrap();

    let first = harness(queue.clone(), 1);
    let report = first
        .controller
        .run(&cancel_after(500), &RecordingReporter::default())
        .await
        .unwrap();
    assert_eq!(
        report,
        SessionReport::Stopped {
            pasted: 1,
            remaining: 3
        }
    );

    let second = harness(queue.clone(), usize::MAX);
    let report = second
        .controller
        .run(&CancellationToken::new(), &RecordingReporter::default())
        .await
        .unwrap();
    assert_eq!(report, SessionReport::Completed { pasted: 3 });

    // The sentence on offer at interruption is offered again, nothing else repeats
    assert_eq!(
        first.clipboard.writes(),
        vec!["I climbed 1 step", "I climbed 2 steps"]
    );
    assert_eq!(
        second.clipboard.writes(),
        vec!["I climbed 2 steps", "I climbed 3 steps", "I climbed 4 steps"]
    );
    assert!(!queue.exists());
}

#[tokio::test]
async fn test_cancel_before_start_leaves_list_untouched() {
    let dir = TempDir::new().unwrap();
    let queue = DurableQueue::new(dir.path().join("step_paster_list.txt"));
    session::start_new_session(&queue, &climbing(), 1, 2).unwrap();

    let h = harness(queue.clone(), usize::MAX);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = h
        .controller
        .run(&cancel, &RecordingReporter::default())
        .await
        .unwrap();

    assert_eq!(
        report,
        SessionReport::Stopped {
            pasted: 0,
            remaining: 2
        }
    );
    assert!(h.clipboard.writes().is_empty());
    assert_eq!(queue.load().unwrap().len(), 2);
}
