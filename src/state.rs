//! State machine for a single paste wait
//!
//! Each call to the detector walks one cell through:
//! Idle → Watching → Detected | TimedOut | Cancelled
//!
//! The move out of Watching is a compare-and-swap, so when several watchers
//! race only the first claim takes effect.

use std::sync::atomic::{AtomicU8, Ordering};

/// Phase of one paste wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorPhase {
    /// Not armed yet
    Idle,
    /// Watchers running, no outcome yet
    Watching,
    /// A paste was observed
    Detected,
    /// The deadline passed first
    TimedOut,
    /// The session was cancelled first
    Cancelled,
}

impl DetectorPhase {
    /// True once an outcome has been claimed
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DetectorPhase::Detected | DetectorPhase::TimedOut | DetectorPhase::Cancelled
        )
    }

    fn to_u8(self) -> u8 {
        match self {
            DetectorPhase::Idle => 0,
            DetectorPhase::Watching => 1,
            DetectorPhase::Detected => 2,
            DetectorPhase::TimedOut => 3,
            DetectorPhase::Cancelled => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => DetectorPhase::Watching,
            2 => DetectorPhase::Detected,
            3 => DetectorPhase::TimedOut,
            4 => DetectorPhase::Cancelled,
            _ => DetectorPhase::Idle,
        }
    }
}

impl std::fmt::Display for DetectorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorPhase::Idle => write!(f, "Idle"),
            DetectorPhase::Watching => write!(f, "Watching"),
            DetectorPhase::Detected => write!(f, "Detected"),
            DetectorPhase::TimedOut => write!(f, "Timed out"),
            DetectorPhase::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Write-once outcome cell shared by the watchers of one wait
#[derive(Debug)]
pub struct OutcomeSlot {
    phase: AtomicU8,
}

impl OutcomeSlot {
    /// Create a new idle slot
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(DetectorPhase::Idle.to_u8()),
        }
    }

    /// Idle → Watching. Returns false if the slot was already armed.
    pub fn arm(&self) -> bool {
        self.transition(DetectorPhase::Idle, DetectorPhase::Watching)
    }

    /// Watching → `outcome`. Returns true only for the winning claim.
    pub fn claim(&self, outcome: DetectorPhase) -> bool {
        if !outcome.is_terminal() {
            return false;
        }
        self.transition(DetectorPhase::Watching, outcome)
    }

    /// Current phase
    pub fn get(&self) -> DetectorPhase {
        DetectorPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    fn transition(&self, from: DetectorPhase, to: DetectorPhase) -> bool {
        self.phase
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for OutcomeSlot {
    fn default() -> Self {
        Self::new()
    }
}
