use crate::job::{BatchSummary, DocumentKind};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// One significant fact about a run, free of any rendering concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    ScanStarted {
        root: PathBuf,
    },
    CandidateDetected {
        path: PathBuf,
        modified_at: DateTime<Utc>,
    },
    ScanCompleted {
        checked: usize,
        detected: usize,
    },
    SessionOpened {
        kinds: Vec<DocumentKind>,
    },
    JobStarted {
        index: usize,
        total: usize,
        source: PathBuf,
    },
    JobOpened {
        source: PathBuf,
    },
    JobConverted {
        source: PathBuf,
        target: PathBuf,
        original_deleted: bool,
    },
    JobSkipped {
        source: PathBuf,
        reason: String,
    },
    JobFailed {
        source: PathBuf,
        reason: String,
    },
    SessionClosed,
    BatchCompleted {
        summary: BatchSummary,
    },
}

/// Receives batch events.
///
/// The CLI implements this with an indicatif progress bar; tests use [`EventLog`].
pub trait ProgressReporter: Send + Sync {
    fn report(&self, _event: &BatchEvent) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Append-only record of every event, drained by whoever renders them.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<BatchEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all events recorded so far, leaving the log empty.
    pub fn drain(&self) -> Vec<BatchEvent> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *events)
    }

    pub fn snapshot(&self) -> Vec<BatchEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressReporter for EventLog {
    fn report(&self, event: &BatchEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
