//! Periodic countdown driver for exam sessions.
//!
//! The clock applies one `Tick` per period to a session held in a shared
//! [`SessionBook`]. Ticks are applied one at a time under the book's lock,
//! which is never held across an await point.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::exam::{ExamEvent, SessionBook, SessionKey, SessionStatus};

/// A session book shared between the hosting UI and its clocks.
pub type SharedBook = Arc<Mutex<SessionBook>>;

/// Default tick period: one second of wall-clock time.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Why a clock stopped running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStop {
    /// The session reached `Submitted` (manually or by time-out).
    Submitted,
    /// The session was removed from the book.
    SessionGone,
    /// The clock was cancelled by its owner.
    Cancelled,
    /// A tick could not be applied. The error has been logged.
    Failed,
}

/// Handle to a running exam clock.
///
/// Dropping the handle cancels the clock.
pub struct ExamClock {
    key: SessionKey,
    cancel: Option<watch::Sender<bool>>,
    remaining: watch::Receiver<u32>,
    handle: Option<JoinHandle<ClockStop>>,
}

impl ExamClock {
    /// Start ticking the session stored under `key` every `period`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(book: SharedBook, key: SessionKey, period: Duration) -> Self {
        let initial = book
            .lock()
            .ok()
            .and_then(|b| b.get(&key).map(|s| s.remaining_seconds()))
            .unwrap_or(0);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (remaining_tx, remaining_rx) = watch::channel(initial);

        let task_key = key.clone();
        let handle = tokio::spawn(run(book, task_key, period, cancel_rx, remaining_tx));

        Self {
            key,
            cancel: Some(cancel_tx),
            remaining: remaining_rx,
            handle: Some(handle),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Receiver of the remaining seconds, updated after every tick.
    pub fn remaining(&self) -> watch::Receiver<u32> {
        self.remaining.clone()
    }

    /// Stop ticking. No tick is applied after this returns.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(true);
        }
    }

    /// Wait for the clock task to finish and report why it stopped.
    pub async fn finished(mut self) -> ClockStop {
        let Some(handle) = self.handle.take() else {
            return ClockStop::Cancelled;
        };
        match handle.await {
            Ok(stop) => stop,
            Err(e) => {
                tracing::error!(key = %self.key, "exam clock task failed: {e}");
                ClockStop::Cancelled
            }
        }
    }
}

impl Drop for ExamClock {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run(
    book: SharedBook,
    key: SessionKey,
    period: Duration,
    mut cancel: watch::Receiver<bool>,
    remaining: watch::Sender<u32>,
) -> ClockStop {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            changed = cancel.changed() => {
                // a dropped sender also means the owner went away
                if changed.is_err() || *cancel.borrow() {
                    tracing::debug!(%key, "exam clock cancelled");
                    return ClockStop::Cancelled;
                }
            }
            _ = interval.tick() => {
                let outcome = {
                    let Ok(mut guard) = book.lock() else {
                        tracing::error!(%key, "session book lock poisoned");
                        return ClockStop::Failed;
                    };
                    let current = guard
                        .get(&key)
                        .map(|s| (s.remaining_seconds(), s.status()));
                    match current {
                        None => None,
                        Some((seconds, SessionStatus::Submitted)) => {
                            Some((seconds, SessionStatus::Submitted))
                        }
                        Some(_) => match guard.apply(&key, &ExamEvent::Tick) {
                            Ok(s) => Some((s.remaining_seconds(), s.status())),
                            Err(e) => {
                                tracing::error!(%key, "exam clock tick failed: {e}");
                                return ClockStop::Failed;
                            }
                        },
                    }
                };

                match outcome {
                    None => {
                        tracing::debug!(%key, "session gone, exam clock stopping");
                        return ClockStop::SessionGone;
                    }
                    Some((seconds, status)) => {
                        let _ = remaining.send(seconds);
                        if status == SessionStatus::Submitted {
                            tracing::debug!(%key, seconds, "session submitted, exam clock stopping");
                            return ClockStop::Submitted;
                        }
                    }
                }
            }
        }
    }
}
