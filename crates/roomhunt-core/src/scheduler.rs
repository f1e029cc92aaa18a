//! Deferred continuations run on the session clock.
//!
//! Tasks are not cancellable. Each one holds a [`LivenessToken`] and is
//! discarded unrun once the owning session has ended.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Work a session defers to a later point on its clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deferred {
    /// Select the first target after the start delay.
    StartGame,
    /// Release the input lock and advance after a correct tap.
    Advance,
    /// Blank the feedback label.
    ClearFeedback,
}

/// Owned by a session; alive until killed or dropped.
#[derive(Debug)]
pub struct Liveness(Arc<AtomicBool>);

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn token(&self) -> LivenessToken {
        LivenessToken(Arc::downgrade(&self.0))
    }

    pub fn kill(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Weak handle checked before a deferred task runs.
#[derive(Debug, Clone)]
pub struct LivenessToken(Weak<AtomicBool>);

impl LivenessToken {
    pub fn is_alive(&self) -> bool {
        self.0
            .upgrade()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }
}

#[derive(Debug, Clone)]
struct Task {
    due: Duration,
    seq: u64,
    action: Deferred,
    token: LivenessToken,
}

/// Single-threaded timer queue. Tasks with equal due times run in the order
/// they were scheduled.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_seq: u64,
    discarded: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, action: Deferred, token: LivenessToken) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(Task {
            due,
            seq,
            action,
            token,
        });
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Tasks dropped because their session had ended.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Removes and returns the earliest live task due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<Deferred> {
        loop {
            let index = self
                .tasks
                .iter()
                .enumerate()
                .filter(|(_, task)| task.due <= now)
                .min_by_key(|(_, task)| (task.due, task.seq))
                .map(|(index, _)| index)?;
            let task = self.tasks.swap_remove(index);
            if task.token.is_alive() {
                return Some(task.action);
            }
            self.discarded += 1;
            tracing::debug!("[scheduler] dropped {:?} for ended session", task.action);
        }
    }

    /// Removes and returns every live task due at or before `now`, in order.
    pub fn drain_due(&mut self, now: Duration) -> Vec<Deferred> {
        std::iter::from_fn(|| self.pop_due(now)).collect()
    }
}
