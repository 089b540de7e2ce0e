//! Pass scheduling: at most one pass in flight, everything else coalesced.
//!
//! ```text
//!          push (start)           complete (next empty)
//!   Idle ───────────────► Draining ───────────────────► Idle + refresh
//!                          │    ▲
//!                          └────┘ complete (next pending) → drain next
//! ```

use crate::plugin::ChangeSet;

/// What to do after a pass completes.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Completion {
    /// Start another pass with the coalesced batch.
    Drain(ChangeSet),
    /// Nothing pending; the queue is idle.
    Idle,
}

/// Coalescing state for change batches.
#[derive(Debug, Default)]
pub(super) struct RebuildQueue {
    draining: bool,
    next: Option<ChangeSet>,
}

impl RebuildQueue {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn is_draining(&self) -> bool {
        self.draining
    }

    /// Accept a change batch.
    ///
    /// Returns the batch to start now when idle; otherwise it joins the
    /// next batch.
    pub(super) fn push(&mut self, changes: ChangeSet) -> Option<ChangeSet> {
        if !self.draining {
            self.draining = true;
            return Some(changes);
        }

        match &mut self.next {
            Some(next) => next.merge(changes),
            None => self.next = Some(changes),
        }
        None
    }

    /// Record that the pass in flight finished.
    pub(super) fn complete(&mut self) -> Completion {
        match self.next.take() {
            Some(batch) => Completion::Drain(batch),
            None => {
                self.draining = false;
                Completion::Idle
            }
        }
    }
}
