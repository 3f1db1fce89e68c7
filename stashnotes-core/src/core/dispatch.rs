//! FIFO mutation queue and the dispatcher that runs mutations through it.

use crate::{Repository, Result, StashError, SubscriptionRegistry};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

const EMPTY_NOTE_MESSAGE: &str = "title and content cannot both be empty";

#[derive(Debug, Default)]
struct QueueState {
    next_ticket: u64,
    now_serving: u64,
}

/// Ticket lock that admits mutations strictly in arrival order.
#[derive(Debug, Default)]
pub struct MutationQueue {
    state: Mutex<QueueState>,
    turn: Condvar,
}

/// Exclusive turn in a [`MutationQueue`]; the next ticket is admitted on drop.
#[derive(Debug)]
pub struct MutationTicket<'a> {
    queue: &'a MutationQueue,
    sequence: u64,
}

impl MutationTicket<'_> {
    /// Position of this mutation in the global order, starting at zero.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl MutationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until every mutation that arrived earlier has finished.
    pub fn enter(&self) -> MutationTicket<'_> {
        let mut state = self.lock_state();
        let sequence = state.next_ticket;
        state.next_ticket += 1;
        while state.now_serving != sequence {
            state = self.turn.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        MutationTicket {
            queue: self,
            sequence,
        }
    }

    // Counters only; a panic elsewhere cannot leave them half-updated.
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MutationTicket<'_> {
    fn drop(&mut self) {
        let mut state = self.queue.lock_state();
        state.now_serving += 1;
        drop(state);
        self.queue.turn.notify_all();
    }
}

/// Rejects a note whose title and content are both blank.
///
/// # Errors
///
/// Returns [`StashError::Validation`] when both fields are empty or whitespace.
pub fn validate_note(title: &str, content: &str) -> Result<()> {
    if title.trim().is_empty() && content.trim().is_empty() {
        return Err(StashError::Validation(EMPTY_NOTE_MESSAGE.to_string()));
    }
    Ok(())
}

/// Serializes mutations and fans out exactly one notification per success.
#[derive(Debug, Default)]
pub struct MutationDispatcher {
    queue: MutationQueue,
}

impl MutationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `mutation` in FIFO order, then notifies subscribers.
    ///
    /// Subscribers have received their updates by the time this returns. A
    /// failed mutation is returned as is and triggers no notification.
    pub fn dispatch<T>(
        &self,
        repository: &Repository,
        subscriptions: &SubscriptionRegistry,
        mutation: impl FnOnce(&Repository) -> Result<T>,
    ) -> Result<T> {
        let ticket = self.queue.enter();

        let outcome = mutation(repository);
        match &outcome {
            Ok(_) => {
                let pushed = subscriptions.notify_mutation(repository);
                log::debug!("mutation #{} applied, {pushed} subscribers updated", ticket.sequence());
            }
            Err(e) => {
                log::debug!("mutation #{} failed: {e}", ticket.sequence());
            }
        }
        outcome
    }
}
