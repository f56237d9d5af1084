//! Request generations for superseded async work.
//!
//! Every fetch for a logical piece of data takes a [`Ticket`]. Issuing a new
//! ticket, or invalidating the tracker on teardown, makes every older ticket
//! stale, and a stale ticket's result must be dropped.

use std::sync::atomic::{AtomicU64, Ordering};

/// Proof of which generation a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Tracks the latest generation for one logical request slot.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding any outstanding one.
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Make every outstanding ticket stale.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    /// Pass `value` through only if `ticket` is still the latest.
    pub fn accept<T>(&self, ticket: Ticket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!(
                "Dropping stale response (generation {} superseded)",
                ticket.0
            );
            None
        }
    }
}

/// Lifecycle of one primary data slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading(Ticket),
    Ready,
    Failed,
}

impl LoadState {
    pub fn is_loading(self) -> bool {
        matches!(self, LoadState::Loading(_))
    }

    /// State after a response for `ticket` arrives. Responses for any other
    /// ticket leave the state untouched.
    pub fn on_done(self, ticket: Ticket, ok: bool) -> Self {
        match self {
            LoadState::Loading(current) if current == ticket => {
                if ok {
                    LoadState::Ready
                } else {
                    LoadState::Failed
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_ticket_is_current() {
        let tracker = RequestTracker::new();
        let first = tracker.issue();
        let second = tracker.issue();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[test]
    fn invalidate_makes_everything_stale() {
        let tracker = RequestTracker::new();
        let ticket = tracker.issue();
        tracker.invalidate();
        assert!(!tracker.is_current(ticket));
        assert_eq!(tracker.accept(ticket, 1), None);
    }

    #[test]
    fn accept_passes_current_value() {
        let tracker = RequestTracker::new();
        let ticket = tracker.issue();
        assert_eq!(tracker.accept(ticket, "data"), Some("data"));
    }

    #[test]
    fn loading_transitions_on_matching_ticket() {
        let tracker = RequestTracker::new();
        let ticket = tracker.issue();
        let state = LoadState::Loading(ticket);
        assert!(state.is_loading());
        assert_eq!(state.on_done(ticket, true), LoadState::Ready);
        assert_eq!(state.on_done(ticket, false), LoadState::Failed);
    }

    #[test]
    fn stale_ticket_does_not_finish_load() {
        let tracker = RequestTracker::new();
        let old = tracker.issue();
        let new = tracker.issue();
        let state = LoadState::Loading(new);
        assert_eq!(state.on_done(old, true), LoadState::Loading(new));
    }
}
