//! Periodic target-reading poller state.
//!
//! Tracks whether periodic polling is enabled and which repeating timer (at
//! most one) is outstanding. The panel arms, fires, and cancels the actual
//! timers; this keeps the mode and the single live handle consistent.

use crate::timer::TimerId;

#[derive(Debug, Default)]
pub struct ReadingPoller {
    enabled: bool,
    pending: Option<TimerId>,
}

impl ReadingPoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable periodic polling. Returns true when this actually flipped the
    /// mode on (so the caller arms the first timer exactly once).
    pub fn enable(&mut self) -> bool {
        if self.enabled {
            return false;
        }
        self.enabled = true;
        true
    }

    /// Disable periodic polling, yielding the pending timer to cancel.
    pub fn disable(&mut self) -> Option<TimerId> {
        self.enabled = false;
        self.pending.take()
    }

    /// Record the timer just armed for the next poll.
    pub fn note_armed(&mut self, id: TimerId) {
        self.pending = Some(id);
    }

    /// A poll timer fired. Returns true when it is the live handle and the
    /// mode is still on, meaning the caller should request a reading and
    /// re-arm; the fired handle is consumed either way if it matches.
    pub fn should_poll(&mut self, fired: TimerId) -> bool {
        if self.pending != Some(fired) {
            return false;
        }
        self.pending = None;
        self.enabled
    }

    /// Drop mode and handle together (disconnect path). Returns the pending
    /// timer to cancel.
    pub fn reset(&mut self) -> Option<TimerId> {
        self.enabled = false;
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{TimerKind, TimerQueue};
    use std::time::Instant;

    fn fresh_id(queue: &mut TimerQueue) -> TimerId {
        queue.arm(TimerKind::ReadingPoll, Instant::now())
    }

    #[test]
    fn enable_is_edge_triggered() {
        let mut poller = ReadingPoller::new();
        assert!(poller.enable());
        assert!(!poller.enable());
        assert!(poller.is_enabled());
    }

    #[test]
    fn fire_and_rearm_cycle() {
        let mut queue = TimerQueue::new();
        let mut poller = ReadingPoller::new();
        poller.enable();

        let first = fresh_id(&mut queue);
        poller.note_armed(first);
        assert!(poller.should_poll(first));

        let second = fresh_id(&mut queue);
        poller.note_armed(second);
        // Only one outstanding handle: the consumed one no longer matches.
        assert!(!poller.should_poll(first));
        assert!(poller.should_poll(second));
    }

    #[test]
    fn disable_cancels_pending_timer() {
        let mut queue = TimerQueue::new();
        let mut poller = ReadingPoller::new();
        poller.enable();
        let id = fresh_id(&mut queue);
        poller.note_armed(id);

        assert_eq!(poller.disable(), Some(id));
        assert!(!poller.is_enabled());
        // A late fire of the cancelled handle does nothing.
        assert!(!poller.should_poll(id));
    }

    #[test]
    fn reset_clears_mode_and_handle() {
        let mut queue = TimerQueue::new();
        let mut poller = ReadingPoller::new();
        poller.enable();
        let id = fresh_id(&mut queue);
        poller.note_armed(id);

        assert_eq!(poller.reset(), Some(id));
        assert!(!poller.is_enabled());
        assert_eq!(poller.reset(), None);
    }
}
