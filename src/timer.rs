//! Deadline-based timer queue for the presentation loop.
//!
//! All time-driven behavior (connection settle, door auto-close, periodic
//! polling) runs through this queue: timers are scheduled callbacks with
//! explicit cancellable handles, fired from `Panel::pump`, never sleeps.

use std::time::Instant;

/// Handle to an armed timer. Stale handles cancel nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// What an armed timer means to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Post-open device reset latency elapsed; the link is ready for traffic.
    Settle,
    /// The door has been open long enough and should close itself.
    DoorAutoClose,
    /// Time to request the next periodic sensor reading.
    ReadingPoll,
}

#[derive(Debug)]
struct Timer {
    id: TimerId,
    kind: TimerKind,
    deadline: Instant,
}

/// Queue of pending timers, popped in deadline order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer and return its handle.
    pub fn arm(&mut self, kind: TimerKind, deadline: Instant) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer { id, kind, deadline });
        id
    }

    /// Cancel a pending timer. Returns whether anything was removed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Cancel everything (disconnect/shutdown path).
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Remove and return the due timer with the earliest deadline, if any.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerId, TimerKind)> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(_, t)| t.deadline)
            .map(|(i, _)| i)?;
        let timer = self.timers.swap_remove(idx);
        Some((timer.id, timer.kind))
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn pops_in_deadline_order() {
        let mut queue = TimerQueue::new();
        let now = Instant::now();
        queue.arm(TimerKind::ReadingPoll, now + Duration::from_millis(20));
        queue.arm(TimerKind::Settle, now + Duration::from_millis(5));
        queue.arm(TimerKind::DoorAutoClose, now + Duration::from_millis(10));

        let later = now + Duration::from_millis(50);
        assert_eq!(queue.pop_due(later).unwrap().1, TimerKind::Settle);
        assert_eq!(queue.pop_due(later).unwrap().1, TimerKind::DoorAutoClose);
        assert_eq!(queue.pop_due(later).unwrap().1, TimerKind::ReadingPoll);
        assert!(queue.pop_due(later).is_none());
    }

    #[test]
    fn not_due_timers_stay_queued() {
        let mut queue = TimerQueue::new();
        let now = Instant::now();
        queue.arm(TimerKind::Settle, now + Duration::from_secs(60));

        assert!(queue.pop_due(now).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn cancel_removes_only_the_handle() {
        let mut queue = TimerQueue::new();
        let now = Instant::now();
        let keep = queue.arm(TimerKind::ReadingPoll, now);
        let drop = queue.arm(TimerKind::DoorAutoClose, now);

        assert!(queue.cancel(drop));
        assert!(!queue.cancel(drop));
        assert_eq!(queue.len(), 1);

        let (id, kind) = queue.pop_due(now).unwrap();
        assert_eq!(id, keep);
        assert_eq!(kind, TimerKind::ReadingPoll);
    }

    #[test]
    fn clear_empties_the_queue() {
        let mut queue = TimerQueue::new();
        let now = Instant::now();
        queue.arm(TimerKind::Settle, now);
        queue.arm(TimerKind::ReadingPoll, now);

        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.pop_due(now).is_none());
    }

    #[test]
    fn handles_are_unique_across_rearms() {
        let mut queue = TimerQueue::new();
        let now = Instant::now();
        let first = queue.arm(TimerKind::DoorAutoClose, now);
        queue.pop_due(now).unwrap();
        let second = queue.arm(TimerKind::DoorAutoClose, now);
        assert_ne!(first, second);
    }
}
