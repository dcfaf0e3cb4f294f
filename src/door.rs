//! Door auto-close bookkeeping.
//!
//! The door state machine proper lives in the panel intents plus the
//! dispatcher (device acknowledgments); this module tracks the one armed
//! auto-close timer per open and decides whether a firing timer may act.

use crate::state::DoorPhase;
use crate::timer::TimerId;

/// Tracks the auto-close timer armed by the most recent open intent.
#[derive(Debug, Default)]
pub struct DoorController {
    armed_close: Option<TimerId>,
}

impl DoorController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the timer armed for the open that just succeeded. Exactly one
    /// handle is live at a time; a re-open replaces the previous handle,
    /// which turns the superseded timer into a no-op when it fires.
    pub fn arm(&mut self, id: TimerId) {
        self.armed_close = Some(id);
    }

    /// Forget the armed timer (disconnect path). Returns the handle so the
    /// caller can cancel it in the queue.
    pub fn disarm(&mut self) -> Option<TimerId> {
        self.armed_close.take()
    }

    /// Decide whether a firing auto-close timer should send `CLOSE_DOOR`.
    ///
    /// Two guards apply: the handle must be the currently armed one (a
    /// re-open supersedes older timers), and the door must still be open or
    /// opening (a manual close already happened otherwise). Either way the
    /// fired handle is consumed.
    pub fn should_auto_close(&mut self, fired: TimerId, phase: DoorPhase) -> bool {
        if self.armed_close != Some(fired) {
            return false;
        }
        self.armed_close = None;
        phase.is_open_or_opening()
    }

    /// Whether an auto-close timer is currently armed.
    pub fn is_armed(&self) -> bool {
        self.armed_close.is_some()
    }
}
