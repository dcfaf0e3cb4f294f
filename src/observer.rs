//! Collaborator-facing notification seam.

use crate::state::DoorPhase;

/// One-way notifications consumed by the presentation layer.
///
/// None of these return a value or may block: the panel calls them on its
/// own (single-threaded) loop while applying events and firing timers.
/// All methods default to no-ops so implementors pick what they care about.
pub trait PanelObserver: Send {
    /// A switch acknowledgment arrived and the confirmed state changed.
    fn on_switch_changed(&mut self, index: u8, on: bool) {
        let _ = (index, on);
    }

    /// The door moved to a new phase (by acknowledgment or by intent).
    fn on_door_phase_changed(&mut self, phase: DoorPhase) {
        let _ = phase;
    }

    /// A fresh position-sensor reading was decoded.
    fn on_reading_updated(&mut self, raw: u16, celsius: f32) {
        let _ = (raw, celsius);
    }

    /// The doorbell button was pressed on the device.
    fn on_button_pressed(&mut self) {}

    /// The connection became ready, or was torn down.
    fn on_connection_status_changed(&mut self, connected: bool, detail: &str) {
        let _ = (connected, detail);
    }
}

/// Observer that ignores every notification. Useful for tests and tooling.
#[derive(Debug, Default)]
pub struct NullObserver;

impl PanelObserver for NullObserver {}
