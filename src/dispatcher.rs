//! Event application: the sole writer of panel state.
//!
//! Decoded device events cross the reader/presentation boundary through a
//! channel and land here, applied strictly in arrival order on the
//! presentation thread. No other code path mutates switch, door, or reading
//! state in response to the device.

use crate::observer::PanelObserver;
use crate::protocol::{self, DeviceEvent};
use crate::state::{DoorPhase, PanelState, TargetReading, SWITCH_NAMES};
use tracing::{debug, warn};

/// Apply one decoded event to the state store and notify the observer.
pub(crate) fn apply(event: DeviceEvent, state: &mut PanelState, observer: &mut dyn PanelObserver) {
    match event {
        DeviceEvent::Reading { raw } => {
            let reading = TargetReading::from_raw(raw);
            state.last_reading = Some(reading);
            observer.on_reading_updated(reading.raw, reading.celsius);
        }
        DeviceEvent::SwitchAck { index } => {
            if !protocol::is_valid_switch_index(index) {
                warn!(index, "switch acknowledgment for unknown index, dropped");
                return;
            }
            // Acknowledgment-as-toggle: the device confirms "it flipped",
            // not "it is now on/off".
            let switch = &mut state.switches[index as usize];
            switch.confirmed_on = !switch.confirmed_on;
            let on = switch.confirmed_on;
            debug!(
                index,
                name = SWITCH_NAMES[index as usize],
                on,
                "switch state confirmed"
            );
            observer.on_switch_changed(index, on);
        }
        DeviceEvent::ButtonPressed => {
            observer.on_button_pressed();
        }
        DeviceEvent::DoorOpened => {
            state.door = DoorPhase::Open;
            observer.on_door_phase_changed(DoorPhase::Open);
        }
        DeviceEvent::DoorClosed => {
            state.door = DoorPhase::Closed;
            observer.on_door_phase_changed(DoorPhase::Closed);
        }
        DeviceEvent::Unrecognized { line } => {
            debug!(%line, "ignoring unrecognized line from device");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;

    #[derive(Default)]
    struct Recorder {
        switches: Vec<(u8, bool)>,
        doors: Vec<DoorPhase>,
        readings: Vec<(u16, f32)>,
        button_presses: usize,
    }

    impl PanelObserver for Recorder {
        fn on_switch_changed(&mut self, index: u8, on: bool) {
            self.switches.push((index, on));
        }
        fn on_door_phase_changed(&mut self, phase: DoorPhase) {
            self.doors.push(phase);
        }
        fn on_reading_updated(&mut self, raw: u16, celsius: f32) {
            self.readings.push((raw, celsius));
        }
        fn on_button_pressed(&mut self) {
            self.button_presses += 1;
        }
    }

    #[test]
    fn switch_ack_inverts_not_sets() {
        let mut state = PanelState::default();
        let mut rec = Recorder::default();

        apply(DeviceEvent::SwitchAck { index: 2 }, &mut state, &mut rec);
        assert!(state.switches[2].confirmed_on);

        apply(DeviceEvent::SwitchAck { index: 2 }, &mut state, &mut rec);
        assert!(!state.switches[2].confirmed_on);

        assert_eq!(rec.switches, vec![(2, true), (2, false)]);
    }

    #[test]
    fn unknown_switch_index_leaves_state_untouched() {
        let mut state = PanelState::default();
        let mut rec = Recorder::default();

        apply(DeviceEvent::SwitchAck { index: 7 }, &mut state, &mut rec);

        assert!(state.switches.iter().all(|s| !s.confirmed_on));
        assert!(rec.switches.is_empty());
    }

    #[test]
    fn reading_updates_state_and_notifies() {
        let mut state = PanelState::default();
        let mut rec = Recorder::default();

        apply(DeviceEvent::Reading { raw: 1023 }, &mut state, &mut rec);

        assert_eq!(state.last_reading.unwrap().celsius, 30.0);
        assert_eq!(rec.readings, vec![(1023, 30.0)]);
    }

    #[test]
    fn door_acks_set_phase() {
        let mut state = PanelState::default();
        let mut rec = Recorder::default();

        apply(DeviceEvent::DoorOpened, &mut state, &mut rec);
        assert_eq!(state.door, DoorPhase::Open);

        apply(DeviceEvent::DoorClosed, &mut state, &mut rec);
        assert_eq!(state.door, DoorPhase::Closed);

        assert_eq!(rec.doors, vec![DoorPhase::Open, DoorPhase::Closed]);
    }

    #[test]
    fn button_press_only_notifies() {
        let mut state = PanelState::default();
        let mut rec = Recorder::default();

        apply(DeviceEvent::ButtonPressed, &mut state, &mut rec);

        assert_eq!(rec.button_presses, 1);
        assert_eq!(state.visitor_count, 0, "visitors count on intent, not press");
    }

    #[test]
    fn unrecognized_changes_nothing() {
        let mut state = PanelState::default();
        apply(
            DeviceEvent::Unrecognized {
                line: "POT:abc".into(),
            },
            &mut state,
            &mut NullObserver,
        );
        assert_eq!(state.door, DoorPhase::Closed);
        assert!(state.last_reading.is_none());
    }
}
