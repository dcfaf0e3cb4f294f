//! Shared device-state aggregate.
//!
//! One `PanelState` exists per panel, owned by the panel and mutated only on
//! the presentation thread (see `dispatcher`). Everything else sees `Clone`
//! snapshots.

/// Number of light switches on the panel.
pub const SWITCH_COUNT: usize = 4;

/// Fixed display names for the four switches, by index.
pub const SWITCH_NAMES: [&str; SWITCH_COUNT] = ["Kitchen", "Hallway", "Bedroom", "Living room"];

/// Default baud rate for the device link (the firmware is fixed at 9600).
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// A single light switch.
///
/// `confirmed_on` reflects the last acknowledgment received from the device,
/// never a request in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Switch {
    pub confirmed_on: bool,
}

/// Discrete state of the door mechanism.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DoorPhase {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

impl DoorPhase {
    /// Whether the door is open or on its way there.
    pub fn is_open_or_opening(&self) -> bool {
        matches!(self, DoorPhase::Opening | DoorPhase::Open)
    }

    /// Whether the door is closed or on its way there.
    pub fn is_closed_or_closing(&self) -> bool {
        matches!(self, DoorPhase::Closed | DoorPhase::Closing)
    }
}

/// A decoded position-sensor reading and its temperature interpretation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetReading {
    /// Raw sensor value in `0..=1023`.
    pub raw: u16,
    /// Derived target temperature, rounded to one decimal place.
    pub celsius: f32,
}

impl TargetReading {
    /// Map a raw 10-bit sensor value onto the 15.0–30.0 °C target range.
    pub fn from_raw(raw: u16) -> Self {
        let celsius = 15.0 + (raw as f32 / 1023.0) * 15.0;
        Self {
            raw,
            celsius: (celsius * 10.0).round() / 10.0,
        }
    }
}

/// The process-wide device state store.
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    /// Confirmed switch states, by index.
    pub switches: [Switch; SWITCH_COUNT],
    /// Current door phase.
    pub door: DoorPhase,
    /// Most recent sensor reading, if any arrived this session.
    pub last_reading: Option<TargetReading>,
    /// Visitors admitted this session; counted per open intent.
    pub visitor_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_maps_range_endpoints() {
        assert_eq!(TargetReading::from_raw(0).celsius, 15.0);
        assert_eq!(TargetReading::from_raw(1023).celsius, 30.0);
    }

    #[test]
    fn reading_rounds_to_one_decimal() {
        // 15 + (511/1023)*15 = 22.4926... -> 22.5
        assert_eq!(TargetReading::from_raw(511).celsius, 22.5);
        // 15 + (100/1023)*15 = 16.4662... -> 16.5
        assert_eq!(TargetReading::from_raw(100).celsius, 16.5);
    }

    #[test]
    fn door_phase_predicates() {
        assert!(DoorPhase::Open.is_open_or_opening());
        assert!(DoorPhase::Opening.is_open_or_opening());
        assert!(!DoorPhase::Closing.is_open_or_opening());

        assert!(DoorPhase::Closed.is_closed_or_closing());
        assert!(DoorPhase::Closing.is_closed_or_closing());
        assert!(!DoorPhase::Open.is_closed_or_closing());
    }

    #[test]
    fn default_state_is_neutral() {
        let state = PanelState::default();
        assert_eq!(state.door, DoorPhase::Closed);
        assert_eq!(state.visitor_count, 0);
        assert!(state.last_reading.is_none());
        assert!(state.switches.iter().all(|s| !s.confirmed_on));
    }
}
