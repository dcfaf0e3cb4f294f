//! Line-oriented wire protocol for the panel device.
//!
//! The device speaks newline-terminated ASCII. Four command shapes go out;
//! five event shapes come back. Decoding is total: a line that cannot be
//! classified becomes [`DeviceEvent::Unrecognized`] rather than an error, so
//! a misbehaving device can never take down the connection.

use crate::state::SWITCH_COUNT;

/// Highest raw value the position sensor can report (10-bit ADC).
pub const MAX_RAW_READING: u16 = 1023;

/// An outbound command for the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Toggle the switch with the given index.
    ToggleSwitch(u8),
    /// Ask the device to report the current position-sensor reading.
    RequestReading,
    /// Open the door.
    OpenDoor,
    /// Close the door.
    CloseDoor,
}

impl Command {
    /// Encode the command as a newline-terminated wire line.
    pub fn encode(&self) -> String {
        match self {
            Command::ToggleSwitch(index) => format!("LED:{index}\n"),
            Command::RequestReading => "GET_POT\n".to_string(),
            Command::OpenDoor => "OPEN_DOOR\n".to_string(),
            Command::CloseDoor => "CLOSE_DOOR\n".to_string(),
        }
    }
}

/// A decoded inbound line from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Position-sensor reading, raw value in `0..=1023`.
    Reading { raw: u16 },
    /// The device confirmed a switch toggle took effect.
    ///
    /// This is an acknowledgment, not an absolute-value report: the local
    /// state inverts on receipt.
    SwitchAck { index: u8 },
    /// The doorbell button was pressed on the device.
    ButtonPressed,
    /// The device reports the door finished opening.
    DoorOpened,
    /// The device reports the door finished closing.
    DoorClosed,
    /// Anything that failed to classify; logged and otherwise ignored.
    Unrecognized { line: String },
}

/// Decode one inbound line (surrounding whitespace is ignored).
pub fn decode_line(line: &str) -> DeviceEvent {
    let line = line.trim();

    if let Some(payload) = line.strip_prefix("POT:") {
        return match payload.trim().parse::<u16>() {
            Ok(raw) if raw <= MAX_RAW_READING => DeviceEvent::Reading { raw },
            _ => unrecognized(line),
        };
    }

    if let Some(payload) = line.strip_prefix("LED_OK:") {
        // The index is validated at dispatch, not here: any integer payload
        // is a well-formed acknowledgment on the wire.
        return match payload.trim().parse::<u8>() {
            Ok(index) => DeviceEvent::SwitchAck { index },
            Err(_) => unrecognized(line),
        };
    }

    match line {
        "BUTTON_PRESSED" => DeviceEvent::ButtonPressed,
        "DOOR_OPENED" => DeviceEvent::DoorOpened,
        "DOOR_CLOSED" => DeviceEvent::DoorClosed,
        _ => unrecognized(line),
    }
}

fn unrecognized(line: &str) -> DeviceEvent {
    DeviceEvent::Unrecognized {
        line: line.to_string(),
    }
}

/// Whether a switch index is one the panel actually has.
pub fn is_valid_switch_index(index: u8) -> bool {
    (index as usize) < SWITCH_COUNT
}
