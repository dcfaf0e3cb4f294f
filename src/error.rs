//! Unified panel-level error type.

use crate::port::PortError;
use thiserror::Error;

/// Errors surfaced by panel operations.
///
/// Protocol-level anomalies never appear here: a malformed inbound line is a
/// logged [`crate::protocol::DeviceEvent::Unrecognized`] value, not an error.
#[derive(Debug, Error)]
pub enum AppError {
    /// An action that requires a live, settled connection was invoked
    /// without one. Surfaced as a warning; the action is discarded.
    #[error("not connected to the device")]
    NotConnected,

    /// A second connection was attempted while one is open.
    #[error("a connection is already open")]
    AlreadyConnected,

    /// A switch index outside the panel's range was requested.
    #[error("no such switch: {0}")]
    InvalidSwitch(u8),

    /// The serial port could not be opened or failed mid-operation.
    #[error("connection failed: {0}")]
    Connection(#[from] PortError),

    /// The shared link lock was poisoned by a panicked thread.
    #[error("device link state is poisoned")]
    LinkPoisoned,

    /// A collaborator-side action (such as launching the camera viewer)
    /// failed. Core state is unaffected.
    #[error("external action failed: {0}")]
    External(String),
}
