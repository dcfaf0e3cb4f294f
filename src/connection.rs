//! Device link ownership and port discovery.
//!
//! The serial handle lives in a [`LinkState`] behind an `Arc<Mutex<_>>`
//! shared between the intent side (which writes commands) and the reader
//! thread (which only reads). The panel is the only component that replaces
//! the link state; at most one link is open at a time.

use crate::port::SerialPortAdapter;
use std::sync::{Arc, Mutex};

/// Shared, thread-safe handle to the device link.
pub type SharedLink = Arc<Mutex<LinkState>>;

/// Current state of the serial link.
#[derive(Debug, Default)]
pub enum LinkState {
    #[default]
    Closed,
    Open {
        /// The port adapter; a trait object so tests can inject a mock.
        port: Box<dyn SerialPortAdapter>,
        /// Name the link was opened under.
        port_name: String,
        /// Baud rate the link was opened at.
        baud_rate: u32,
    },
}

impl LinkState {
    pub fn is_open(&self) -> bool {
        matches!(self, LinkState::Open { .. })
    }

    /// Port name if the link is open.
    pub fn port_name(&self) -> Option<&str> {
        match self {
            LinkState::Open { port_name, .. } => Some(port_name),
            LinkState::Closed => None,
        }
    }
}

/// Create a fresh, closed shared link.
pub fn new_shared_link() -> SharedLink {
    Arc::new(Mutex::new(LinkState::Closed))
}

/// Enumerate candidate serial ports, sorted by name.
///
/// Callers re-poll this on a fixed interval while disconnected; enumeration
/// failure is reported as an empty list rather than an error.
pub fn available_ports() -> Vec<String> {
    let mut names: Vec<String> = serialport::available_ports()
        .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
        .unwrap_or_default();
    names.sort();
    names
}
