//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates the device end of the line
//! without requiring hardware. Tests enqueue inbound bytes, inspect the
//! outbound write log, and can force a one-shot failure.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Inner state of the mock port, protected by a mutex for interior mutability.
#[derive(Debug, Default)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all byte chunks written to the port.
    write_log: Vec<Vec<u8>>,
    /// Whether the next operation should fail with a timeout.
    fail_next: bool,
    /// Configured timeout duration, reported by simulated timeouts.
    timeout: Duration,
}

/// Mock serial port for tests.
///
/// Clones share the same underlying state, so a test can keep one handle
/// while the panel owns another:
///
/// ```
/// use domu_panel::port::{MockSerialPort, SerialPortAdapter};
///
/// let device = MockSerialPort::new("MOCK0");
/// let mut panel_side = device.clone();
///
/// device.enqueue_read(b"DOOR_OPENED\n");
/// let mut buf = [0u8; 16];
/// let n = panel_side.read_bytes(&mut buf).unwrap();
/// assert_eq!(&buf[..n], b"DOOR_OPENED\n");
///
/// panel_side.write_bytes(b"GET_POT\n").unwrap();
/// assert_eq!(device.write_log(), vec![b"GET_POT\n".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// The internal state, shared between clones.
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_secs(1),
                ..Default::default()
            })),
        }
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&self, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.read_queue.extend(data);
    }

    /// Get a copy of all data written to the port so far.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state.write_log.clone()
    }

    /// Get the written data as lossy UTF-8 strings, one per write call.
    pub fn written_lines(&self) -> Vec<String> {
        self.write_log()
            .into_iter()
            .map(|chunk| String::from_utf8_lossy(&chunk).into_owned())
            .collect()
    }

    /// Clear the write log.
    pub fn clear_write_log(&self) {
        let mut state = self.state.lock().unwrap();
        state.write_log.clear();
    }

    /// Make the next read or write fail with a timeout error.
    pub fn fail_next(&self) {
        let mut state = self.state.lock().unwrap();
        state.fail_next = true;
    }

    /// Get the number of bytes queued for reading.
    pub fn available_bytes(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.read_queue.len()
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock().unwrap();

        if state.fail_next {
            state.fail_next = false;
            return Err(PortError::timeout(state.timeout));
        }

        state.write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock().unwrap();

        if state.fail_next {
            state.fail_next = false;
            return Err(PortError::timeout(state.timeout));
        }

        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            if let Some(queued_byte) = state.read_queue.pop_front() {
                *byte = queued_byte;
                bytes_read += 1;
            } else {
                break;
            }
        }

        if bytes_read == 0 {
            // Simulate "would block" behavior for an empty queue.
            Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "No data available",
            )))
        } else {
            Ok(bytes_read)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bytes_to_read(&self) -> Option<usize> {
        Some(self.available_bytes())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"POT:512\n");

        let mut buffer = [0u8; 16];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 8);
        assert_eq!(&buffer[..n], b"POT:512\n");
    }

    #[test]
    fn test_write_logging() {
        let mut port = MockSerialPort::new("MOCK0");
        port.write_bytes(b"LED:0\n").unwrap();
        port.write_bytes(b"OPEN_DOOR\n").unwrap();

        assert_eq!(port.written_lines(), vec!["LED:0\n", "OPEN_DOOR\n"]);
    }

    #[test]
    fn test_clones_share_state() {
        let producer = MockSerialPort::new("MOCK0");
        let mut consumer = producer.clone();

        producer.enqueue_read(b"BUTTON_PRESSED\n");
        let mut buffer = [0u8; 32];
        let n = consumer.read_bytes(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"BUTTON_PRESSED\n");
    }

    #[test]
    fn test_empty_read_would_block() {
        let mut port = MockSerialPort::new("MOCK0");
        let mut buffer = [0u8; 10];

        let result = port.read_bytes(&mut buffer);
        match result {
            Err(PortError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::WouldBlock),
            other => panic!("Expected WouldBlock error, got {:?}", other),
        }
    }

    #[test]
    fn test_fail_next_is_one_shot() {
        let mut port = MockSerialPort::new("MOCK0");
        port.fail_next();

        assert!(matches!(
            port.write_bytes(b"LED:1\n"),
            Err(PortError::Timeout(_))
        ));
        assert!(port.write_bytes(b"LED:1\n").is_ok());
    }

    #[test]
    fn test_partial_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"DOOR_CLOSED\n");

        let mut buffer = [0u8; 4];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buffer[..n], b"DOOR");
        assert_eq!(port.available_bytes(), 8);
    }

    #[test]
    fn test_bytes_to_read() {
        let port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"POT:1\n");
        assert_eq!(port.bytes_to_read(), Some(6));
    }
}
