//! Port abstraction layer for serial communication.
//!
//! Provides the adapter trait plus real and mock implementations, enabling
//! dependency injection and hardware-free testing.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::MockSerialPort;
pub use sync_port::SyncSerialPort;
pub use traits::{PortConfiguration, SerialPortAdapter};
