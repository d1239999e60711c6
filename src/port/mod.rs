//! Port abstraction layer for serial communication.
//!
//! `SerialPort` is the owning handle; `NativePort` is the seam between it
//! and the OS (or the in-memory mock used in tests).

pub mod error;
mod handle;
mod lifecycle;
pub mod mock;
pub mod traits;

pub use error::{PortError, PortResult};
pub use handle::SerialPort;
pub use mock::{MockDevice, MockPort, MockSettings};
pub use traits::*;
