//! Portable serial port configuration engine.
//!
//! Translates a small portable description of a serial line (baud rate,
//! character size, parity, stop bits, flow control, modem control lines)
//! into POSIX termios or Win32 DCB/COMMTIMEOUTS settings, and sequences
//! open, close and reconfiguration so that a port is always left in a
//! restorable state.
//!
//! # Modules
//!
//! - `properties`: line property tables, capability predicates and timing
//! - `port`: the `SerialPort` handle, the `NativePort` seam and a mock backend
//! - `enumerator`: port naming and discovery
//! - `config`: configuration management with TOML support
//! - `logging`: subscriber setup for programs using the crate

pub mod config;
pub mod enumerator;
pub mod logging;
pub mod port;
pub mod properties;
mod sys;

// Re-export commonly used types for convenience
pub use enumerator::{list_ports, name_from_path, path_from_name};
pub use port::{OpenMode, PortConfiguration, PortError, PortResult, SerialPort};
pub use properties::{
    transmission_time_millis, BaudRate, CharacterSize, ControlLine, FlowControl, Parity,
    Platform, PortProperty, StopBit,
};
pub use sys::{NativeBackend, NativeCharacterSize, NativeSpeed, PORT_PREFIX};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
