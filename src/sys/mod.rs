//! Build-time selection of the native backend.
//!
//! Each backend exports the same items: the device type implementing
//! `NativePort`, the native constant types and lookups used by the property
//! tables, the device path prefix and the port probe used for discovery.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
mod syscall;
#[cfg(target_os = "linux")]
pub use linux::{
    native_baud, native_character_size, probe_ports, LinuxPort as NativeBackend,
    NativeCharacterSize, NativeSpeed, PORT_PREFIX,
};

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::{
    native_baud, native_character_size, probe_ports, NativeCharacterSize, NativeSpeed,
    WindowsPort as NativeBackend, PORT_PREFIX,
};

#[cfg(not(any(target_os = "linux", windows)))]
mod unsupported;
#[cfg(not(any(target_os = "linux", windows)))]
pub use unsupported::{
    native_baud, native_character_size, probe_ports, NativeCharacterSize, NativeSpeed,
    UnsupportedPort as NativeBackend, PORT_PREFIX,
};
