//! Port naming and discovery.
//!
//! A port *name* is what users type (`ttyUSB0`, `COM3`); a *path* is what
//! the OS opens (`/dev/ttyUSB0`, `\\.\COM3`).

use crate::port::PortResult;
use crate::sys::{self, PORT_PREFIX};

/// Device path for a port name. Paths are returned unchanged.
pub fn path_from_name(name: &str) -> String {
    if name.starts_with(PORT_PREFIX) {
        name.to_string()
    } else {
        format!("{PORT_PREFIX}{name}")
    }
}

/// Port name for a device path, with every leading prefix removed.
pub fn name_from_path(path: &str) -> String {
    let mut name = path;
    while let Some(rest) = name.strip_prefix(PORT_PREFIX) {
        name = rest;
    }
    name.to_string()
}

/// Names of the serial ports present on this machine.
///
/// Probes the conventional device names only; fails on targets without a
/// native backend.
pub fn list_ports() -> PortResult<Vec<String>> {
    sys::probe_ports()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_from_name() {
        assert_eq!(path_from_name("port0"), format!("{PORT_PREFIX}port0"));
        let path = path_from_name("port0");
        assert_eq!(path_from_name(&path), path);
    }

    #[test]
    fn test_name_from_path() {
        let doubled = format!("{PORT_PREFIX}{PORT_PREFIX}port1");
        assert_eq!(name_from_path(&doubled), "port1");
        assert_eq!(name_from_path("port1"), "port1");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_naming() {
        assert_eq!(path_from_name("ttyUSB0"), "/dev/ttyUSB0");
        assert_eq!(name_from_path("/dev/ttyACM3"), "ttyACM3");
    }

    #[cfg(windows)]
    #[test]
    fn test_windows_naming() {
        assert_eq!(path_from_name("COM3"), r"\\.\COM3");
        assert_eq!(name_from_path(r"\\.\COM12"), "COM12");
    }
}
