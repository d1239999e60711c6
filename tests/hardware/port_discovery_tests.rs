//! Port discovery and enumeration tests.
//!
//! These use whatever ports the machine has. They are ignored because an
//! empty result is not meaningful on a machine without serial hardware.

use portable_serial::{list_ports, name_from_path, path_from_name, OpenMode, SerialPort};
use std::collections::HashSet;

use crate::hardware::utils::first_port;

#[test]
#[ignore] // Requires hardware
fn test_port_discovery() {
    let ports = list_ports().expect("enumeration failed");

    if ports.is_empty() {
        println!("No ports found - skipping test");
        return;
    }

    println!("Found {} port(s)", ports.len());
    for port in &ports {
        println!("  - {} ({})", port, path_from_name(port));
    }
}

#[test]
#[ignore]
fn test_discovered_names_are_bare_and_unique() {
    let ports = list_ports().expect("enumeration failed");

    let unique: HashSet<&String> = ports.iter().collect();
    assert_eq!(unique.len(), ports.len());
    for port in &ports {
        assert_eq!(&name_from_path(port), port);
    }
}

#[test]
#[ignore]
fn test_configured_port_is_discovered() {
    let Some(name) = first_port() else { return };

    let ports = list_ports().expect("enumeration failed");

    assert!(ports.contains(&name_from_path(&name)), "{name} not in {ports:?}");
}

#[test]
#[ignore]
fn test_discovered_ports_open() {
    let ports = list_ports().expect("enumeration failed");

    for name in ports {
        let mut port = SerialPort::new(&name);
        // Busy ports are fine; anything listed must at least exist.
        if let Err(err) = port.open(OpenMode::READ_WRITE) {
            println!("{name}: {err}");
        }
    }
}
