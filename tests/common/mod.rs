//! Shared test utilities for portable_serial integration tests.
//!
//! This module provides common test infrastructure including:
//! - Uniquely named mock devices so tests can run in parallel
//! - Null-modem pairs of mock devices
//! - Enumeration of every line setting the platform supports

#![allow(dead_code)]

use portable_serial::port::{MockDevice, MockPort};
use portable_serial::{
    BaudRate, CharacterSize, FlowControl, Parity, PortConfiguration, PortProperty, SerialPort,
    StopBit,
};
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// A device name no other test uses.
pub fn unique_name(tag: &str) -> String {
    format!("mock-{tag}-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Install a fresh mock device and a closed handle on it.
pub fn mock_port(tag: &str) -> (MockDevice, SerialPort<MockPort>) {
    let name = unique_name(tag);
    let device = MockDevice::install(&name);
    (device, SerialPort::with_backend(name))
}

/// Two mock devices wired as a null-modem pair, with a handle on each.
pub fn null_modem_pair(
    tag: &str,
) -> (
    (MockDevice, SerialPort<MockPort>),
    (MockDevice, SerialPort<MockPort>),
) {
    let first = mock_port(tag);
    let second = mock_port(tag);
    first.0.connect(&second.0);
    (first, second)
}

/// Every value of `P` the current platform can configure.
pub fn supported<P: PortProperty>() -> Vec<P> {
    P::ALL.iter().copied().filter(|value| value.is_supported()).collect()
}

/// Every supported baud/size/parity/stop combination, without flow control.
pub fn supported_combinations() -> Vec<PortConfiguration> {
    let mut combinations = Vec::new();
    for baud_rate in supported::<BaudRate>() {
        for character_size in supported::<CharacterSize>() {
            for parity in supported::<Parity>() {
                for stop_bit in supported::<StopBit>() {
                    combinations.push(PortConfiguration {
                        baud_rate,
                        character_size,
                        parity,
                        stop_bit,
                        flow_control: FlowControl::None,
                    });
                }
            }
        }
    }
    combinations
}

/// A byte pattern that exercises the high bits.
pub fn test_pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 37 + 0x81) as u8).collect()
}

/// What arrives at the far end once the line drops bits above `size`.
pub fn as_received(data: &[u8], size: CharacterSize) -> Vec<u8> {
    data.iter().map(|byte| byte & size.mask()).collect()
}
