//! Tests requiring actual serial hardware.
//!
//! Every test returns early when its ports are not configured.
//!
//! # Hardware Requirements
//!
//! - **Single-port tests**: any serial port
//! - **Pair tests**: two ports joined by a null-modem cable (TX to RX,
//!   DTR to DSR/DCD, RTS to CTS)

use portable_serial::{
    BaudRate, ControlLine, FlowControl, OpenMode, Parity, PortConfiguration, PortError,
    SerialPort, StopBit,
};
use serial_test::serial;
use std::time::Duration;

use crate::common::{as_received, supported_combinations, test_pattern};
use crate::hardware::utils::{
    first_port, open_port, port_pair, testing_config, wait_for_transfer, TimingHelper,
};

#[test]
#[ignore] // Run with --ignored flag
#[serial]
fn test_real_port_open_close() {
    let Some(name) = first_port() else { return };

    // Arrange
    let mut port = SerialPort::new(&name);

    // Act
    port.open(OpenMode::READ_WRITE).expect("open failed");
    let was_open = port.is_open();
    port.close().expect("close failed");

    // Assert
    assert!(was_open);
    assert!(!port.is_open());
}

#[test]
#[ignore]
#[serial]
fn test_real_port_exclusive_blocks_second_open() {
    let Some(name) = first_port() else { return };

    // Arrange
    let _holder = open_port(&name, PortConfiguration::default()).expect("open failed");
    let mut intruder = SerialPort::new(&name);

    // Act
    let result = intruder.open(OpenMode::READ_WRITE);

    // Assert
    #[cfg(unix)]
    assert!(matches!(result, Err(PortError::Open { .. })), "{result:?}");
    #[cfg(windows)]
    assert!(result.is_err());
}

#[test]
#[ignore]
#[serial]
fn test_real_port_reconfigure_while_open() {
    let Some(name) = first_port() else { return };

    // Arrange
    let mut port = open_port(&name, PortConfiguration::default()).expect("open failed");

    // Act
    port.set_baud_rate(BaudRate::Baud9600).expect("baud");
    port.set_parity(Parity::Even).expect("parity");
    port.set_stop_bit(StopBit::Two).expect("stop bit");
    port.set_flow_control(FlowControl::Hardware).expect("flow");

    // Assert
    let config = port.configuration();
    assert_eq!(config.baud_rate, BaudRate::Baud9600);
    assert_eq!(config.parity, Parity::Even);
    assert_eq!(config.stop_bit, StopBit::Two);
    assert_eq!(config.flow_control, FlowControl::Hardware);
}

#[test]
#[ignore]
#[serial]
fn test_real_port_queues_start_empty() {
    let Some(name) = first_port() else { return };

    // Arrange
    let mut port = open_port(&name, PortConfiguration::default()).expect("open failed");

    // Act
    port.flush_input_output();

    // Assert
    assert_eq!(port.output_queue_count(), 0);
}

#[test]
#[ignore]
#[serial]
fn test_null_modem_loopback_all_settings() {
    let Some((first, second)) = port_pair() else { return };
    let margin = testing_config().settle_margin();
    let pattern = test_pattern(16);
    let mut sender = open_port(&first, PortConfiguration::default()).expect("open first");
    let mut receiver = open_port(&second, PortConfiguration::default()).expect("open second");
    let timer = TimingHelper::new("null-modem loopback");

    let mut failures = Vec::new();
    for config in supported_combinations() {
        // Arrange
        sender.set_configuration(config).expect("configure sender");
        receiver.set_configuration(config).expect("configure receiver");
        receiver.flush_input();

        // Act
        let written = sender.write(&pattern);
        sender.drain();
        wait_for_transfer(&config, written, margin);
        let received = receiver.read_available();

        // Assert (collected so one run reports every failing setting)
        if written != pattern.len() || received != as_received(&pattern, config.character_size) {
            failures.push(config);
        }
    }

    timer.finish();
    assert!(failures.is_empty(), "failed settings: {failures:#?}");
}

#[test]
#[ignore]
#[serial]
fn test_null_modem_control_lines() {
    let Some((first, second)) = port_pair() else { return };

    // Arrange
    let mut near = open_port(&first, PortConfiguration::default()).expect("open first");
    let far = open_port(&second, PortConfiguration::default()).expect("open second");

    for state in [true, false] {
        // Act
        assert!(near.set_control_line(ControlLine::DTR | ControlLine::RTS, state));
        std::thread::sleep(Duration::from_millis(20));

        // Assert
        assert_eq!(far.control_line(ControlLine::DSR), state);
        assert_eq!(far.control_line(ControlLine::CTS), state);
    }
}

#[test]
#[ignore]
#[serial]
fn test_null_modem_input_queue_count() {
    let Some((first, second)) = port_pair() else { return };
    let margin = testing_config().settle_margin();

    // Arrange
    let config = PortConfiguration {
        baud_rate: BaudRate::Baud115200,
        ..PortConfiguration::default()
    };
    let mut sender = open_port(&first, config).expect("open first");
    let mut receiver = open_port(&second, config).expect("open second");
    receiver.flush_input();

    // Act
    let written = sender.write(b"0123456789");
    sender.drain();
    wait_for_transfer(&config, written, margin);

    // Assert
    assert_eq!(receiver.input_queue_count(), 10);
    assert_eq!(receiver.read_available(), b"0123456789".to_vec());
    assert_eq!(receiver.input_queue_count(), 0);
}
