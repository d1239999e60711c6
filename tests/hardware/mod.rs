//! Hardware-specific tests requiring real serial devices.
//!
//! These tests are ignored by default. Run them manually with the
//! `--ignored` flag after naming the ports to use:
//!
//! ```bash
//! export PORTABLE_SERIAL_TESTING_FIRST_PORT=ttyUSB0
//! export PORTABLE_SERIAL_TESTING_SECOND_PORT=ttyUSB1   # other end of a null-modem cable
//! cargo test --features hardware-tests --test integration_hardware -- --ignored --test-threads=1
//! ```

pub mod port_discovery_tests;
pub mod real_port_tests;
pub mod utils;
