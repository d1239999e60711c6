//! Utility functions for hardware testing.
//!
//! Port names come from the `[testing]` table of the configuration file or
//! from the `PORTABLE_SERIAL_TESTING_*` environment variables.

use portable_serial::config::TestingConfig;
use portable_serial::{
    transmission_time_millis, ConfigLoader, OpenMode, PortConfiguration, PortResult, SerialPort,
};
use std::thread;
use std::time::{Duration, Instant};

/// Testing section of the resolved configuration.
pub fn testing_config() -> TestingConfig {
    ConfigLoader::load()
        .map(ConfigLoader::into_config)
        .unwrap_or_default()
        .testing
}

/// The single port to test, if configured.
pub fn first_port() -> Option<String> {
    let port = testing_config().first_port;
    if port.is_none() {
        println!("Skipping: PORTABLE_SERIAL_TESTING_FIRST_PORT not set");
    }
    port
}

/// Both ends of a null-modem cable, if configured.
pub fn port_pair() -> Option<(String, String)> {
    let testing = testing_config();
    match testing.port_pair() {
        Some((first, second)) => Some((first.to_string(), second.to_string())),
        None => {
            println!("Skipping: set PORTABLE_SERIAL_TESTING_FIRST_PORT and _SECOND_PORT");
            None
        }
    }
}

/// Open `name` read/write with `config` applied.
pub fn open_port(name: &str, config: PortConfiguration) -> PortResult<SerialPort> {
    let mut port = SerialPort::with_configuration(name, config);
    port.open(OpenMode::READ_WRITE)?;
    Ok(port)
}

/// Sleep long enough for `count` characters to cross the line.
pub fn wait_for_transfer(config: &PortConfiguration, count: usize, margin: Duration) {
    let per_char = transmission_time_millis(
        config.baud_rate,
        config.character_size,
        config.parity,
        config.stop_bit,
    )
    .unwrap_or(0.0);
    thread::sleep(Duration::from_secs_f64(per_char * count as f64 / 1000.0) + margin);
}

/// Timing helper for measuring operation duration.
pub struct TimingHelper {
    start: Instant,
    name: String,
}

impl TimingHelper {
    pub fn new(name: &str) -> Self {
        println!("Starting: {}", name);
        TimingHelper {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        println!("Completed: {} in {:?}", self.name, elapsed);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_helper() {
        let timer = TimingHelper::new("test operation");
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.finish();
        assert!(elapsed >= Duration::from_millis(10));
    }

    #[test]
    fn test_wait_for_transfer_includes_margin() {
        let timer = Instant::now();
        let config = PortConfiguration::default();
        wait_for_transfer(&config, 1, Duration::from_millis(5));
        assert!(timer.elapsed() >= Duration::from_millis(5));
    }
}
