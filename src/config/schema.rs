//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::port::PortConfiguration;
use crate::properties::{BaudRate, CharacterSize, FlowControl, Parity, PortProperty, StopBit};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Port opened when no name is given.
#[cfg(windows)]
pub const DEFAULT_PORT_NAME: &str = "COM1";

/// Port opened when no name is given.
#[cfg(not(windows))]
pub const DEFAULT_PORT_NAME: &str = "ttyUSB0";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default port and line settings
    pub port: PortSection,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Hardware testing configuration
    pub testing: TestingConfig,
}

impl Config {
    /// Check every value against what this platform can configure.
    pub fn validate(&self) -> ConfigResult<()> {
        self.port.validate()?;
        self.logging.validate()
    }
}

/// `[port]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortSection {
    /// Port name, with or without the device prefix
    pub name: String,
    pub baud_rate: BaudRate,
    /// Data bits, 5 to 8
    pub character_size: CharacterSize,
    /// "hardware", "software" or "none"
    pub flow_control: FlowControl,
    /// "none", "odd", "even", "mark" or "space"
    pub parity: Parity,
    /// "one", "one_and_half" or "two"
    pub stop_bit: StopBit,
    /// Keep other processes from opening the port while it is open
    pub exclusive: bool,
}

impl Default for PortSection {
    fn default() -> Self {
        let line = PortConfiguration::default();
        Self {
            name: DEFAULT_PORT_NAME.to_string(),
            baud_rate: line.baud_rate,
            character_size: line.character_size,
            flow_control: line.flow_control,
            parity: line.parity,
            stop_bit: line.stop_bit,
            exclusive: true,
        }
    }
}

impl PortSection {
    /// Line settings described by this section.
    pub fn to_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud_rate,
            character_size: self.character_size,
            flow_control: self.flow_control,
            parity: self.parity,
            stop_bit: self.stop_bit,
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid_value("port.name", "must not be empty"));
        }
        check("port.baud_rate", self.baud_rate)?;
        check("port.character_size", self.character_size)?;
        check("port.flow_control", self.flow_control)?;
        check("port.parity", self.parity)?;
        check("port.stop_bit", self.stop_bit)
    }
}

fn check<P: PortProperty>(key: &str, value: P) -> ConfigResult<()> {
    value
        .validate()
        .map(drop)
        .map_err(|err| ConfigError::port_value(key, &err))
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive: "trace", "debug", "info", "warn", "error" or a
    /// full `EnvFilter` expression
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> ConfigResult<()> {
        tracing_subscriber::EnvFilter::try_new(&self.level)
            .map(drop)
            .map_err(|err| ConfigError::invalid_value("logging.level", err.to_string()))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

/// `[testing]` section: the null-modem pair used by the hardware suites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingConfig {
    /// One end of the null-modem cable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_port: Option<String>,
    /// The other end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_port: Option<String>,
    /// Extra wait after the computed transmission time, in milliseconds
    pub settle_margin_ms: u64,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            first_port: None,
            second_port: None,
            settle_margin_ms: 20,
        }
    }
}

impl TestingConfig {
    pub fn settle_margin(&self) -> Duration {
        Duration::from_millis(self.settle_margin_ms)
    }

    /// Both ends, if configured.
    pub fn port_pair(&self) -> Option<(&str, &str)> {
        Some((self.first_port.as_deref()?, self.second_port.as_deref()?))
    }
}
