//! Port-specific error types.
//!
//! Hard failures of the configuration and lifecycle engine. Conditions that
//! merely describe the state of the line (a short read, a drain that did not
//! complete, a control line that cannot be driven) are reported as `bool` or
//! byte counts by the port handle instead.

use super::traits::OpenMode;
use thiserror::Error;

/// Errors that can occur while configuring, opening or closing a serial port.
#[derive(Debug, Error)]
pub enum PortError {
    /// A configuration value is outside its declared range or not
    /// supported on this platform.
    #[error("{0}")]
    OutOfRange(String),

    /// The requested open mode is not read, write or read+write.
    #[error("Unsupported open mode: {0:?}")]
    UnsupportedOpenMode(OpenMode),

    /// The native device could not be opened.
    #[error("Unable to open serial port '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The native settings could not be read.
    #[error("Unable to get port settings: {0}")]
    GetSettings(#[source] std::io::Error),

    /// The native timeout settings could not be read.
    #[error("Unable to get port timeout settings: {0}")]
    GetTimeouts(#[source] std::io::Error),

    /// The native settings (or timeouts) could not be written.
    #[error("Unable to set port settings")]
    SetSettings,

    /// The native timeout settings could not be written.
    #[error("Unable to set port timeout settings")]
    SetTimeouts,

    /// Exclusive access to the device could not be obtained.
    #[error("Unable to set exclusive mode")]
    Exclusive,

    /// The build target has no native serial backend.
    #[error("Serial ports are not supported on this platform")]
    UnsupportedPlatform,
}

impl PortError {
    /// Create an error for a value past the end of its declared range.
    pub fn out_of_range(property: &str) -> Self {
        Self::OutOfRange(format!("{property} out of range"))
    }

    /// Create an error for a value the current platform cannot use.
    pub fn not_supported(property: &str) -> Self {
        Self::OutOfRange(format!("{property} not supported"))
    }

    /// Whether this error was raised by value validation rather than by the OS.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange(_))
    }
}

/// Result type for port operations.
pub type PortResult<T> = Result<T, PortError>;
