//! Core traits for serial port abstraction.
//!
//! Defines the portable configuration value and the `NativePort` trait that
//! lets the termios backend, the Win32 backend and the in-crate mock drive
//! the same lifecycle and handle code.

use super::error::{PortError, PortResult};
use crate::properties::{BaudRate, CharacterSize, ControlLine, FlowControl, Parity, StopBit};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::io;

/// Configuration parameters for a serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfiguration {
    /// Line speed.
    pub baud_rate: BaudRate,

    /// Number of data bits (5, 6, 7, or 8).
    pub character_size: CharacterSize,

    /// Flow control mode.
    pub flow_control: FlowControl,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bit: StopBit,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: BaudRate::DEFAULT,
            character_size: CharacterSize::DEFAULT,
            flow_control: FlowControl::DEFAULT,
            parity: Parity::DEFAULT,
            stop_bit: StopBit::DEFAULT,
        }
    }
}

bitflags! {
    /// Access requested when opening a port.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenMode: u8 {
        const READ = 0x01;
        const WRITE = 0x02;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl OpenMode {
    /// Read, write or read+write. Anything else cannot be opened.
    pub fn is_supported(self) -> bool {
        self == Self::READ || self == Self::WRITE || self == Self::READ_WRITE
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        Self::READ_WRITE
    }
}

/// Buffer selected by a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Queue {
    /// Received but unread data.
    Input,
    /// Written but untransmitted data.
    Output,
    Both,
}

/// An open OS serial device and its settings translator.
///
/// `capture`, `prepare` and `apply` form the translation cycle: read the
/// current native settings, rewrite them from a portable configuration and
/// write them back in a single call. Every other method is a thin
/// pass-through whose failure is reported as a soft value.
pub trait NativePort: Sized {
    /// Snapshot of everything the port restores on close.
    type Settings: Clone;

    /// Acquire the device at `path`.
    fn open(path: &str, mode: OpenMode) -> PortResult<Self>;

    /// Release the device. The handle is gone whatever the result.
    fn release(self) -> io::Result<()>;

    /// Read the current native settings.
    fn capture(&self) -> PortResult<Self::Settings>;

    /// Rewrite every relevant field of `settings` from `config`.
    fn prepare(settings: &mut Self::Settings, config: &PortConfiguration) -> PortResult<()>;

    /// Write `settings` to the device, attempting every part of them even
    /// when an earlier part is rejected.
    fn apply(&self, settings: &Self::Settings) -> bool;

    /// Write `settings`, reporting which part the device rejected.
    fn configure(&self, settings: &Self::Settings) -> PortResult<()> {
        if self.apply(settings) {
            Ok(())
        } else {
            Err(PortError::SetSettings)
        }
    }

    fn set_exclusive(&self, exclusive: bool) -> bool;

    /// Block until pending output has been transmitted.
    fn drain(&self) -> bool;

    fn flush(&self, queue: Queue) -> bool;

    fn input_queue_count(&self) -> Option<usize>;

    fn output_queue_count(&self) -> Option<usize>;

    /// Read whatever is buffered, without waiting.
    fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&self, data: &[u8]) -> io::Result<usize>;

    /// `Some(true)` when every line in `mask` is asserted.
    fn control_line(&self, mask: ControlLine) -> Option<bool>;

    /// Assert or clear the lines in `mask`.
    fn set_control_line(&self, mask: ControlLine, state: bool) -> bool;
}
