//! Fallback for targets without a native serial backend.

use crate::port::{NativePort, OpenMode, PortConfiguration, PortError, PortResult, Queue};
use crate::properties::{BaudRate, CharacterSize, ControlLine};
use std::io;

pub const PORT_PREFIX: &str = "/dev/";

pub type NativeSpeed = u32;
pub type NativeCharacterSize = u8;

pub fn native_baud(_baud: BaudRate) -> Option<NativeSpeed> {
    None
}

pub fn native_character_size(_size: CharacterSize) -> Option<NativeCharacterSize> {
    None
}

pub fn probe_ports() -> PortResult<Vec<String>> {
    Err(PortError::UnsupportedPlatform)
}

/// Uninhabited: opening always fails, so no value ever exists.
#[derive(Debug)]
pub enum UnsupportedPort {}

impl NativePort for UnsupportedPort {
    type Settings = ();

    fn open(_path: &str, _mode: OpenMode) -> PortResult<Self> {
        Err(PortError::UnsupportedPlatform)
    }

    fn release(self) -> io::Result<()> {
        match self {}
    }

    fn capture(&self) -> PortResult<()> {
        match *self {}
    }

    fn prepare(_settings: &mut (), _config: &PortConfiguration) -> PortResult<()> {
        Err(PortError::UnsupportedPlatform)
    }

    fn apply(&self, _settings: &()) -> bool {
        match *self {}
    }

    fn set_exclusive(&self, _exclusive: bool) -> bool {
        match *self {}
    }

    fn drain(&self) -> bool {
        match *self {}
    }

    fn flush(&self, _queue: Queue) -> bool {
        match *self {}
    }

    fn input_queue_count(&self) -> Option<usize> {
        match *self {}
    }

    fn output_queue_count(&self) -> Option<usize> {
        match *self {}
    }

    fn read(&self, _buf: &mut [u8]) -> io::Result<usize> {
        match *self {}
    }

    fn write(&self, _data: &[u8]) -> io::Result<usize> {
        match *self {}
    }

    fn control_line(&self, _mask: ControlLine) -> Option<bool> {
        match *self {}
    }

    fn set_control_line(&self, _mask: ControlLine, _state: bool) -> bool {
        match *self {}
    }
}
