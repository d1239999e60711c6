//! The public serial port handle.

use super::error::PortResult;
use super::lifecycle::Lifecycle;
use super::traits::{NativePort, OpenMode, PortConfiguration, Queue};
use crate::enumerator::path_from_name;
use crate::properties::{BaudRate, CharacterSize, ControlLine, FlowControl, Parity, PortProperty, StopBit};
use crate::sys::NativeBackend;
use std::fmt;
use std::io;
use tracing::debug;

const READ_CHUNK: usize = 64;

/// A named serial port and its portable configuration.
///
/// The configuration can be changed at any time; while the port is open
/// every change is translated onto the device immediately. Dropping an
/// open port restores the settings it had before it was opened.
///
/// # Example
/// ```no_run
/// use portable_serial::{BaudRate, SerialPort};
/// use portable_serial::port::OpenMode;
///
/// let mut port = SerialPort::new("ttyUSB0");
/// port.set_baud_rate(BaudRate::Baud9600)?;
/// port.open(OpenMode::READ_WRITE)?;
/// port.write(b"AT\r");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SerialPort<D: NativePort = NativeBackend> {
    name: String,
    config: PortConfiguration,
    lifecycle: Lifecycle<D>,
}

impl SerialPort<NativeBackend> {
    /// A closed port with the default configuration (115200 8N1, no flow
    /// control).
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_backend(name)
    }
}

impl<D: NativePort> SerialPort<D> {
    /// A closed port on an explicit backend.
    pub fn with_backend(name: impl Into<String>) -> Self {
        Self::with_configuration(name, PortConfiguration::default())
    }

    pub fn with_configuration(name: impl Into<String>, config: PortConfiguration) -> Self {
        Self {
            name: name.into(),
            config,
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device path the port opens.
    pub fn path(&self) -> String {
        path_from_name(&self.name)
    }

    /// Rename the port, reopening it under the new name if it is open.
    pub fn set_name(&mut self, name: impl Into<String>) -> PortResult<()> {
        self.name = name.into();
        let path = self.path();
        self.lifecycle.reopen(&path, &self.config)
    }

    pub fn open(&mut self, mode: OpenMode) -> PortResult<()> {
        let path = self.path();
        self.lifecycle.open(&path, mode, &self.config)
    }

    /// Close the port, restoring the settings captured on open.
    ///
    /// The port is closed even when an error is returned.
    pub fn close(&mut self) -> PortResult<()> {
        self.lifecycle.close()
    }

    pub fn is_open(&self) -> bool {
        self.lifecycle.is_open()
    }

    pub fn reopen(&mut self) -> PortResult<()> {
        let path = self.path();
        self.lifecycle.reopen(&path, &self.config)
    }

    /// Request or give up exclusive access. `false` when closed.
    pub fn set_exclusive(&mut self, exclusive: bool) -> bool {
        self.lifecycle.set_exclusive(exclusive)
    }

    pub fn configuration(&self) -> PortConfiguration {
        self.config
    }

    /// Replace the whole configuration at once.
    pub fn set_configuration(&mut self, config: PortConfiguration) -> PortResult<()> {
        config.baud_rate.validate()?;
        config.character_size.validate()?;
        config.flow_control.validate()?;
        config.parity.validate()?;
        config.stop_bit.validate()?;
        let drain = config.parity != self.config.parity
            || config.stop_bit != self.config.stop_bit
            || config.flow_control != self.config.flow_control;
        self.reconfigure(config, drain)
    }

    pub fn baud_rate(&self) -> BaudRate {
        self.config.baud_rate
    }

    pub fn set_baud_rate(&mut self, baud_rate: BaudRate) -> PortResult<()> {
        let baud_rate = baud_rate.validate()?;
        self.reconfigure(PortConfiguration { baud_rate, ..self.config }, false)
    }

    pub fn character_size(&self) -> CharacterSize {
        self.config.character_size
    }

    pub fn set_character_size(&mut self, character_size: CharacterSize) -> PortResult<()> {
        let character_size = character_size.validate()?;
        self.reconfigure(PortConfiguration { character_size, ..self.config }, false)
    }

    pub fn flow_control(&self) -> FlowControl {
        self.config.flow_control
    }

    /// Pending output is drained before the discipline changes.
    pub fn set_flow_control(&mut self, flow_control: FlowControl) -> PortResult<()> {
        let flow_control = flow_control.validate()?;
        self.reconfigure(PortConfiguration { flow_control, ..self.config }, true)
    }

    pub fn parity(&self) -> Parity {
        self.config.parity
    }

    /// Pending output is drained before the framing changes.
    pub fn set_parity(&mut self, parity: Parity) -> PortResult<()> {
        let parity = parity.validate()?;
        self.reconfigure(PortConfiguration { parity, ..self.config }, true)
    }

    pub fn stop_bit(&self) -> StopBit {
        self.config.stop_bit
    }

    /// Pending output is drained before the framing changes.
    pub fn set_stop_bit(&mut self, stop_bit: StopBit) -> PortResult<()> {
        let stop_bit = stop_bit.validate()?;
        self.reconfigure(PortConfiguration { stop_bit, ..self.config }, true)
    }

    /// Store `config` and apply it if open; the previous configuration is
    /// kept when applying fails.
    fn reconfigure(&mut self, config: PortConfiguration, drain: bool) -> PortResult<()> {
        if drain {
            self.drain();
        }
        let previous = std::mem::replace(&mut self.config, config);
        if let Err(err) = self.lifecycle.update(&self.config) {
            debug!(port = %self.name, error = %err, "reconfiguration failed, keeping previous settings");
            self.config = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Whether every line in `mask` is asserted. `false` when closed or when
    /// the lines cannot be read.
    pub fn control_line(&self, mask: ControlLine) -> bool {
        self.lifecycle
            .device()
            .and_then(|device| device.control_line(mask))
            .unwrap_or(false)
    }

    /// Drive DTR and/or RTS. Input lines in `mask` are ignored.
    pub fn set_control_line(&mut self, mask: ControlLine, state: bool) -> bool {
        self.lifecycle
            .device()
            .is_some_and(|device| device.set_control_line(mask & ControlLine::SETTABLE, state))
    }

    /// Bytes received and not yet read; 0 when unknown.
    pub fn input_queue_count(&self) -> usize {
        self.lifecycle
            .device()
            .and_then(NativePort::input_queue_count)
            .unwrap_or(0)
    }

    /// Bytes written and not yet transmitted; 0 when unknown.
    pub fn output_queue_count(&self) -> usize {
        self.lifecycle
            .device()
            .and_then(NativePort::output_queue_count)
            .unwrap_or(0)
    }

    /// Read what is buffered into `buf`. Returns 0 when nothing is available,
    /// the port is closed or the read fails.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        self.lifecycle
            .device()
            .and_then(|device| device.read(buf).ok())
            .unwrap_or(0)
    }

    /// Everything currently buffered.
    pub fn read_available(&mut self) -> Vec<u8> {
        let mut data = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let count = self.read(&mut chunk);
            if count == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..count]);
        }
        data
    }

    /// Bytes accepted by the device; 0 when closed or on failure.
    pub fn write(&mut self, data: &[u8]) -> usize {
        self.lifecycle
            .device()
            .and_then(|device| device.write(data).ok())
            .unwrap_or(0)
    }

    pub fn write_byte(&mut self, byte: u8) -> bool {
        self.write(&[byte]) == 1
    }

    /// Wait until pending output has been transmitted.
    pub fn drain(&mut self) -> bool {
        self.lifecycle.device().is_some_and(NativePort::drain)
    }

    /// Discard received, unread data.
    pub fn flush_input(&mut self) -> bool {
        self.flush_queue(Queue::Input)
    }

    /// Discard written, untransmitted data.
    pub fn flush_output(&mut self) -> bool {
        self.flush_queue(Queue::Output)
    }

    pub fn flush_input_output(&mut self) -> bool {
        self.flush_queue(Queue::Both)
    }

    fn flush_queue(&mut self, queue: Queue) -> bool {
        self.lifecycle.device().is_some_and(|device| device.flush(queue))
    }

    fn open_device(&self) -> io::Result<&D> {
        self.lifecycle
            .device()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port is not open"))
    }
}

impl<D: NativePort> fmt::Debug for SerialPort<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialPort")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Non-blocking: `WouldBlock` when nothing is buffered.
impl<D: NativePort> io::Read for SerialPort<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.open_device()?.read(buf)
    }
}

impl<D: NativePort> io::Write for SerialPort<D> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.open_device()?.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.open_device()?.drain() {
            Ok(())
        } else {
            Err(io::Error::other("unable to drain serial port output"))
        }
    }
}
