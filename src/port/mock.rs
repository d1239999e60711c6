//! Mock serial backend for testing.
//!
//! Provides `MockPort`, a `NativePort` implementation backed by in-memory
//! devices, so the lifecycle and handle logic can be exercised without
//! hardware. Devices are registered by name with [`MockDevice::install`] and
//! can be wired together as a null-modem pair.
//!
//! # Example
//! ```
//! use portable_serial::port::{MockDevice, MockPort, OpenMode};
//! use portable_serial::SerialPort;
//!
//! let left = MockDevice::install("mock-doc-left");
//! let right = MockDevice::install("mock-doc-right");
//! left.connect(&right);
//!
//! let mut a = SerialPort::<MockPort>::with_backend("mock-doc-left");
//! let mut b = SerialPort::<MockPort>::with_backend("mock-doc-right");
//! a.open(OpenMode::READ_WRITE).unwrap();
//! b.open(OpenMode::READ_WRITE).unwrap();
//!
//! assert_eq!(a.write(b"ping"), 4);
//! assert_eq!(b.read_available(), b"ping");
//! ```

use super::error::{PortError, PortResult};
use super::traits::{NativePort, OpenMode, PortConfiguration, Queue};
use crate::enumerator::path_from_name;
use crate::properties::{
    BaudRate, CharacterSize, ControlLine, FlowControl, Parity, PortProperty, StopBit,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Weak};

// Weak so that a device disappears once its last `MockDevice` and
// `MockPort` are dropped.
static REGISTRY: Lazy<Mutex<HashMap<String, Weak<Mutex<MockLine>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Native settings of a mock device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSettings {
    pub baud_rate: BaudRate,
    pub character_size: CharacterSize,
    pub flow_control: FlowControl,
    pub parity: Parity,
    pub stop_bit: StopBit,
    /// Whether the device has been put in raw mode.
    pub raw: bool,
}

impl Default for MockSettings {
    /// A freshly booted tty: 9600 8N1, cooked.
    fn default() -> Self {
        Self {
            baud_rate: BaudRate::Baud9600,
            character_size: CharacterSize::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bit: StopBit::One,
            raw: false,
        }
    }
}

/// Failures to inject into the next operations on a device.
#[derive(Debug, Clone, Default)]
struct Faults {
    open: bool,
    capture: bool,
    exclusive: bool,
    release: bool,
    /// Settings writes succeed but the timeout write that follows fails.
    timeouts: bool,
    /// Number of further applies that succeed before every apply fails.
    apply_budget: Option<usize>,
}

#[derive(Debug, Default)]
struct MockLine {
    settings: MockSettings,
    input: VecDeque<u8>,
    peer: Weak<Mutex<MockLine>>,
    driven: ControlLine,
    open_count: usize,
    exclusive: bool,
    faults: Faults,
    applied: Vec<MockSettings>,
    drains: usize,
}

impl MockLine {
    fn take_apply_permit(&mut self) -> bool {
        match self.faults.apply_budget.as_mut() {
            None => true,
            Some(0) => false,
            Some(remaining) => {
                *remaining -= 1;
                true
            }
        }
    }
}

fn injected(what: &str) -> io::Error {
    io::Error::other(format!("injected {what} failure"))
}

/// Test-side handle on a registered mock device.
#[derive(Clone)]
pub struct MockDevice {
    name: String,
    line: Arc<Mutex<MockLine>>,
}

impl MockDevice {
    /// Register (or replace) a device reachable under `name`.
    ///
    /// The device stays registered while any `MockDevice` clone or open
    /// `MockPort` refers to it.
    pub fn install(name: &str) -> Self {
        let line = Arc::new(Mutex::new(MockLine::default()));
        let mut registry = REGISTRY.lock();
        registry.retain(|_, entry| entry.strong_count() > 0);
        registry.insert(path_from_name(name), Arc::downgrade(&line));
        Self {
            name: name.to_string(),
            line,
        }
    }

    /// Remove the device; later opens fail as if it was unplugged.
    pub fn uninstall(&self) {
        REGISTRY.lock().remove(&path_from_name(&self.name));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wire the two devices as a null-modem pair: TX to RX, DTR to DCD and
    /// DSR, RTS to CTS. Connecting a device to itself makes a loopback plug.
    pub fn connect(&self, other: &MockDevice) {
        self.line.lock().peer = Arc::downgrade(&other.line);
        other.line.lock().peer = Arc::downgrade(&self.line);
    }

    /// Settings currently applied to the device.
    pub fn settings(&self) -> MockSettings {
        self.line.lock().settings
    }

    /// Every settings write, oldest first.
    pub fn applied(&self) -> Vec<MockSettings> {
        self.line.lock().applied.clone()
    }

    pub fn drain_count(&self) -> usize {
        self.line.lock().drains
    }

    pub fn is_open(&self) -> bool {
        self.line.lock().open_count > 0
    }

    pub fn is_exclusive(&self) -> bool {
        self.line.lock().exclusive
    }

    /// Queue bytes as if they had arrived on the wire.
    pub fn receive(&self, data: &[u8]) {
        self.line.lock().input.extend(data);
    }

    pub fn fail_open(&self, fail: bool) {
        self.line.lock().faults.open = fail;
    }

    pub fn fail_capture(&self, fail: bool) {
        self.line.lock().faults.capture = fail;
    }

    pub fn fail_exclusive(&self, fail: bool) {
        self.line.lock().faults.exclusive = fail;
    }

    pub fn fail_release(&self, fail: bool) {
        self.line.lock().faults.release = fail;
    }

    /// Make the timeout half of every settings write fail.
    pub fn fail_timeouts(&self, fail: bool) {
        self.line.lock().faults.timeouts = fail;
    }

    /// Let `successes` more settings writes through, then fail every one.
    /// `None` clears the fault.
    pub fn fail_apply_after(&self, successes: Option<usize>) {
        self.line.lock().faults.apply_budget = successes;
    }
}

impl std::fmt::Debug for MockDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDevice")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .finish()
    }
}

/// `NativePort` over a registered [`MockDevice`].
pub struct MockPort {
    line: Arc<Mutex<MockLine>>,
    mode: OpenMode,
}

impl MockPort {
    fn peer(&self) -> Option<Arc<Mutex<MockLine>>> {
        self.line.lock().peer.upgrade()
    }
}

impl std::fmt::Debug for MockPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPort").field("mode", &self.mode).finish()
    }
}

impl NativePort for MockPort {
    type Settings = MockSettings;

    fn open(path: &str, mode: OpenMode) -> PortResult<Self> {
        let open_error = |source: io::Error| PortError::Open {
            path: path.to_string(),
            source,
        };
        let line = REGISTRY
            .lock()
            .get(path)
            .and_then(Weak::upgrade)
            .ok_or_else(|| open_error(io::Error::from(io::ErrorKind::NotFound)))?;
        {
            let mut state = line.lock();
            if state.faults.open {
                return Err(open_error(injected("open")));
            }
            if state.exclusive && state.open_count > 0 {
                return Err(open_error(io::Error::other("device or resource busy")));
            }
            state.open_count += 1;
        }
        Ok(Self { line, mode })
    }

    fn release(self) -> io::Result<()> {
        let mut state = self.line.lock();
        state.open_count = state.open_count.saturating_sub(1);
        if state.open_count == 0 {
            state.exclusive = false;
            state.driven = ControlLine::NONE;
        }
        if state.faults.release {
            Err(injected("release"))
        } else {
            Ok(())
        }
    }

    fn capture(&self) -> PortResult<MockSettings> {
        let state = self.line.lock();
        if state.faults.capture {
            return Err(PortError::GetSettings(injected("capture")));
        }
        Ok(state.settings)
    }

    fn prepare(settings: &mut MockSettings, config: &PortConfiguration) -> PortResult<()> {
        *settings = MockSettings {
            baud_rate: config.baud_rate.validate()?,
            character_size: config.character_size.validate()?,
            flow_control: config.flow_control.validate()?,
            parity: config.parity.validate()?,
            stop_bit: config.stop_bit.validate()?,
            raw: true,
        };
        Ok(())
    }

    fn apply(&self, settings: &MockSettings) -> bool {
        self.configure(settings).is_ok()
    }

    fn configure(&self, settings: &MockSettings) -> PortResult<()> {
        let mut state = self.line.lock();
        if !state.take_apply_permit() {
            return Err(PortError::SetSettings);
        }
        state.settings = *settings;
        state.applied.push(*settings);
        if state.faults.timeouts {
            return Err(PortError::SetTimeouts);
        }
        Ok(())
    }

    fn set_exclusive(&self, exclusive: bool) -> bool {
        let mut state = self.line.lock();
        if state.faults.exclusive {
            return false;
        }
        state.exclusive = exclusive;
        true
    }

    fn drain(&self) -> bool {
        self.line.lock().drains += 1;
        true
    }

    fn flush(&self, queue: Queue) -> bool {
        if matches!(queue, Queue::Input | Queue::Both) {
            self.line.lock().input.clear();
        }
        true
    }

    fn input_queue_count(&self) -> Option<usize> {
        Some(self.line.lock().input.len())
    }

    fn output_queue_count(&self) -> Option<usize> {
        // Writes reach the peer immediately.
        Some(0)
    }

    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.mode.contains(OpenMode::READ) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        let mut state = self.line.lock();
        if state.input.is_empty() {
            return Err(io::Error::from(io::ErrorKind::WouldBlock));
        }
        let count = buf.len().min(state.input.len());
        for (slot, byte) in buf.iter_mut().zip(state.input.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn write(&self, data: &[u8]) -> io::Result<usize> {
        if !self.mode.contains(OpenMode::WRITE) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        let mask = self.line.lock().settings.character_size.mask();
        if let Some(peer) = self.peer() {
            peer.lock().input.extend(data.iter().map(|byte| byte & mask));
        }
        Ok(data.len())
    }

    fn control_line(&self, mask: ControlLine) -> Option<bool> {
        let mut asserted = self.line.lock().driven;
        if let Some(peer) = self.peer() {
            let remote = peer.lock().driven;
            if remote.contains(ControlLine::DTR) {
                asserted |= ControlLine::DCD | ControlLine::DSR;
            }
            if remote.contains(ControlLine::RTS) {
                asserted |= ControlLine::CTS;
            }
        }
        Some(asserted.contains(mask))
    }

    fn set_control_line(&self, mask: ControlLine, state: bool) -> bool {
        let mut line = self.line.lock();
        let mask = mask & ControlLine::SETTABLE;
        if state {
            line.driven |= mask;
        } else {
            line.driven -= mask;
        }
        true
    }
}
