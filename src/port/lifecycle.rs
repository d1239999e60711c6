//! Open/close/reconfigure sequencing.
//!
//! A port is open exactly when a native device is held. Opening captures
//! the device's settings so that closing can put them back; every failure
//! after the device has been acquired releases it again before returning.

use super::error::{PortError, PortResult};
use super::traits::{NativePort, OpenMode, PortConfiguration};
use tracing::{debug, warn};

/// A held device and the settings it had before we touched it.
pub(crate) struct OpenDevice<D: NativePort> {
    device: D,
    saved: D::Settings,
}

/// Closed/open state machine over a native backend.
pub(crate) struct Lifecycle<D: NativePort> {
    open: Option<OpenDevice<D>>,
    mode: OpenMode,
}

impl<D: NativePort> Lifecycle<D> {
    pub(crate) fn new() -> Self {
        Self {
            open: None,
            mode: OpenMode::default(),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// The held device, if open.
    pub(crate) fn device(&self) -> Option<&D> {
        self.open.as_ref().map(|open| &open.device)
    }

    pub(crate) fn open(&mut self, path: &str, mode: OpenMode, config: &PortConfiguration) -> PortResult<()> {
        if self.is_open() {
            return Ok(());
        }
        if !mode.is_supported() {
            return Err(PortError::UnsupportedOpenMode(mode));
        }

        let device = D::open(path, mode)?;
        let saved = match device.capture() {
            Ok(saved) => saved,
            Err(err) => {
                release(device);
                return Err(err);
            }
        };
        if !device.set_exclusive(true) {
            release(device);
            return Err(PortError::Exclusive);
        }

        self.open = Some(OpenDevice { device, saved });
        self.mode = mode;
        if let Err(err) = self.update(config) {
            if let Err(close_err) = self.close() {
                warn!(path, error = %close_err, "rollback after failed open could not restore settings");
            }
            return Err(err);
        }

        debug!(path, ?mode, "serial port opened");
        Ok(())
    }

    /// Restore the saved settings and release the device.
    ///
    /// The port is closed when this returns, even when restoring failed.
    pub(crate) fn close(&mut self) -> PortResult<()> {
        let Some(OpenDevice { device, saved }) = self.open.take() else {
            return Ok(());
        };
        let restored = device.apply(&saved);
        if !restored {
            warn!("failed to restore saved port settings");
        }
        release(device);
        debug!("serial port closed");
        if restored {
            Ok(())
        } else {
            Err(PortError::SetSettings)
        }
    }

    /// Translate `config` onto the device. No-op while closed.
    pub(crate) fn update(&mut self, config: &PortConfiguration) -> PortResult<()> {
        let Some(open) = self.open.as_ref() else {
            return Ok(());
        };
        let mut settings = open.device.capture()?;
        D::prepare(&mut settings, config)?;
        open.device.configure(&settings)
    }

    pub(crate) fn reopen(&mut self, path: &str, config: &PortConfiguration) -> PortResult<()> {
        if !self.is_open() {
            return Ok(());
        }
        self.close()?;
        self.open(path, self.mode, config)
    }

    pub(crate) fn set_exclusive(&self, exclusive: bool) -> bool {
        self.device().is_some_and(|device| device.set_exclusive(exclusive))
    }
}

impl<D: NativePort> Drop for Lifecycle<D> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            debug!(error = %err, "discarding close error on drop");
        }
    }
}

fn release<D: NativePort>(device: D) {
    if let Err(err) = device.release() {
        warn!(error = %err, "failed to release serial device");
    }
}
