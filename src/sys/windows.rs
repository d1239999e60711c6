//! Win32 DCB backend.

use crate::port::{NativePort, OpenMode, PortConfiguration, PortError, PortResult, Queue};
use crate::properties::{ascii, BaudRate, CharacterSize, ControlLine, FlowControl, Parity, StopBit};
use std::ffi::OsStr;
use std::io;
use std::mem;
use std::os::windows::ffi::OsStrExt;
use std::ptr;
use tracing::trace;
use winapi::shared::minwindef::{BYTE, DWORD, FALSE};
use winapi::um::commapi::{
    ClearCommError, EscapeCommFunction, GetCommModemStatus, GetCommState, GetCommTimeouts,
    PurgeComm, SetCommState, SetCommTimeouts,
};
use winapi::um::fileapi::{CreateFileW, FlushFileBuffers, ReadFile, WriteFile, OPEN_EXISTING};
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::winbase::{
    CBR_110, CBR_115200, CBR_1200, CBR_128000, CBR_14400, CBR_19200, CBR_2400, CBR_256000,
    CBR_300, CBR_38400, CBR_4800, CBR_56000, CBR_57600, CBR_600, CBR_9600, CLRDTR, CLRRTS,
    COMMTIMEOUTS, COMSTAT, DCB, DTR_CONTROL_DISABLE, EVENPARITY, MARKPARITY, MS_CTS_ON,
    MS_DSR_ON, MS_RING_ON, MS_RLSD_ON, NOPARITY, ODDPARITY, ONE5STOPBITS, ONESTOPBIT,
    PURGE_RXABORT, PURGE_RXCLEAR, PURGE_TXABORT, PURGE_TXCLEAR, RTS_CONTROL_DISABLE,
    RTS_CONTROL_HANDSHAKE, SETDTR, SETRTS, SPACEPARITY, TWOSTOPBITS,
};
use winapi::um::winnt::{GENERIC_READ, GENERIC_WRITE, HANDLE, MAXDWORD};

pub const PORT_PREFIX: &str = r"\\.\";

pub type NativeSpeed = DWORD;
pub type NativeCharacterSize = BYTE;

const PROBED_PORTS: std::ops::Range<usize> = 1..64;

const WRITE_TOTAL_TIMEOUT_MULTIPLIER_MS: DWORD = 100;
const WRITE_TOTAL_TIMEOUT_CONSTANT_MS: DWORD = 1000;

pub fn native_baud(baud: BaudRate) -> Option<DWORD> {
    let speed = match baud {
        BaudRate::Baud110 => CBR_110,
        BaudRate::Baud300 => CBR_300,
        BaudRate::Baud600 => CBR_600,
        BaudRate::Baud1200 => CBR_1200,
        BaudRate::Baud2400 => CBR_2400,
        BaudRate::Baud4800 => CBR_4800,
        BaudRate::Baud9600 => CBR_9600,
        BaudRate::Baud14400 => CBR_14400,
        BaudRate::Baud19200 => CBR_19200,
        BaudRate::Baud38400 => CBR_38400,
        BaudRate::Baud56000 => CBR_56000,
        BaudRate::Baud57600 => CBR_57600,
        BaudRate::Baud115200 => CBR_115200,
        BaudRate::Baud128000 => CBR_128000,
        BaudRate::Baud256000 => CBR_256000,
        _ => return None,
    };
    Some(speed)
}

pub fn native_character_size(size: CharacterSize) -> Option<BYTE> {
    Some(size.bits())
}

/// Settings restored on close: line settings and timeouts.
#[derive(Clone, Copy)]
pub struct WindowsSettings {
    dcb: DCB,
    timeouts: COMMTIMEOUTS,
}

fn wide_path(path: &str) -> Vec<u16> {
    OsStr::new(path).encode_wide().chain(Some(0)).collect()
}

fn open_handle(path: &str, access: DWORD) -> io::Result<HANDLE> {
    let path = wide_path(path);
    // Share mode 0: Windows serial handles are always exclusive.
    let handle = unsafe {
        CreateFileW(
            path.as_ptr(),
            access,
            0,
            ptr::null_mut(),
            OPEN_EXISTING,
            0,
            ptr::null_mut(),
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        Err(io::Error::last_os_error())
    } else {
        Ok(handle)
    }
}

/// An open COM device.
#[derive(Debug)]
pub struct WindowsPort {
    handle: HANDLE,
}

// The handle is owned exclusively and only used through `&self`/`self`.
unsafe impl Send for WindowsPort {}

impl WindowsPort {
    fn comm_status(&self) -> Option<COMSTAT> {
        let mut errors: DWORD = 0;
        let mut status: COMSTAT = unsafe { mem::zeroed() };
        let ok = unsafe { ClearCommError(self.handle, &mut errors, &mut status) };
        (ok != FALSE).then_some(status)
    }

    fn set_state(&self, mut dcb: DCB) -> bool {
        unsafe { SetCommState(self.handle, &mut dcb) != FALSE }
    }

    fn set_timeouts(&self, mut timeouts: COMMTIMEOUTS) -> bool {
        unsafe { SetCommTimeouts(self.handle, &mut timeouts) != FALSE }
    }

    fn escape(&self, function: DWORD) -> bool {
        unsafe { EscapeCommFunction(self.handle, function) != FALSE }
    }
}

impl Drop for WindowsPort {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.handle);
        }
    }
}

impl NativePort for WindowsPort {
    type Settings = WindowsSettings;

    fn open(path: &str, mode: OpenMode) -> PortResult<Self> {
        let mut access = 0;
        if mode.contains(OpenMode::READ) {
            access |= GENERIC_READ;
        }
        if mode.contains(OpenMode::WRITE) {
            access |= GENERIC_WRITE;
        }
        let handle = open_handle(path, access).map_err(|source| PortError::Open {
            path: path.to_string(),
            source,
        })?;
        trace!(path, "opened COM device");
        Ok(Self { handle })
    }

    fn release(self) -> io::Result<()> {
        let handle = self.handle;
        mem::forget(self);
        if unsafe { CloseHandle(handle) } == FALSE {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    fn capture(&self) -> PortResult<WindowsSettings> {
        let mut dcb: DCB = unsafe { mem::zeroed() };
        dcb.DCBlength = mem::size_of::<DCB>() as DWORD;
        if unsafe { GetCommState(self.handle, &mut dcb) } == FALSE {
            return Err(PortError::GetSettings(io::Error::last_os_error()));
        }
        let mut timeouts: COMMTIMEOUTS = unsafe { mem::zeroed() };
        if unsafe { GetCommTimeouts(self.handle, &mut timeouts) } == FALSE {
            return Err(PortError::GetTimeouts(io::Error::last_os_error()));
        }
        Ok(WindowsSettings { dcb, timeouts })
    }

    fn prepare(settings: &mut WindowsSettings, config: &PortConfiguration) -> PortResult<()> {
        let speed = config.baud_rate.native_value()?;
        let size = config.character_size.native_value()?;
        let hardware = config.flow_control == FlowControl::Hardware;
        let software = config.flow_control == FlowControl::Software;

        let dcb = &mut settings.dcb;
        dcb.DCBlength = mem::size_of::<DCB>() as DWORD;
        dcb.BaudRate = speed;
        dcb.set_fBinary(1);
        dcb.set_fParity(DWORD::from(config.parity.has_bit()));
        dcb.set_fOutxCtsFlow(DWORD::from(hardware));
        dcb.set_fOutxDsrFlow(0);
        dcb.set_fDtrControl(DTR_CONTROL_DISABLE);
        dcb.set_fDsrSensitivity(DWORD::from(hardware));
        dcb.set_fTXContinueOnXoff(0);
        dcb.set_fOutX(DWORD::from(software));
        dcb.set_fInX(DWORD::from(software));
        dcb.set_fErrorChar(0);
        dcb.set_fNull(0);
        dcb.set_fRtsControl(if hardware { RTS_CONTROL_HANDSHAKE } else { RTS_CONTROL_DISABLE });
        dcb.set_fAbortOnError(0);
        dcb.wReserved = 0;
        dcb.ByteSize = size;
        dcb.Parity = match config.parity {
            Parity::None => NOPARITY,
            Parity::Odd => ODDPARITY,
            Parity::Even => EVENPARITY,
            Parity::Mark => MARKPARITY,
            Parity::Space => SPACEPARITY,
        } as BYTE;
        dcb.StopBits = match config.stop_bit {
            StopBit::One => ONESTOPBIT,
            StopBit::OneAndHalf => ONE5STOPBITS,
            StopBit::Two => TWOSTOPBITS,
        } as BYTE;
        dcb.XonChar = ascii::XON as i8;
        dcb.XoffChar = ascii::XOFF as i8;
        dcb.ErrorChar = ascii::NUL as i8;
        dcb.EofChar = ascii::NUL as i8;
        dcb.EvtChar = ascii::NUL as i8;

        let timeouts = &mut settings.timeouts;
        timeouts.ReadIntervalTimeout = MAXDWORD;
        timeouts.ReadTotalTimeoutMultiplier = 0;
        timeouts.ReadTotalTimeoutConstant = 0;
        timeouts.WriteTotalTimeoutMultiplier = WRITE_TOTAL_TIMEOUT_MULTIPLIER_MS;
        timeouts.WriteTotalTimeoutConstant = WRITE_TOTAL_TIMEOUT_CONSTANT_MS;

        trace!(baud = speed, byte_size = size, "prepared DCB");
        Ok(())
    }

    /// Both halves are written even when the DCB is rejected, so a restore
    /// on close puts back as much as the driver accepts.
    fn apply(&self, settings: &WindowsSettings) -> bool {
        write_all([
            &|| self.set_state(settings.dcb),
            &|| self.set_timeouts(settings.timeouts),
        ])
    }

    fn configure(&self, settings: &WindowsSettings) -> PortResult<()> {
        if !self.set_state(settings.dcb) {
            return Err(PortError::SetSettings);
        }
        if !self.set_timeouts(settings.timeouts) {
            return Err(PortError::SetTimeouts);
        }
        Ok(())
    }

    fn set_exclusive(&self, exclusive: bool) -> bool {
        exclusive
    }

    fn drain(&self) -> bool {
        unsafe { FlushFileBuffers(self.handle) != FALSE }
    }

    fn flush(&self, queue: Queue) -> bool {
        let flags = match queue {
            Queue::Input => PURGE_RXABORT | PURGE_RXCLEAR,
            Queue::Output => PURGE_TXABORT | PURGE_TXCLEAR,
            Queue::Both => PURGE_RXABORT | PURGE_RXCLEAR | PURGE_TXABORT | PURGE_TXCLEAR,
        };
        unsafe { PurgeComm(self.handle, flags) != FALSE }
    }

    fn input_queue_count(&self) -> Option<usize> {
        self.comm_status().map(|status| status.cbInQue as usize)
    }

    fn output_queue_count(&self) -> Option<usize> {
        self.comm_status().map(|status| status.cbOutQue as usize)
    }

    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let len = DWORD::try_from(buf.len()).unwrap_or(MAXDWORD);
        let mut count: DWORD = 0;
        let ok = unsafe {
            ReadFile(self.handle, buf.as_mut_ptr().cast(), len, &mut count, ptr::null_mut())
        };
        if ok == FALSE {
            Err(io::Error::last_os_error())
        } else {
            Ok(count as usize)
        }
    }

    fn write(&self, data: &[u8]) -> io::Result<usize> {
        let len = DWORD::try_from(data.len()).unwrap_or(MAXDWORD);
        let mut count: DWORD = 0;
        let ok = unsafe {
            WriteFile(self.handle, data.as_ptr().cast(), len, &mut count, ptr::null_mut())
        };
        if ok == FALSE {
            Err(io::Error::last_os_error())
        } else {
            Ok(count as usize)
        }
    }

    fn control_line(&self, mask: ControlLine) -> Option<bool> {
        let mut status: DWORD = 0;
        if unsafe { GetCommModemStatus(self.handle, &mut status) } == FALSE {
            return None;
        }
        let wanted = modem_status_bits(mask);
        Some(status & wanted == wanted)
    }

    fn set_control_line(&self, mask: ControlLine, state: bool) -> bool {
        let mut ok = true;
        if mask.contains(ControlLine::DTR) {
            ok &= self.escape(if state { SETDTR } else { CLRDTR });
        }
        if mask.contains(ControlLine::RTS) {
            ok &= self.escape(if state { SETRTS } else { CLRRTS });
        }
        ok
    }
}

/// `GetCommModemStatus` bits for the readable lines in `mask`. DTR and RTS
/// have no status bit and are dropped.
fn modem_status_bits(mask: ControlLine) -> DWORD {
    let mut bits = 0;
    for (line, native) in [
        (ControlLine::DCD, MS_RLSD_ON),
        (ControlLine::DSR, MS_DSR_ON),
        (ControlLine::CTS, MS_CTS_ON),
        (ControlLine::RI, MS_RING_ON),
    ] {
        if mask.contains(line) {
            bits |= native;
        }
    }
    bits
}

/// Run every write, even after one fails.
fn write_all<const N: usize>(writes: [&dyn Fn() -> bool; N]) -> bool {
    writes.iter().fold(true, |ok, write| write() & ok)
}

pub fn probe_ports() -> PortResult<Vec<String>> {
    let mut found = Vec::new();
    for index in PROBED_PORTS {
        let name = format!("COM{index}");
        if let Ok(handle) = open_handle(&format!("{PORT_PREFIX}{name}"), GENERIC_READ | GENERIC_WRITE) {
            unsafe {
                CloseHandle(handle);
            }
            trace!(%name, "serial device found");
            found.push(name);
        }
    }
    Ok(found)
}
