//! termios backend.

use super::syscall::retry;
use crate::port::{NativePort, OpenMode, PortConfiguration, PortError, PortResult, Queue};
use crate::properties::{
    ascii, BaudRate, CharacterSize, ControlLine, FlowControl, Parity, PortProperty, StopBit,
};
use libc::{c_int, cc_t, speed_t, tcflag_t, termios};
use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd};
use tracing::trace;

pub const PORT_PREFIX: &str = "/dev/";

pub type NativeSpeed = speed_t;
pub type NativeCharacterSize = tcflag_t;

const VDISABLE: cc_t = 0;

const PROBED_FAMILIES: [&str; 3] = ["ttyUSB", "ttyACM", "ttyS"];
const PROBED_PER_FAMILY: usize = 64;

pub fn native_baud(baud: BaudRate) -> Option<speed_t> {
    let speed = match baud {
        BaudRate::Baud50 => libc::B50,
        BaudRate::Baud75 => libc::B75,
        BaudRate::Baud110 => libc::B110,
        BaudRate::Baud134 => libc::B134,
        BaudRate::Baud150 => libc::B150,
        BaudRate::Baud200 => libc::B200,
        BaudRate::Baud300 => libc::B300,
        BaudRate::Baud600 => libc::B600,
        BaudRate::Baud1200 => libc::B1200,
        BaudRate::Baud1800 => libc::B1800,
        BaudRate::Baud2400 => libc::B2400,
        BaudRate::Baud4800 => libc::B4800,
        BaudRate::Baud9600 => libc::B9600,
        BaudRate::Baud19200 => libc::B19200,
        BaudRate::Baud38400 => libc::B38400,
        BaudRate::Baud57600 => libc::B57600,
        BaudRate::Baud115200 => libc::B115200,
        BaudRate::Baud230400 => libc::B230400,
        BaudRate::Baud460800 => libc::B460800,
        BaudRate::Baud500000 => libc::B500000,
        BaudRate::Baud576000 => libc::B576000,
        BaudRate::Baud921600 => libc::B921600,
        BaudRate::Baud1000000 => libc::B1000000,
        BaudRate::Baud1152000 => libc::B1152000,
        BaudRate::Baud1500000 => libc::B1500000,
        BaudRate::Baud2000000 => libc::B2000000,
        BaudRate::Baud2500000 => libc::B2500000,
        BaudRate::Baud3000000 => libc::B3000000,
        BaudRate::Baud3500000 => libc::B3500000,
        BaudRate::Baud4000000 => libc::B4000000,
        BaudRate::Custom
        | BaudRate::Baud14400
        | BaudRate::Baud56000
        | BaudRate::Baud128000
        | BaudRate::Baud256000 => return None,
    };
    Some(speed)
}

pub fn native_character_size(size: CharacterSize) -> Option<tcflag_t> {
    Some(match size {
        CharacterSize::Five => libc::CS5,
        CharacterSize::Six => libc::CS6,
        CharacterSize::Seven => libc::CS7,
        CharacterSize::Eight => libc::CS8,
    })
}

fn native_lines(mask: ControlLine) -> c_int {
    let mut bits = 0;
    for (line, native) in [
        (ControlLine::DCD, libc::TIOCM_CAR),
        (ControlLine::DTR, libc::TIOCM_DTR),
        (ControlLine::DSR, libc::TIOCM_DSR),
        (ControlLine::RTS, libc::TIOCM_RTS),
        (ControlLine::CTS, libc::TIOCM_CTS),
        (ControlLine::RI, libc::TIOCM_RNG),
    ] {
        if mask.contains(line) {
            bits |= native;
        }
    }
    bits
}

fn path_to_cstring(path: &str) -> io::Result<CString> {
    CString::new(path).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))
}

fn open_fd(path: &str, flags: c_int) -> io::Result<OwnedFd> {
    let path = path_to_cstring(path)?;
    let fd = retry(|| unsafe { libc::open(path.as_ptr(), flags) })?;
    // SAFETY: `open` returned a fresh descriptor we now own.
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

/// An open tty.
#[derive(Debug)]
pub struct LinuxPort {
    fd: OwnedFd,
}

impl LinuxPort {
    fn ioctl_int(&self, request: libc::Ioctl) -> Option<c_int> {
        let mut value: c_int = 0;
        retry(|| unsafe { libc::ioctl(self.fd.as_raw_fd(), request, &mut value as *mut c_int) })
            .ok()
            .map(|_| value)
    }
}

impl NativePort for LinuxPort {
    type Settings = termios;

    fn open(path: &str, mode: OpenMode) -> PortResult<Self> {
        let access = if mode == OpenMode::READ {
            libc::O_RDONLY
        } else if mode == OpenMode::WRITE {
            libc::O_WRONLY
        } else {
            libc::O_RDWR
        };
        let fd = open_fd(path, access | libc::O_NOCTTY | libc::O_NONBLOCK).map_err(|source| PortError::Open {
            path: path.to_string(),
            source,
        })?;
        trace!(path, fd = fd.as_raw_fd(), "opened tty");
        Ok(Self { fd })
    }

    fn release(self) -> io::Result<()> {
        let fd = self.fd.into_raw_fd();
        // close is never retried; the descriptor is gone after the first call
        if unsafe { libc::close(fd) } == -1 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    fn capture(&self) -> PortResult<termios> {
        // SAFETY: termios is plain old data; tcgetattr fills every field.
        let mut settings: termios = unsafe { std::mem::zeroed() };
        retry(|| unsafe { libc::tcgetattr(self.fd.as_raw_fd(), &mut settings) })
            .map_err(PortError::GetSettings)?;
        Ok(settings)
    }

    fn prepare(settings: &mut termios, config: &PortConfiguration) -> PortResult<()> {
        let speed = config.baud_rate.native_value()?;
        let size = config.character_size.native_value()?;
        config.stop_bit.validate()?;

        settings.c_iflag &= !(libc::IGNBRK
            | libc::BRKINT
            | libc::PARMRK
            | libc::ISTRIP
            | libc::INLCR
            | libc::IGNCR
            | libc::ICRNL
            | libc::IXANY
            | libc::IMAXBEL
            | libc::IUTF8);
        match config.parity {
            Parity::None | Parity::Mark | Parity::Space => {
                settings.c_iflag |= libc::IGNPAR;
                settings.c_iflag &= !libc::INPCK;
            }
            Parity::Odd | Parity::Even => {
                settings.c_iflag &= !libc::IGNPAR;
                settings.c_iflag |= libc::INPCK;
            }
        }
        settings.c_iflag &= !(libc::IXON | libc::IXOFF);
        if config.flow_control == FlowControl::Software {
            settings.c_iflag |= libc::IXON | libc::IXOFF;
        }

        settings.c_oflag &= !(libc::OPOST
            | libc::ONLCR
            | libc::OCRNL
            | libc::ONOCR
            | libc::ONLRET
            | libc::OFILL
            | libc::NLDLY
            | libc::CRDLY
            | libc::TABDLY
            | libc::BSDLY
            | libc::VTDLY
            | libc::FFDLY);

        unsafe {
            libc::cfsetispeed(&mut *settings, speed);
            libc::cfsetospeed(&mut *settings, speed);
        }
        settings.c_cflag &= !libc::CSIZE;
        settings.c_cflag |= size;
        if config.stop_bit == StopBit::Two {
            settings.c_cflag |= libc::CSTOPB;
        } else {
            settings.c_cflag &= !libc::CSTOPB;
        }
        settings.c_cflag |= libc::CREAD | libc::CLOCAL;
        settings.c_cflag &= !(libc::PARENB | libc::PARODD | libc::CMSPAR | libc::HUPCL | libc::CRTSCTS);
        if config.parity.has_bit() {
            settings.c_cflag |= libc::PARENB;
        }
        if matches!(config.parity, Parity::Odd | Parity::Mark) {
            settings.c_cflag |= libc::PARODD;
        }
        if matches!(config.parity, Parity::Mark | Parity::Space) {
            settings.c_cflag |= libc::CMSPAR;
        }
        if config.flow_control == FlowControl::Hardware {
            settings.c_cflag |= libc::CRTSCTS;
        }

        settings.c_lflag &= !(libc::ISIG
            | libc::ICANON
            | libc::ECHO
            | libc::ECHOE
            | libc::ECHOK
            | libc::ECHONL
            | libc::NOFLSH
            | libc::TOSTOP
            | libc::ECHOCTL
            | libc::ECHOPRT
            | libc::ECHOKE
            | libc::FLUSHO
            | libc::PENDIN
            | libc::IEXTEN);

        for index in [
            libc::VDISCARD,
            libc::VEOF,
            libc::VEOL,
            libc::VEOL2,
            libc::VERASE,
            libc::VINTR,
            libc::VKILL,
            libc::VLNEXT,
            libc::VMIN,
            libc::VQUIT,
            libc::VREPRINT,
            libc::VSUSP,
            libc::VSWTC,
            libc::VTIME,
            libc::VWERASE,
        ] {
            settings.c_cc[index] = VDISABLE;
        }
        let (start, stop) = if config.flow_control == FlowControl::Software {
            (ascii::XON, ascii::XOFF)
        } else {
            (VDISABLE, VDISABLE)
        };
        settings.c_cc[libc::VSTART] = start;
        settings.c_cc[libc::VSTOP] = stop;

        trace!(
            iflag = settings.c_iflag,
            oflag = settings.c_oflag,
            cflag = settings.c_cflag,
            lflag = settings.c_lflag,
            "prepared termios"
        );
        Ok(())
    }

    fn apply(&self, settings: &termios) -> bool {
        retry(|| unsafe { libc::tcsetattr(self.fd.as_raw_fd(), libc::TCSANOW, settings) }).is_ok()
    }

    fn set_exclusive(&self, exclusive: bool) -> bool {
        let request = if exclusive { libc::TIOCEXCL } else { libc::TIOCNXCL };
        retry(|| unsafe { libc::ioctl(self.fd.as_raw_fd(), request) }).is_ok()
    }

    fn drain(&self) -> bool {
        retry(|| unsafe { libc::tcdrain(self.fd.as_raw_fd()) }).is_ok()
    }

    fn flush(&self, queue: Queue) -> bool {
        let selector = match queue {
            Queue::Input => libc::TCIFLUSH,
            Queue::Output => libc::TCOFLUSH,
            Queue::Both => libc::TCIOFLUSH,
        };
        retry(|| unsafe { libc::tcflush(self.fd.as_raw_fd(), selector) }).is_ok()
    }

    fn input_queue_count(&self) -> Option<usize> {
        self.ioctl_int(libc::FIONREAD).and_then(|count| usize::try_from(count).ok())
    }

    fn output_queue_count(&self) -> Option<usize> {
        self.ioctl_int(libc::TIOCOUTQ).and_then(|count| usize::try_from(count).ok())
    }

    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let count = retry(|| unsafe { libc::read(self.fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) })?;
        Ok(count as usize)
    }

    fn write(&self, data: &[u8]) -> io::Result<usize> {
        let count = retry(|| unsafe { libc::write(self.fd.as_raw_fd(), data.as_ptr().cast(), data.len()) })?;
        Ok(count as usize)
    }

    fn control_line(&self, mask: ControlLine) -> Option<bool> {
        let wanted = native_lines(mask);
        self.ioctl_int(libc::TIOCMGET).map(|status| status & wanted == wanted)
    }

    fn set_control_line(&self, mask: ControlLine, state: bool) -> bool {
        let lines = native_lines(mask & ControlLine::SETTABLE);
        let request = if state { libc::TIOCMBIS } else { libc::TIOCMBIC };
        retry(|| unsafe { libc::ioctl(self.fd.as_raw_fd(), request, &lines as *const c_int) }).is_ok()
    }
}

/// Mirror of the kernel's `struct serial_struct`, filled by `TIOCGSERIAL`.
#[repr(C)]
#[allow(dead_code)]
struct SerialStruct {
    kind: c_int,
    line: c_int,
    port: libc::c_uint,
    irq: c_int,
    flags: c_int,
    xmit_fifo_size: c_int,
    custom_divisor: c_int,
    baud_base: c_int,
    close_delay: libc::c_ushort,
    io_type: libc::c_char,
    reserved_char: [libc::c_char; 1],
    hub6: c_int,
    closing_wait: libc::c_ushort,
    closing_wait2: libc::c_ushort,
    iomem_base: *mut libc::c_uchar,
    iomem_reg_shift: libc::c_ushort,
    port_high: libc::c_uint,
    iomap_base: libc::c_ulong,
}

fn is_serial_device(path: &str) -> bool {
    let Ok(fd) = open_fd(path, libc::O_RDWR | libc::O_NOCTTY | libc::O_NONBLOCK) else {
        return false;
    };
    // SAFETY: all-zero is a valid bit pattern for this plain C struct.
    let mut info: SerialStruct = unsafe { std::mem::zeroed() };
    retry(|| unsafe { libc::ioctl(fd.as_raw_fd(), libc::TIOCGSERIAL, &mut info as *mut SerialStruct) }).is_ok()
}

pub fn probe_ports() -> PortResult<Vec<String>> {
    let mut found = Vec::new();
    for family in PROBED_FAMILIES {
        for index in 0..PROBED_PER_FAMILY {
            let name = format!("{family}{index}");
            if is_serial_device(&format!("{PORT_PREFIX}{name}")) {
                trace!(%name, "serial device found");
                found.push(name);
            }
        }
    }
    Ok(found)
}
