use super::{Platform, PortProperty};
use crate::port::{PortError, PortResult};
use crate::sys;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Line speed.
///
/// `Custom` is a placeholder for rates outside the table. It is never
/// supported and never maps to a native or numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(u8)]
pub enum BaudRate {
    Custom = 0,
    Baud50,
    Baud75,
    Baud110,
    Baud134,
    Baud150,
    Baud200,
    Baud300,
    Baud600,
    Baud1200,
    Baud1800,
    Baud2400,
    Baud4800,
    Baud9600,
    Baud14400,
    Baud19200,
    Baud38400,
    Baud56000,
    Baud57600,
    Baud115200,
    Baud128000,
    Baud230400,
    Baud256000,
    Baud460800,
    Baud500000,
    Baud576000,
    Baud921600,
    Baud1000000,
    Baud1152000,
    Baud1500000,
    Baud2000000,
    Baud2500000,
    Baud3000000,
    Baud3500000,
    Baud4000000,
}

// (value, rate, posix, windows)
const TABLE: [(BaudRate, u32, bool, bool); 35] = [
    (BaudRate::Custom, 0, false, false),
    (BaudRate::Baud50, 50, true, false),
    (BaudRate::Baud75, 75, true, false),
    (BaudRate::Baud110, 110, true, true),
    (BaudRate::Baud134, 134, true, false),
    (BaudRate::Baud150, 150, true, false),
    (BaudRate::Baud200, 200, true, false),
    (BaudRate::Baud300, 300, true, true),
    (BaudRate::Baud600, 600, true, true),
    (BaudRate::Baud1200, 1200, true, true),
    (BaudRate::Baud1800, 1800, true, false),
    (BaudRate::Baud2400, 2400, true, true),
    (BaudRate::Baud4800, 4800, true, true),
    (BaudRate::Baud9600, 9600, true, true),
    (BaudRate::Baud14400, 14400, false, true),
    (BaudRate::Baud19200, 19200, true, true),
    (BaudRate::Baud38400, 38400, true, true),
    (BaudRate::Baud56000, 56000, false, true),
    (BaudRate::Baud57600, 57600, true, true),
    (BaudRate::Baud115200, 115200, true, true),
    (BaudRate::Baud128000, 128000, false, true),
    (BaudRate::Baud230400, 230400, true, false),
    (BaudRate::Baud256000, 256000, false, true),
    (BaudRate::Baud460800, 460800, true, false),
    (BaudRate::Baud500000, 500000, true, false),
    (BaudRate::Baud576000, 576000, true, false),
    (BaudRate::Baud921600, 921600, true, false),
    (BaudRate::Baud1000000, 1000000, true, false),
    (BaudRate::Baud1152000, 1152000, true, false),
    (BaudRate::Baud1500000, 1500000, true, false),
    (BaudRate::Baud2000000, 2000000, true, false),
    (BaudRate::Baud2500000, 2500000, true, false),
    (BaudRate::Baud3000000, 3000000, true, false),
    (BaudRate::Baud3500000, 3500000, true, false),
    (BaudRate::Baud4000000, 4000000, true, false),
];

const ALL: [BaudRate; 35] = {
    let mut all = [BaudRate::Custom; 35];
    let mut i = 0;
    while i < TABLE.len() {
        all[i] = TABLE[i].0;
        i += 1;
    }
    all
};

impl BaudRate {
    pub const MIN: BaudRate = BaudRate::Custom;
    pub const MAX: BaudRate = BaudRate::Baud4000000;
    pub const DEFAULT: BaudRate = BaudRate::Baud115200;

    fn row(self) -> (BaudRate, u32, bool, bool) {
        TABLE[usize::from(self as u8)]
    }

    /// Literal bits per second, independent of platform.
    pub fn numeric_rate(self) -> PortResult<u32> {
        match self {
            BaudRate::Custom => Err(PortError::out_of_range(Self::LABEL)),
            other => Ok(other.row().1),
        }
    }

    /// Native speed constant for the current platform.
    pub fn native_value(self) -> PortResult<sys::NativeSpeed> {
        if !self.is_supported() {
            return Err(PortError::out_of_range(Self::LABEL));
        }
        sys::native_baud(self).ok_or_else(|| PortError::out_of_range(Self::LABEL))
    }

    /// Table entry for a literal rate; `None` for rates outside the table.
    pub fn from_rate(rate: u32) -> Option<BaudRate> {
        TABLE
            .iter()
            .skip(1)
            .find(|(_, value, _, _)| *value == rate)
            .map(|(baud, _, _, _)| *baud)
    }
}

impl PortProperty for BaudRate {
    const LABEL: &'static str = "Baud rate";
    const ALL: &'static [Self] = &ALL;

    fn index(self) -> u8 {
        self as u8
    }

    fn is_supported_on(self, platform: Platform) -> bool {
        let (_, _, posix, windows) = self.row();
        match platform {
            Platform::Posix => posix,
            Platform::Windows => windows,
        }
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.numeric_rate() {
            Ok(rate) => write!(f, "{rate}"),
            Err(_) => f.write_str("custom"),
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = String;

    fn try_from(rate: u32) -> Result<Self, Self::Error> {
        if rate == 0 {
            return Ok(BaudRate::Custom);
        }
        BaudRate::from_rate(rate).ok_or_else(|| format!("unknown baud rate {rate}"))
    }
}

impl From<BaudRate> for u32 {
    fn from(baud: BaudRate) -> Self {
        baud.numeric_rate().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMON: [u32; 11] = [
        110, 300, 600, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200,
    ];

    #[test]
    fn test_common_subset_supported_everywhere() {
        for rate in COMMON {
            let baud = BaudRate::from_rate(rate).unwrap();
            assert!(baud.is_supported_on(Platform::Posix), "{rate}");
            assert!(baud.is_supported_on(Platform::Windows), "{rate}");
        }
    }

    #[test]
    fn test_platform_only_rates() {
        for rate in [14400, 56000, 128000, 256000] {
            let baud = BaudRate::from_rate(rate).unwrap();
            assert!(baud.is_supported_on(Platform::Windows));
            assert!(!baud.is_supported_on(Platform::Posix));
        }
        for rate in [50, 75, 134, 150, 200, 1800, 230400, 921600, 4000000] {
            let baud = BaudRate::from_rate(rate).unwrap();
            assert!(baud.is_supported_on(Platform::Posix));
            assert!(!baud.is_supported_on(Platform::Windows));
        }
    }

    #[test]
    fn test_custom_is_never_usable() {
        assert!(!BaudRate::Custom.is_supported_on(Platform::Posix));
        assert!(!BaudRate::Custom.is_supported_on(Platform::Windows));
        assert!(BaudRate::Custom.numeric_rate().is_err());
        assert!(BaudRate::Custom.native_value().is_err());
        assert_eq!(BaudRate::from_rate(0), None);
    }

    #[test]
    fn test_bounds_and_default() {
        assert_eq!(BaudRate::MIN.index(), 0);
        assert_eq!(BaudRate::MAX.index(), 34);
        assert_eq!(BaudRate::default(), BaudRate::Baud115200);
        assert_eq!(BaudRate::from_index(35).unwrap_err().to_string(), "Baud rate out of range");
    }

    #[test]
    fn test_numeric_rate_matches_name() {
        assert_eq!(BaudRate::Baud9600.numeric_rate().unwrap(), 9600);
        assert_eq!(BaudRate::Baud4000000.numeric_rate().unwrap(), 4_000_000);
        assert_eq!(BaudRate::Baud134.to_string(), "134");
    }

    #[test]
    fn test_rate_conversion() {
        assert_eq!(BaudRate::try_from(57600).unwrap(), BaudRate::Baud57600);
        assert_eq!(BaudRate::try_from(0).unwrap(), BaudRate::Custom);
        assert!(BaudRate::try_from(12345).is_err());
        assert_eq!(u32::from(BaudRate::Custom), 0);
    }
}
