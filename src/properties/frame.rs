use super::{Platform, PortProperty};
use crate::port::{PortError, PortResult};
use crate::sys;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum CharacterSize {
    Five = 0,
    Six,
    Seven,
    Eight,
}

impl CharacterSize {
    pub const MIN: CharacterSize = CharacterSize::Five;
    pub const MAX: CharacterSize = CharacterSize::Eight;
    pub const DEFAULT: CharacterSize = CharacterSize::Eight;

    /// Number of data bits, 5 through 8.
    pub fn bits(self) -> u8 {
        self as u8 + 5
    }

    /// Mask covering the data bits of one character.
    pub fn mask(self) -> u8 {
        (0xFFu16 >> (8 - self.bits())) as u8
    }

    /// Native character size constant (`CS5`..`CS8` or a DCB byte size).
    pub fn native_value(self) -> PortResult<sys::NativeCharacterSize> {
        sys::native_character_size(self).ok_or_else(|| PortError::out_of_range(Self::LABEL))
    }
}

impl PortProperty for CharacterSize {
    const LABEL: &'static str = "Character size";
    const ALL: &'static [Self] = &[Self::Five, Self::Six, Self::Seven, Self::Eight];

    fn index(self) -> u8 {
        self as u8
    }

    fn is_supported_on(self, _platform: Platform) -> bool {
        true
    }
}

impl Default for CharacterSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for CharacterSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl TryFrom<u8> for CharacterSize {
    type Error = String;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            other => Err(format!("character size must be 5 to 8 bits, got {other}")),
        }
    }
}

impl From<CharacterSize> for u8 {
    fn from(size: CharacterSize) -> Self {
        size.bits()
    }
}

/// Flow control discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum FlowControl {
    /// RTS/CTS handshake.
    Hardware = 0,
    /// XON/XOFF in band.
    Software,
    None,
}

impl FlowControl {
    pub const MIN: FlowControl = FlowControl::Hardware;
    pub const MAX: FlowControl = FlowControl::None;
    pub const DEFAULT: FlowControl = FlowControl::None;

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Hardware => "Hardware",
            Self::Software => "Software",
            Self::None => "None",
        }
    }
}

impl PortProperty for FlowControl {
    const LABEL: &'static str = "Flow control";
    const ALL: &'static [Self] = &[Self::Hardware, Self::Software, Self::None];

    fn index(self) -> u8 {
        self as u8
    }

    fn is_supported_on(self, _platform: Platform) -> bool {
        true
    }
}

impl Default for FlowControl {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for FlowControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Parity bit scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Parity {
    None = 0,
    Odd,
    Even,
    /// Parity bit always 1.
    Mark,
    /// Parity bit always 0.
    Space,
}

impl Parity {
    pub const MIN: Parity = Parity::None;
    pub const MAX: Parity = Parity::Space;
    pub const DEFAULT: Parity = Parity::None;

    pub fn display_name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Odd => "Odd",
            Self::Even => "Even",
            Self::Mark => "Mark",
            Self::Space => "Space",
        }
    }

    /// Whether a parity bit is present on the wire.
    pub fn has_bit(self) -> bool {
        self != Self::None
    }
}

impl PortProperty for Parity {
    const LABEL: &'static str = "Parity";
    const ALL: &'static [Self] = &[Self::None, Self::Odd, Self::Even, Self::Mark, Self::Space];

    fn index(self) -> u8 {
        self as u8
    }

    fn is_supported_on(self, _platform: Platform) -> bool {
        true
    }
}

impl Default for Parity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum StopBit {
    One = 0,
    /// Windows only.
    OneAndHalf,
    Two,
}

impl StopBit {
    pub const MIN: StopBit = StopBit::One;
    pub const MAX: StopBit = StopBit::Two;
    pub const DEFAULT: StopBit = StopBit::One;

    pub fn display_name(self) -> &'static str {
        match self {
            Self::One => "One",
            Self::OneAndHalf => "One and a half",
            Self::Two => "Two",
        }
    }

    /// Whole stop bits used for timing; one and a half rounds up to two.
    pub fn bit_count(self) -> u32 {
        match self {
            Self::One => 1,
            Self::OneAndHalf | Self::Two => 2,
        }
    }
}

impl PortProperty for StopBit {
    const LABEL: &'static str = "Stop bit";
    const ALL: &'static [Self] = &[Self::One, Self::OneAndHalf, Self::Two];

    fn index(self) -> u8 {
        self as u8
    }

    fn is_supported_on(self, platform: Platform) -> bool {
        match self {
            Self::OneAndHalf => platform == Platform::Windows,
            Self::One | Self::Two => true,
        }
    }
}

impl Default for StopBit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for StopBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_size_bits_and_mask() {
        assert_eq!(CharacterSize::Five.bits(), 5);
        assert_eq!(CharacterSize::Eight.bits(), 8);
        assert_eq!(CharacterSize::Five.mask(), 0x1F);
        assert_eq!(CharacterSize::Seven.mask(), 0x7F);
        assert_eq!(CharacterSize::Eight.mask(), 0xFF);
        assert_eq!(CharacterSize::try_from(9).unwrap_err(), "character size must be 5 to 8 bits, got 9");
    }

    #[test]
    fn test_display_names() {
        assert_eq!(FlowControl::Hardware.to_string(), "Hardware");
        assert_eq!(FlowControl::None.display_name(), "None");
        assert_eq!(Parity::Mark.to_string(), "Mark");
        assert_eq!(StopBit::OneAndHalf.to_string(), "One and a half");
    }

    #[test]
    fn test_one_and_half_stop_bits_windows_only() {
        assert!(StopBit::OneAndHalf.is_supported_on(Platform::Windows));
        assert!(!StopBit::OneAndHalf.is_supported_on(Platform::Posix));
        assert!(StopBit::Two.is_supported_on(Platform::Posix));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(CharacterSize::default(), CharacterSize::Eight);
        assert_eq!(FlowControl::default(), FlowControl::None);
        assert_eq!(Parity::default(), Parity::None);
        assert_eq!(StopBit::default(), StopBit::One);
    }

    #[test]
    fn test_from_index_past_max() {
        assert!(Parity::from_index(Parity::MAX.index() + 1).is_err());
        assert!(StopBit::from_index(3).is_err());
        assert_eq!(FlowControl::from_index(1).unwrap(), FlowControl::Software);
    }
}
