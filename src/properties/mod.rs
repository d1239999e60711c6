//! Portable serial line properties.
//!
//! Every enumeration here is a closed set of values with a stable numeric
//! index, a platform capability predicate and, where the OS has one, a
//! native constant. Nothing in this module performs I/O.

pub mod ascii;
mod baud;
mod control_line;
mod frame;
mod timing;

pub use baud::BaudRate;
pub use control_line::ControlLine;
pub use frame::{CharacterSize, FlowControl, Parity, StopBit};
pub use timing::transmission_time_millis;

use crate::port::PortError;

/// Native API family whose capability table applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// termios based targets.
    Posix,
    /// Win32 DCB based targets.
    Windows,
}

impl Platform {
    /// Platform of the current build target.
    #[cfg(windows)]
    pub const CURRENT: Platform = Platform::Windows;

    /// Platform of the current build target.
    #[cfg(not(windows))]
    pub const CURRENT: Platform = Platform::Posix;
}

/// Shared behaviour of the enumerated line properties.
pub trait PortProperty: Copy + PartialEq + std::fmt::Debug + 'static {
    /// Human readable property name used in error messages.
    const LABEL: &'static str;

    /// Every value, ordered by index.
    const ALL: &'static [Self];

    /// Stable numeric index of the value.
    fn index(self) -> u8;

    /// Whether `platform` can configure this value.
    fn is_supported_on(self, platform: Platform) -> bool;

    /// Whether the current build target can configure this value.
    fn is_supported(self) -> bool {
        self.is_supported_on(Platform::CURRENT)
    }

    /// Look a value up by index; indices past the declared maximum fail.
    fn from_index(index: u8) -> Result<Self, PortError> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or_else(|| PortError::out_of_range(Self::LABEL))
    }

    /// Return the value unchanged if the current platform supports it.
    fn validate(self) -> Result<Self, PortError> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(PortError::not_supported(Self::LABEL))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_ordered<P: PortProperty>() {
        for (position, value) in P::ALL.iter().enumerate() {
            assert_eq!(usize::from(value.index()), position, "{:?}", value);
            assert_eq!(P::from_index(value.index()).unwrap(), *value);
        }
        let past_end = u8::try_from(P::ALL.len()).unwrap();
        assert!(P::from_index(past_end).is_err());
    }

    #[test]
    fn test_tables_are_ordered_by_index() {
        assert_indices_ordered::<BaudRate>();
        assert_indices_ordered::<CharacterSize>();
        assert_indices_ordered::<FlowControl>();
        assert_indices_ordered::<Parity>();
        assert_indices_ordered::<StopBit>();
    }

    #[test]
    fn test_validate_reports_label() {
        let err = BaudRate::Custom.validate().unwrap_err();
        assert_eq!(err.to_string(), "Baud rate not supported");
    }
}
