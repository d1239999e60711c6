//! ASCII control characters used by the native translators.

/// Null character.
pub const NUL: u8 = 0x00;

/// End of transmission.
pub const EOT: u8 = 0x04;

/// Device control 1, resumes transmission under software flow control.
pub const XON: u8 = 0x11;

/// Device control 3, pauses transmission under software flow control.
pub const XOFF: u8 = 0x13;

/// Escape.
pub const ESC: u8 = 0x1B;
