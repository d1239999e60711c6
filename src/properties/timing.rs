use super::{BaudRate, CharacterSize, Parity, StopBit};
use crate::port::PortResult;

/// Time on the wire for one character, in milliseconds.
///
/// Counts one start bit, the data bits, one parity bit when parity is
/// enabled and the stop bits (one and a half counts as two).
pub fn transmission_time_millis(
    baud_rate: BaudRate,
    character_size: CharacterSize,
    parity: Parity,
    stop_bit: StopBit,
) -> PortResult<f64> {
    let rate = baud_rate.numeric_rate()?;
    let bits = 1 + u32::from(character_size.bits()) + u32::from(parity.has_bit()) + stop_bit.bit_count();
    Ok(f64::from(bits) * 1000.0 / f64::from(rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_9600_8n1() {
        let millis = transmission_time_millis(
            BaudRate::Baud9600,
            CharacterSize::Eight,
            Parity::None,
            StopBit::One,
        )
        .unwrap();
        assert!((millis - 1.041_666).abs() < 1e-4, "{millis}");
    }

    #[test]
    fn test_parity_and_stop_bits_add_time() {
        let millis = transmission_time_millis(
            BaudRate::Baud1200,
            CharacterSize::Seven,
            Parity::Even,
            StopBit::OneAndHalf,
        )
        .unwrap();
        // 1 + 7 + 1 + 2 bits
        assert!((millis - 11_000.0 / 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_rate_fails() {
        assert!(transmission_time_millis(
            BaudRate::Custom,
            CharacterSize::Eight,
            Parity::None,
            StopBit::One
        )
        .is_err());
    }
}
