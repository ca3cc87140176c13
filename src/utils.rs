use std::ops::{BitAnd, Shl, Shr};

use num::Integer;

/// Make an n_bits-long mask (all ones)
pub fn mask<T>(n_bits: T) -> T
where
    T: Integer + Shl<Output = T>,
{
    (T::one() << n_bits) - T::one()
}

/// Obtain value[end:start] (verilog notation) from value
pub fn extract_field<T>(value: T, end: T, start: T) -> T
where
    T: Copy + Integer + Shl<Output = T> + Shr<Output = T> + BitAnd<Output = T>,
{
    mask(end - start + T::one()) & (value >> start)
}

/// Number of hex digits needed to print a value of n_bits bits
pub fn hex_digits(n_bits: u32) -> usize {
    n_bits.div_ceil(4) as usize
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn check_mask() {
        assert_eq!(mask(0u32), 0);
        assert_eq!(mask(4u32), 0xf);
        assert_eq!(mask(64u128), u128::from(u64::MAX));
    }

    #[test]
    fn check_extract_field() {
        assert_eq!(extract_field(0xe1u128, 7, 4), 0xe);
        assert_eq!(extract_field(0xe1u128, 3, 0), 0x1);
        assert_eq!(extract_field(0b0110011u32, 6, 0), 0b0110011);
    }

    #[test]
    fn check_hex_digits() {
        assert_eq!(hex_digits(8), 2);
        assert_eq!(hex_digits(9), 3);
        assert_eq!(hex_digits(126), 32);
    }
}
