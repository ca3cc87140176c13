//! Operand width of the datapath
//!
//! The accumulator is a `2w`-bit register. It is held in a `u128`,
//! and the trial subtraction of the divide step is evaluated as an
//! `i128`, so the widest supported datapath is 63 bits (leaving one
//! guard bit above the accumulator for the sign of the trial
//! result).

use std::fmt;

use thiserror::Error;

use crate::utils::mask;

/// Widest operand width whose accumulator (plus guard bit) fits in
/// an i128
pub const MAX_WIDTH: u32 = 63;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthError {
    #[error("width {0} is out of range (must be 1 to {max})", max = MAX_WIDTH)]
    OutOfRange(u32),
    #[error("operand 0x{value:x} does not fit in {width} bits")]
    OperandTooWide { value: u64, width: u32 },
}

/// A validated operand width w, in bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Width(u32);

impl Width {
    pub fn new(bits: u32) -> Result<Self, WidthError> {
        if bits == 0 || bits > MAX_WIDTH {
            Err(WidthError::OutOfRange(bits))
        } else {
            Ok(Self(bits))
        }
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Width of the full accumulator register (2w)
    pub fn accum_bits(self) -> u32 {
        2 * self.0
    }

    /// All-ones value of w bits
    pub fn operand_mask(self) -> u64 {
        mask(u64::from(self.0))
    }

    /// Number of distinct w-bit operands (2^w)
    pub fn operand_count(self) -> u64 {
        1 << self.0
    }

    pub fn check_operand(self, value: u64) -> Result<u64, WidthError> {
        if value & !self.operand_mask() != 0 {
            Err(WidthError::OperandTooWide {
                value,
                width: self.0,
            })
        } else {
            Ok(value)
        }
    }
}

impl TryFrom<u32> for Width {
    type Error = WidthError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::new(bits)
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
