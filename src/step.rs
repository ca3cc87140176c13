//! Single-cycle steppers of the sequential multiply/divide datapath
//!
//! Each function performs the data transformation of one clock cycle
//! on the accumulator register. Neither function validates its
//! inputs: the driver checks operands before the first cycle, and the
//! accumulator must stay representable in 2w bits between cycles
//! (which holds for any accumulator seeded with a w-bit value and
//! stepped at most w times).

use crate::width::Width;

/// Common signature of the two steppers. The third argument is the
/// operand that stays fixed for the whole operation (the divisor or
/// the multiplicand).
pub type StepFn = fn(width: Width, accum: u128, operand: u64) -> u128;

/// One restoring-division cycle
///
/// The divisor is aligned to bit w-1 of the accumulator and
/// trial-subtracted. If the result is non-negative it is committed,
/// otherwise the accumulator is left as it was. The accumulator is
/// then shifted left by one, and the new quotient bit (1 if the
/// subtraction was committed) is shifted in at the bottom.
pub fn div_step(width: Width, accum: u128, divisor: u64) -> u128 {
    let aligned = i128::from(divisor) << (width.bits() - 1);

    // accum < 2^(2w) <= 2^126, so it is exact as an i128
    let trial = accum as i128 - aligned;
    let underflow = trial < 0;
    let accum = if underflow { accum } else { trial as u128 };

    (accum << 1) | u128::from(!underflow)
}

/// One shift-add multiplication cycle
///
/// The multiplier bit at the bottom of the accumulator decides
/// whether the multiplicand (aligned to bit w-1) is added in after
/// the accumulator has been shifted right by one.
pub fn mul_step(width: Width, accum: u128, multiplicand: u64) -> u128 {
    let add_enable = accum & 1 == 1;
    let accum = accum >> 1;
    if add_enable {
        accum + (u128::from(multiplicand) << (width.bits() - 1))
    } else {
        accum
    }
}
