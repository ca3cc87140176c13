//! Iteration driver
//!
//! Runs a stepper exactly w times over an accumulator seeded with one
//! operand, then splits the final 2w-bit accumulator into its high
//! and low halves. The number of cycles does not depend on the
//! operand values.

use std::fmt;

use thiserror::Error;

use crate::step::{div_step, mul_step, StepFn};
use crate::trace::{StepTrace, TraceSink};
use crate::utils::{extract_field, mask};
use crate::width::{Width, WidthError};

/// Operation performed by the datapath
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Unsigned restoring division. The accumulator is seeded with
    /// the dividend; the fixed operand is the divisor.
    Divide,
    /// Unsigned shift-add multiplication. The accumulator is seeded
    /// with the multiplier; the fixed operand is the multiplicand.
    Multiply,
}

impl Op {
    fn stepper(self) -> StepFn {
        match self {
            Op::Divide => div_step,
            Op::Multiply => mul_step,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Op::Divide => "/",
            Op::Multiply => "*",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Op::Divide => write!(f, "div"),
            Op::Multiply => write!(f, "mul"),
        }
    }
}

/// The two w-bit halves of the final accumulator
///
/// For division this is (remainder, quotient); for multiplication it
/// is (high half of product, low half of product).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultPair {
    pub high: u64,
    pub low: u64,
}

impl ResultPair {
    fn split(width: Width, accum: u128) -> Self {
        let w = u128::from(width.bits());
        // Both halves are at most w <= 63 bits wide
        Self {
            high: extract_field(accum, 2 * w - 1, w) as u64,
            low: (accum & mask(w)) as u64,
        }
    }

    /// Concatenation of the two halves as a 2w-bit value
    pub fn join(self, width: Width) -> u128 {
        (u128::from(self.high) << width.bits()) | u128::from(self.low)
    }
}

impl From<ResultPair> for (u64, u64) {
    fn from(pair: ResultPair) -> Self {
        (pair.high, pair.low)
    }
}

impl fmt::Display for ResultPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.high, self.low)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulDivError {
    #[error("divisor is zero")]
    InvalidDivisor,
    #[error("{0}")]
    Width(WidthError),
}

impl From<WidthError> for MulDivError {
    fn from(e: WidthError) -> Self {
        Self::Width(e)
    }
}

/// Run the datapath for w cycles
///
/// `seed` is the value the accumulator starts from (dividend or
/// multiplier) and `operand` is held fixed for every cycle (divisor
/// or multiplicand). If a sink is given, it receives one entry per
/// cycle before this function returns.
pub fn run(
    width: Width,
    op: Op,
    seed: u64,
    operand: u64,
    mut sink: Option<&mut dyn TraceSink>,
) -> Result<ResultPair, MulDivError> {
    let seed = width.check_operand(seed)?;
    let operand = width.check_operand(operand)?;
    if op == Op::Divide && operand == 0 {
        return Err(MulDivError::InvalidDivisor);
    }

    let step = op.stepper();
    let mut accum = u128::from(seed);
    for index in 0..width.bits() {
        let before = accum;
        accum = step(width, accum, operand);
        if let Some(sink) = sink.as_deref_mut() {
            sink.record(StepTrace {
                width,
                index,
                before,
                after: accum,
            });
        }
    }

    let result = ResultPair::split(width, accum);
    tracing::trace!(%op, %width, seed, operand, %result, "datapath run");
    Ok(result)
}

/// Divide, returning (remainder, quotient)
pub fn divide(width: Width, dividend: u64, divisor: u64) -> Result<ResultPair, MulDivError> {
    run(width, Op::Divide, dividend, divisor, None)
}

pub fn divide_traced(
    width: Width,
    dividend: u64,
    divisor: u64,
    sink: &mut dyn TraceSink,
) -> Result<ResultPair, MulDivError> {
    run(width, Op::Divide, dividend, divisor, Some(sink))
}

/// Multiply, returning (high half, low half) of the 2w-bit product
pub fn multiply(
    width: Width,
    multiplicand: u64,
    multiplier: u64,
) -> Result<ResultPair, MulDivError> {
    run(width, Op::Multiply, multiplier, multiplicand, None)
}

pub fn multiply_traced(
    width: Width,
    multiplicand: u64,
    multiplier: u64,
    sink: &mut dyn TraceSink,
) -> Result<ResultPair, MulDivError> {
    run(width, Op::Multiply, multiplier, multiplicand, Some(sink))
}
