//! Exhaustive self-test of the datapath model
//!
//! Every operand pair for a given width is run through the driver and
//! compared against native integer arithmetic. Checking stops at the
//! first disagreement.

use std::fmt;

use itertools::iproduct;
use num::Integer;
use rayon::prelude::*;
use thiserror::Error;

use crate::driver::{run, MulDivError, Op, ResultPair};
use crate::width::Width;

/// A computed result that disagrees with native arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub op: Op,
    /// Dividend or multiplicand
    pub lhs: u64,
    /// Divisor or multiplier
    pub rhs: u64,
    pub computed: ResultPair,
    pub expected: ResultPair,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}: computed {}, expected {}",
            self.lhs,
            self.op.symbol(),
            self.rhs,
            self.computed,
            self.expected
        )
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessError {
    #[error("mismatch: {0}")]
    Mismatch(Mismatch),
    #[error("datapath rejected operands: {0}")]
    Driver(MulDivError),
}

impl From<MulDivError> for HarnessError {
    fn from(e: MulDivError) -> Self {
        Self::Driver(e)
    }
}

/// Number of operand pairs checked by a passing run
///
/// Up to 2^126 pairs exist at the widest width, so the counts are
/// u128.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub divide: u128,
    pub multiply: u128,
}

/// Expected (remainder, quotient) or (product high, product low)
///
/// Operands are checked the same way the driver checks them.
pub fn reference(width: Width, op: Op, lhs: u64, rhs: u64) -> Result<ResultPair, MulDivError> {
    let lhs = width.check_operand(lhs)?;
    let rhs = width.check_operand(rhs)?;
    match op {
        Op::Divide if rhs == 0 => Err(MulDivError::InvalidDivisor),
        Op::Divide => {
            let (quotient, remainder) = lhs.div_rem(&rhs);
            Ok(ResultPair {
                high: remainder,
                low: quotient,
            })
        }
        Op::Multiply => {
            let product = u128::from(lhs) * u128::from(rhs);
            // both operands are below 2^w, so the high half is too
            Ok(ResultPair {
                high: (product >> width.bits()) as u64,
                low: (product as u64) & width.operand_mask(),
            })
        }
    }
}

/// Something that computes a result pair from (lhs, rhs)
type Model = fn(Width, Op, u64, u64) -> Result<ResultPair, MulDivError>;

fn datapath(width: Width, op: Op, lhs: u64, rhs: u64) -> Result<ResultPair, MulDivError> {
    // The driver takes (seed, operand): the dividend seeds a divide,
    // the multiplier seeds a multiply.
    match op {
        Op::Divide => run(width, op, lhs, rhs, None),
        Op::Multiply => run(width, op, rhs, lhs, None),
    }
}

/// Check a single operand pair
pub fn check_pair(width: Width, op: Op, lhs: u64, rhs: u64) -> Result<(), HarnessError> {
    check_pair_with(datapath, width, op, lhs, rhs)
}

fn check_pair_with(
    model: Model,
    width: Width,
    op: Op,
    lhs: u64,
    rhs: u64,
) -> Result<(), HarnessError> {
    let computed = model(width, op, lhs, rhs)?;
    let expected = reference(width, op, lhs, rhs)?;
    match op {
        Op::Divide => tracing::trace!(
            "{lhs:02} % {rhs:02} = {:02} (gold {:02}); ./. = {:02} (gold {:02})",
            computed.high,
            expected.high,
            computed.low,
            expected.low
        ),
        Op::Multiply => tracing::trace!(
            "{lhs:02} * {rhs:02} = ({:02} (gold {:02}), {:02} (gold {:02}))",
            computed.high,
            expected.high,
            computed.low,
            expected.low
        ),
    }
    if computed == expected {
        Ok(())
    } else {
        Err(HarnessError::Mismatch(Mismatch {
            op,
            lhs,
            rhs,
            computed,
            expected,
        }))
    }
}

/// Right-hand operands to enumerate: divisors start at one
fn rhs_range(width: Width, op: Op) -> std::ops::Range<u64> {
    match op {
        Op::Divide => 1..width.operand_count(),
        Op::Multiply => 0..width.operand_count(),
    }
}

fn pair_count(width: Width, op: Op) -> u128 {
    let rhs = rhs_range(width, op);
    u128::from(width.operand_count()) * u128::from(rhs.end - rhs.start)
}

/// Check one operation over its whole operand space, returning the
/// number of pairs checked
pub fn verify_op(width: Width, op: Op) -> Result<u128, HarnessError> {
    verify_op_with(datapath, width, op)
}

fn verify_op_with(model: Model, width: Width, op: Op) -> Result<u128, HarnessError> {
    iproduct!(0..width.operand_count(), rhs_range(width, op))
        .try_for_each(|(lhs, rhs)| check_pair_with(model, width, op, lhs, rhs))?;
    let checked = pair_count(width, op);
    tracing::info!(%width, %op, checked, "verified");
    Ok(checked)
}

/// As [verify_op], with the outer operand loop spread over the rayon
/// thread pool
pub fn verify_op_parallel(width: Width, op: Op) -> Result<u128, HarnessError> {
    verify_op_parallel_with(datapath, width, op)
}

fn verify_op_parallel_with(model: Model, width: Width, op: Op) -> Result<u128, HarnessError> {
    (0..width.operand_count())
        .into_par_iter()
        .try_for_each(|lhs| {
            rhs_range(width, op).try_for_each(|rhs| check_pair_with(model, width, op, lhs, rhs))
        })?;
    let checked = pair_count(width, op);
    tracing::info!(%width, %op, checked, "verified (parallel)");
    Ok(checked)
}

/// Check every dividend against every non-zero divisor
pub fn verify_divide(width: Width) -> Result<Coverage, HarnessError> {
    Ok(Coverage {
        divide: verify_op(width, Op::Divide)?,
        ..Coverage::default()
    })
}

/// Check every pair of multiplicand and multiplier
pub fn verify_multiply(width: Width) -> Result<Coverage, HarnessError> {
    Ok(Coverage {
        multiply: verify_op(width, Op::Multiply)?,
        ..Coverage::default()
    })
}

/// Check division, then multiplication
pub fn verify(width: Width) -> Result<Coverage, HarnessError> {
    Ok(Coverage {
        divide: verify_op(width, Op::Divide)?,
        multiply: verify_op(width, Op::Multiply)?,
    })
}

/// As [verify], with the outer operand loop spread over the rayon
/// thread pool. When more than one pair mismatches, which one is
/// reported is not defined.
pub fn verify_parallel(width: Width) -> Result<Coverage, HarnessError> {
    Ok(Coverage {
        divide: verify_op_parallel(width, Op::Divide)?,
        multiply: verify_op_parallel(width, Op::Multiply)?,
    })
}
