#![forbid(unsafe_code)]

//! Bit-accurate reference model of a sequential (one bit per cycle)
//! unsigned multiply/divide datapath
//!
//! The model reproduces, cycle for cycle, the accumulator of a
//! single-subtractor restoring divider and a shift-add multiplier,
//! and can be checked exhaustively against native arithmetic.

pub mod driver;
pub mod harness;
pub mod logging;
pub mod rv32m;
pub mod step;
pub mod trace;
pub mod utils;
pub mod width;

pub use driver::{divide, multiply, run, MulDivError, Op, ResultPair};
pub use width::{Width, WidthError};
