//! Unsigned RV32M instructions on top of the 32-bit datapath model
//!
//! MUL, MULHU, DIVU and REMU are all served by one run of the
//! sequential datapath at w = 32; the instruction only selects which
//! half of the result pair is written back. Signed variants are not
//! modelled.
//!
//! Division by zero is defined by the RISC-V unprivileged
//! specification (section 7.2): DIVU returns all ones and REMU
//! returns the dividend. That case is resolved here, without running
//! the datapath.

use std::fmt;

use thiserror::Error;

use crate::driver::{divide, multiply, MulDivError};
use crate::utils::extract_field;
use crate::width::Width;

pub const OP: u32 = 0b0110011;
pub const FUNCT7_MULDIV: u32 = 0b0000001;

pub const FUNCT3_MUL: u32 = 0b000;
pub const FUNCT3_MULH: u32 = 0b001;
pub const FUNCT3_MULHSU: u32 = 0b010;
pub const FUNCT3_MULHU: u32 = 0b011;
pub const FUNCT3_DIV: u32 = 0b100;
pub const FUNCT3_DIVU: u32 = 0b101;
pub const FUNCT3_REM: u32 = 0b110;
pub const FUNCT3_REMU: u32 = 0b111;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsignedOp {
    Mul,
    Mulhu,
    Divu,
    Remu,
}

impl UnsignedOp {
    pub fn from_funct3(funct3: u32) -> Result<Self, DecodeError> {
        match funct3 {
            FUNCT3_MUL => Ok(Self::Mul),
            FUNCT3_MULHU => Ok(Self::Mulhu),
            FUNCT3_DIVU => Ok(Self::Divu),
            FUNCT3_REMU => Ok(Self::Remu),
            FUNCT3_MULH | FUNCT3_MULHSU | FUNCT3_DIV | FUNCT3_REM => {
                Err(DecodeError::SignedOp(funct3))
            }
            _ => Err(DecodeError::InvalidFunct3(funct3)),
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Mul => "mul",
            Self::Mulhu => "mulhu",
            Self::Divu => "divu",
            Self::Remu => "remu",
        }
    }
}

impl fmt::Display for UnsignedOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("instruction 0x{0:08x} is not in the OP/MULDIV encoding space")]
    NotMulDiv(u32),
    #[error("signed multiply/divide (funct3 0b{0:03b}) is not modelled")]
    SignedOp(u32),
    #[error("funct3 0b{0:03b} is not a valid field value")]
    InvalidFunct3(u32),
}

/// Register operands of an R-type instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rtype {
    pub rs1: u8,
    pub rs2: u8,
    pub rd: u8,
}

/// A decoded unsigned multiply/divide instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MulDivInstr {
    pub op: UnsignedOp,
    pub regs: Rtype,
}

impl fmt::Display for MulDivInstr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Rtype { rs1, rs2, rd } = self.regs;
        write!(f, "{} x{rd}, x{rs1}, x{rs2}", self.op)
    }
}

/// Makes a function called field_name which returns instr[end:start]
/// (verilog notation). Register fields are five bits wide and are
/// returned as u8; all other fields stay u32.
macro_rules! make_field_getter {
    ($field_name:ident, register, $end:expr, $start:expr) => {
        fn $field_name(instr: u32) -> u8 {
            extract_field(instr, $end, $start) as u8
        }
    };
    ($field_name:ident, $end:expr, $start:expr) => {
        fn $field_name(instr: u32) -> u32 {
            extract_field(instr, $end, $start)
        }
    };
}

make_field_getter!(opcode, 6, 0);
make_field_getter!(rd, register, 11, 7);
make_field_getter!(funct3, 14, 12);
make_field_getter!(rs1, register, 19, 15);
make_field_getter!(rs2, register, 24, 20);
make_field_getter!(funct7, 31, 25);

pub fn decode(instr: u32) -> Result<MulDivInstr, DecodeError> {
    if opcode(instr) != OP || funct7(instr) != FUNCT7_MULDIV {
        return Err(DecodeError::NotMulDiv(instr));
    }
    Ok(MulDivInstr {
        op: UnsignedOp::from_funct3(funct3(instr))?,
        regs: Rtype {
            rs1: rs1(instr),
            rs2: rs2(instr),
            rd: rd(instr),
        },
    })
}

/// Value written to rd for the given source register values
pub fn execute(op: UnsignedOp, src1: u32, src2: u32) -> Result<u32, MulDivError> {
    let xlen = Width::new(32)?;
    let (src1, src2) = (u64::from(src1), u64::from(src2));

    // Both halves of the result pair are 32 bits wide at w = 32
    let value = match op {
        UnsignedOp::Mul => multiply(xlen, src1, src2)?.low,
        UnsignedOp::Mulhu => multiply(xlen, src1, src2)?.high,
        UnsignedOp::Divu if src2 == 0 => u64::from(u32::MAX),
        UnsignedOp::Divu => divide(xlen, src1, src2)?.low,
        UnsignedOp::Remu if src2 == 0 => src1,
        UnsignedOp::Remu => divide(xlen, src1, src2)?.high,
    };
    Ok(value as u32)
}

#[cfg(test)]
mod tests {

    use super::*;
    use proptest::prelude::*;

    fn encode(funct3: u32, rd: u32, rs1: u32, rs2: u32) -> u32 {
        (FUNCT7_MULDIV << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | OP
    }

    #[test]
    fn check_decode_unsigned_ops() {
        let instr = decode(encode(FUNCT3_DIVU, 3, 10, 11)).unwrap();
        assert_eq!(instr.op, UnsignedOp::Divu);
        assert_eq!(
            instr.regs,
            Rtype {
                rs1: 10,
                rs2: 11,
                rd: 3
            }
        );
        assert_eq!(instr.to_string(), "divu x3, x10, x11");

        assert_eq!(decode(encode(FUNCT3_MUL, 1, 2, 3)).unwrap().op, UnsignedOp::Mul);
        assert_eq!(
            decode(encode(FUNCT3_MULHU, 31, 31, 31)).unwrap().op,
            UnsignedOp::Mulhu
        );
        assert_eq!(decode(encode(FUNCT3_REMU, 0, 0, 0)).unwrap().op, UnsignedOp::Remu);
    }

    #[test]
    fn check_field_getters() {
        // mulhu x31, x30, x29 with every register bit exercised
        let instr = encode(FUNCT3_MULHU, 31, 30, 29);
        assert_eq!(opcode(instr), OP);
        assert_eq!(funct3(instr), FUNCT3_MULHU);
        assert_eq!(funct7(instr), FUNCT7_MULDIV);
        assert_eq!(rd(instr), 31);
        assert_eq!(rs1(instr), 30);
        assert_eq!(rs2(instr), 29);
    }

    #[test]
    fn check_decode_rejects_signed_ops() {
        for funct3 in [FUNCT3_MULH, FUNCT3_MULHSU, FUNCT3_DIV, FUNCT3_REM] {
            assert_eq!(
                decode(encode(funct3, 1, 2, 3)),
                Err(DecodeError::SignedOp(funct3))
            );
        }
    }

    #[test]
    fn check_decode_rejects_other_instructions() {
        // add x1, x2, x3 (funct7 = 0)
        let add = 0x0031_00b3;
        assert_eq!(decode(add), Err(DecodeError::NotMulDiv(add)));
        // addi x1, x0, 1
        let addi = 0x0010_0093;
        assert_eq!(decode(addi), Err(DecodeError::NotMulDiv(addi)));
    }

    #[test]
    fn check_execute_examples() {
        assert_eq!(execute(UnsignedOp::Mul, 7, 6), Ok(42));
        assert_eq!(execute(UnsignedOp::Mul, u32::MAX, u32::MAX), Ok(1));
        assert_eq!(execute(UnsignedOp::Mulhu, u32::MAX, u32::MAX), Ok(0xffff_fffe));
        assert_eq!(execute(UnsignedOp::Divu, 100, 7), Ok(14));
        assert_eq!(execute(UnsignedOp::Remu, 100, 7), Ok(2));
    }

    #[test]
    fn check_divide_by_zero_convention() {
        assert_eq!(execute(UnsignedOp::Divu, 1234, 0), Ok(u32::MAX));
        assert_eq!(execute(UnsignedOp::Remu, 1234, 0), Ok(1234));
        assert_eq!(execute(UnsignedOp::Divu, 0, 0), Ok(u32::MAX));
        assert_eq!(execute(UnsignedOp::Remu, 0, 0), Ok(0));
    }

    proptest! {
        #[test]
        fn execute_matches_native(src1 in any::<u32>(), src2 in any::<u32>()) {
            let wide = u64::from(src1) * u64::from(src2);
            prop_assert_eq!(execute(UnsignedOp::Mul, src1, src2), Ok(src1.wrapping_mul(src2)));
            prop_assert_eq!(execute(UnsignedOp::Mulhu, src1, src2), Ok((wide >> 32) as u32));
            prop_assert_eq!(
                execute(UnsignedOp::Divu, src1, src2),
                Ok(src1.checked_div(src2).unwrap_or(u32::MAX))
            );
            prop_assert_eq!(
                execute(UnsignedOp::Remu, src1, src2),
                Ok(src1.checked_rem(src2).unwrap_or(src1))
            );
        }
    }
}
