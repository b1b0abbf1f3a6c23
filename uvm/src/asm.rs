//! Platter encoder
//!
//! Builds instruction words from opcodes and register operands. Used to
//! write small programs in tests and by anything that needs to synthesize
//! code for array 0.

use crate::constants::*;
use crate::vm::{Instr, Opcode, Register};

fn standard(opcode: Opcode, a: Register, b: Register, c: Register) -> u32 {
    ((opcode as u32) << OPCODE_SHIFT)
        | ((a as u32) << REG_A_SHIFT)
        | ((b as u32) << REG_B_SHIFT)
        | c as u32
}

/// Encode a decoded instruction. Fields the variant does not carry are
/// written as zero. A CONST immediate is truncated to 25 bits.
pub fn encode(instr: Instr) -> u32 {
    use Register::R0;

    match instr {
        Instr::Cmov { a, b, c } => standard(Opcode::Cmov, a, b, c),
        Instr::Load { a, b, c } => standard(Opcode::Load, a, b, c),
        Instr::Store { a, b, c } => standard(Opcode::Store, a, b, c),
        Instr::Add { a, b, c } => standard(Opcode::Add, a, b, c),
        Instr::Mul { a, b, c } => standard(Opcode::Mul, a, b, c),
        Instr::Div { a, b, c } => standard(Opcode::Div, a, b, c),
        Instr::Nand { a, b, c } => standard(Opcode::Nand, a, b, c),
        Instr::Halt => standard(Opcode::Halt, R0, R0, R0),
        Instr::Alloc { b, c } => standard(Opcode::Alloc, R0, b, c),
        Instr::Free { c } => standard(Opcode::Free, R0, R0, c),
        Instr::Out { c } => standard(Opcode::Out, R0, R0, c),
        Instr::In { c } => standard(Opcode::In, R0, R0, c),
        Instr::Call { b, c } => standard(Opcode::Call, R0, b, c),
        Instr::Const { a, value } => {
            ((Opcode::Const as u32) << OPCODE_SHIFT)
                | ((a as u32) << CONST_REG_SHIFT)
                | (value & CONST_VALUE_MASK)
        }
    }
}

pub fn cmov(a: Register, b: Register, c: Register) -> u32 {
    encode(Instr::Cmov { a, b, c })
}

pub fn load(a: Register, b: Register, c: Register) -> u32 {
    encode(Instr::Load { a, b, c })
}

pub fn store(a: Register, b: Register, c: Register) -> u32 {
    encode(Instr::Store { a, b, c })
}

pub fn add(a: Register, b: Register, c: Register) -> u32 {
    encode(Instr::Add { a, b, c })
}

pub fn mul(a: Register, b: Register, c: Register) -> u32 {
    encode(Instr::Mul { a, b, c })
}

pub fn div(a: Register, b: Register, c: Register) -> u32 {
    encode(Instr::Div { a, b, c })
}

pub fn nand(a: Register, b: Register, c: Register) -> u32 {
    encode(Instr::Nand { a, b, c })
}

pub fn halt() -> u32 {
    encode(Instr::Halt)
}

pub fn alloc(b: Register, c: Register) -> u32 {
    encode(Instr::Alloc { b, c })
}

pub fn free(c: Register) -> u32 {
    encode(Instr::Free { c })
}

pub fn out(c: Register) -> u32 {
    encode(Instr::Out { c })
}

pub fn input(c: Register) -> u32 {
    encode(Instr::In { c })
}

pub fn call(b: Register, c: Register) -> u32 {
    encode(Instr::Call { b, c })
}

/// CONST a <- value. Returns None if `value` does not fit in 25 bits.
pub fn constant(a: Register, value: u32) -> Option<u32> {
    if value > CONST_VALUE_MASK {
        return None;
    }
    Some(encode(Instr::Const { a, value }))
}
