/// Instruction representation for the Universal Machine
use super::registers::Register;
use crate::constants::*;
use crate::error::Fault;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Cmov = 0,
    Load = 1,
    Store = 2,
    Add = 3,
    Mul = 4,
    Div = 5,
    Nand = 6,
    Halt = 7,
    Alloc = 8,
    Free = 9,
    Out = 10,
    In = 11,
    Call = 12,
    Const = 13,
}

impl Opcode {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Opcode::Cmov),
            1 => Some(Opcode::Load),
            2 => Some(Opcode::Store),
            3 => Some(Opcode::Add),
            4 => Some(Opcode::Mul),
            5 => Some(Opcode::Div),
            6 => Some(Opcode::Nand),
            7 => Some(Opcode::Halt),
            8 => Some(Opcode::Alloc),
            9 => Some(Opcode::Free),
            10 => Some(Opcode::Out),
            11 => Some(Opcode::In),
            12 => Some(Opcode::Call),
            13 => Some(Opcode::Const),
            _ => None,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Opcode::Cmov => "CMOV",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Nand => "NAND",
            Opcode::Halt => "HALT",
            Opcode::Alloc => "ALLOC",
            Opcode::Free => "FREE",
            Opcode::Out => "OUT",
            Opcode::In => "IN",
            Opcode::Call => "CALL",
            Opcode::Const => "CONST",
        }
    }
}

/// A decoded platter. Each variant carries only the register fields its
/// opcode reads, so unused fields of the standard encoding are dropped here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    /// if c != 0 { a = b }
    Cmov { a: Register, b: Register, c: Register },
    /// a = array[b][c]
    Load { a: Register, b: Register, c: Register },
    /// array[a][b] = c
    Store { a: Register, b: Register, c: Register },
    Add { a: Register, b: Register, c: Register },
    Mul { a: Register, b: Register, c: Register },
    Div { a: Register, b: Register, c: Register },
    Nand { a: Register, b: Register, c: Register },
    Halt,
    /// b = handle of a new array of length c
    Alloc { b: Register, c: Register },
    Free { c: Register },
    Out { c: Register },
    In { c: Register },
    /// array 0 = copy of array b, finger = c
    Call { b: Register, c: Register },
    Const { a: Register, value: u32 },
}

impl Instr {
    /// Decode one platter. Only opcodes 14 and 15 can fail.
    #[inline]
    pub fn decode(platter: u32) -> Result<Self, Fault> {
        let opcode = platter >> OPCODE_SHIFT;
        let a = Register::from_field(platter >> REG_A_SHIFT);
        let b = Register::from_field(platter >> REG_B_SHIFT);
        let c = Register::from_field(platter);

        let instr = match Opcode::from_u32(opcode) {
            Some(Opcode::Cmov) => Instr::Cmov { a, b, c },
            Some(Opcode::Load) => Instr::Load { a, b, c },
            Some(Opcode::Store) => Instr::Store { a, b, c },
            Some(Opcode::Add) => Instr::Add { a, b, c },
            Some(Opcode::Mul) => Instr::Mul { a, b, c },
            Some(Opcode::Div) => Instr::Div { a, b, c },
            Some(Opcode::Nand) => Instr::Nand { a, b, c },
            Some(Opcode::Halt) => Instr::Halt,
            Some(Opcode::Alloc) => Instr::Alloc { b, c },
            Some(Opcode::Free) => Instr::Free { c },
            Some(Opcode::Out) => Instr::Out { c },
            Some(Opcode::In) => Instr::In { c },
            Some(Opcode::Call) => Instr::Call { b, c },
            Some(Opcode::Const) => Instr::Const {
                a: Register::from_field(platter >> CONST_REG_SHIFT),
                value: platter & CONST_VALUE_MASK,
            },
            None => return Err(Fault::BadInstruction { opcode, platter }),
        };
        Ok(instr)
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Instr::Cmov { .. } => Opcode::Cmov,
            Instr::Load { .. } => Opcode::Load,
            Instr::Store { .. } => Opcode::Store,
            Instr::Add { .. } => Opcode::Add,
            Instr::Mul { .. } => Opcode::Mul,
            Instr::Div { .. } => Opcode::Div,
            Instr::Nand { .. } => Opcode::Nand,
            Instr::Halt => Opcode::Halt,
            Instr::Alloc { .. } => Opcode::Alloc,
            Instr::Free { .. } => Opcode::Free,
            Instr::Out { .. } => Opcode::Out,
            Instr::In { .. } => Opcode::In,
            Instr::Call { .. } => Opcode::Call,
            Instr::Const { .. } => Opcode::Const,
        }
    }

    pub fn is_halt(&self) -> bool {
        matches!(self, Instr::Halt)
    }
}
