use std::fmt;
use std::ops::{Index, IndexMut};
use crate::constants::{REGISTER_COUNT, REG_FIELD_MASK};

/// One of the eight general-purpose registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Register {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl Register {
    pub const ALL: [Register; REGISTER_COUNT] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
    ];

    /// Decode a 3-bit register field. Higher bits are masked off.
    #[inline(always)]
    pub fn from_field(bits: u32) -> Self {
        Self::ALL[(bits & REG_FIELD_MASK) as usize]
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", *self as u8)
    }
}

/// The register bank. Reads and writes never fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    values: [u32; REGISTER_COUNT],
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn get(&self, reg: Register) -> u32 {
        self.values[reg.index()]
    }

    #[inline(always)]
    pub fn set(&mut self, reg: Register, value: u32) {
        self.values[reg.index()] = value;
    }

    pub fn as_array(&self) -> &[u32; REGISTER_COUNT] {
        &self.values
    }
}

impl Index<Register> for Registers {
    type Output = u32;

    fn index(&self, reg: Register) -> &u32 {
        &self.values[reg.index()]
    }
}

impl IndexMut<Register> for Registers {
    fn index_mut(&mut self, reg: Register) -> &mut u32 {
        &mut self.values[reg.index()]
    }
}
