//! Central configuration and constants for the Universal Machine

// Machine shape
pub const REGISTER_COUNT: usize = 8;
pub const CODE_HANDLE: u32 = 0;

// Instruction encoding
pub const OPCODE_SHIFT: u32 = 28;
pub const REG_A_SHIFT: u32 = 6;
pub const REG_B_SHIFT: u32 = 3;
pub const REG_FIELD_MASK: u32 = 0b111;

// CONST (opcode 13) uses its own layout
pub const CONST_REG_SHIFT: u32 = 25;
pub const CONST_VALUE_MASK: u32 = 0x01FF_FFFF;

// Program image
pub const PLATTER_BYTES: usize = 4;

// Console
pub const MAX_OUTPUT_VALUE: u32 = 255;

// Debug output configuration
pub const DEBUG_HEAP_DISPLAY_ARRAYS: usize = 16; // Arrays listed in the heap summary
pub const DEBUG_DISASM_CONTEXT: usize = 3; // Instructions shown after the finger
