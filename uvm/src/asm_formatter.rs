use std::fmt;
use colored::*;
use crate::vm::{Instr, Opcode};

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.opcode().to_str();
        match *self {
            Instr::Cmov { a, b, c }
            | Instr::Load { a, b, c }
            | Instr::Store { a, b, c }
            | Instr::Add { a, b, c }
            | Instr::Mul { a, b, c }
            | Instr::Div { a, b, c }
            | Instr::Nand { a, b, c } => write!(f, "{name:<6} {a}, {b}, {c}"),
            Instr::Halt => write!(f, "{name}"),
            Instr::Alloc { b, c } | Instr::Call { b, c } => write!(f, "{name:<6} {b}, {c}"),
            Instr::Free { c } | Instr::Out { c } | Instr::In { c } => write!(f, "{name:<6} {c}"),
            Instr::Const { a, value } => write!(f, "{name:<6} {a}, 0x{value:X}"),
        }
    }
}

/// Disassemble one platter
pub fn format_instruction(platter: u32) -> String {
    match Instr::decode(platter) {
        Ok(instr) => instr.to_string(),
        Err(_) => format!("INVALID 0x{platter:08X}"),
    }
}

/// Disassemble one platter with its offset, as a listing line
pub fn format_asm_line(offset: usize, platter: u32) -> String {
    format!("{offset:08X}: {platter:08X}  {}", format_instruction(platter))
}

/// Disassemble a whole program, one line per platter
pub fn disassemble(program: &[u32]) -> String {
    let mut listing = String::new();
    for (offset, &platter) in program.iter().enumerate() {
        listing.push_str(&format_asm_line(offset, platter));
        listing.push('\n');
    }
    listing
}

/// Terminal styling for an instruction, keyed by what it touches
pub fn get_instruction_style(platter: u32) -> Color {
    match Instr::decode(platter).map(|instr| instr.opcode()) {
        Ok(Opcode::Halt) => Color::BrightRed,
        Ok(Opcode::Call) => Color::BrightMagenta,
        Ok(Opcode::Load | Opcode::Store) => Color::BrightBlue,
        Ok(Opcode::Alloc | Opcode::Free) => Color::BrightYellow,
        Ok(Opcode::Out | Opcode::In) => Color::BrightCyan,
        Ok(_) => Color::White,
        Err(_) => Color::Red,
    }
}

/// Colored disassembly for the interactive debugger
pub fn format_instruction_colored(platter: u32) -> ColoredString {
    format_instruction(platter).color(get_instruction_style(platter))
}
