pub mod vm;
pub mod asm;
pub mod asm_formatter;
pub mod config;
pub mod constants;
pub mod debug;
pub mod error;
pub mod loader;
pub mod settings;

// Re-export commonly used types
pub use vm::{Console, EofPolicy, Instr, MachineStats, Register, RunOutcome, VMState, VM};
pub use config::MachineConfig;
pub use error::{Fault, LoadError, VmError, VmResult};
pub use loader::{load_program, load_program_file};
pub use asm_formatter::{disassemble, format_asm_line, format_instruction};
