//! Error handling for the Universal Machine
//!
//! Guest faults are the eight illegal conditions a running program can
//! trigger. `VmError` wraps them together with host-side failures so callers
//! can tell a misbehaving program apart from a broken console.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A fatal condition raised by the guest program. Every fault is detected
/// before the offending instruction mutates any machine state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error("bad instruction: opcode {opcode} in platter 0x{platter:08X}")]
    BadInstruction { opcode: u32, platter: u32 },

    #[error("inactive array access: array {handle}, index {index}")]
    InactiveArrayAccess { handle: u32, index: u32 },

    #[error("attempted to free array 0")]
    FreeZero,

    #[error("double free of array {handle}")]
    DoubleFree { handle: u32 },

    #[error("division by zero")]
    DivideByZero,

    #[error("call of inactive array {handle}")]
    CallInactive { handle: u32 },

    #[error("output value {value} is out of range (0-255)")]
    OutputOutOfRange { value: u32 },

    #[error("execution ran off the platter at finger {finger} (array 0 holds {len} platters)")]
    ExecutionOffPlatter { finger: u32, len: usize },
}

impl Fault {
    /// Short stable name for the fault kind, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Fault::BadInstruction { .. } => "bad-instruction",
            Fault::InactiveArrayAccess { .. } => "inactive-array-access",
            Fault::FreeZero => "free-zero",
            Fault::DoubleFree { .. } => "double-free",
            Fault::DivideByZero => "divide-by-zero",
            Fault::CallInactive { .. } => "call-inactive",
            Fault::OutputOutOfRange { .. } => "output-out-of-range",
            Fault::ExecutionOffPlatter { .. } => "execution-off-platter",
        }
    }
}

/// Everything that can stop a step from completing
#[derive(Error, Debug)]
pub enum VmError {
    #[error("machine fault: {0}")]
    Fault(#[from] Fault),

    #[error("console I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("array heap exhausted: no free 32-bit handle remains")]
    HeapExhausted,

    #[error("machine is not running")]
    NotRunning,
}

impl VmError {
    /// The guest fault behind this error, if it is one
    pub fn fault(&self) -> Option<Fault> {
        match self {
            VmError::Fault(fault) => Some(*fault),
            _ => None,
        }
    }
}

/// Program image loading errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read program image '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("program image length {len} is not a multiple of 4 bytes")]
    TruncatedWord { len: usize },
}

pub type VmResult<T> = Result<T, VmError>;
