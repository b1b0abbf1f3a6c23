use std::fmt;
use crate::error::Fault;

/// VM execution states. Halted and Faulted are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMState {
    Running,
    Halted,
    Faulted(Fault),
}

impl VMState {
    pub fn is_running(&self) -> bool {
        matches!(self, VMState::Running)
    }
}

impl fmt::Display for VMState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VMState::Running => write!(f, "running"),
            VMState::Halted => write!(f, "halted"),
            VMState::Faulted(fault) => write!(f, "faulted ({fault})"),
        }
    }
}

/// How a call to `run` ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Halted,
    /// The configured step limit ran out while the machine was still running
    StepLimit,
}
