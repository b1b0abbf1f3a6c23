//! Machine configuration
//!
//! Limits and console policies for a single run. The CLI fills this in from
//! its flags; library users build it directly.

use crate::vm::EofPolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineConfig {
    /// What IN stores once the input stream is exhausted
    pub eof_policy: EofPolicy,

    /// Stop `run` after this many instructions
    pub step_limit: Option<u64>,

    /// Most platters the active arrays may hold before ALLOC reports
    /// `HeapExhausted`
    pub heap_limit: Option<usize>,
}

impl MachineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_eof_policy(mut self, eof_policy: EofPolicy) -> Self {
        self.eof_policy = eof_policy;
        self
    }

    pub fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = Some(step_limit);
        self
    }

    pub fn with_heap_limit(mut self, heap_limit: usize) -> Self {
        self.heap_limit = Some(heap_limit);
        self
    }
}
