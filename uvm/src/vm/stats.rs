use serde::{Deserialize, Serialize};

/// Counters collected while the machine runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineStats {
    pub instructions: u64,
    pub allocations: u64,
    pub frees: u64,
    pub calls: u64,
    /// Calls that replaced array 0 with a copy of another array
    pub program_loads: u64,
    pub peak_active_arrays: usize,
    pub bytes_in: u64,
    pub bytes_out: u64,
}
