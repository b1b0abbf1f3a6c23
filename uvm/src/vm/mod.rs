/// VM module - Virtual Machine implementation for the Universal Machine

mod console;
mod execution;
mod heap;
mod instruction;
mod registers;
mod state;
mod stats;

pub use console::{Console, EofPolicy};
pub use heap::ArrayHeap;
pub use instruction::{Instr, Opcode};
pub use registers::{Register, Registers};
pub use state::{RunOutcome, VMState};
pub use stats::MachineStats;

use std::io::{Read, Write};
use log::{debug, info, log_enabled, trace, warn, Level};
use crate::config::MachineConfig;
use crate::error::{Fault, VmError, VmResult};

/// The Universal Machine
#[derive(Debug)]
pub struct VM<R, W> {
    pub registers: Registers,

    // Offset of the next platter to execute in array 0
    finger: u32,

    heap: ArrayHeap,
    state: VMState,
    console: Console<R, W>,
    config: MachineConfig,
    stats: MachineStats,
}

impl<R: Read, W: Write> VM<R, W> {
    pub fn new(program: Vec<u32>, console: Console<R, W>) -> Self {
        Self::with_config(program, console, MachineConfig::default())
    }

    pub fn with_config(
        program: Vec<u32>,
        mut console: Console<R, W>,
        config: MachineConfig,
    ) -> Self {
        info!("loaded program: {} platters", program.len());
        console.set_eof_policy(config.eof_policy);
        VM {
            registers: Registers::new(),
            finger: 0,
            heap: ArrayHeap::with_limit(program, config.heap_limit),
            state: VMState::Running,
            console,
            config,
            stats: MachineStats {
                peak_active_arrays: 1,
                ..MachineStats::default()
            },
        }
    }

    /// Execute a single instruction. A fault moves the machine into the
    /// Faulted state and is also returned to the caller.
    ///
    /// Host errors (console I/O, heap exhaustion) leave the machine Running
    /// with the finger still on the failed instruction, so a later step
    /// retries it.
    pub fn step(&mut self) -> VmResult<()> {
        if !self.state.is_running() {
            return Err(VmError::NotRunning);
        }

        match self.fetch_and_execute() {
            Err(VmError::Fault(fault)) => {
                warn!("machine fault: {fault}");
                self.state = VMState::Faulted(fault);
                if let Err(e) = self.console.flush() {
                    warn!("failed to flush output after fault: {e}");
                }
                Err(VmError::Fault(fault))
            }
            result => result,
        }
    }

    /// Run until the machine halts, faults, or the step limit runs out
    pub fn run(&mut self) -> VmResult<RunOutcome> {
        match self.state {
            VMState::Running => {}
            VMState::Halted => return Ok(RunOutcome::Halted),
            VMState::Faulted(fault) => return Err(VmError::Fault(fault)),
        }

        let mut budget = self.config.step_limit;
        while self.state.is_running() {
            if let Some(left) = budget.as_mut() {
                if *left == 0 {
                    info!("step limit reached after {} instructions", self.stats.instructions);
                    self.console.flush()?;
                    return Ok(RunOutcome::StepLimit);
                }
                *left -= 1;
            }
            self.step()?;
        }
        Ok(RunOutcome::Halted)
    }

    fn fetch_and_execute(&mut self) -> VmResult<()> {
        let finger = self.finger;
        let code = self.heap.code();
        let platter = *code
            .get(finger as usize)
            .ok_or(Fault::ExecutionOffPlatter { finger, len: code.len() })?;

        // Advance before dispatch so CALL can overwrite the finger
        self.finger += 1;
        let instr = Instr::decode(platter)?;

        if log_enabled!(Level::Trace) {
            trace!("[{finger:08X}] {instr}  {:?}", self.registers.as_array());
        }

        self.stats.instructions += 1;
        match self.execute_instruction(instr) {
            Err(e) if e.fault().is_none() => {
                debug!("host error at {finger:08X}, instruction will be retried: {e}");
                self.finger = finger;
                self.stats.instructions -= 1;
                Err(e)
            }
            result => result,
        }
    }

    pub fn state(&self) -> VMState {
        self.state
    }

    pub fn finger(&self) -> u32 {
        self.finger
    }

    pub fn heap(&self) -> &ArrayHeap {
        &self.heap
    }

    pub fn console(&self) -> &Console<R, W> {
        &self.console
    }

    pub fn flush_console(&mut self) -> std::io::Result<()> {
        self.console.flush()
    }

    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    pub fn stats(&self) -> MachineStats {
        MachineStats {
            bytes_in: self.console.bytes_in(),
            bytes_out: self.console.bytes_out(),
            ..self.stats.clone()
        }
    }
}
