use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use uvm::{EofPolicy, MachineConfig, RunOutcome, VMState, VmError, VmResult};

pub const EXIT_HALTED: u8 = 0;
pub const EXIT_FAULT: u8 = 1;
pub const EXIT_HOST_ERROR: u8 = 2;
pub const EXIT_STEP_LIMIT: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "uvm",
    about = "Universal Machine - Run 32-bit platter program images",
    long_about = "The Universal Machine executes program images made of big-endian \
                  32-bit platters.\n\
                  It offers eight registers, a heap of platter arrays and byte console I/O, \
                  along with\na disassembler and an interactive debugger.",
    version,
    author
)]
pub struct Cli {
    /// Program image to execute
    pub program: PathBuf,

    /// Read guest input from a file instead of stdin
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Value IN stores once input is exhausted: all-ones or zero
    #[arg(long, default_value = "all-ones")]
    pub eof: EofPolicy,

    /// Stop after executing this many instructions
    #[arg(long)]
    pub max_steps: Option<u64>,

    /// Report heap exhaustion once active arrays would hold more platters
    #[arg(long)]
    pub heap_limit: Option<usize>,

    /// Print run statistics as JSON on stderr when the machine stops
    #[arg(long)]
    pub stats: bool,

    /// Enable debug mode (step through execution)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Print a disassembly of the program and exit
    #[arg(long)]
    pub disassemble: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn machine_config(&self) -> MachineConfig {
        let mut config = MachineConfig::new().with_eof_policy(self.eof);
        if let Some(limit) = self.max_steps {
            config = config.with_step_limit(limit);
        }
        if let Some(limit) = self.heap_limit {
            config = config.with_heap_limit(limit);
        }
        config
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Process exit status for a run to completion
pub fn run_exit_status(result: &VmResult<RunOutcome>) -> u8 {
    match result {
        Ok(RunOutcome::Halted) => EXIT_HALTED,
        Ok(RunOutcome::StepLimit) => EXIT_STEP_LIMIT,
        Err(VmError::Fault(_)) => EXIT_FAULT,
        Err(_) => EXIT_HOST_ERROR,
    }
}

/// Process exit status once a debugger session ends
pub fn session_exit_status(state: VMState) -> u8 {
    match state {
        VMState::Faulted(_) => EXIT_FAULT,
        VMState::Running | VMState::Halted => EXIT_HALTED,
    }
}
