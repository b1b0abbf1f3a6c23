mod cli;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::process::ExitCode;
use clap::Parser;
use colored::*;
use log::warn;
use uvm::debug::Debugger;
use uvm::settings::DebuggerSettings;
use uvm::{disassemble, load_program_file, Console, RunOutcome, VmError, VM};
use cli::{run_exit_status, session_exit_status, Cli, EXIT_HOST_ERROR};

type Machine = VM<Box<dyn Read>, BufWriter<io::Stdout>>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let program = match load_program_file(&cli.program) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error loading program: {e}");
            return ExitCode::from(EXIT_HOST_ERROR);
        }
    };

    if cli.disassemble {
        print!("{}", disassemble(&program));
        return ExitCode::SUCCESS;
    }

    // The debugger owns stdin for its commands, so guest input must come from a file
    let input: Box<dyn Read> = match &cli.input {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                eprintln!("Error opening input '{}': {e}", path.display());
                return ExitCode::from(EXIT_HOST_ERROR);
            }
        },
        None if cli.debug => {
            warn!("debug mode without --input: guest input is empty");
            Box::new(io::empty())
        }
        None => Box::new(io::stdin()),
    };

    let console = Console::new(input, BufWriter::new(io::stdout()));
    let mut vm: Machine = VM::with_config(program, console, cli.machine_config());

    let code = if cli.debug {
        run_debugger(&mut vm)
    } else {
        run_to_completion(&mut vm)
    };

    if cli.stats {
        match serde_json::to_string_pretty(&vm.stats()) {
            Ok(json) => eprintln!("{json}"),
            Err(e) => eprintln!("Error serializing statistics: {e}"),
        }
    }

    code
}

fn run_to_completion(vm: &mut Machine) -> ExitCode {
    let result = vm.run();
    match &result {
        Ok(RunOutcome::Halted) => {}
        Ok(RunOutcome::StepLimit) => {
            eprintln!("Step limit reached at finger {:08X}", vm.finger());
        }
        Err(VmError::Fault(fault)) => {
            let _ = io::stdout().flush();
            eprintln!("{} [{}]: {fault}", "Machine fault".bright_red().bold(), fault.kind());
        }
        Err(e) => eprintln!("Runtime error: {e}"),
    }
    ExitCode::from(run_exit_status(&result))
}

fn run_debugger(vm: &mut Machine) -> ExitCode {
    let mut debugger = Debugger::with_settings_file(DebuggerSettings::settings_path());
    if let Err(e) = debugger.run_session(vm, io::stdin().lock()) {
        eprintln!("Debugger error: {e}");
        return ExitCode::from(EXIT_HOST_ERROR);
    }
    ExitCode::from(session_exit_status(vm.state()))
}
