use std::collections::BTreeSet;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use colored::*;
use log::warn;
use crate::asm_formatter::format_instruction_colored;
use crate::constants::DEBUG_HEAP_DISPLAY_ARRAYS;
use crate::error::VmError;
use crate::settings::DebuggerSettings;
use crate::vm::{Register, RunOutcome, VMState, VM};

/// One line of debugger input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Step,
    Run,
    Continue,
    ToggleBreakpoint(u32),
    Examine { handle: u32, index: u32 },
    Heap,
    Toggle(Panel),
    Help,
    Quit,
}

/// A display setting the debugger can toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Registers,
    Heap,
    Disassembly,
    HexRegisters,
}

impl Panel {
    fn parse(token: Option<&str>) -> Result<Self, String> {
        match token {
            Some("regs" | "registers") => Ok(Panel::Registers),
            Some("heap") => Ok(Panel::Heap),
            Some("disasm" | "disassembly") => Ok(Panel::Disassembly),
            Some("hex") => Ok(Panel::HexRegisters),
            Some(other) => Err(format!("Unknown panel: {other} (regs, heap, disasm, hex)")),
            None => Err("Missing panel name (regs, heap, disasm, hex)".to_string()),
        }
    }
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Ok(Command::Step);
        };

        let command = match word {
            "s" | "step" => Command::Step,
            "r" | "run" => Command::Run,
            "c" | "continue" => Command::Continue,
            "b" | "break" => Command::ToggleBreakpoint(parse_number(parts.next())?),
            "x" | "examine" => Command::Examine {
                handle: parse_number(parts.next())?,
                index: parse_number(parts.next())?,
            },
            "h" | "heap" => Command::Heap,
            "t" | "toggle" => Command::Toggle(Panel::parse(parts.next())?),
            "?" | "help" => Command::Help,
            "q" | "quit" => Command::Quit,
            other => return Err(format!("Unknown command: {other}")),
        };

        if let Some(extra) = parts.next() {
            return Err(format!("Unexpected argument: {extra}"));
        }
        Ok(command)
    }
}

/// Parse a decimal or 0x-prefixed hex number
fn parse_number(token: Option<&str>) -> Result<u32, String> {
    let token = token.ok_or_else(|| "Missing numeric argument".to_string())?;
    let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => token.parse(),
    };
    parsed.map_err(|_| format!("Invalid number: {token}"))
}

pub struct Debugger {
    settings: DebuggerSettings,
    // Where toggled settings are saved, if anywhere
    settings_path: Option<PathBuf>,
    breakpoints: BTreeSet<u32>,
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new(DebuggerSettings::default())
    }
}

impl Debugger {
    pub fn new(settings: DebuggerSettings) -> Self {
        Self {
            settings,
            settings_path: None,
            breakpoints: BTreeSet::new(),
        }
    }

    /// Load settings from `path` and save them back there whenever a panel
    /// is toggled
    pub fn with_settings_file(path: PathBuf) -> Self {
        Self {
            settings: DebuggerSettings::load_from(&path),
            settings_path: Some(path),
            breakpoints: BTreeSet::new(),
        }
    }

    pub fn settings(&self) -> &DebuggerSettings {
        &self.settings
    }

    pub fn breakpoints(&self) -> &BTreeSet<u32> {
        &self.breakpoints
    }

    /// Drive the machine from debugger commands until quit or end of input.
    /// Guest faults are shown, not returned; only host I/O errors end the
    /// session with an error.
    pub fn run_session<R, W, C>(
        &mut self,
        vm: &mut VM<R, W>,
        commands: C,
    ) -> Result<(), VmError>
    where
        R: Read,
        W: Write,
        C: BufRead,
    {
        Self::print_welcome();
        self.print_state(vm);
        Self::print_prompt();

        for line in commands.lines() {
            let command = match Command::parse(&line?) {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e.bright_red());
                    Self::print_prompt();
                    continue;
                }
            };

            if !self.apply(vm, command)? {
                break;
            }
            Self::print_prompt();
        }

        vm.flush_console()?;
        Ok(())
    }

    /// Execute one command. Returns false when the session should end.
    pub fn apply<R: Read, W: Write>(
        &mut self,
        vm: &mut VM<R, W>,
        command: Command,
    ) -> Result<bool, VmError> {
        match command {
            Command::Quit => return Ok(false),
            Command::Help => Self::print_help(),
            Command::Heap => self.print_heap(vm),
            Command::ToggleBreakpoint(finger) => {
                if self.breakpoints.remove(&finger) {
                    println!("Breakpoint at {finger:08X} removed");
                } else {
                    self.breakpoints.insert(finger);
                    println!("Breakpoint at {finger:08X} set");
                }
            }
            Command::Examine { handle, index } => match vm.heap().read(handle, index) {
                Ok(value) => println!("[{handle}][{index}] = {value:08X} ({value})"),
                Err(e) => println!("{}", e.to_string().bright_red()),
            },
            Command::Step => {
                Self::step_once(vm)?;
                self.print_state(vm);
            }
            Command::Run => {
                match vm.run() {
                    Ok(RunOutcome::StepLimit) => {
                        println!("{}", "Step limit reached".bright_yellow());
                    }
                    Ok(RunOutcome::Halted) | Err(VmError::Fault(_) | VmError::NotRunning) => {}
                    Err(e) => return Err(e),
                }
                self.print_state(vm);
            }
            Command::Toggle(panel) => {
                let enabled = self.toggle(panel);
                println!("{panel:?} {}", if enabled { "on" } else { "off" });
            }
            Command::Continue => {
                self.continue_to_breakpoint(vm)?;
                self.print_state(vm);
            }
        }
        Ok(true)
    }

    /// Flip a display setting and persist it. Returns the new value.
    fn toggle(&mut self, panel: Panel) -> bool {
        let setting = match panel {
            Panel::Registers => &mut self.settings.show_registers,
            Panel::Heap => &mut self.settings.show_heap,
            Panel::Disassembly => &mut self.settings.show_disassembly,
            Panel::HexRegisters => &mut self.settings.hex_registers,
        };
        *setting = !*setting;
        let enabled = *setting;

        if let Some(path) = &self.settings_path {
            if let Err(e) = self.settings.save_to(path) {
                warn!("{e}");
            }
        }
        enabled
    }

    fn continue_to_breakpoint<R: Read, W: Write>(
        &self,
        vm: &mut VM<R, W>,
    ) -> Result<(), VmError> {
        // Always leave the current breakpoint before checking again
        if !Self::step_once(vm)? {
            return Ok(());
        }
        while !self.breakpoints.contains(&vm.finger()) {
            if !Self::step_once(vm)? {
                return Ok(());
            }
        }
        println!("\n{}", ">>> Breakpoint hit <<<".bright_yellow().bold());
        Ok(())
    }

    /// Returns whether the machine can keep stepping
    fn step_once<R: Read, W: Write>(vm: &mut VM<R, W>) -> Result<bool, VmError> {
        match vm.step() {
            Ok(()) => Ok(vm.state().is_running()),
            Err(VmError::Fault(_) | VmError::NotRunning) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Print the current VM state in a pretty format
    pub fn print_state<R: Read, W: Write>(&self, vm: &mut VM<R, W>) {
        // Guest output goes first so it is not interleaved with the dump
        let _ = vm.flush_console();

        println!("\n{}", "─".repeat(80).bright_black());
        println!(
            "{}: {:08X}  {}: {}",
            "Finger".bright_cyan().bold(),
            vm.finger(),
            "State".bright_cyan().bold(),
            Self::format_state(&vm.state())
        );

        if self.settings.show_registers {
            println!("\n{}", "Registers:".bright_cyan().bold());
            for row in Register::ALL.chunks(4) {
                for &reg in row {
                    let value = vm.registers[reg];
                    let formatted = if self.settings.hex_registers {
                        format!("{reg}={value:08X}")
                    } else {
                        format!("{reg}={value:<10}")
                    };
                    if value != 0 {
                        print!("  {}", formatted.bright_white());
                    } else {
                        print!("  {}", formatted.bright_black());
                    }
                }
                println!();
            }
        }

        if self.settings.show_disassembly {
            println!("\n{}", "Next Instructions:".bright_cyan().bold());
            let finger = vm.finger() as usize;
            let code = vm.heap().code();
            let lines = self.settings.disassembly_lines.max(1);
            let shown = code.iter().enumerate().skip(finger).take(lines);
            for (offset, &platter) in shown {
                let marker = if offset == finger { "=>" } else { "  " };
                let bp = if self.breakpoints.contains(&(offset as u32)) {
                    "*".bright_red()
                } else {
                    " ".normal()
                };
                println!("{bp}{marker} [{offset:08X}] {}", format_instruction_colored(platter));
            }
            if finger >= code.len() {
                println!("   {}", "(finger is past the end of array 0)".bright_black());
            }
        }

        if self.settings.show_heap {
            self.print_heap(vm);
        }

        println!("{}", "─".repeat(80).bright_black());
    }

    fn print_heap<R: Read, W: Write>(&self, vm: &VM<R, W>) {
        let heap = vm.heap();
        println!("\n{} {} active", "Heap:".bright_cyan().bold(), heap.active_count());
        for (handle, len) in heap.active_arrays().take(DEBUG_HEAP_DISPLAY_ARRAYS) {
            println!("  array {handle:>8}: {len} platters");
        }
        if heap.active_count() > DEBUG_HEAP_DISPLAY_ARRAYS {
            let more = heap.active_count() - DEBUG_HEAP_DISPLAY_ARRAYS;
            println!("  {}", format!("... {more} more").bright_black());
        }
    }

    fn print_prompt() {
        print!("{} ", ">".bright_green().bold());
        let _ = io::stdout().flush();
    }

    /// Print a welcome message for debug mode
    pub fn print_welcome() {
        println!("{}", "╔══════════════════════════════════════════════════════════════╗".bright_cyan());
        println!("{}", "║        Universal Machine Debugger - Interactive Mode         ║".bright_cyan());
        println!("{}", "╚══════════════════════════════════════════════════════════════╝".bright_cyan());
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  {}  Step one instruction", "Enter".bright_green().bold());
        println!("  {}       Run to completion", "r".bright_green().bold());
        println!("  {}       Continue to the next breakpoint", "c".bright_green().bold());
        println!("  {}     Toggle breakpoint at finger N", "b N".bright_green().bold());
        println!("  {}   Examine word I of array H", "x H I".bright_green().bold());
        println!("  {}       Show active arrays", "h".bright_green().bold());
        println!("  {}  Toggle regs, heap, disasm or hex", "t PANEL".bright_green().bold());
        println!("  {}       Quit debugger", "q".bright_green().bold());
        println!();
    }

    fn format_state(state: &VMState) -> ColoredString {
        match state {
            VMState::Running => "Running".bright_green(),
            VMState::Halted => "Halted".bright_red(),
            VMState::Faulted(fault) => format!("Fault: {fault}").bright_red().bold(),
        }
    }
}
