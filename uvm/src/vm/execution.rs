use std::io::{Read, Write};
use log::{debug, info};
use super::{Instr, VMState, VM};
use crate::constants::{CODE_HANDLE, MAX_OUTPUT_VALUE};
use crate::error::{Fault, VmResult};

impl<R: Read, W: Write> VM<R, W> {
    /// Apply one decoded instruction. The finger has already been advanced.
    /// Every fault check happens before the instruction writes anything.
    pub(super) fn execute_instruction(&mut self, instr: Instr) -> VmResult<()> {
        let regs = &mut self.registers;

        match instr {
            Instr::Cmov { a, b, c } => {
                if regs[c] != 0 {
                    regs[a] = regs[b];
                }
            }
            Instr::Load { a, b, c } => {
                regs[a] = self.heap.read(regs[b], regs[c])?;
            }
            Instr::Store { a, b, c } => {
                self.heap.write(regs[a], regs[b], regs[c])?;
            }
            Instr::Add { a, b, c } => {
                regs[a] = regs[b].wrapping_add(regs[c]);
            }
            Instr::Mul { a, b, c } => {
                regs[a] = regs[b].wrapping_mul(regs[c]);
            }
            Instr::Div { a, b, c } => {
                regs[a] = regs[b].checked_div(regs[c]).ok_or(Fault::DivideByZero)?;
            }
            Instr::Nand { a, b, c } => {
                regs[a] = !(regs[b] & regs[c]);
            }
            Instr::Halt => {
                self.console.flush()?;
                info!("halted after {} instructions", self.stats.instructions);
                self.state = VMState::Halted;
            }
            Instr::Alloc { b, c } => {
                regs[b] = self.heap.allocate(regs[c])?;
                self.stats.allocations += 1;
                self.stats.peak_active_arrays =
                    self.stats.peak_active_arrays.max(self.heap.active_count());
            }
            Instr::Free { c } => {
                self.heap.free(regs[c])?;
                self.stats.frees += 1;
            }
            Instr::Out { c } => {
                let value = regs[c];
                if value > MAX_OUTPUT_VALUE {
                    return Err(Fault::OutputOutOfRange { value }.into());
                }
                self.console.write_byte(value as u8)?;
            }
            Instr::In { c } => {
                regs[c] = self.console.read_platter()?;
            }
            Instr::Call { b, c } => {
                let handle = regs[b];
                // Array 0 calling itself is a plain jump
                if handle != CODE_HANDLE {
                    let program = self.heap.duplicate(handle)?;
                    debug!("call: array {handle} ({} platters) becomes array 0", program.len());
                    self.heap.replace_array_zero(program);
                    self.stats.program_loads += 1;
                }
                self.stats.calls += 1;
                self.finger = regs[c];
            }
            Instr::Const { a, value } => {
                regs[a] = value;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};
    use crate::asm;
    use crate::config::MachineConfig;
    use crate::error::{Fault, VmError};
    use crate::vm::{Console, Register::*, RunOutcome, VMState, VM};

    type TestVM = VM<&'static [u8], Vec<u8>>;

    fn machine(program: Vec<u32>) -> TestVM {
        VM::new(program, Console::new(&[][..], Vec::new()))
    }

    fn machine_with_input(program: Vec<u32>, input: &'static [u8]) -> TestVM {
        VM::new(program, Console::new(input, Vec::new()))
    }

    fn run_fault(vm: &mut TestVM) -> Fault {
        match vm.run() {
            Err(VmError::Fault(fault)) => {
                assert_eq!(vm.state(), VMState::Faulted(fault));
                fault
            }
            other => panic!("expected a fault, got {other:?}"),
        }
    }

    #[test]
    fn create_and_halt() {
        let mut vm = machine(vec![asm::halt()]);
        assert_eq!(vm.run().unwrap(), RunOutcome::Halted);
        assert_eq!(vm.finger(), 1);
        assert_eq!(vm.state(), VMState::Halted);
    }

    #[test]
    fn cmov_moves_only_when_condition_nonzero() {
        let mut vm = machine(vec![asm::cmov(R0, R1, R2), asm::halt()]);
        vm.registers[R0] = 0xDEAD_BEEF;
        vm.registers[R1] = 0xDECA_F000;
        vm.run().unwrap();
        assert_eq!(vm.registers[R0], 0xDEAD_BEEF);

        let mut vm = machine(vec![asm::cmov(R0, R1, R2), asm::halt()]);
        vm.registers[R1] = 0xDECA_F000;
        vm.registers[R2] = 1;
        vm.run().unwrap();
        assert_eq!(vm.registers[R0], 0xDECA_F000);
        assert_eq!(vm.registers[R1], 0xDECA_F000);
    }

    #[test]
    fn add_and_mul_wrap() {
        let mut vm = machine(vec![asm::add(R0, R1, R2), asm::mul(R3, R4, R5), asm::halt()]);
        vm.registers[R1] = u32::MAX;
        vm.registers[R2] = 1;
        vm.registers[R4] = u32::MAX;
        vm.registers[R5] = 2;
        vm.run().unwrap();
        assert_eq!(vm.registers[R0], 0);
        assert_eq!(vm.registers[R3], u32::MAX - 1);
    }

    #[test]
    fn div_rounds_down() {
        let mut vm = machine(vec![asm::div(R0, R1, R2), asm::halt()]);
        vm.registers[R1] = 8;
        vm.registers[R2] = 3;
        vm.run().unwrap();
        assert_eq!(vm.registers[R0], 2);
    }

    #[test]
    fn div_by_zero_leaves_destination_untouched() {
        let mut vm = machine(vec![asm::div(R0, R1, R2), asm::halt()]);
        vm.registers[R0] = 1234;
        vm.registers[R1] = 8;
        assert_eq!(run_fault(&mut vm), Fault::DivideByZero);
        assert_eq!(vm.registers[R0], 1234);
    }

    #[test]
    fn nand_is_bitwise() {
        let mut vm = machine(vec![
            asm::nand(R0, R1, R2),
            asm::nand(R3, R1, R1),
            asm::nand(R4, R5, R5),
            asm::nand(R6, R7, R7),
            asm::halt(),
        ]);
        vm.registers[R1] = 0xFFFF_00FF;
        vm.registers[R2] = 0xFFFF_0F0F;
        vm.registers[R7] = 0xFFFF_FFFF;
        vm.run().unwrap();
        assert_eq!(vm.registers[R0], 0x0000_FFF0);
        assert_eq!(vm.registers[R3], !0xFFFF_00FFu32);
        assert_eq!(vm.registers[R4], 0xFFFF_FFFF);
        assert_eq!(vm.registers[R6], 0);
    }

    #[test]
    fn alloc_store_load() {
        let mut vm = machine(vec![
            asm::alloc(R7, R0),
            asm::store(R7, R1, R2),
            asm::load(R6, R7, R1),
            asm::halt(),
        ]);
        vm.registers[R0] = 20;
        vm.registers[R1] = 5;
        vm.registers[R2] = 0xDEAD_BEEF;
        vm.run().unwrap();
        assert_eq!(vm.registers[R6], 0xDEAD_BEEF);
        assert_eq!(vm.heap().array(vm.registers[R7]).map(|a| a.len()), Some(20));
        assert_eq!(vm.stats().allocations, 1);
        assert_eq!(vm.stats().peak_active_arrays, 2);
    }

    #[test]
    fn store_to_unallocated_array_faults() {
        let mut vm = machine(vec![asm::store(R7, R1, R2), asm::halt()]);
        vm.registers[R7] = 100;
        vm.registers[R1] = 3;
        assert_eq!(run_fault(&mut vm), Fault::InactiveArrayAccess { handle: 100, index: 3 });
    }

    #[test]
    fn load_past_end_of_array_faults() {
        let mut vm = machine(vec![asm::alloc(R1, R2), asm::load(R3, R1, R2), asm::halt()]);
        vm.registers[R2] = 4;
        let fault = run_fault(&mut vm);
        assert_eq!(fault, Fault::InactiveArrayAccess { handle: vm.registers[R1], index: 4 });
    }

    #[test]
    fn store_and_load_program_memory() {
        let mut vm = machine(vec![asm::store(R7, R1, R2), asm::load(R6, R7, R1), asm::halt()]);
        vm.registers[R2] = 0xDEAD_BEEF;
        assert_eq!(vm.run().unwrap(), RunOutcome::Halted);
        assert_eq!(vm.registers[R6], 0xDEAD_BEEF);
    }

    #[test]
    fn free_then_any_use_faults() {
        for (use_instr, expected) in [
            (asm::load(R3, R1, R0), Fault::InactiveArrayAccess { handle: 1, index: 0 }),
            (asm::store(R1, R0, R0), Fault::InactiveArrayAccess { handle: 1, index: 0 }),
            (asm::free(R1), Fault::DoubleFree { handle: 1 }),
            (asm::call(R1, R0), Fault::CallInactive { handle: 1 }),
        ] {
            let mut vm = machine(vec![asm::alloc(R1, R2), asm::free(R1), use_instr, asm::halt()]);
            vm.registers[R2] = 4;
            assert_eq!(run_fault(&mut vm), expected);
        }
    }

    #[test]
    fn free_zero_faults() {
        let mut vm = machine(vec![asm::free(R0), asm::halt()]);
        assert_eq!(run_fault(&mut vm), Fault::FreeZero);
        assert_eq!(vm.heap().code().len(), 2);
    }

    #[test]
    fn output_range_is_checked_on_full_register() {
        let mut vm = machine(vec![asm::out(R7), asm::halt()]);
        vm.registers[R7] = 255;
        vm.run().unwrap();
        assert_eq!(vm.console().writer(), &vec![255u8]);

        let mut vm = machine(vec![asm::out(R7), asm::halt()]);
        vm.registers[R7] = 256;
        assert_eq!(run_fault(&mut vm), Fault::OutputOutOfRange { value: 256 });
        assert!(vm.console().writer().is_empty());
    }

    #[test]
    fn input_sign_extends() {
        let program = vec![asm::input(R1), asm::input(R2), asm::input(R3), asm::halt()];
        let mut vm = machine_with_input(program, b"A\x80");
        vm.run().unwrap();
        assert_eq!(vm.registers[R1], 0x41);
        assert_eq!(vm.registers[R2], 0xFFFF_FF80);
        assert_eq!(vm.registers[R3], u32::MAX);
    }

    #[test]
    fn constant_load() {
        let mut vm = machine(vec![0b1101_1110_1010_1010_1101_0010_0101_0101, asm::halt()]);
        vm.run().unwrap();
        assert_eq!(vm.registers[R7], 0b0_1010_1010_1101_0010_0101_0101);
    }

    #[test]
    fn call_array_copies_and_jumps() {
        let mut vm = machine(vec![
            asm::alloc(R5, R0),
            asm::store(R5, R1, R2),
            asm::call(R5, R1),
        ]);
        vm.registers[R0] = 5;
        vm.registers[R1] = 3;
        vm.registers[R2] = asm::halt();
        assert_eq!(vm.run().unwrap(), RunOutcome::Halted);
        assert_eq!(vm.finger(), 4);
        assert_eq!(vm.heap().code(), &[0, 0, 0, asm::halt(), 0]);
        // The source array survives the call
        assert!(vm.heap().is_active(vm.registers[R5]));
        assert_eq!(vm.stats().program_loads, 1);
    }

    #[test]
    fn call_zero_is_a_jump() {
        let mut vm = machine(vec![
            asm::call(R0, R1),
            0xFFFF_FFFF,
            0xFFFF_FFFF,
            0xFFFF_FFFF,
            asm::halt(),
        ]);
        vm.registers[R1] = 4;
        assert_eq!(vm.run().unwrap(), RunOutcome::Halted);
        assert_eq!(vm.stats().program_loads, 0);
        assert_eq!(vm.stats().calls, 1);
    }

    #[test]
    fn call_inactive_array_faults() {
        let mut vm = machine(vec![asm::call(R5, R1)]);
        vm.registers[R5] = 5;
        assert_eq!(run_fault(&mut vm), Fault::CallInactive { handle: 5 });
    }

    #[test]
    fn invalid_opcodes_fault() {
        let mut vm = machine(vec![0xE000_0000]);
        assert_eq!(run_fault(&mut vm), Fault::BadInstruction { opcode: 14, platter: 0xE000_0000 });
    }

    #[test]
    fn running_off_the_platter_faults() {
        let mut vm = machine(vec![]);
        assert_eq!(run_fault(&mut vm), Fault::ExecutionOffPlatter { finger: 0, len: 0 });

        let mut vm = machine(vec![asm::constant(R0, 1).unwrap()]);
        assert_eq!(run_fault(&mut vm), Fault::ExecutionOffPlatter { finger: 1, len: 1 });
    }

    #[test]
    fn terminal_states_execute_nothing() {
        let mut vm = machine(vec![asm::halt(), asm::constant(R0, 9).unwrap()]);
        vm.run().unwrap();
        assert!(matches!(vm.step(), Err(VmError::NotRunning)));
        assert_eq!(vm.registers[R0], 0);
        assert_eq!(vm.run().unwrap(), RunOutcome::Halted);
    }

    /// Fails the first read, then serves `data`
    struct FailOnceReader {
        failed: bool,
        data: &'static [u8],
    }

    impl Read for FailOnceReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.failed {
                self.failed = true;
                return Err(io::Error::new(io::ErrorKind::Other, "transient"));
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn input_error_retries_the_same_instruction() {
        let reader = FailOnceReader { failed: false, data: b"Z" };
        let program = vec![asm::input(R1), asm::out(R1), asm::halt()];
        let mut vm = VM::new(program, Console::new(reader, Vec::new()));

        assert!(matches!(vm.run(), Err(VmError::Io(_))));
        assert_eq!(vm.state(), VMState::Running);
        assert_eq!(vm.finger(), 0);
        assert_eq!(vm.stats().instructions, 0);

        assert_eq!(vm.run().unwrap(), RunOutcome::Halted);
        assert_eq!(vm.registers[R1], u32::from(b'Z'));
        assert_eq!(vm.console().writer(), &vec![b'Z']);
        assert_eq!(vm.stats().instructions, 3);
    }

    #[test]
    fn heap_exhaustion_is_a_host_error() {
        let config = MachineConfig::new().with_heap_limit(16);
        let program = vec![asm::nand(R1, R0, R0), asm::alloc(R2, R1), asm::halt()];
        let mut vm = VM::with_config(program, Console::new(&[][..], Vec::new()), config);

        assert!(matches!(vm.run(), Err(VmError::HeapExhausted)));
        assert_eq!(vm.state(), VMState::Running);
        assert_eq!(vm.finger(), 1);
        assert_eq!(vm.registers[R2], 0);
        assert_eq!(vm.heap().active_count(), 1);
        assert_eq!(vm.stats().allocations, 0);
    }
}
