//! CHIP-8 emulator.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    time::Duration,
};

use super::{
    core::{cpu::CPU, governor::RateGovernor, opcodes},
    errors::EmulatorError,
    peripherals::cartridge::Cartridge,
    trace_exec,
};

/// CHIP-8 emulator: a CPU plus the rate governor pacing its step loop.
#[derive(Default)]
pub struct Emulator {
    /// CPU handle.
    pub cpu: CPU,
    governor: RateGovernor,
}

/// Emulation state, returned by a step and interpreted by the host loop.
#[derive(Debug)]
pub enum EmulationState {
    /// Host requested termination.
    Quit,
    /// Host requested a reset.
    Reset,
    /// Nothing noteworthy happened this step.
    Normal,
    /// An Fx0A wait is in progress; no instruction was executed.
    WaitForInput,
    /// A step failed. PC is left at the offending instruction.
    Halted(EmulatorError),
}

/// Tracefile handle.
#[derive(Debug)]
pub enum TracefileHandle {
    /// File
    File(File),
    /// Stdout
    Stdout,
}

/// Emulator context: host-facing configuration that outlives a single step.
#[derive(Default)]
pub struct EmulatorContext {
    tracefile_handle: Option<TracefileHandle>,
    should_quit: bool,
}

impl EmulatorContext {
    /// Create new emulator context.
    pub fn new() -> Self {
        Default::default()
    }

    /// Prepare a tracefile from a host-supplied path. `-` means stdout.
    pub fn prepare_tracefile(&mut self, tracefile: &Option<String>) {
        self.tracefile_handle = match tracefile {
            Some(ref path) => {
                if path == "-" {
                    Some(TracefileHandle::Stdout)
                } else {
                    Some(TracefileHandle::File(
                        OpenOptions::new().write(true).create(true).open(path).unwrap(),
                    ))
                }
            }
            None => None,
        };
    }

    /// Request a stop. The next `Emulator::step` cancels any in-flight
    /// Fx0A wait, halts the CPU, and returns `EmulationState::Quit`.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

impl Emulator {
    /// Create new CHIP-8 emulator.
    pub fn new() -> Self {
        Default::default()
    }

    /// Load a cartridge, installing the font table first.
    pub fn load_game(&mut self, cartridge: &Cartridge) {
        self.cpu.load_font_in_memory();
        self.cpu.load_cartridge_data(cartridge);
    }

    /// Reset the CPU and rate governor, then reload the cartridge.
    pub fn reset(&mut self, cartridge: &Cartridge) {
        self.cpu.reset();
        self.governor.reset();

        self.cpu.load_font_in_memory();
        self.cpu.load_cartridge_data(cartridge);
    }

    /// Advance the emulation by `elapsed` wall-clock time.
    ///
    /// Resolves an in-progress Fx0A wait first (without spending a CPU
    /// tick), then lets the rate governor decide whether this call's
    /// elapsed time crosses the instruction and/or timer period boundary.
    ///
    pub fn step(&mut self, ctx: &mut EmulatorContext, elapsed: Duration) -> EmulationState {
        if ctx.should_quit {
            self.cpu.peripherals.keypad.cancel_wait();
            self.cpu.halted = true;
            return EmulationState::Quit;
        }

        if self.cpu.halted {
            return EmulationState::Halted(EmulatorError::BadOpcode(
                self.cpu.peripherals.memory.get_pointer(),
            ));
        }

        if self.cpu.peripherals.keypad.is_waiting() {
            match self.cpu.peripherals.keypad.take_satisfied_wait() {
                Some((reg, key)) => {
                    self.cpu.registers.set_register(reg, key);
                    self.cpu.peripherals.memory.advance_pointer();
                }
                None => return EmulationState::WaitForInput,
            }
        }

        let (execute_now, tick_timer_now) = self.governor.step(elapsed);

        if execute_now {
            let opcode = match self.cpu.peripherals.memory.read_opcode() {
                Ok(opcode) => opcode,
                Err(err) => {
                    self.cpu.halted = true;
                    return EmulationState::Halted(err);
                }
            };

            trace_exec!(
                ctx.tracefile_handle,
                "[{:08X}] {:04X} - reading opcode 0x{:04X}...",
                self.cpu.instruction_count,
                self.cpu.peripherals.memory.get_pointer(),
                opcode
            );

            let opcode_enum = opcodes::get_opcode_enum(opcode);
            let (assembly, verbose) = opcodes::get_opcode_str(&opcode_enum);
            trace_exec!(ctx.tracefile_handle, "  - {:20} ; {}", assembly, verbose);

            if let Err(err) = self.cpu.execute_instruction(&opcode_enum) {
                self.cpu.halted = true;
                return EmulationState::Halted(err);
            }

            self.cpu.instruction_count += 1;
        }

        if tick_timer_now {
            self.cpu.decrement_timers();
        }

        EmulationState::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripherals::cartridge::Cartridge;

    #[test]
    fn test_load_and_step() {
        let mut emulator = Emulator::new();
        let cartridge = Cartridge::load_from_string("Test", "", &[0x60, 0x05]).unwrap();
        emulator.load_game(&cartridge);

        let mut ctx = EmulatorContext::new();
        // One governor period at 600 Hz.
        let state = emulator.step(&mut ctx, Duration::from_millis(2));
        assert!(matches!(state, EmulationState::Normal));
        assert_eq!(emulator.cpu.registers.get_register(0), 0x05);
    }

    #[test]
    fn test_halts_on_bad_opcode() {
        let mut emulator = Emulator::new();
        let cartridge = Cartridge::load_from_string("Test", "", &[0x50, 0x01]).unwrap();
        emulator.load_game(&cartridge);

        let mut ctx = EmulatorContext::new();
        let state = emulator.step(&mut ctx, Duration::from_millis(2));
        assert!(matches!(state, EmulationState::Halted(EmulatorError::BadOpcode(0x5001))));
        assert!(emulator.cpu.halted);
    }

    #[test]
    fn test_key_wait_suspends_then_resumes() {
        let mut emulator = Emulator::new();
        // Fx0A on V0.
        let cartridge = Cartridge::load_from_string("Test", "", &[0xF0, 0x0A]).unwrap();
        emulator.load_game(&cartridge);

        let mut ctx = EmulatorContext::new();
        emulator.step(&mut ctx, Duration::from_millis(2));
        assert!(emulator.cpu.peripherals.keypad.is_waiting());

        let state = emulator.step(&mut ctx, Duration::from_millis(2));
        assert!(matches!(state, EmulationState::WaitForInput));

        emulator.cpu.peripherals.keypad.set_key_down(0x7, true);
        emulator.step(&mut ctx, Duration::from_millis(2));
        assert_eq!(emulator.cpu.registers.get_register(0), 0x7);
    }

    #[test]
    fn test_quit_cancels_wait_and_halts() {
        let mut emulator = Emulator::new();
        // Fx0A on V0.
        let cartridge = Cartridge::load_from_string("Test", "", &[0xF0, 0x0A]).unwrap();
        emulator.load_game(&cartridge);

        let mut ctx = EmulatorContext::new();
        let pointer_before = emulator.cpu.peripherals.memory.get_pointer();
        emulator.step(&mut ctx, Duration::from_millis(2));
        assert!(emulator.cpu.peripherals.keypad.is_waiting());

        ctx.quit();
        let state = emulator.step(&mut ctx, Duration::from_millis(2));

        assert!(matches!(state, EmulationState::Quit));
        assert!(!emulator.cpu.peripherals.keypad.is_waiting());
        assert!(emulator.cpu.halted);
        assert_eq!(emulator.cpu.peripherals.memory.get_pointer(), pointer_before);
    }
}
