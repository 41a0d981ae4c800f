//! Debugger: breakpoints plus single-step/continue orchestration around the
//! emulator's step loop. Rendering state to a user is the host's job; this
//! module decides *when* to step, not how to display what stepped.

mod breakpoints;
mod context;
mod errors;

pub mod inspection;

use std::time::Duration;

pub use breakpoints::Breakpoints;
pub use context::DebuggerContext;
pub use errors::BadBreakpoint;

use crate::emulator::{EmulationState, Emulator, EmulatorContext};

/// Debugger.
#[derive(Default)]
pub struct Debugger;

impl Debugger {
    /// Create new debugger.
    pub fn new() -> Self {
        Default::default()
    }

    /// Advance the emulator under breakpoint/single-step control.
    ///
    /// Checks for a breakpoint hit first, then steps the emulator only if
    /// the context is currently stepping or continuing. Returns
    /// `EmulationState::Normal` without touching the emulator if neither
    /// flag is set (the debugger is paused, waiting on the host).
    ///
    pub fn step(
        &self,
        emulator: &mut Emulator,
        emulator_ctx: &mut EmulatorContext,
        debug_ctx: &mut DebuggerContext,
        elapsed: Duration,
    ) -> EmulationState {
        if debug_ctx.should_quit {
            emulator.cpu.peripherals.keypad.cancel_wait();
            emulator.cpu.halted = true;
            return EmulationState::Quit;
        }

        if debug_ctx.is_continuing && !debug_ctx.breakpoint_hit {
            let pointer = emulator.cpu.peripherals.memory.get_pointer();
            if debug_ctx.breakpoints.check_breakpoint(pointer) {
                debug_ctx.breakpoint_hit = true;
                debug_ctx.has_moved = true;
                debug_ctx.pause();
            }
        }

        if debug_ctx.is_stepping || debug_ctx.is_continuing {
            let result = emulator.step(emulator_ctx, elapsed);

            debug_ctx.has_moved = true;
            debug_ctx.set_address(emulator.cpu.peripherals.memory.get_pointer());

            if debug_ctx.is_stepping {
                debug_ctx.is_stepping = false;
            }

            if debug_ctx.breakpoint_hit {
                debug_ctx.breakpoint_hit = false;
            }

            return result;
        }

        EmulationState::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripherals::cartridge::Cartridge;

    fn emulator_with(bytes: &[u8]) -> Emulator {
        let mut emulator = Emulator::new();
        let cartridge = Cartridge::load_from_string("Test", "", bytes).unwrap();
        emulator.load_game(&cartridge);
        emulator
    }

    #[test]
    fn test_paused_by_default() {
        let mut emulator = emulator_with(&[0x60, 0x05]);
        let mut ctx = EmulatorContext::new();
        let mut debug_ctx = DebuggerContext::new();
        let debugger = Debugger::new();

        debugger.step(&mut emulator, &mut ctx, &mut debug_ctx, Duration::from_millis(2));
        assert_eq!(emulator.cpu.registers.get_register(0), 0);
    }

    #[test]
    fn test_single_step_advances_once() {
        let mut emulator = emulator_with(&[0x60, 0x05, 0x61, 0x07]);
        let mut ctx = EmulatorContext::new();
        let mut debug_ctx = DebuggerContext::new();
        let debugger = Debugger::new();

        debug_ctx.is_stepping = true;
        debugger.step(&mut emulator, &mut ctx, &mut debug_ctx, Duration::from_millis(2));
        assert_eq!(emulator.cpu.registers.get_register(0), 0x05);
        assert!(!debug_ctx.is_stepping);
    }

    #[test]
    fn test_continue_stops_at_breakpoint() {
        let mut emulator = emulator_with(&[0x60, 0x05, 0x61, 0x07]);
        let mut ctx = EmulatorContext::new();
        let mut debug_ctx = DebuggerContext::new();
        debug_ctx.register_breakpoint(0x202);
        debug_ctx.is_continuing = true;

        let debugger = Debugger::new();
        // First call executes up to the breakpoint address; the second
        // call's pre-step check is what actually catches it.
        debugger.step(&mut emulator, &mut ctx, &mut debug_ctx, Duration::from_millis(2));
        debugger.step(&mut emulator, &mut ctx, &mut debug_ctx, Duration::from_millis(2));
        assert!(debug_ctx.breakpoint_hit);
        assert!(!debug_ctx.is_continuing);
    }

    #[test]
    fn test_quit_cancels_wait_and_halts() {
        // Fx0A on V0.
        let mut emulator = emulator_with(&[0xF0, 0x0A]);
        let mut ctx = EmulatorContext::new();
        let mut debug_ctx = DebuggerContext::new();
        debug_ctx.is_continuing = true;
        let debugger = Debugger::new();

        let pointer_before = emulator.cpu.peripherals.memory.get_pointer();
        debugger.step(&mut emulator, &mut ctx, &mut debug_ctx, Duration::from_millis(2));
        assert!(emulator.cpu.peripherals.keypad.is_waiting());

        debug_ctx.quit();
        let state = debugger.step(&mut emulator, &mut ctx, &mut debug_ctx, Duration::from_millis(2));

        assert!(matches!(state, EmulationState::Quit));
        assert!(!emulator.cpu.peripherals.keypad.is_waiting());
        assert!(emulator.cpu.halted);
        assert_eq!(emulator.cpu.peripherals.memory.get_pointer(), pointer_before);
    }
}
