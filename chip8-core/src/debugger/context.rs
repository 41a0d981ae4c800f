//! Debugger context.

use super::errors::BadBreakpoint;
use crate::{
    core::types::{convert_hex_addr, C8Addr},
    debugger::Breakpoints,
    errors::CResult,
};

/// Debugger context: breakpoints plus the stepping/continuing state machine
/// a host UI drives.
pub struct DebuggerContext {
    /// Running.
    pub running: bool,
    /// Address last observed after a step.
    pub address: C8Addr,
    /// Is stepping.
    pub is_stepping: bool,
    /// Is continuing.
    pub is_continuing: bool,
    /// Has just hit breakpoint.
    pub breakpoint_hit: bool,
    /// Has moved.
    pub has_moved: bool,
    /// Should quit.
    pub should_quit: bool,
    /// Breakpoints.
    pub breakpoints: Breakpoints,
}

impl Default for DebuggerContext {
    fn default() -> Self {
        Self {
            address: 0,
            running: true,
            is_stepping: false,
            is_continuing: false,
            breakpoint_hit: false,
            has_moved: false,
            should_quit: false,
            breakpoints: Breakpoints::new(),
        }
    }
}

impl DebuggerContext {
    /// Create new context.
    pub fn new() -> Self {
        Default::default()
    }

    /// Set debugger address.
    pub fn set_address(&mut self, addr: C8Addr) {
        self.address = addr;
    }

    /// Pause: clear both stepping and continuing.
    pub fn pause(&mut self) {
        self.is_continuing = false;
        self.is_stepping = false;
    }

    /// Is the debugger paused?
    pub fn is_paused(&self) -> bool {
        !self.is_continuing
    }

    /// Request a stop. The next `Debugger::step` cancels any in-flight
    /// Fx0A wait, halts the CPU, and returns `EmulationState::Quit`.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Register breakpoint.
    pub fn register_breakpoint(&mut self, addr: C8Addr) {
        self.breakpoints.register(addr);
    }

    /// Unregister breakpoint.
    pub fn unregister_breakpoint(&mut self, addr: C8Addr) {
        self.breakpoints.unregister(addr);
    }

    /// Register a breakpoint given as a hex string (`"0x200"` or `"200"`).
    ///
    /// # Errors
    ///
    /// `BadBreakpoint` if `addr` does not parse as a hex address.
    ///
    pub fn register_breakpoint_str(&mut self, addr: &str) -> CResult {
        if let Some(addr) = convert_hex_addr(addr) {
            self.breakpoints.register(addr);
            Ok(())
        } else {
            Err(Box::new(BadBreakpoint(String::from(addr))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_clears_flags() {
        let mut ctx = DebuggerContext::new();
        ctx.is_stepping = true;
        ctx.is_continuing = true;
        ctx.pause();
        assert!(!ctx.is_stepping);
        assert!(!ctx.is_continuing);
        assert!(ctx.is_paused());
    }

    #[test]
    fn test_quit_sets_should_quit() {
        let mut ctx = DebuggerContext::new();
        assert!(!ctx.should_quit);
        ctx.quit();
        assert!(ctx.should_quit);
    }

    #[test]
    fn test_register_breakpoint_str() {
        let mut ctx = DebuggerContext::new();
        ctx.register_breakpoint_str("0x200").unwrap();
        assert!(ctx.breakpoints.check_breakpoint(0x200));
        assert!(ctx.register_breakpoint_str("zz").is_err());
    }
}
