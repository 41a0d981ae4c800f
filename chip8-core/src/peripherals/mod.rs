//! Peripherals.

pub mod cartridge;
pub mod framebuffer;
pub mod keypad;
pub mod memory;
pub mod sound;

use self::{framebuffer::Framebuffer, keypad::Keypad, memory::Memory, sound::Sound};

/// Peripherals.
pub struct Peripherals {
    /// Keypad.
    pub keypad: Keypad,
    /// Memory.
    pub memory: Memory,
    /// Framebuffer.
    pub framebuffer: Framebuffer,
    /// Sound.
    pub sound: Sound,
}

impl Peripherals {
    /// Create new peripherals.
    pub fn new() -> Self {
        Peripherals {
            keypad: Keypad::new(),
            memory: Memory::new(),
            framebuffer: Framebuffer::new(),
            sound: Sound::new(),
        }
    }

    /// Reset peripherals.
    pub fn reset(&mut self) {
        self.memory.reset();
        self.keypad.reset();
        self.framebuffer.reset();
    }
}

impl Default for Peripherals {
    fn default() -> Self {
        Self::new()
    }
}
