//! CPU.

use std::fmt;

use rand::Rng;

use super::{
    font::{sprite_addr, FONT_DATA, FONT_DATA_ADDR},
    opcodes::OpCode,
    registers::Registers,
    stack::Stack,
    timer::Timer,
    types::{C8Addr, C8Byte},
};
use crate::{
    debugger::inspection::{ChangeBitmap, Snapshot},
    errors::EmulatorError,
    peripherals::{
        cartridge::Cartridge,
        framebuffer::{FRAMEBUFFER_HEIGHT, FRAMEBUFFER_WIDTH},
        sound::AudioInterface,
        Peripherals,
    },
};

/// CHIP-8 CPU.
pub struct CPU {
    /// Peripherals.
    pub peripherals: Peripherals,
    /// Host audio collaborator, sounded while ST > 0.
    pub audio: Option<Box<dyn AudioInterface>>,

    /// Registers.
    pub registers: Registers,
    /// Stack.
    pub stack: Stack,

    /// Delay timer.
    pub delay_timer: Timer,
    /// Sound timer.
    pub sound_timer: Timer,

    /// Number of instructions executed so far.
    pub instruction_count: usize,

    /// Set once a step fails; the offending instruction's address is left
    /// in PC. Cleared by `reset`.
    pub halted: bool,

    /// Per-field change bitmap for the debugger inspection surface.
    changes: ChangeBitmap,
}

impl CPU {
    /// Create CHIP-8 CPU with default parameters.
    pub fn new() -> Self {
        CPU {
            peripherals: Peripherals::new(),
            audio: None,

            registers: Registers::new(),
            stack: Stack::new(),

            delay_timer: Timer::new("Delay".to_string()),
            sound_timer: Timer::new("Sound".to_string()),

            instruction_count: 0,
            halted: false,

            changes: ChangeBitmap::new(),
        }
    }

    /// Load the built-in font table into the reserved low memory region.
    pub fn load_font_in_memory(&mut self) {
        self.peripherals
            .memory
            .write_data_at_offset(FONT_DATA_ADDR, &FONT_DATA)
            .expect("font table always fits below 0x200");
    }

    /// Load cartridge data into memory at the program start address.
    pub fn load_cartridge_data(&mut self, cartridge: &Cartridge) {
        self.peripherals.memory.reset_pointer();
        self.peripherals
            .memory
            .write_data_at_pointer(cartridge.get_data())
            .expect("cartridge loader already rejects oversized images");
    }

    /// Decrement both timers by one tick (called at 60 Hz by the rate governor).
    ///
    /// Sounds or silences the host audio collaborator on ST's edges.
    ///
    pub fn decrement_timers(&mut self) {
        self.delay_timer.decrement();
        self.sound_timer.decrement();
        self.changes.mark_dt();
        self.changes.mark_st();

        if let Some(audio) = self.audio.as_deref_mut() {
            if self.sound_timer.finished() {
                self.peripherals.sound.silence(audio);
            } else if self.sound_timer.get_value() > 0 {
                self.peripherals.sound.play_beep(audio);
            }
        }
    }

    /// Reset CPU.
    pub fn reset(&mut self) {
        self.peripherals.reset();

        self.registers.reset();
        self.stack.reset();
        self.delay_timer.reset(0);
        self.sound_timer.reset(0);
        self.instruction_count = 0;
        self.halted = false;
        self.changes = ChangeBitmap::new();
    }

    /// A read-only, internally consistent snapshot of the inspectable state.
    pub fn snapshot(&self) -> Snapshot {
        let mut registers = [0u8; super::registers::REGISTER_COUNT];
        registers.copy_from_slice(self.registers.get_registers());

        Snapshot {
            registers,
            i: self.registers.get_i_register(),
            pc: self.peripherals.memory.get_pointer(),
            dt: self.delay_timer.get_value(),
            st: self.sound_timer.get_value(),
            stack: self.stack.ordered_view().to_vec(),
            cycle_count: self.instruction_count,
            halted: self.halted,
        }
    }

    /// Read-only access to what's changed since the last `ack_changes`.
    pub fn changes(&self) -> &ChangeBitmap {
        &self.changes
    }

    /// Clear the change bitmap once a debugger has displayed the current state.
    pub fn ack_changes(&mut self) {
        self.changes.ack();
    }

    /// Read a range of memory without mutating anything, for the inspection surface.
    pub fn read_memory_range(&self, addr: C8Addr, count: C8Addr) -> Result<&[C8Byte], EmulatorError> {
        self.peripherals.memory.read_data_at_offset(addr, count)
    }

    /// Execute a single decoded instruction.
    ///
    /// Does not fetch or decode; the caller is expected to have read the
    /// opcode at the current PC and decoded it already (the emulator's
    /// step loop does this so it can trace the raw word and mnemonic
    /// before executing).
    ///
    /// # Errors
    ///
    /// Returns the first of `EmulatorError::{StackOverflow,StackUnderflow,
    /// BadOpcode,MemoryOutOfRange}` encountered. PC is left pointing at
    /// the offending instruction.
    ///
    pub fn execute_instruction(&mut self, opcode: &OpCode) -> Result<(), EmulatorError> {
        let mut advance_pointer = true;

        match *opcode {
            OpCode::SYS(_addr) => {
                // Legacy host call. No-op.
            }
            OpCode::CLS => {
                self.peripherals.framebuffer.clear();
                self.changes.mark_framebuffer();
            }
            OpCode::RET => {
                let addr = self.stack.pop()?;
                self.peripherals.memory.set_pointer(addr);
                self.changes.mark_pc();
                self.changes.mark_stack();
            }
            OpCode::JP(addr) => {
                self.peripherals.memory.set_pointer(addr);
                self.changes.mark_pc();
                advance_pointer = false;
            }
            OpCode::CALL(addr) => {
                self.stack.push(self.peripherals.memory.get_pointer())?;
                self.peripherals.memory.set_pointer(addr);
                self.changes.mark_pc();
                self.changes.mark_stack();
                advance_pointer = false;
            }
            OpCode::SEByte(reg, byte) => {
                if self.registers.get_register(reg) == byte {
                    self.peripherals.memory.advance_pointer();
                }
            }
            OpCode::SNEByte(reg, byte) => {
                if self.registers.get_register(reg) != byte {
                    self.peripherals.memory.advance_pointer();
                }
            }
            OpCode::SE(reg1, reg2) => {
                if self.registers.get_register(reg1) == self.registers.get_register(reg2) {
                    self.peripherals.memory.advance_pointer();
                }
            }
            OpCode::LDByte(reg, byte) => {
                self.registers.set_register(reg, byte);
                self.changes.mark_v(reg);
            }
            OpCode::ADDByte(reg, byte) => {
                let r = self.registers.get_register(reg);
                self.registers.set_register(reg, r.wrapping_add(byte));
                self.changes.mark_v(reg);
            }
            OpCode::LD(reg1, reg2) => {
                let r = self.registers.get_register(reg2);
                self.registers.set_register(reg1, r);
                self.changes.mark_v(reg1);
            }
            OpCode::OR(reg1, reg2) => {
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);
                self.registers.set_register(reg1, r1 | r2);
                self.changes.mark_v(reg1);
            }
            OpCode::AND(reg1, reg2) => {
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);
                self.registers.set_register(reg1, r1 & r2);
                self.changes.mark_v(reg1);
            }
            OpCode::XOR(reg1, reg2) => {
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);
                self.registers.set_register(reg1, r1 ^ r2);
                self.changes.mark_v(reg1);
            }
            OpCode::ADD(reg1, reg2) => {
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);
                let (res, overflow) = r1.overflowing_add(r2);

                self.registers.set_register(reg1, res);
                self.registers.set_carry_register(overflow as C8Byte);
                self.changes.mark_v(reg1);
                self.changes.mark_v(super::registers::FLAG_REGISTER);
            }
            OpCode::SUB(reg1, reg2) => {
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);

                self.registers.set_register(reg1, r1.wrapping_sub(r2));
                self.registers.set_carry_register((r1 > r2) as C8Byte);
                self.changes.mark_v(reg1);
                self.changes.mark_v(super::registers::FLAG_REGISTER);
            }
            OpCode::SHR(reg, _) => {
                let r = self.registers.get_register(reg);

                self.registers.set_register(reg, r >> 1);
                self.registers.set_carry_register(r & 1);
                self.changes.mark_v(reg);
                self.changes.mark_v(super::registers::FLAG_REGISTER);
            }
            OpCode::SUBN(reg1, reg2) => {
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);

                self.registers.set_register(reg1, r2.wrapping_sub(r1));
                self.registers.set_carry_register((r2 > r1) as C8Byte);
                self.changes.mark_v(reg1);
                self.changes.mark_v(super::registers::FLAG_REGISTER);
            }
            OpCode::SHL(reg, _) => {
                let r = self.registers.get_register(reg);
                let msb = 1 << 7;

                self.registers.set_register(reg, r << 1);
                self.registers.set_carry_register(((r & msb) == msb) as C8Byte);
                self.changes.mark_v(reg);
                self.changes.mark_v(super::registers::FLAG_REGISTER);
            }
            OpCode::SNE(reg1, reg2) => {
                if self.registers.get_register(reg1) != self.registers.get_register(reg2) {
                    self.peripherals.memory.advance_pointer();
                }
            }
            OpCode::LDI(addr) => {
                self.registers.set_i_register(addr);
                self.changes.mark_i();
            }
            OpCode::JP0(addr) => {
                let v0 = C8Addr::from(self.registers.get_register(0));
                self.peripherals.memory.set_pointer((addr + v0) & 0x0FFF);
                self.changes.mark_pc();
                advance_pointer = false;
            }
            OpCode::RND(reg, byte) => {
                let rand_value: C8Byte = rand::thread_rng().gen();
                self.registers.set_register(reg, rand_value & byte);
                self.changes.mark_v(reg);
            }
            OpCode::DRW(reg1, reg2, n) => {
                let vx = self.registers.get_register(reg1) as usize;
                let vy = self.registers.get_register(reg2) as usize;
                let height = if n == 0 { 16 } else { n };
                let base = self.registers.get_i_register() & 0x0FFF;

                let sprite = self
                    .peripherals
                    .memory
                    .read_data_at_offset(base, C8Addr::from(height))?
                    .to_vec();

                let mut collision = false;
                for (row, byte) in sprite.iter().enumerate() {
                    let py = (vy + row) % FRAMEBUFFER_HEIGHT;

                    for col in 0..8 {
                        let bit = (byte >> (7 - col)) & 1 != 0;
                        let px = (vx + col) % FRAMEBUFFER_WIDTH;

                        if self.peripherals.framebuffer.xor_pixel(px, py, bit) {
                            collision = true;
                        }
                    }
                }

                self.registers.set_carry_register(collision as C8Byte);
                self.changes.mark_v(super::registers::FLAG_REGISTER);
                self.changes.mark_framebuffer();
            }
            OpCode::SKP(reg) => {
                let r = self.registers.get_register(reg);
                if self.peripherals.keypad.is_down(r) {
                    self.peripherals.memory.advance_pointer();
                }
            }
            OpCode::SKNP(reg) => {
                let r = self.registers.get_register(reg);
                if !self.peripherals.keypad.is_down(r) {
                    self.peripherals.memory.advance_pointer();
                }
            }
            OpCode::LDGetDelayTimer(reg) => {
                self.registers.set_register(reg, self.delay_timer.get_value());
                self.changes.mark_v(reg);
            }
            OpCode::LDGetKey(reg) => {
                // Suspends the step loop; the emulator observes
                // `peripherals.keypad.is_waiting()` and resumes this
                // instruction (without re-decoding) once a key press
                // satisfies the wait.
                self.peripherals.keypad.begin_wait(reg);
                advance_pointer = false;
            }
            OpCode::LDSetDelayTimer(reg) => {
                let r = self.registers.get_register(reg);
                self.delay_timer.reset(r);
                self.changes.mark_dt();
            }
            OpCode::LDSetSoundTimer(reg) => {
                let r = self.registers.get_register(reg);
                self.sound_timer.reset(r);
                self.changes.mark_st();
            }
            OpCode::ADDI(reg) => {
                let i = self.registers.get_i_register();
                let r = self.registers.get_register(reg);
                self.registers.set_i_register(i.wrapping_add(C8Addr::from(r)));
                self.changes.mark_i();
            }
            OpCode::LDSprite(reg) => {
                let digit = self.registers.get_register(reg);
                self.registers.set_i_register(sprite_addr(digit));
                self.changes.mark_i();
            }
            OpCode::LDBCD(reg) => {
                let r = self.registers.get_register(reg);
                let base = self.registers.get_i_register() & 0x0FFF;

                let n3 = r / 100;
                let n2 = (r % 100) / 10;
                let n1 = r % 10;

                self.peripherals.memory.write_data_at_offset(base, &[n3, n2, n1])?;
            }
            OpCode::LDS(reg) => {
                let base = self.registers.get_i_register() & 0x0FFF;

                for ridx in 0..=reg {
                    let r = self.registers.get_register(ridx);
                    self.peripherals
                        .memory
                        .write_byte_at_offset(base + C8Addr::from(ridx), r)?;
                }
            }
            OpCode::LDR(reg) => {
                let base = self.registers.get_i_register() & 0x0FFF;

                for ridx in 0..=reg {
                    let byte = self
                        .peripherals
                        .memory
                        .read_byte_at_offset(base + C8Addr::from(ridx))?;
                    self.registers.set_register(ridx, byte);
                    self.changes.mark_v(ridx);
                }
            }

            OpCode::DATA(opcode) => {
                return Err(EmulatorError::BadOpcode(opcode));
            }
        };

        if advance_pointer {
            self.peripherals.memory.advance_pointer();
            self.changes.mark_pc();
        }

        Ok(())
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CPU {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CPU {{")?;

        writeln!(f, "  memory: {{")?;
        write!(f, "{:?}", self.peripherals.memory)?;
        writeln!(f, "  }},")?;

        writeln!(f, "  framebuffer: {{")?;
        write!(f, "{:?}", self.peripherals.framebuffer)?;
        writeln!(f, "  }},")?;

        writeln!(f, "  registers: {{")?;
        write!(f, "{:?}", self.registers)?;
        writeln!(f, "  }},")?;

        writeln!(f, "  stack: {{")?;
        write!(f, "{:?}", self.stack)?;
        writeln!(f, "  }},")?;

        writeln!(f, "  keypad: {{")?;
        write!(f, "{:?}", self.peripherals.keypad)?;
        writeln!(f, "  }},")?;

        writeln!(f, "  delay_timer: {:?},", self.delay_timer)?;
        writeln!(f, "  sound_timer: {:?}", self.sound_timer)?;

        writeln!(f, "}}")
    }
}
