//! CPU memory.

use std::fmt;

use crate::core::{
    opcodes::extract_opcode_from_array,
    types::{C8Addr, C8Byte},
};
use crate::errors::EmulatorError;

/// Memory size.
pub const MEMORY_SIZE: usize = 4096;
/// Chunk size.
pub const CHUNK_SIZE: usize = 64;

/// Initial memory pointer.
pub const INITIAL_MEMORY_POINTER: C8Addr = 0x200;

/// CPU memory: a flat 4096-byte address space. Every read/write is
/// bounds-checked against `MEMORY_SIZE`; out-of-range accesses fail rather
/// than panic, since they're reachable from guest code (a program can set
/// I near the top of memory and then trigger a multi-byte transfer).
#[derive(Clone)]
pub struct Memory {
    data: Vec<C8Byte>,
    pointer: C8Addr,
    code_end_pointer: C8Addr,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    /// Create new memory.
    pub fn new() -> Self {
        Memory {
            data: vec![0; MEMORY_SIZE],
            pointer: INITIAL_MEMORY_POINTER,
            code_end_pointer: INITIAL_MEMORY_POINTER,
        }
    }

    /// Write data at offset.
    ///
    /// # Errors
    ///
    /// * `EmulatorError::MemoryOutOfRange` if `offset + data.len()` exceeds
    ///   `MEMORY_SIZE`.
    ///
    pub fn write_data_at_offset(&mut self, offset: C8Addr, data: &[C8Byte]) -> Result<(), EmulatorError> {
        let start = offset as usize;
        let end = start + data.len();

        if end > MEMORY_SIZE {
            return Err(EmulatorError::MemoryOutOfRange(offset));
        }

        self.data[start..end].copy_from_slice(data);

        let end_ptr = end as C8Addr;
        if end_ptr > self.code_end_pointer {
            self.code_end_pointer = end_ptr;
        }

        Ok(())
    }

    /// Write byte at offset.
    ///
    /// # Errors
    ///
    /// * `EmulatorError::MemoryOutOfRange` if `offset` is out of range.
    ///
    pub fn write_byte_at_offset(&mut self, offset: C8Addr, byte: C8Byte) -> Result<(), EmulatorError> {
        let addr = offset as usize;

        if addr >= MEMORY_SIZE {
            return Err(EmulatorError::MemoryOutOfRange(offset));
        }

        self.data[addr] = byte;
        Ok(())
    }

    /// Write data at the current pointer.
    ///
    /// # Errors
    ///
    /// * `EmulatorError::MemoryOutOfRange` if the data would run past the
    ///   end of memory.
    ///
    pub fn write_data_at_pointer(&mut self, data: &[C8Byte]) -> Result<(), EmulatorError> {
        let pointer = self.pointer;
        self.write_data_at_offset(pointer, data)
    }

    /// Get data at offset.
    ///
    /// # Errors
    ///
    /// * `EmulatorError::MemoryOutOfRange` if `offset + count` exceeds
    ///   `MEMORY_SIZE`.
    ///
    pub fn read_data_at_offset(&self, offset: C8Addr, count: C8Addr) -> Result<&[C8Byte], EmulatorError> {
        let start = offset as usize;
        let end = start + count as usize;

        if end > MEMORY_SIZE {
            return Err(EmulatorError::MemoryOutOfRange(offset));
        }

        Ok(&self.data[start..end])
    }

    /// Get byte at offset.
    ///
    /// # Errors
    ///
    /// * `EmulatorError::MemoryOutOfRange` if `offset` is out of range.
    ///
    pub fn read_byte_at_offset(&self, offset: C8Addr) -> Result<C8Byte, EmulatorError> {
        self.data
            .get(offset as usize)
            .copied()
            .ok_or(EmulatorError::MemoryOutOfRange(offset))
    }

    /// Set pointer.
    pub fn set_pointer(&mut self, pointer: C8Addr) {
        self.pointer = pointer;
    }

    /// Get pointer.
    pub fn get_pointer(&self) -> C8Addr {
        self.pointer
    }

    /// Advance pointer by 2.
    pub fn advance_pointer(&mut self) {
        self.pointer += 2;
    }

    /// Reset pointer at initial value.
    pub fn reset_pointer(&mut self) {
        self.pointer = INITIAL_MEMORY_POINTER;
        self.code_end_pointer = INITIAL_MEMORY_POINTER;
    }

    /// Read the opcode at the current pointer.
    ///
    /// # Errors
    ///
    /// * `EmulatorError::MemoryOutOfRange` if the pointer is past the end
    ///   of memory (fetch ran off the program).
    ///
    pub fn read_opcode(&self) -> Result<C8Addr, EmulatorError> {
        self.read_opcode_at_address(self.pointer)
    }

    /// Get end pointer (one past the highest byte written by a cartridge load).
    pub fn get_end_pointer(&self) -> C8Addr {
        self.code_end_pointer
    }

    /// Read opcode at address.
    ///
    /// # Errors
    ///
    /// * `EmulatorError::MemoryOutOfRange` if `addr + 1` is out of range.
    ///
    pub fn read_opcode_at_address(&self, addr: C8Addr) -> Result<C8Addr, EmulatorError> {
        if (addr as usize) + 1 >= MEMORY_SIZE {
            return Err(EmulatorError::MemoryOutOfRange(addr));
        }

        Ok(extract_opcode_from_array(&self.data, addr as usize))
    }

    /// Read multiple opcodes at address, for disassembly.
    pub fn read_opcodes_at_address(&self, addr: C8Addr, count: C8Addr) -> Vec<C8Addr> {
        let mut output = vec![];
        for c in 0..count {
            let current = addr + (c * 2);
            output.push(self.read_opcode_at_address(current).unwrap_or(0));
        }

        output
    }

    /// Get data.
    pub fn get_data(&self) -> &[C8Byte] {
        &self.data
    }

    /// Reset memory.
    pub fn reset(&mut self) {
        self.data = vec![0; MEMORY_SIZE];
        self.pointer = INITIAL_MEMORY_POINTER;
        self.code_end_pointer = INITIAL_MEMORY_POINTER;
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_row(f)?;
        print_separator(f)?;

        for (idx, chunk) in self.data.chunks(CHUNK_SIZE).enumerate() {
            write!(
                f,
                "    {:04X}-{:04X} | ",
                idx * CHUNK_SIZE,
                (idx + 1) * CHUNK_SIZE
            )?;

            for chunk_value in chunk.iter() {
                write!(f, "{:02X} ", chunk_value)?;
            }

            writeln!(f)?;
        }

        print_separator(f)?;
        print_row(f)?;

        writeln!(f, "    PC: {:04X}", self.pointer)
    }
}

fn print_separator(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "                ")?;
    for _ in 0..CHUNK_SIZE {
        write!(f, "---")?;
    }

    writeln!(f)
}

fn print_row(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "                ")?;
    for v in 0..CHUNK_SIZE {
        write!(f, "{:02X} ", v * 2)?;
    }

    writeln!(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_byte() {
        let mut mem = Memory::new();
        mem.write_byte_at_offset(0x300, 0x42).unwrap();
        assert_eq!(mem.read_byte_at_offset(0x300).unwrap(), 0x42);
    }

    #[test]
    fn test_write_byte_out_of_range() {
        let mut mem = Memory::new();
        assert_eq!(
            mem.write_byte_at_offset(0x1000, 0x42),
            Err(EmulatorError::MemoryOutOfRange(0x1000))
        );
    }

    #[test]
    fn test_read_data_out_of_range() {
        let mem = Memory::new();
        assert_eq!(
            mem.read_data_at_offset(0xFFE, 4),
            Err(EmulatorError::MemoryOutOfRange(0xFFE))
        );
    }

    #[test]
    fn test_write_data_updates_end_pointer() {
        let mut mem = Memory::new();
        mem.reset_pointer();
        mem.write_data_at_pointer(&[1, 2, 3]).unwrap();
        assert_eq!(mem.get_end_pointer(), INITIAL_MEMORY_POINTER + 3);
    }

    #[test]
    fn test_read_opcode() {
        let mut mem = Memory::new();
        mem.write_data_at_offset(0x200, &[0x12, 0x34]).unwrap();
        mem.set_pointer(0x200);
        assert_eq!(mem.read_opcode().unwrap(), 0x1234);
    }

    #[test]
    fn test_read_opcode_out_of_range() {
        let mem = Memory::new();
        assert_eq!(
            mem.read_opcode_at_address(0xFFF),
            Err(EmulatorError::MemoryOutOfRange(0xFFF))
        );
    }
}
