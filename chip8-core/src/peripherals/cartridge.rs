//! CHIP-8 cartridge.

use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::path::Path;

use crate::core::opcodes::{extract_opcode_from_array, get_opcode_enum, get_opcode_str};
use crate::core::types::{C8Addr, C8Byte};
use crate::errors::CResult;

use super::memory::INITIAL_MEMORY_POINTER;

/// Largest program image accepted: memory size minus the reserved
/// font/low region.
pub const CARTRIDGE_MAX_SIZE: usize = 4096 - 512;

const EMPTY_GAME_NAME: &str = "<EMPTY>";

/// Cartridge exceeds `CARTRIDGE_MAX_SIZE`.
#[derive(Debug)]
pub struct LoadError(pub usize);

impl Error for LoadError {}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cartridge is {} bytes, exceeds the {} byte limit",
            self.0, CARTRIDGE_MAX_SIZE
        )
    }
}

/// A loaded CHIP-8 program image.
pub struct Cartridge {
    title: String,
    path: String,
    data: Vec<C8Byte>,
}

impl Cartridge {
    /// New empty cartridge.
    pub fn new_empty() -> Self {
        Self {
            title: String::from(EMPTY_GAME_NAME),
            path: String::from(""),
            data: vec![],
        }
    }

    /// Derive a human-readable title from a file path: its stem,
    /// uppercased, with underscores replaced by spaces.
    pub fn get_game_name(path: &Path) -> String {
        match path.file_stem() {
            Some(stem) => stem.to_string_lossy().to_uppercase().replace('_', " "),
            None => String::from(EMPTY_GAME_NAME),
        }
    }

    /// Load a cartridge from a filesystem path.
    ///
    /// # Errors
    ///
    /// * Any I/O error reading the file.
    /// * `LoadError` if the file exceeds `CARTRIDGE_MAX_SIZE` bytes.
    ///
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> CResult<Cartridge> {
        let mut file = File::open(path.as_ref())?;

        let mut contents = Vec::with_capacity(CARTRIDGE_MAX_SIZE);
        file.read_to_end(&mut contents)?;

        let game_name = Self::get_game_name(path.as_ref());
        Cartridge::load_from_string(&game_name, path.as_ref(), &contents)
    }

    /// Load a cartridge from a byte slice already in memory.
    ///
    /// # Errors
    ///
    /// * `LoadError` if `bytes` exceeds `CARTRIDGE_MAX_SIZE` bytes.
    ///
    pub fn load_from_string<P: AsRef<Path>>(
        title: &str,
        path: P,
        bytes: &[C8Byte],
    ) -> CResult<Cartridge> {
        if bytes.len() > CARTRIDGE_MAX_SIZE {
            return Err(Box::new(LoadError(bytes.len())));
        }

        let title = title.to_string();
        let data = bytes.to_vec();
        let path = path.as_ref().to_str().unwrap_or_default().to_string();

        tracing::info!(title = %title, size = data.len(), "cartridge loaded");

        Ok(Cartridge { title, data, path })
    }

    /// Get cartridge title.
    pub fn get_title(&self) -> &str {
        &self.title
    }

    /// Get cartridge path.
    pub fn get_path(&self) -> &str {
        &self.path
    }

    /// Get internal data.
    pub fn get_data(&self) -> &[C8Byte] {
        &self.data
    }

    /// Disassemble the cartridge's own bytes, two at a time.
    ///
    /// Returns a tuple of (raw opcode words, assembly mnemonics, verbose
    /// descriptions), one entry per opcode.
    ///
    pub fn disassemble(&self) -> (Vec<C8Addr>, Vec<String>, Vec<String>) {
        let mut code_output = Vec::with_capacity(CARTRIDGE_MAX_SIZE / 2);
        let mut assembly_output = Vec::with_capacity(CARTRIDGE_MAX_SIZE / 2);
        let mut verbose_output = Vec::with_capacity(CARTRIDGE_MAX_SIZE / 2);
        let mut ptr = 0;

        while ptr < self.data.len() {
            let opcode_value = extract_opcode_from_array(&self.data, ptr);
            let opcode_enum = get_opcode_enum(opcode_value);

            let (assembly, verbose) = get_opcode_str(&opcode_enum);
            code_output.push(opcode_value);
            assembly_output.push(assembly);
            verbose_output.push(verbose);

            ptr += 2;
        }

        (code_output, assembly_output, verbose_output)
    }

    /// Write disassembly to a file path, or to stdout if `output_file` is `-`.
    pub fn write_disassembly_to_file(&self, output_file: &str) -> io::Result<()> {
        if output_file == "-" {
            self.write_disassembly_to_stream(&mut io::stdout())
        } else {
            let mut file_handle = File::create(output_file)?;
            self.write_disassembly_to_stream(&mut file_handle)
        }
    }

    /// Write disassembly to a stream.
    pub fn write_disassembly_to_stream<W: Write>(&self, output_stream: &mut W) -> io::Result<()> {
        let (code, assembly, verbose) = self.disassemble();
        let mut ptr_value = INITIAL_MEMORY_POINTER;

        for i in 0..assembly.len() {
            writeln!(
                output_stream,
                "{:04X}| ({:04X})  {:20} ; {}",
                ptr_value, code[i], assembly[i], verbose[i]
            )?;
            ptr_value += 2;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_string() {
        let example: &[C8Byte] = b"\x00\xE0\x63\x00";
        let cartridge = Cartridge::load_from_string("Test", "", example).unwrap();

        let mut disasm_raw = Vec::new();
        cartridge.write_disassembly_to_stream(&mut disasm_raw).unwrap();
        let disasm_str = std::str::from_utf8(&disasm_raw).unwrap();
        let disasm_lines: Vec<_> = disasm_str.split('\n').collect();

        assert_eq!(disasm_lines[0], "0200| (00E0)  CLS                  ; clearing screen");
        assert_eq!(disasm_lines[1], "0202| (6300)  LD V3, 00            ; set V3 = 00");
    }

    #[test]
    fn test_load_rejects_oversized_cartridge() {
        let oversized = vec![0u8; CARTRIDGE_MAX_SIZE + 1];
        let result = Cartridge::load_from_string("Test", "", &oversized);
        assert!(result.is_err());
    }

    #[test]
    fn test_game_name() {
        assert_eq!(Cartridge::get_game_name(Path::new("TOTO.ch8")), String::from("TOTO"));
        assert_eq!(Cartridge::get_game_name(Path::new("TEST/TOTO.ch8")), String::from("TOTO"));
        assert_eq!(
            Cartridge::get_game_name(Path::new("TEST/TOTO_TUTU.c8k")),
            String::from("TOTO TUTU")
        );
        assert_eq!(Cartridge::get_game_name(Path::new("")), String::from(EMPTY_GAME_NAME));
    }
}
