use crate::config::PROGRAM_ADDR;
use crate::error::{Chip8Error, Result};
use std::io;

// NB. addresses are usize here so the same accessors serve RAM and the
//     framebuffer; the interpreter converts from its u16 registers

/// returned for any byte read past the end of a buffer
pub const BYTE_SENTINEL: u8 = 0xff;
/// returned for any word read that doesn't fit inside a buffer
pub const WORD_SENTINEL: u16 = 0xffff;

/// Byte-addressable storage with relaxed bounds: reads past the end give a
/// sentinel and writes past the end are dropped, so a malformed program keeps
/// running instead of crashing the interpreter.
pub trait MemoryMap {
    /// r/o view of the underlying bytes
    fn bytes(&self) -> &[u8];

    /// r/w view of the underlying bytes
    fn bytes_mut(&mut self) -> &mut [u8];

    fn size(&self) -> usize {
        self.bytes().len()
    }

    fn read_byte(&self, addr: usize) -> u8 {
        self.bytes().get(addr).copied().unwrap_or(BYTE_SENTINEL)
    }

    /// big-endian; both bytes must be in range
    fn read_word(&self, addr: usize) -> u16 {
        match self.bytes().get(addr..addr.saturating_add(2)) {
            Some(&[hi, lo]) => u16::from_be_bytes([hi, lo]),
            _ => WORD_SENTINEL,
        }
    }

    fn write_byte(&mut self, addr: usize, value: u8) {
        if let Some(b) = self.bytes_mut().get_mut(addr) {
            *b = value;
        }
    }

    /// big-endian; whichever byte lands out of range is dropped
    fn write_word(&mut self, addr: usize, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.write_byte(addr, hi);
        self.write_byte(addr.saturating_add(1), lo);
    }

    /// write a chunk of bytes, dropping anything that runs off the end
    fn write(&mut self, data: &[u8], addr: usize) {
        let bytes = self.bytes_mut();
        if addr >= bytes.len() {
            return;
        }
        let len = data.len().min(bytes.len() - addr);
        bytes[addr..addr + len].copy_from_slice(&data[..len]);
    }

    fn clear(&mut self) {
        self.bytes_mut().fill(0);
    }
}

/// CHIP-8 RAM. Layout:
///   0x0000-0x004f  hex font, 5 bytes per digit
///   0x0050-0x01ff  unused (interpreter area on the VIP)
///   0x0200-        program
pub struct Memory {
    bytes: Box<[u8]>,
}

impl MemoryMap for Memory {
    fn bytes(&self) -> &[u8] {
        &self.bytes
    }
    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Memory {
    /// zeroed RAM with the font baked in
    pub fn new(size: usize) -> Self {
        let mut mm = Memory {
            bytes: vec![0u8; size].into_boxed_slice(),
        };
        mm.reset();
        mm
    }

    /// clear everything and re-write the font
    pub fn reset(&mut self) {
        self.clear();
        self.write(&CHIP8_FONT, CHIP8_FONT_ADDR as usize);
    }

    /// bytes available to a program
    pub fn program_capacity(&self) -> usize {
        self.size().saturating_sub(PROGRAM_ADDR as usize)
    }

    /// copy a program in at 0x200, refusing anything that doesn't fit
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        let available = self.program_capacity();
        if program.len() > available {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                available,
            });
        }
        self.write(program, PROGRAM_ADDR as usize);
        Ok(())
    }
}

/// read a whole program from something like a file
pub fn read_program(reader: &mut impl io::Read) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

pub const CHIP8_FONT_ADDR: u16 = 0x000;
/// bytes per font glyph
pub const CHIP8_FONT_HEIGHT: u16 = 5;
pub const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_zeroed_above_font() {
        let m = Memory::new(4096);
        assert_eq!(m.bytes()[..80], CHIP8_FONT);
        assert!(m.bytes()[80..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_byte() {
        let mut m = Memory::new(4096);
        m.bytes_mut()[42] = 0xba;
        assert_eq!(m.read_byte(42), 0xba);
        assert_eq!(m.read_byte(4096), BYTE_SENTINEL);
        assert_eq!(m.read_byte(65535), BYTE_SENTINEL);
    }

    #[test]
    fn test_read_word() {
        let mut m = Memory::new(4096);
        m.write(&[0xab, 0xcd, 0xef], 42);
        assert_eq!(m.read_word(42), 0xabcd);
        assert_eq!(m.read_word(43), 0xcdef);
        assert_eq!(m.read_word(4095), WORD_SENTINEL);
        assert_eq!(m.read_word(65534), WORD_SENTINEL);
        assert_eq!(m.read_word(usize::MAX), WORD_SENTINEL);
    }

    #[test]
    fn test_write_then_read_back() {
        let mut m = Memory::new(4096);
        m.write_byte(42, 0xba);
        assert_eq!(m.read_byte(42), 0xba);
        m.write_word(0x300, 0xabcd);
        assert_eq!(m.bytes()[0x300..0x302], [0xab, 0xcd]);
        assert_eq!(m.read_word(0x300), 0xabcd);
    }

    #[test]
    fn test_writes_past_end_dropped() {
        let mut m = Memory::new(4096);
        m.write_byte(4096, 0xba);
        m.write_word(4095, 0xabcd);
        assert_eq!(m.read_byte(4095), 0xab);
        assert_eq!(m.size(), 4096);
    }

    #[test]
    fn test_write_slice_truncates() {
        let mut m = Memory::new(0x210);
        m.write(&[1; 32], 0x200);
        assert_eq!(m.bytes()[0x200..], [1; 16]);
    }

    #[test]
    fn test_program_load_ok() -> Result<()> {
        let mut m = Memory::new(4096);
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        let program = read_program(&mut prog)?;
        m.load_program(&program)?;
        assert_eq!(m.read_word(0x200), 0x00e0);
        Ok(())
    }

    #[test]
    fn test_program_too_large_rejected() {
        let mut m = Memory::new(4096);
        let prog = vec![0x12; 0xe01];
        match m.load_program(&prog) {
            Err(Chip8Error::ProgramTooLarge { size, available }) => {
                assert_eq!(size, 0xe01);
                assert_eq!(available, 0xe00);
            }
            other => panic!("expected ProgramTooLarge, got {:?}", other),
        }
        assert_eq!(m.read_byte(0x200), 0);
    }
}
