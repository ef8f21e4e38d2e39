use std::io;
use thiserror::Error;

/// Everything that can go wrong setting up or loading the machine. Nothing in
/// the fetch/decode/execute path is fatal, so none of these come from `step`.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("program is {size} bytes but only {available} bytes fit above 0x200")]
    ProgramTooLarge { size: usize, available: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// a 16-bit word that doesn't map onto any CHIP-8 instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unrecognised instruction 0x{0:04x}")]
pub struct UnknownInstruction(pub u16);
