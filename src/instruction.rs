//! CHIP-8 instruction set, decoded from raw 16-bit words.
//!
//! Field names follow Cowgod's reference: `x`/`y` are register nibbles, `kk`
//! is the low byte, `nnn` the low 12 bits and `n` the low nibble.
use crate::error::UnknownInstruction;
use std::fmt;

/// register index taken from a nibble
pub type Reg = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1nnn
    Jp(u16),
    /// 2nnn
    Call(u16),
    /// 3xkk
    SeByte(Reg, u8),
    /// 4xkk
    SneByte(Reg, u8),
    /// 5xy0
    SeReg(Reg, Reg),
    /// 6xkk
    LdByte(Reg, u8),
    /// 7xkk
    AddByte(Reg, u8),
    /// 8xy0
    LdReg(Reg, Reg),
    /// 8xy1
    Or(Reg, Reg),
    /// 8xy2
    And(Reg, Reg),
    /// 8xy3
    Xor(Reg, Reg),
    /// 8xy4
    AddReg(Reg, Reg),
    /// 8xy5
    Sub(Reg, Reg),
    /// 8xy6
    Shr(Reg),
    /// 8xy7
    Subn(Reg, Reg),
    /// 8xyE
    Shl(Reg),
    /// 9xy0
    SneReg(Reg, Reg),
    /// Annn
    LdI(u16),
    /// Bnnn
    JpV0(u16),
    /// Cxkk
    Rnd(Reg, u8),
    /// Dxyn
    Drw(Reg, Reg, u8),
    /// Ex9E
    Skp(Reg),
    /// ExA1
    Sknp(Reg),
    /// Fx07
    LdVxDt(Reg),
    /// Fx0A
    LdVxK(Reg),
    /// Fx15
    LdDtVx(Reg),
    /// Fx18
    LdStVx(Reg),
    /// Fx1E
    AddI(Reg),
    /// Fx29
    LdF(Reg),
    /// Fx33
    LdB(Reg),
    /// Fx55
    LdIVx(Reg),
    /// Fx65
    LdVxI(Reg),
}

impl Instruction {
    /// Split a word into its nibbles and route on the top one. Families 0, 8,
    /// E and F have sub-opcodes; 5 and 9 ignore the bottom nibble.
    pub fn decode(word: u16) -> Result<Self, UnknownInstruction> {
        use Instruction::*;

        let family = (word >> 12) as u8;
        let x = ((word >> 8) & 0xf) as Reg;
        let y = ((word >> 4) & 0xf) as Reg;
        let n = (word & 0xf) as u8;
        let kk = (word & 0xff) as u8;
        let nnn = word & 0x0fff;

        let instruction = match family {
            0x0 => match nnn {
                0x0e0 => Cls,
                0x0ee => Ret,
                _ => return Err(UnknownInstruction(word)),
            },
            0x1 => Jp(nnn),
            0x2 => Call(nnn),
            0x3 => SeByte(x, kk),
            0x4 => SneByte(x, kk),
            0x5 => SeReg(x, y),
            0x6 => LdByte(x, kk),
            0x7 => AddByte(x, kk),
            0x8 => match n {
                0x0 => LdReg(x, y),
                0x1 => Or(x, y),
                0x2 => And(x, y),
                0x3 => Xor(x, y),
                0x4 => AddReg(x, y),
                0x5 => Sub(x, y),
                0x6 => Shr(x),
                0x7 => Subn(x, y),
                0xe => Shl(x),
                _ => return Err(UnknownInstruction(word)),
            },
            0x9 => SneReg(x, y),
            0xa => LdI(nnn),
            0xb => JpV0(nnn),
            0xc => Rnd(x, kk),
            0xd => Drw(x, y, n),
            0xe => match kk {
                0x9e => Skp(x),
                0xa1 => Sknp(x),
                _ => return Err(UnknownInstruction(word)),
            },
            0xf => match kk {
                0x07 => LdVxDt(x),
                0x0a => LdVxK(x),
                0x15 => LdDtVx(x),
                0x18 => LdStVx(x),
                0x1e => AddI(x),
                0x29 => LdF(x),
                0x33 => LdB(x),
                0x55 => LdIVx(x),
                0x65 => LdVxI(x),
                _ => return Err(UnknownInstruction(word)),
            },
            _ => return Err(UnknownInstruction(word)),
        };
        Ok(instruction)
    }
}

/// assembler-style mnemonics, for tracing and the debugger pane
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp(a) => write!(f, "JP 0x{:03X}", a),
            Call(a) => write!(f, "CALL 0x{:03X}", a),
            SeByte(x, kk) => write!(f, "SE V{:X}, 0x{:02X}", x, kk),
            SneByte(x, kk) => write!(f, "SNE V{:X}, 0x{:02X}", x, kk),
            SeReg(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LdByte(x, kk) => write!(f, "LD V{:X}, 0x{:02X}", x, kk),
            AddByte(x, kk) => write!(f, "ADD V{:X}, 0x{:02X}", x, kk),
            LdReg(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr(x) => write!(f, "SHR V{:X}", x),
            Subn(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl(x) => write!(f, "SHL V{:X}", x),
            SneReg(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI(a) => write!(f, "LD I, 0x{:03X}", a),
            JpV0(a) => write!(f, "JP V0, 0x{:03X}", a),
            Rnd(x, kk) => write!(f, "RND V{:X}, 0x{:02X}", x, kk),
            Drw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Skp(x) => write!(f, "SKP V{:X}", x),
            Sknp(x) => write!(f, "SKNP V{:X}", x),
            LdVxDt(x) => write!(f, "LD V{:X}, DT", x),
            LdVxK(x) => write!(f, "LD V{:X}, K", x),
            LdDtVx(x) => write!(f, "LD DT, V{:X}", x),
            LdStVx(x) => write!(f, "LD ST, V{:X}", x),
            AddI(x) => write!(f, "ADD I, V{:X}", x),
            LdF(x) => write!(f, "LD F, V{:X}", x),
            LdB(x) => write!(f, "LD B, V{:X}", x),
            LdIVx(x) => write!(f, "LD [I], V{:X}", x),
            LdVxI(x) => write!(f, "LD V{:X}, [I]", x),
        }
    }
}
