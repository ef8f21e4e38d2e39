//! # interpreter
//!
//! One `step` is one instruction:
//!  1. tick the timers
//!  2. fetch the word at PC into MAR, advance PC by 2
//!  3. decode and execute
//!  4. bump the cycle counter
//!
//! Nothing here blocks or fails. Unknown instructions are logged and skipped,
//! out-of-range accesses read sentinels, and `LD Vx, K` waits by rewinding PC
//! so the scheduler keeps ticking while it does.
use crate::config::PROGRAM_ADDR;
use crate::instruction::{Instruction, Reg};
use crate::machine::{Machine, RunState, KEY_COUNT, VF};
use crate::memory::{MemoryMap, CHIP8_FONT_ADDR, CHIP8_FONT_HEIGHT};
use log::{debug, trace, warn};
use rand::Rng;

impl Machine {
    pub fn step(&mut self) {
        self.tick_timers();

        self.mar = self.pc;
        let word = self.memory.read_word(self.pc as usize);
        self.pc = self.pc.wrapping_add(2);

        match Instruction::decode(word) {
            Ok(instruction) => {
                trace!("0x{:03x}: {:04x} {}", self.mar, word, instruction);
                self.execute(instruction);
            }
            Err(e) => warn!("{} at 0x{:03x}, ignoring", e, self.mar),
        }

        self.cycle += 1;
    }

    pub fn execute(&mut self, instruction: Instruction) {
        use Instruction::*;
        match instruction {
            Cls => self.display.clear(),
            Ret => self.pc = self.stack.pop(),
            Jp(addr) => self.pc = addr,
            Call(addr) => {
                if addr < PROGRAM_ADDR {
                    return;
                }
                self.stack.push(self.mar);
                self.pc = addr;
            }
            SeByte(x, kk) => self.skip_if(self.v(x) == kk),
            SneByte(x, kk) => self.skip_if(self.v(x) != kk),
            SeReg(x, y) => self.skip_if(self.v(x) == self.v(y)),
            SneReg(x, y) => self.skip_if(self.v(x) != self.v(y)),
            LdByte(x, kk) => self.set_register(x, kk),
            AddByte(x, kk) => self.add(x, kk),
            LdReg(x, y) => self.set_register(x, self.v(y)),
            Or(x, y) => self.set_register(x, self.v(x) | self.v(y)),
            And(x, y) => self.set_register(x, self.v(x) & self.v(y)),
            Xor(x, y) => self.set_register(x, self.v(x) ^ self.v(y)),
            AddReg(x, y) => self.add(x, self.v(y)),
            Sub(x, y) => self.sub(x, self.v(x), self.v(y)),
            Subn(x, y) => self.sub(x, self.v(y), self.v(x)),
            Shr(x) => {
                // Vy is ignored, as on the CHIP-48
                let vx = self.v(x);
                self.set_register(VF, vx & 0x01);
                self.set_register(x, vx >> 1);
            }
            Shl(x) => {
                let vx = self.v(x);
                self.set_register(VF, (vx & 0x80) >> 7);
                self.set_register(x, vx << 1);
            }
            LdI(addr) => self.i = addr,
            JpV0(addr) => self.pc = addr.wrapping_add(self.v(0) as u16),
            Rnd(x, kk) => {
                let r: u8 = self.rng.random();
                self.set_register(x, r & kk);
            }
            Drw(x, y, n) => self.draw(x, y, n),
            Skp(x) => self.skip_if(self.is_key_pressed(self.v(x) as usize)),
            Sknp(x) => self.skip_if(!self.is_key_pressed(self.v(x) as usize)),
            LdVxDt(x) => self.set_register(x, self.delay_timer),
            LdVxK(x) => self.wait_for_key(x),
            LdDtVx(x) => self.delay_timer = self.v(x),
            LdStVx(x) => {
                if self.v(x) > 0 {
                    self.sound_timer = self.v(x);
                }
            }
            AddI(x) => self.i = self.i.wrapping_add(self.v(x) as u16),
            LdF(x) => {
                let digit = self.v(x) as u16;
                if digit < 16 {
                    self.i = CHIP8_FONT_ADDR + digit * CHIP8_FONT_HEIGHT;
                }
            }
            LdB(x) => {
                let vx = self.v(x);
                let i = self.i as usize;
                self.memory.write_byte(i, vx / 100 % 10);
                self.memory.write_byte(i + 1, vx / 10 % 10);
                self.memory.write_byte(i + 2, vx % 10);
            }
            LdIVx(x) => {
                for r in 0..=x {
                    let value = self.v(r);
                    self.memory.write_byte(self.i as usize + r, value);
                }
            }
            LdVxI(x) => {
                for r in 0..=x {
                    let value = self.memory.read_byte(self.i as usize + r);
                    self.set_register(r, value);
                }
            }
        }
    }

    fn v(&self, x: Reg) -> u8 {
        self.register(x)
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    /// Vx += value, VF = carry
    fn add(&mut self, x: Reg, value: u8) {
        let (sum, carry) = self.v(x).overflowing_add(value);
        self.set_register(x, sum);
        self.set_register(VF, carry as u8);
    }

    /// Vx = a - b, VF = NOT borrow. Equal operands count as a borrow.
    fn sub(&mut self, x: Reg, a: u8, b: u8) {
        let no_borrow = a > b;
        self.set_register(x, a.wrapping_sub(b));
        self.set_register(VF, no_borrow as u8);
    }

    fn draw(&mut self, x: Reg, y: Reg, n: u8) {
        let sprite: Vec<u8> = (0..n as usize)
            .map(|row| self.memory.read_byte(self.i as usize + row))
            .collect();
        let (vx, vy) = (self.v(x) as usize, self.v(y) as usize);
        let collision = self
            .display
            .draw_sprite(vx, vy, &sprite, self.config.draw_wrap);
        self.set_register(VF, collision as u8);
    }

    /// Park on this instruction until some key goes from up to down. The
    /// first visit only records the key state; later visits compare against
    /// what was seen on the previous step.
    fn wait_for_key(&mut self, x: Reg) {
        let previous = match self.run_state {
            RunState::WaitingForKey { previous } => previous,
            RunState::Running => {
                debug!("waiting for key into V{:X}", x);
                self.keys
            }
        };

        let keydown = (0..KEY_COUNT).find(|&k| self.keys[k] && !previous[k]);
        match keydown {
            Some(key) => {
                debug!("key {:X} pressed, stored in V{:X}", key, x);
                self.set_register(x, key as u8);
                self.run_state = RunState::Running;
            }
            None => {
                self.pc = self.mar;
                self.run_state = RunState::WaitingForKey {
                    previous: self.keys,
                };
            }
        }
    }
}
