//! Machine state: everything the interpreter reads and writes.
//!
//! Register model (per Cowgod, not the RCA 1802 the VIP actually ran):
//!  * V0-VF  8-bit general purpose; VF doubles as carry/borrow/collision
//!  * I      16-bit index, points at sprites and register dumps
//!  * PC     next instruction to fetch
//!  * MAR    address of the instruction being executed; CALL pushes it and
//!           LD Vx, K rewinds to it
//!  * DT/ST  delay and sound timers
use crate::config::{Config, PROGRAM_ADDR};
use crate::display::{Framebuffer, Resolution};
use crate::error::{Chip8Error, Result};
use crate::memory::{self, Memory, MemoryMap};
use crate::stack::Stack;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;

pub const KEY_COUNT: usize = 16;

/// words of program shown around PC in a snapshot, PC being the middle one
pub const PROGRAM_WINDOW: usize = 20;

/// the flag register
pub const VF: usize = 0xf;

/// Whether the interpreter is executing normally or parked on `LD Vx, K`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// `previous` is the key state seen on the last step, so a keydown is any
    /// key that's pressed now but wasn't then
    WaitingForKey { previous: [bool; KEY_COUNT] },
}

pub struct Machine {
    pub(crate) config: Config,
    pub(crate) memory: Memory,
    pub(crate) display: Framebuffer,
    pub(crate) registers: Box<[u8]>,
    pub(crate) stack: Stack,
    pub(crate) pc: u16,
    pub(crate) mar: u16,
    pub(crate) i: u16,
    pub(crate) delay_timer: u8,
    pub(crate) sound_timer: u8,
    /// accumulates timer_hz per step; timers tick each time it passes clock_hz
    pub(crate) timer_phase: u64,
    pub(crate) keys: [bool; KEY_COUNT],
    pub(crate) run_state: RunState,
    pub(crate) cycle: u64,
    pub(crate) rng: StdRng,
}

impl Machine {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Machine {
            memory: Memory::new(config.memory_size),
            display: Framebuffer::new(Resolution::new(config.width, config.height)),
            registers: vec![0u8; config.register_count].into_boxed_slice(),
            stack: Stack::new(config.stack_depth),
            pc: PROGRAM_ADDR,
            mar: PROGRAM_ADDR,
            i: 0,
            delay_timer: 0,
            sound_timer: 0,
            timer_phase: 0,
            keys: [false; KEY_COUNT],
            run_state: RunState::Running,
            cycle: 0,
            rng,
            config,
        })
    }

    /// back to power-on: zeroed memory with the font, blank screen, empty
    /// stack, cleared registers, PC at 0x200
    pub fn reset(&mut self) {
        self.memory.reset();
        self.display.clear();
        self.registers.fill(0);
        self.stack.clear();
        self.pc = PROGRAM_ADDR;
        self.mar = PROGRAM_ADDR;
        self.i = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.timer_phase = 0;
        self.run_state = RunState::Running;
        self.cycle = 0;
    }

    /// reset, then copy `program` in at 0x200. Programs that don't fit are
    /// rejected and leave the machine untouched.
    pub fn load_program_bytes(&mut self, program: &[u8]) -> Result<()> {
        let available = self.memory.program_capacity();
        if program.len() > available {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                available,
            });
        }
        self.reset();
        self.memory.load_program(program)?;
        debug!("loaded {} byte program at 0x{:03x}", program.len(), PROGRAM_ADDR);
        Ok(())
    }

    /// load a chip8 program
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<()> {
        let program = memory::read_program(reader)?;
        self.load_program_bytes(&program)
    }

    /// Record a key going up or down. Keys outside 0-F are ignored.
    pub fn set_key_state(&mut self, key: usize, pressed: bool) {
        if let Some(k) = self.keys.get_mut(key) {
            *k = pressed;
        }
    }

    pub fn set_keys(&mut self, keys: [bool; KEY_COUNT]) {
        self.keys = keys;
    }

    pub fn is_key_pressed(&self, key: usize) -> bool {
        self.keys.get(key).copied().unwrap_or(false)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn display(&self) -> &Framebuffer {
        &self.display
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn register(&self, x: usize) -> u8 {
        self.registers.get(x).copied().unwrap_or(memory::BYTE_SENTINEL)
    }

    pub fn set_register(&mut self, x: usize, value: u8) {
        if let Some(r) = self.registers.get_mut(x) {
            *r = value;
        }
    }

    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn mar(&self) -> u16 {
        self.mar
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn set_i(&mut self, i: u16) {
        self.i = i;
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.delay_timer = value;
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Advance the timer phase by one clock tick, decrementing both timers
    /// once for every full timer period that has elapsed.
    pub(crate) fn tick_timers(&mut self) {
        let clock_hz = u64::from(self.config.clock_hz);
        self.timer_phase += u64::from(self.config.timer_hz);
        let elapsed = self.timer_phase / clock_hz;
        self.timer_phase %= clock_hz;

        let elapsed = u8::try_from(elapsed).unwrap_or(u8::MAX);
        self.delay_timer = self.delay_timer.saturating_sub(elapsed);
        self.sound_timer = self.sound_timer.saturating_sub(elapsed);
    }

    /// `(address, word)` pairs around PC, clamped at the bottom of memory
    fn program_window(&self) -> Vec<(u16, u16)> {
        let start = self.pc.saturating_sub(2 * (PROGRAM_WINDOW / 2) as u16);
        (0..PROGRAM_WINDOW as u16)
            .map(|n| start.wrapping_add(2 * n))
            .map(|addr| (addr, self.memory.read_word(addr as usize)))
            .collect()
    }

    /// immutable copy of everything a renderer might want to show
    pub fn snapshot(&self, paused: bool) -> Snapshot {
        Snapshot {
            resolution: self.display.resolution(),
            display: self.display.bytes().to_vec(),
            registers: self.registers.to_vec(),
            i: self.i,
            pc: self.pc,
            next_word: self.memory.read_word(self.pc as usize),
            program: self.program_window(),
            stack: self.stack.slots().to_vec(),
            stack_pointer: self.stack.pointer(),
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
            keys: self.keys,
            cycle: self.cycle,
            waiting_for_key: matches!(self.run_state, RunState::WaitingForKey { .. }),
            paused,
        }
    }
}

/// A point-in-time copy of the machine for the render context.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub resolution: Resolution,
    /// bit-packed, row-major, MSB first
    pub display: Vec<u8>,
    pub registers: Vec<u8>,
    pub i: u16,
    pub pc: u16,
    /// the word PC points at
    pub next_word: u16,
    /// `(address, word)` listing around PC
    pub program: Vec<(u16, u16)>,
    pub stack: Vec<u16>,
    pub stack_pointer: usize,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub keys: [bool; KEY_COUNT],
    pub cycle: u64,
    pub waiting_for_key: bool,
    pub paused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::CHIP8_FONT;

    fn machine() -> Machine {
        Machine::new(Config::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let c = Config {
            width: 7,
            ..Config::default()
        };
        assert!(matches!(Machine::new(c), Err(Chip8Error::InvalidConfig(_))));
    }

    #[test]
    fn test_reset() {
        let mut m = machine();
        m.pc = 42;
        m.cycle = 42;
        m.memory.write_byte(0, 42);
        m.memory.write_byte(42, 42);
        m.memory.write_byte(4095, 42);
        m.display.write_byte(0, 42);
        m.display.write_byte(255, 42);
        for _ in 0..16 {
            m.stack.push(42);
        }
        m.registers[0] = 42;
        m.registers[15] = 42;
        m.i = 42;
        m.delay_timer = 42;
        m.sound_timer = 42;

        m.reset();

        assert_eq!(m.pc(), 0x200);
        assert_eq!(m.cycle(), 0);
        assert_eq!(m.memory.bytes()[..80], CHIP8_FONT);
        assert!(m.memory.bytes()[80..].iter().all(|&b| b == 0));
        assert!(m.display.bytes().iter().all(|&b| b == 0));
        assert!(m.stack.slots().iter().all(|&s| s == 0));
        assert_eq!(m.stack.pointer(), 0);
        assert!(m.registers().iter().all(|&r| r == 0));
        assert_eq!(m.i(), 0);
        assert_eq!(m.delay_timer(), 0);
        assert_eq!(m.sound_timer(), 0);
        assert_eq!(m.run_state(), RunState::Running);
    }

    #[test]
    fn test_load_program_resets_first() -> Result<()> {
        let mut m = machine();
        m.registers[3] = 9;
        m.display.write_byte(10, 0xff);
        let mut prog: &[u8] = &[0x00, 0xe0, 0x12, 0x00];
        m.load_program(&mut prog)?;
        assert_eq!(m.memory.read_word(0x200), 0x00e0);
        assert_eq!(m.memory.read_word(0x202), 0x1200);
        assert_eq!(m.register(3), 0);
        assert_eq!(m.display.read_byte(10), 0);
        Ok(())
    }

    #[test]
    fn test_load_oversized_program_leaves_state() {
        let mut m = machine();
        m.registers[3] = 9;
        let prog = vec![0u8; 4096];
        assert!(m.load_program_bytes(&prog).is_err());
        assert_eq!(m.register(3), 9);
    }

    #[test]
    fn test_key_state() {
        let mut m = machine();
        m.set_key_state(0xa, true);
        assert!(m.is_key_pressed(0xa));
        m.set_key_state(0xa, false);
        assert!(!m.is_key_pressed(0xa));
        m.set_key_state(16, true);
        assert!(!m.is_key_pressed(16));
    }

    #[test]
    fn test_register_bounds() {
        let mut m = machine();
        m.set_register(16, 1);
        assert_eq!(m.register(16), 0xff);
        m.set_register(15, 1);
        assert_eq!(m.register(VF), 1);
    }

    #[test]
    fn test_timers_tick_at_timer_rate() {
        let mut m = machine();
        m.delay_timer = 100;
        m.sound_timer = 1;
        // 500 clock ticks is one second, so 60 timer ticks
        for _ in 0..500 {
            m.tick_timers();
        }
        assert_eq!(m.delay_timer(), 40);
        assert_eq!(m.sound_timer(), 0);
    }

    #[test]
    fn test_timer_faster_than_clock() {
        let c = Config {
            clock_hz: 30,
            timer_hz: 60,
            ..Config::default()
        };
        let mut m = Machine::new(c).unwrap();
        m.delay_timer = 10;
        m.tick_timers();
        assert_eq!(m.delay_timer(), 8);
    }

    #[test]
    fn test_timers_with_huge_frequencies() {
        let c = Config {
            clock_hz: 4_000_000_000,
            timer_hz: 3_000_000_000,
            ..Config::default()
        };
        let mut m = Machine::new(c).unwrap();
        m.delay_timer = 10;
        for _ in 0..4 {
            m.tick_timers();
        }
        assert_eq!(m.delay_timer(), 7);

        let c = Config {
            clock_hz: 1,
            timer_hz: u32::MAX,
            ..Config::default()
        };
        let mut m = Machine::new(c).unwrap();
        m.delay_timer = 200;
        m.sound_timer = 3;
        m.tick_timers();
        m.tick_timers();
        assert_eq!(m.delay_timer(), 0);
        assert_eq!(m.sound_timer(), 0);
    }

    #[test]
    fn test_snapshot() {
        let mut m = machine();
        m.load_program_bytes(&[0xa1, 0x23]).unwrap();
        m.display.write_byte(0, 0x80);
        m.set_key_state(2, true);
        let s = m.snapshot(true);
        assert_eq!(s.display.len(), 256);
        assert_eq!(s.display[0], 0x80);
        assert_eq!(s.next_word, 0xa123);
        assert_eq!(s.stack.len(), 16);
        assert!(s.keys[2]);
        assert!(s.paused);
        assert!(!s.waiting_for_key);
    }

    #[test]
    fn test_program_window() {
        let mut m = machine();
        m.load_program_bytes(&[0x61, 0x05, 0x12, 0x00]).unwrap();
        let s = m.snapshot(false);
        assert_eq!(s.program.len(), PROGRAM_WINDOW);
        assert_eq!(s.program[0].0, 0x1ec);
        assert_eq!(s.program[10], (0x200, 0x6105));
        assert_eq!(s.program[11], (0x202, 0x1200));

        // near the bottom of memory the window starts at 0
        m.pc = 0x004;
        let s = m.snapshot(false);
        assert_eq!(s.program[0], (0x000, 0xf090));
        assert_eq!(s.program[2].0, 0x004);
    }

    #[test]
    fn test_seeded_machines_agree() {
        let c = Config {
            seed: Some(7),
            ..Config::default()
        };
        let mut a = Machine::new(c.clone()).unwrap();
        let mut b = Machine::new(c).unwrap();
        use rand::Rng;
        assert_eq!(a.rng.random::<u64>(), b.rng.random::<u64>());
    }
}
