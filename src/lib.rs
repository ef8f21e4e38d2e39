//! A CHIP-8 virtual machine.
//!
//! ## Design
//!
//! * the machine is plain data plus a synchronous, non-blocking `step()`; one
//!   call is one instruction, so it can be driven from tests without a clock
//! * sizes (memory, stack, registers, resolution) come from `Config`
//! * memory and display share one set of relaxed-bounds accessors: reads past
//!   the end return 0xff/0xffff, writes past the end vanish
//! * instructions decode into a closed enum; anything else is logged and
//!   skipped
//! * `LD Vx, K` never blocks; it parks the machine in `RunState::WaitingForKey`
//!   and rewinds PC until a key goes down
//! * timers tick at `timer_hz` of emulated time, however fast the clock runs
//! * display abstracted behind a trait so alternatives can be plugged in;
//!   starting with TUI in-console
//!
//! Model
//!
//! main
//!  |-- config, machine(config), load program
//!  |-- scheduler thread: owns the machine
//!  |    `-- every 1/clock_hz: copy keys in, step (unless paused), publish snapshot
//!  `-- frontend loop, every 1/60s
//!       |-- poll input -> controller (keys, pause, stop)
//!       `-- draw latest snapshot
pub mod config;
pub mod display;
pub mod error;
pub mod frontend;
pub mod input;
pub mod instruction;
mod interpreter;
pub mod machine;
pub mod memory;
pub mod scheduler;
mod sprite;
pub mod stack;

pub use config::Config;
pub use error::{Chip8Error, Result};
pub use machine::{Machine, RunState, Snapshot};
pub use scheduler::{Controller, Scheduler, StopToken};
