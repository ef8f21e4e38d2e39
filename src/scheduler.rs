//! Clocked execution.
//!
//! The scheduler owns the `Machine` outright and runs it on its own thread.
//! Everyone else goes through a `Controller`: key presses and pause/stop go in
//! as atomics, and the machine comes back out as a `Snapshot` republished
//! after every tick. Nothing outside this thread ever touches live state.
use crate::machine::{Machine, Snapshot, KEY_COUNT};
use log::info;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};

/// if we fall this far behind, give up catching up
const MAX_LAG: Duration = Duration::from_millis(100);

/// Cancellation flag, checked by the scheduler once per tick.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct Shared {
    paused: AtomicBool,
    /// bit n set = key n down
    keys: AtomicU16,
    snapshot: RwLock<Snapshot>,
}

/// Handle for the render/input side. Cheap to clone.
#[derive(Clone)]
pub struct Controller {
    shared: Arc<Shared>,
    stop: StopToken,
}

impl Controller {
    pub fn new(machine: &Machine) -> Self {
        Controller {
            shared: Arc::new(Shared {
                paused: AtomicBool::new(false),
                keys: AtomicU16::new(0),
                snapshot: RwLock::new(machine.snapshot(false)),
            }),
            stop: StopToken::new(),
        }
    }

    /// Record a key going up or down; anything outside 0-F is ignored.
    pub fn set_key_state(&self, key: u8, pressed: bool) {
        if key as usize >= KEY_COUNT {
            return;
        }
        let bit = 1u16 << key;
        if pressed {
            self.shared.keys.fetch_or(bit, Ordering::SeqCst);
        } else {
            self.shared.keys.fetch_and(!bit, Ordering::SeqCst);
        }
    }

    pub fn keys(&self) -> [bool; KEY_COUNT] {
        let mask = self.shared.keys.load(Ordering::SeqCst);
        std::array::from_fn(|k| mask & (1 << k) != 0)
    }

    pub fn pause(&self) {
        if !self.shared.paused.swap(true, Ordering::SeqCst) {
            info!("paused");
        }
    }

    pub fn resume(&self) {
        if self.shared.paused.swap(false, Ordering::SeqCst) {
            info!("resumed");
        }
    }

    pub fn toggle_pause(&self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// the most recently published machine state
    pub fn snapshot(&self) -> Snapshot {
        self.shared
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, snapshot: Snapshot) {
        *self
            .shared
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

pub struct Scheduler {
    machine: Machine,
    controller: Controller,
    period: Duration,
}

impl Scheduler {
    pub fn new(machine: Machine, controller: Controller) -> Self {
        let period = Duration::from_nanos(1_000_000_000 / machine.config().clock_hz as u64);
        Scheduler {
            machine,
            controller,
            period,
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// time between ticks
    pub fn period(&self) -> Duration {
        self.period
    }

    /// One clock tick: pick up the latest keys, step unless paused, publish.
    /// Keys are picked up while paused too, so snapshots show them.
    /// Returns false once a stop has been requested.
    pub fn tick(&mut self) -> bool {
        if self.controller.is_stopped() {
            return false;
        }
        let paused = self.controller.is_paused();
        self.machine.set_keys(self.controller.keys());
        if !paused {
            self.machine.step();
        }
        self.controller.publish(self.machine.snapshot(paused));
        true
    }

    /// Tick at the configured clock rate until stopped, then hand the
    /// machine back.
    pub fn run(mut self) -> Machine {
        info!(
            "running at {} Hz, timers at {} Hz",
            self.machine.config().clock_hz,
            self.machine.config().timer_hz
        );
        let mut deadline = Instant::now();
        while self.tick() {
            deadline += self.period;
            let now = Instant::now();
            if deadline > now {
                spin_sleep::sleep(deadline - now);
            } else if now - deadline > MAX_LAG {
                deadline = now;
            }
        }
        info!("stopped after {} cycles", self.machine.cycle());
        self.machine
    }

    /// run on a dedicated thread
    pub fn spawn(self) -> io::Result<thread::JoinHandle<Machine>> {
        thread::Builder::new()
            .name("chip8-cpu".into())
            .spawn(move || self.run())
    }
}
