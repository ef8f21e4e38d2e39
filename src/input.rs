use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::{Duration, Instant};

/// map of keyboard keys to the COSMAC hex keypad, using the left-hand side of
/// a qwerty keyboard:
///   1 2 3 4      1 2 3 C
///   q w e r  =>  4 5 6 D
///   a s d f      7 8 9 E
///   z x c v      A 0 B F
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

const PAUSE_KEY: char = 'p';

/// terminals only report presses (and autorepeat), so a key counts as held
/// for this long after the last one
const KEY_HOLD: Duration = Duration::from_millis(200);

/// what the input side can ask of the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key { key: u8, pressed: bool },
    TogglePause,
    Quit,
}

/// reads keypresses
pub trait Input {
    /// everything that's happened since the last poll, without blocking
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error>;
}

/// Turns a stream of presses into press/release pairs by releasing any key
/// that hasn't been seen for a while.
#[derive(Debug)]
pub struct KeyLatch {
    held: [Option<Instant>; 16],
    hold: Duration,
}

impl KeyLatch {
    pub fn new(hold: Duration) -> Self {
        KeyLatch {
            held: [None; 16],
            hold,
        }
    }

    /// note a press; only the first one of a hold produces an event
    pub fn press(&mut self, key: u8, now: Instant) -> Option<InputEvent> {
        let slot = self.held.get_mut(key as usize)?;
        let was_held = slot.replace(now).is_some();
        if was_held {
            None
        } else {
            Some(InputEvent::Key { key, pressed: true })
        }
    }

    /// release every key whose hold has run out
    pub fn release_expired(&mut self, now: Instant) -> Vec<InputEvent> {
        let mut released = Vec::new();
        for (key, slot) in self.held.iter_mut().enumerate() {
            if let Some(at) = *slot {
                if now.duration_since(at) >= self.hold {
                    *slot = None;
                    released.push(InputEvent::Key {
                        key: key as u8,
                        pressed: false,
                    });
                }
            }
        }
        released
    }
}

/// simple implementation of Input, using crossterm events on stdin
pub struct TermInput {
    keymap: HashMap<char, u8>,
    latch: KeyLatch,
}

impl TermInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            latch: KeyLatch::new(KEY_HOLD),
        })
    }

    fn translate(&mut self, evt: KeyEvent, now: Instant) -> Option<InputEvent> {
        match evt.code {
            KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(InputEvent::Quit)
            }
            KeyCode::Esc => Some(InputEvent::Quit),
            KeyCode::Char(c) if c.to_ascii_lowercase() == PAUSE_KEY => Some(InputEvent::TogglePause),
            KeyCode::Char(c) => match self.keymap.get(&c.to_ascii_lowercase()) {
                Some(&mapped_key) => self.latch.press(mapped_key, now),
                None => {
                    debug!("can't map {:?} to a COSMAC key", c);
                    None
                }
            },
            other => {
                debug!("ignoring key {:?}", other);
                None
            }
        }
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TermInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        let mut events = Vec::new();
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                if let Some(e) = self.translate(evt, Instant::now()) {
                    events.push(e);
                }
            }
        }
        events.extend(self.latch.release_expired(Instant::now()));
        Ok(events)
    }
}

/// dummy Input implementation for testing: each poll hands back the next batch
pub struct DummyInput {
    batches: VecDeque<Vec<InputEvent>>,
}

impl DummyInput {
    pub fn new(batches: Vec<Vec<InputEvent>>) -> Self {
        DummyInput {
            batches: batches.into(),
        }
    }
}

impl Input for DummyInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}
