//! The render/input side: polls the keyboard, forwards it to the scheduler
//! and draws whatever snapshot was published last.
use crate::display::Display;
use crate::input::{Input, InputEvent};
use crate::scheduler::Controller;
use log::info;
use std::io;
use std::time::{Duration, Instant};

pub fn apply_event(event: InputEvent, controller: &Controller) {
    match event {
        InputEvent::Key { key, pressed } => controller.set_key_state(key, pressed),
        InputEvent::TogglePause => controller.toggle_pause(),
        InputEvent::Quit => {
            info!("quit requested");
            controller.stop();
        }
    }
}

/// Poll, forward and draw once per `refresh` until the controller is stopped,
/// either from here or by someone else.
pub fn run(
    display: &mut impl Display,
    input: &mut impl Input,
    controller: &Controller,
    refresh: Duration,
) -> Result<(), io::Error> {
    let framebuffer_size = controller.snapshot().display.len();
    if framebuffer_size != display.get_display_size_bytes() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "display holds {} bytes but the machine's framebuffer is {}",
                display.get_display_size_bytes(),
                framebuffer_size
            ),
        ));
    }

    let mut deadline = Instant::now();
    loop {
        for event in input.poll_events()? {
            apply_event(event, controller);
        }
        display.draw(&controller.snapshot())?;
        if controller.is_stopped() {
            return Ok(());
        }

        deadline += refresh;
        let now = Instant::now();
        if deadline > now {
            spin_sleep::sleep(deadline - now);
        } else {
            deadline = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::display::{DummyDisplay, Resolution};
    use crate::input::DummyInput;
    use crate::machine::Machine;

    fn controller() -> Controller {
        Controller::new(&Machine::new(Config::default()).unwrap())
    }

    #[test]
    fn test_apply_events() {
        let c = controller();
        apply_event(InputEvent::Key { key: 3, pressed: true }, &c);
        assert!(c.keys()[3]);
        apply_event(InputEvent::Key { key: 3, pressed: false }, &c);
        assert!(!c.keys()[3]);
        apply_event(InputEvent::TogglePause, &c);
        assert!(c.is_paused());
        apply_event(InputEvent::Quit, &c);
        assert!(c.is_stopped());
    }

    #[test]
    fn test_run_until_quit() -> Result<(), io::Error> {
        let c = controller();
        let mut display = DummyDisplay::new(Resolution::new(64, 32));
        let mut input = DummyInput::new(vec![
            vec![InputEvent::Key { key: 1, pressed: true }],
            vec![InputEvent::TogglePause],
            vec![InputEvent::Quit],
        ]);
        run(&mut display, &mut input, &c, Duration::from_millis(1))?;
        assert_eq!(display.frames.len(), 3);
        assert!(c.keys()[1]);
        assert!(c.is_paused());
        Ok(())
    }

    #[test]
    fn test_run_rejects_mismatched_display() {
        let c = controller();
        let mut display = DummyDisplay::new(Resolution::new(128, 64));
        let mut input = DummyInput::new(vec![vec![InputEvent::Quit]]);
        let err = run(&mut display, &mut input, &c, Duration::from_millis(1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(display.frames.is_empty());
        assert!(!c.is_stopped());
    }

    #[test]
    fn test_run_stops_when_stopped_elsewhere() -> Result<(), io::Error> {
        let c = controller();
        c.stop();
        let mut display = DummyDisplay::new(Resolution::new(64, 32));
        let mut input = DummyInput::new(vec![]);
        run(&mut display, &mut input, &c, Duration::from_millis(1))?;
        assert_eq!(display.frames.len(), 1);
        Ok(())
    }
}
