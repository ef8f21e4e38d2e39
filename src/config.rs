use crate::error::{Chip8Error, Result};

/// where programs are loaded, and the lowest address CALL will accept
pub const PROGRAM_ADDR: u16 = 0x0200;

/// Machine configuration. Sizes are fixed for the lifetime of a machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// display width in pixels; must be a multiple of 8
    pub width: usize,
    /// display height in pixels
    pub height: usize,
    pub memory_size: usize,
    pub stack_depth: usize,
    pub register_count: usize,
    /// instructions per second
    pub clock_hz: u32,
    /// delay/sound timer decrements per second of emulated time
    pub timer_hz: u32,
    /// sprites wrap around screen edges rather than being clipped
    pub draw_wrap: bool,
    /// fixed seed for RND; random per run if unset
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: 64,
            height: 32,
            memory_size: 4096,
            stack_depth: 16,
            register_count: 16,
            clock_hz: 500,
            timer_hz: 60,
            draw_wrap: false,
            seed: None,
        }
    }
}

impl Config {
    /// how big the framebuffer is, one bit per pixel
    pub fn display_size_bytes(&self) -> usize {
        self.width * self.height / 8
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Chip8Error::InvalidConfig(msg));
        if self.width == 0 || self.width % 8 != 0 {
            return invalid(format!("width {} is not a multiple of 8", self.width));
        }
        if self.height == 0 {
            return invalid("height must be non-zero".into());
        }
        if self.memory_size < PROGRAM_ADDR as usize || self.memory_size > 0x10000 {
            return invalid(format!(
                "memory size {} must be between 0x200 and 0x10000 bytes",
                self.memory_size
            ));
        }
        if self.register_count < 16 {
            return invalid(format!(
                "need at least 16 registers, got {}",
                self.register_count
            ));
        }
        if self.stack_depth == 0 {
            return invalid("stack depth must be non-zero".into());
        }
        if self.clock_hz == 0 || self.timer_hz == 0 {
            return invalid("clock and timer frequencies must be non-zero".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() -> Result<()> {
        let c = Config::default();
        c.validate()?;
        assert_eq!(c.display_size_bytes(), 256);
        Ok(())
    }

    #[test]
    fn test_rejects_odd_width() {
        let c = Config {
            width: 60,
            ..Config::default()
        };
        assert!(matches!(c.validate(), Err(Chip8Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_small_memory() {
        let c = Config {
            memory_size: 0x100,
            ..Config::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_rejects_too_few_registers() {
        let c = Config {
            register_count: 8,
            ..Config::default()
        };
        assert!(c.validate().is_err());
    }
}
