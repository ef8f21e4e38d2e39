//! Dxyn: XOR a sprite onto the bit-packed framebuffer.
//!
//! Each sprite row is a byte. Shifted right by `x % 8` inside a 16-bit window
//! it lines up with two adjacent framebuffer bytes, so a row is one word XOR
//! (or two byte XORs at the right edge) rather than eight pixel updates.
use crate::display::Framebuffer;
use crate::memory::MemoryMap;

impl Framebuffer {
    /// Draw `sprite` with its top-left corner at (x, y). Returns true when any
    /// lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8], wrap: bool) -> bool {
        if wrap {
            self.draw_sprite_wrap(x, y, sprite)
        } else {
            self.draw_sprite_clipped(x, y, sprite)
        }
    }

    /// rows off the bottom, and whole sprites off the right, are skipped
    fn draw_sprite_clipped(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let (width, height) = (self.width(), self.height());
        let mut collision = false;

        for (i, &row_bits) in sprite.iter().enumerate() {
            let row = y + i;
            if row >= height || x >= width {
                continue;
            }

            let window = ((row_bits as u16) << 8) >> (x % 8);
            let addr = (row * width + x) / 8;

            if x >= width - 8 {
                // the second byte would spill onto the next row
                let [first, _] = window.to_be_bytes();
                collision |= self.xor_byte(addr, first);
            } else {
                collision |= self.xor_word(addr, window);
            }
        }
        collision
    }

    /// rows off the bottom come back at the top; the part of a row hanging off
    /// the right edge comes back at the start of the same row
    fn draw_sprite_wrap(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let (width, height) = (self.width(), self.height());
        let row_bytes = self.resolution().bytes_per_row();
        let x = x % width;
        let mut collision = false;

        for (i, &row_bits) in sprite.iter().enumerate() {
            let row = (y + i) % height;

            let window = ((row_bits as u16) << 8) >> (x % 8);
            let addr = (row * width + x) / 8;

            if x >= width - 8 {
                let [first, second] = window.to_be_bytes();
                // last byte of this row, then first byte of this row
                let wrapped = addr + 1 - row_bytes;
                collision |= self.xor_byte(addr, first);
                collision |= self.xor_byte(wrapped, second);
            } else {
                collision |= self.xor_word(addr, window);
            }
        }
        collision
    }

    fn xor_byte(&mut self, addr: usize, bits: u8) -> bool {
        let current = self.read_byte(addr);
        self.write_byte(addr, current ^ bits);
        current & bits != 0
    }

    fn xor_word(&mut self, addr: usize, bits: u16) -> bool {
        let current = self.read_word(addr);
        self.write_word(addr, current ^ bits);
        current & bits != 0
    }
}

#[cfg(test)]
mod tests {
    use crate::display::{Framebuffer, Resolution};
    use crate::memory::MemoryMap;

    fn screen() -> Framebuffer {
        Framebuffer::new(Resolution::new(64, 32))
    }

    /// first byte of each of the first `n` rows
    fn column0(fb: &Framebuffer, n: usize) -> Vec<u8> {
        (0..n).map(|row| fb.read_byte(row * 8)).collect()
    }

    #[test]
    fn test_draw_and_collide() {
        let mut fb = screen();
        let sprite = [0b1111_0000, 0b1111_0000];

        assert!(!fb.draw_sprite(0, 0, &sprite, false));
        assert_eq!(column0(&fb, 3), [0b1111_0000, 0b1111_0000, 0b0000_0000]);

        assert!(fb.draw_sprite(1, 1, &sprite, false));
        assert_eq!(column0(&fb, 3), [0b1111_0000, 0b1000_1000, 0b0111_1000]);
    }

    #[test]
    fn test_redraw_erases() {
        let mut fb = screen();
        let sprite = [0xff, 0x81, 0xff];
        fb.draw_sprite(13, 7, &sprite, false);
        assert!(fb.draw_sprite(13, 7, &sprite, false));
        assert!(fb.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_unaligned_spans_two_bytes() {
        let mut fb = screen();
        fb.draw_sprite(4, 0, &[0xff], false);
        assert_eq!(fb.read_word(0), 0x0ff0);
        assert!(fb.pixel(4, 0) && fb.pixel(11, 0) && !fb.pixel(12, 0));
    }

    #[test]
    fn test_clipped_bottom_rows_skipped() {
        let mut fb = screen();
        assert!(!fb.draw_sprite(0, 30, &[0xff, 0xff, 0xff, 0xff], false));
        assert_eq!(fb.read_byte(30 * 8), 0xff);
        assert_eq!(fb.read_byte(31 * 8), 0xff);
        // nothing wrapped to the top
        assert_eq!(fb.read_byte(0), 0);
        assert_eq!(fb.read_byte(8), 0);
    }

    #[test]
    fn test_clipped_right_edge_drops_second_half() {
        let mut fb = screen();
        fb.draw_sprite(60, 0, &[0xff], false);
        assert_eq!(fb.read_byte(7), 0x0f);
        // row 1 untouched, nor the start of row 0
        assert_eq!(fb.read_byte(8), 0);
        assert_eq!(fb.read_byte(0), 0);
    }

    #[test]
    fn test_clipped_off_screen_x_skipped() {
        let mut fb = screen();
        assert!(!fb.draw_sprite(64, 0, &[0xff], false));
        assert!(fb.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_wrap_right_edge_same_row() {
        let mut fb = screen();
        fb.draw_sprite(60, 2, &[0xff], true);
        assert_eq!(fb.read_byte(2 * 8 + 7), 0x0f);
        assert_eq!(fb.read_byte(2 * 8), 0xf0);
        assert_eq!(fb.read_byte(3 * 8), 0);
    }

    #[test]
    fn test_wrap_bottom_to_top() {
        let mut fb = screen();
        fb.draw_sprite(0, 31, &[0x81, 0x42, 0x24], true);
        assert_eq!(fb.read_byte(31 * 8), 0x81);
        assert_eq!(fb.read_byte(0), 0x42);
        assert_eq!(fb.read_byte(8), 0x24);
    }

    #[test]
    fn test_wrap_coordinates_past_screen() {
        let mut fb = screen();
        fb.draw_sprite(64 + 8, 32 + 1, &[0xff], true);
        assert_eq!(fb.read_byte(8 + 1), 0xff);
    }

    #[test]
    fn test_wrap_collision_on_wrapped_half() {
        let mut fb = screen();
        fb.write_byte(0, 0x80);
        assert!(fb.draw_sprite(60, 0, &[0x08], true));
        assert_eq!(fb.read_byte(0), 0x00);
    }
}
