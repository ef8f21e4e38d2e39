/// what `pop` gives back on an empty stack. NB. deliberately only a byte wide
/// even though entries are 16-bit, so RET on an empty stack lands at 0x00ff
pub const STACK_UNDERFLOW: u16 = 0xff;

/// Fixed-depth return-address stack. Overflow and underflow are silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    slots: Box<[u16]>,
    pointer: usize,
}

impl Stack {
    pub fn new(depth: usize) -> Self {
        Stack {
            slots: vec![0u16; depth].into_boxed_slice(),
            pointer: 0,
        }
    }

    pub fn push(&mut self, addr: u16) {
        if let Some(slot) = self.slots.get_mut(self.pointer) {
            *slot = addr;
            self.pointer += 1;
        }
    }

    pub fn pop(&mut self) -> u16 {
        if self.pointer == 0 {
            return STACK_UNDERFLOW;
        }
        self.pointer -= 1;
        self.slots[self.pointer]
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// every slot, including ones above the pointer
    pub fn slots(&self) -> &[u16] {
        &self.slots
    }

    pub fn clear(&mut self) {
        self.slots.fill(0);
        self.pointer = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut s = Stack::new(16);
        s.push(0x0abc);
        s.push(0x0def);
        assert_eq!(s.pointer(), 2);
        assert_eq!(s.pop(), 0x0def);
        assert_eq!(s.pop(), 0x0abc);
        assert_eq!(s.pointer(), 0);
    }

    #[test]
    fn test_push_at_full_depth_is_dropped() {
        let mut s = Stack::new(16);
        for addr in 0..15 {
            s.push(addr);
        }
        s.push(0xba);
        assert_eq!(s.slots()[15], 0xba);
        assert_eq!(s.pointer(), 16);

        s.push(0xdc);
        assert_eq!(s.pointer(), 16);
        assert_eq!(s.pop(), 0xba);
    }

    #[test]
    fn test_pop_empty_returns_sentinel() {
        let mut s = Stack::new(16);
        s.push(0xba);
        assert_eq!(s.pop(), 0xba);
        assert_eq!(s.pop(), STACK_UNDERFLOW);
        assert_eq!(s.pointer(), 0);
    }

    #[test]
    fn test_clear() {
        let mut s = Stack::new(4);
        s.push(1);
        s.push(2);
        s.clear();
        assert_eq!(s.pointer(), 0);
        assert_eq!(s.slots(), &[0, 0, 0, 0]);
    }
}
