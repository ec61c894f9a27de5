pub const NUM_KEYS: usize = 16;

/// Held state of the sixteen hex keys. Written by whatever reads the
/// physical keyboard, read by the machine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; NUM_KEYS],
}

impl Keypad {
    pub fn press(&mut self, key: u8) {
        self.keys[(key & 0xF) as usize] = true;
    }

    pub fn release(&mut self, key: u8) {
        self.keys[(key & 0xF) as usize] = false;
    }

    pub fn set(&mut self, key: u8, held: bool) {
        self.keys[(key & 0xF) as usize] = held;
    }

    /// Only the low nibble of `key` is significant.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize]
    }

    /// The lowest held key, if any.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&held| held).map(|key| key as u8)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn first_pressed_picks_lowest_key() {
        let mut keypad = Keypad::default();
        assert_eq!(keypad.first_pressed(), None);
        keypad.press(0xC);
        keypad.press(0x3);
        assert_eq!(keypad.first_pressed(), Some(0x3));
        keypad.release(0x3);
        assert_eq!(keypad.first_pressed(), Some(0xC));
    }

    #[test]
    fn keys_are_masked_to_a_nibble() {
        let mut keypad = Keypad::default();
        keypad.press(0x15);
        assert!(keypad.is_pressed(0x5));
        assert!(keypad.is_pressed(0xF5));
    }
}
