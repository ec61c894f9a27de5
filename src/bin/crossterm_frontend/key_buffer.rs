use std::time::{Duration, Instant};

use chip8_vm::emulator::keypad::{Keypad, NUM_KEYS};

/// Remembers when each hex key was last pressed.
///
/// Terminals only report key presses (and their auto-repeat), never releases,
/// so a key counts as held until `timeout` has passed since its last press.
pub struct KeyBuffer {
    timeout: Duration,
    pressed_at: [Option<Instant>; NUM_KEYS],
}

impl KeyBuffer {

    /// Create a new `KeyBuffer` where keys are released `timeout` after their last press.
    pub fn new(timeout: Duration) -> KeyBuffer {
        KeyBuffer {
            timeout,
            pressed_at: [None; NUM_KEYS],
        }
    }

    /// Record a keypress.
    pub fn push(&mut self, key: u8, at: Instant) {
        self.pressed_at[(key & 0xF) as usize] = Some(at);
    }

    /// Whether the key counts as held at `now`.
    pub fn is_held(&self, key: u8, now: Instant) -> bool {
        match self.pressed_at[(key & 0xF) as usize] {
            Some(at) => now.saturating_duration_since(at) < self.timeout,
            None => false,
        }
    }

    /// Copy the held state of every key into the machine's keypad.
    pub fn apply(&self, keypad: &mut Keypad, now: Instant) {
        for key in 0..NUM_KEYS as u8 {
            keypad.set(key, self.is_held(key, now));
        }
    }

    pub fn clear(&mut self) {
        self.pressed_at = [None; NUM_KEYS];
    }
}
