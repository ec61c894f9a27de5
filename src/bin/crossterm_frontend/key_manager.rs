use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use super::key_buffer::KeyBuffer;

/// Keys that control the frontend rather than the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Quit,
    TogglePause,
    Reload,
}

/// Reads terminal events without blocking and sorts them into
/// hex key presses and frontend controls.
pub struct KeyManager {
    key_buffer: KeyBuffer,
}

impl KeyManager {
    pub fn new(hold_time: Duration) -> KeyManager {
        KeyManager {
            key_buffer: KeyBuffer::new(hold_time),
        }
    }

    /// Drain every pending terminal event.
    pub fn poll(&mut self) -> crossterm::Result<Vec<Control>> {
        let mut controls = Vec::new();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key_event) = event::read()? {
                log::trace!("Got event {:?}", key_event);
                if let Some(control) = to_control(key_event) {
                    controls.push(control);
                } else if let KeyCode::Char(c) = key_event.code {
                    if let Some(key) = key_to_u8(c) {
                        self.key_buffer.push(key, Instant::now());
                    }
                }
            }
        }
        Ok(controls)
    }

    pub fn key_buffer(&self) -> &KeyBuffer {
        &self.key_buffer
    }

    pub fn release_all(&mut self) {
        self.key_buffer.clear();
    }
}

fn to_control(key_event: KeyEvent) -> Option<Control> {
    match key_event.code {
        KeyCode::Esc => Some(Control::Quit),
        KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Control::Quit)
        }
        KeyCode::Char(' ') => Some(Control::TogglePause),
        KeyCode::Backspace => Some(Control::Reload),
        _ => None,
    }
}

/// The hex keypad laid over the left of a QWERTY keyboard:
///
/// ```text
/// 1 2 3 C      1 2 3 4
/// 4 5 6 D      q w e r
/// 7 8 9 E  ->  a s d f
/// A 0 B F      z x c v
/// ```
fn key_to_u8(c: char) -> Option<u8> {
    let key = match c.to_ascii_lowercase() {
        'x' => 0x0,
        '1' => 0x1,
        '2' => 0x2,
        '3' => 0x3,
        'q' => 0x4,
        'w' => 0x5,
        'e' => 0x6,
        'a' => 0x7,
        's' => 0x8,
        'd' => 0x9,
        'z' => 0xA,
        'c' => 0xB,
        '4' => 0xC,
        'r' => 0xD,
        'f' => 0xE,
        'v' => 0xF,
        _ => return None,
    };
    Some(key)
}
