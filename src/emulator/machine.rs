//! The state of the CHIP-8 virtual machine as described at
//! https://en.wikipedia.org/wiki/CHIP-8#Virtual_machine_description.
//!
//! A `Machine` is plain data. Instructions are executed on it by
//! `emulator::dispatch`, timers are counted down by `emulator::timers`.

use crate::emulator::display::Display;
use crate::emulator::error::LoadError;
use crate::emulator::font;
use crate::emulator::keypad::Keypad;
use crate::emulator::opcode::Opcode;
use crate::emulator::quirks::Quirks;
use crate::emulator::stack::CallStack;
use crate::emulator::timers::Timers;

pub const MEM_SIZE: usize = 4096;
pub const NUM_REGISTERS: usize = 16;
pub const NUM_RPL_FLAGS: usize = 8;
pub const PC_START: u16 = 0x200;
/// The largest program that fits between `PC_START` and the end of memory.
pub const MAX_PROGRAM_SIZE: usize = MEM_SIZE - PC_START as usize;
/// Memory addresses are twelve bits wide.
pub const ADDR_MASK: u16 = 0x0FFF;

/// Index of the flag register VF.
pub const VF: usize = 0xF;

#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    pub memory: [u8; MEM_SIZE],
    pub registers: [u8; NUM_REGISTERS],
    pub rpl_flags: [u8; NUM_RPL_FLAGS],
    pub i: u16,
    pub program_counter: u16,
    pub stack: CallStack,
    pub timers: Timers,
    pub display: Display,
    pub keypad: Keypad,
    redraw_pending: bool,
}

impl Machine {

    /// Create a powered-on machine: zeroed, with the fonts installed and the
    /// program counter at `PC_START`.
    pub fn new(quirks: &Quirks) -> Machine {
        let mut memory = [0; MEM_SIZE];
        font::install(&mut memory);

        Machine {
            memory,
            registers: [0; NUM_REGISTERS],
            rpl_flags: [0; NUM_RPL_FLAGS],
            i: 0,
            program_counter: PC_START,
            stack: CallStack::with_capacity(quirks.stack_capacity),
            timers: Timers::default(),
            display: Display::new(),
            keypad: Keypad::default(),
            redraw_pending: false,
        }
    }

    /// Copy a program into memory at `PC_START`.
    /// Programs that don't fit are refused and memory is left alone.
    pub fn load(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(LoadError::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        let start = PC_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        log::debug!("Loaded {} byte program at {:#05x}", program.len(), PC_START);
        Ok(())
    }

    /// Put the machine back in its power-on state.
    pub fn reset(&mut self, quirks: &Quirks) {
        *self = Machine::new(quirks);
    }

    /// Read the two bytes at the program counter as one big endian opcode.
    pub fn fetch(&self) -> Opcode {
        let pc = self.program_counter;
        Opcode::from_two_u8(self.read(pc), self.read(pc.wrapping_add(1)))
    }

    /// Read memory, wrapping the address into the 4 KiB address space.
    pub fn read(&self, addr: u16) -> u8 {
        self.memory[(addr & ADDR_MASK) as usize]
    }

    /// Write memory, wrapping the address into the 4 KiB address space.
    pub fn write(&mut self, addr: u16, value: u8) {
        self.memory[(addr & ADDR_MASK) as usize] = value;
    }

    /// Copy `buf.len()` bytes starting at `addr` into `buf`, wrapping at the end of memory.
    pub fn read_into(&self, addr: u16, buf: &mut [u8]) {
        for (offset, byte) in buf.iter_mut().enumerate() {
            *byte = self.read(addr.wrapping_add(offset as u16));
        }
    }

    pub fn reg(&self, x: u8) -> u8 {
        self.registers[(x & 0xF) as usize]
    }

    pub fn set_reg(&mut self, x: u8, value: u8) {
        self.registers[(x & 0xF) as usize] = value;
    }

    /// True while the sound timer is running, i.e. while a tone should play.
    pub fn sound_active(&self) -> bool {
        self.timers.sound_active()
    }

    /// Whether the framebuffer changed since the renderer last took a frame.
    pub fn redraw_pending(&self) -> bool {
        self.redraw_pending
    }

    pub fn request_redraw(&mut self) {
        self.redraw_pending = true;
    }

    /// Called by the renderer once it has drawn. Returns whether there
    /// was anything new to draw.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.redraw_pending, false)
    }
}
