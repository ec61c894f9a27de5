use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::emulator::dispatch::{self, StepResult};
use crate::emulator::display::Display;
use crate::emulator::error::LoadError;
use crate::emulator::instruction::Instruction;
use crate::emulator::keypad::Keypad;
use crate::emulator::machine::Machine;
use crate::emulator::quirks::Quirks;
use crate::emulator::timers;

/// A machine together with everything needed to run it: the quirks it was
/// created with, a random number generator and the loaded program, which is
/// kept around so the machine can be reset.
pub struct Emulator {
    machine: Machine,
    quirks: Quirks,
    rng: StdRng,
    program: Vec<u8>,
}

impl Emulator {

    /// Create a new emulator with CHIP-8 quirks
    pub fn new() -> Emulator {
        Emulator::with_quirks(Quirks::chip8())
    }

    pub fn with_quirks(quirks: Quirks) -> Emulator {
        Emulator {
            machine: Machine::new(&quirks),
            quirks,
            rng: StdRng::from_entropy(),
            program: Vec::new(),
        }
    }

    /// Use a seeded random number generator, making `CXNN` reproducible.
    pub fn with_seed(mut self, seed: u64) -> Emulator {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Copy a program into memory at 0x200 and remember it for `reset`.
    pub fn load(&mut self, program: &[u8]) -> Result<(), LoadError> {
        self.machine.load(program)?;
        self.program = program.to_vec();
        Ok(())
    }

    /// Power cycle: back to the initial state with the same quirks and program.
    pub fn reset(&mut self) -> Result<(), LoadError> {
        log::debug!("Resetting machine");
        self.machine.reset(&self.quirks);
        self.machine.request_redraw();
        self.machine.load(&self.program)
    }

    /// Load and execute the next instruction.
    pub fn step(&mut self) -> StepResult {
        dispatch::step(&mut self.machine, &self.quirks, &mut self.rng)
    }

    /// Count the delay and sound timers down. Call this at 60 Hz.
    pub fn tick_timers(&mut self) {
        timers::tick_timers(&mut self.machine);
    }

    /// Execute a single instruction without fetching it from memory
    pub fn execute_single(&mut self, instruction: Instruction) -> StepResult {
        dispatch::execute(&mut self.machine, &self.quirks, &mut self.rng, instruction)
    }

    /// Execute instructions in order, stopping at the first one that does not
    /// return `StepResult::Ok`.
    pub fn execute_many(&mut self, instructions: &[Instruction]) -> StepResult {
        for &instruction in instructions {
            let result = self.execute_single(instruction);
            if !result.is_ok() {
                return result;
            }
        }
        StepResult::Ok
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn display(&self) -> &Display {
        &self.machine.display
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.machine.keypad
    }

    pub fn redraw_pending(&self) -> bool {
        self.machine.redraw_pending()
    }

    /// Hand the current frame to a renderer, see `Machine::take_redraw`.
    pub fn take_redraw(&mut self) -> bool {
        self.machine.take_redraw()
    }

    pub fn sound_active(&self) -> bool {
        self.machine.sound_active()
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}
