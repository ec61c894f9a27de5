//! Driving an emulator frame by frame.
//!
//! A frame is a batch of instruction steps followed by one timer tick.
//! Running frames at 60 Hz keeps the timers at their nominal rate while the
//! CPU runs at `cycles_per_frame * 60` instructions per second.

use std::time::Duration;

use crate::emulator::{Emulator, StepResult};

/// Roughly 700 instructions per second.
pub const DEFAULT_CYCLES_PER_FRAME: u32 = 700 / 60;

/// How long a 60 Hz frame lasts.
pub const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Run another frame.
    Continue,
    /// The program exited.
    Halted,
    /// The program broke, see `StepResult::is_fatal`.
    Fatal(StepResult),
}

pub struct Runner {
    cycles_per_frame: u32,
    undefined_opcodes: u64,
    frames: u64,
}

impl Runner {
    pub fn new(cycles_per_frame: u32) -> Runner {
        Runner {
            cycles_per_frame,
            undefined_opcodes: 0,
            frames: 0,
        }
    }

    /// Step the emulator `cycles_per_frame` times, then tick its timers.
    /// Stops early, without ticking, if the program halts or breaks.
    pub fn run_frame(&mut self, emulator: &mut Emulator) -> FrameOutcome {
        for _ in 0..self.cycles_per_frame {
            match emulator.step() {
                StepResult::Ok => {}
                StepResult::UndefinedOpcode(_) => self.undefined_opcodes += 1,
                StepResult::HaltRequested => return FrameOutcome::Halted,
                fatal => return FrameOutcome::Fatal(fatal),
            }
        }
        emulator.tick_timers();
        self.frames += 1;
        FrameOutcome::Continue
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// How many undefined opcodes were skipped so far.
    pub fn undefined_opcodes(&self) -> u64 {
        self.undefined_opcodes
    }
}

impl Default for Runner {
    fn default() -> Self {
        Runner::new(DEFAULT_CYCLES_PER_FRAME)
    }
}
