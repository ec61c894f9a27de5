//! The CHIP-8 virtual machine and the instructions that run on it.

pub mod dispatch;
pub mod display;
pub mod emulator;
pub mod error;
pub mod font;
pub mod instruction;
pub mod keypad;
pub mod machine;
pub mod opcode;
pub mod quirks;
pub mod stack;
pub mod timers;

pub use self::dispatch::{execute, step, StepResult};
pub use self::emulator::Emulator;
pub use self::machine::Machine;
pub use self::quirks::{Profile, Quirks};
pub use self::timers::tick_timers;
