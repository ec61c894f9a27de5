//! The delay and sound timers, counted down at 60 Hz by whoever drives the machine.

use crate::emulator::machine::Machine;

/// Frequency the timers are meant to be ticked at.
pub const TIMER_HZ: u32 = 60;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    /// Count both timers down by one, stopping at zero.
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// The tone should play exactly while this is true.
    pub fn sound_active(&self) -> bool {
        self.sound > 0
    }
}

/// Tick the timers of a machine once. Call this at `TIMER_HZ`,
/// independently of how often instructions are stepped.
pub fn tick_timers(machine: &mut Machine) {
    machine.timers.tick();
}
