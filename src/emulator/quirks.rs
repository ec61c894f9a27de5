//! Switches for the instructions that historical interpreters disagree on.
//!
//! A `Quirks` value is picked once when the machine is created and then only read.
//! Start from a `Profile` and override single switches with the builder methods.

use std::fmt;
use std::str::FromStr;

use crate::emulator::stack::MAX_STACK_SIZE;

/// The instruction set a program was written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// The original COSMAC VIP instruction set.
    Chip8,
    /// SUPER-CHIP: high resolution, scrolling, big sprites, RPL flags, exit.
    SuperChip,
    /// XO-CHIP: the SUPER-CHIP set plus upward scrolling. Colour planes and
    /// audio patterns are not supported.
    XoChip,
}

impl Profile {
    /// Whether the SUPER-CHIP additions are decoded.
    pub fn has_extended_ops(self) -> bool {
        self != Profile::Chip8
    }

    /// Whether `00DN` scrolls up.
    pub fn has_scroll_up(self) -> bool {
        self == Profile::XoChip
    }

    pub const NAMES: [&'static str; 3] = ["chip8", "schip", "xochip"];
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Chip8
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Profile::Chip8 => "chip8",
            Profile::SuperChip => "schip",
            Profile::XoChip => "xochip",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chip8" | "chip-8" => Ok(Profile::Chip8),
            "schip" | "superchip" | "super-chip" => Ok(Profile::SuperChip),
            "xochip" | "xo-chip" => Ok(Profile::XoChip),
            other => Err(format!(
                "unknown profile '{}', expected one of {}",
                other,
                Profile::NAMES.join(", ")
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    pub profile: Profile,
    /// `8XY6`/`8XYE` shift VY into VX instead of shifting VX in place.
    pub shift_uses_vy: bool,
    /// `BNNN` adds VX (X being the top nibble of NNN) instead of V0.
    pub jump_offset_uses_vx: bool,
    /// `8XY1`/`8XY2`/`8XY3` reset VF.
    pub bitwise_ops_clear_flag: bool,
    /// `FX55`/`FX65` leave I pointing past the last transferred byte.
    pub load_store_increments_index: bool,
    /// `FX1E` sets VF when I leaves the 12-bit address space.
    pub index_add_sets_overflow_flag: bool,
    /// Sprites wrap around the screen edges instead of being clipped.
    pub sprites_wrap: bool,
    /// Number of nested calls before `2NNN` overflows.
    pub stack_capacity: usize,
}

impl Quirks {
    pub fn chip8() -> Quirks {
        Quirks {
            profile: Profile::Chip8,
            shift_uses_vy: true,
            jump_offset_uses_vx: false,
            bitwise_ops_clear_flag: true,
            load_store_increments_index: true,
            index_add_sets_overflow_flag: true,
            sprites_wrap: false,
            stack_capacity: 12,
        }
    }

    pub fn super_chip() -> Quirks {
        Quirks {
            profile: Profile::SuperChip,
            shift_uses_vy: false,
            jump_offset_uses_vx: true,
            bitwise_ops_clear_flag: false,
            load_store_increments_index: false,
            index_add_sets_overflow_flag: false,
            sprites_wrap: true,
            stack_capacity: 16,
        }
    }

    pub fn xo_chip() -> Quirks {
        Quirks {
            profile: Profile::XoChip,
            shift_uses_vy: true,
            jump_offset_uses_vx: false,
            bitwise_ops_clear_flag: false,
            load_store_increments_index: true,
            index_add_sets_overflow_flag: false,
            sprites_wrap: true,
            stack_capacity: 16,
        }
    }

    pub fn for_profile(profile: Profile) -> Quirks {
        match profile {
            Profile::Chip8 => Quirks::chip8(),
            Profile::SuperChip => Quirks::super_chip(),
            Profile::XoChip => Quirks::xo_chip(),
        }
    }

    pub fn with_shift_uses_vy(mut self, on: bool) -> Self {
        self.shift_uses_vy = on;
        self
    }

    pub fn with_jump_offset_uses_vx(mut self, on: bool) -> Self {
        self.jump_offset_uses_vx = on;
        self
    }

    pub fn with_bitwise_ops_clear_flag(mut self, on: bool) -> Self {
        self.bitwise_ops_clear_flag = on;
        self
    }

    pub fn with_load_store_increments_index(mut self, on: bool) -> Self {
        self.load_store_increments_index = on;
        self
    }

    pub fn with_index_add_sets_overflow_flag(mut self, on: bool) -> Self {
        self.index_add_sets_overflow_flag = on;
        self
    }

    pub fn with_sprites_wrap(mut self, on: bool) -> Self {
        self.sprites_wrap = on;
        self
    }

    /// Capacities above `MAX_STACK_SIZE` are clamped to it.
    pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
        self.stack_capacity = capacity.min(MAX_STACK_SIZE);
        self
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks::chip8()
    }
}
