//! Command line options shared by the frontends.

use std::path::PathBuf;

use structopt::StructOpt;

use crate::emulator::quirks::{Profile, Quirks};
use crate::runner::DEFAULT_CYCLES_PER_FRAME;

/// The program options.
#[derive(StructOpt, Debug)]
pub struct Opt {
    /// The program to execute
    #[structopt(parse(from_os_str))]
    pub input: PathBuf,

    /// Instruction set and default quirks: chip8, schip or xochip
    #[structopt(short, long, default_value = "chip8")]
    pub profile: Profile,

    /// Instructions executed per 60 Hz frame
    #[structopt(short, long, default_value = "11")]
    pub cycles_per_frame: u32,

    /// Seed for the random number generator
    #[structopt(long)]
    pub seed: Option<u64>,

    /// Stop after this many frames
    #[structopt(long)]
    pub max_frames: Option<u64>,

    /// Shift VY instead of VX in 8XY6 and 8XYE
    #[structopt(long)]
    pub shift_uses_vy: Option<bool>,

    /// Add VX instead of V0 in BNNN
    #[structopt(long)]
    pub jump_offset_uses_vx: Option<bool>,

    /// Reset VF after 8XY1, 8XY2 and 8XY3
    #[structopt(long)]
    pub bitwise_ops_clear_flag: Option<bool>,

    /// Advance I past the transferred bytes in FX55 and FX65
    #[structopt(long)]
    pub load_store_increments_index: Option<bool>,

    /// Set VF when FX1E moves I out of memory
    #[structopt(long)]
    pub index_add_sets_overflow_flag: Option<bool>,

    /// Wrap sprites around the screen edges instead of clipping them
    #[structopt(long)]
    pub sprites_wrap: Option<bool>,
}

impl Opt {
    /// The profile's quirks with any overrides applied.
    pub fn quirks(&self) -> Quirks {
        let mut quirks = Quirks::for_profile(self.profile);
        if let Some(on) = self.shift_uses_vy {
            quirks = quirks.with_shift_uses_vy(on);
        }
        if let Some(on) = self.jump_offset_uses_vx {
            quirks = quirks.with_jump_offset_uses_vx(on);
        }
        if let Some(on) = self.bitwise_ops_clear_flag {
            quirks = quirks.with_bitwise_ops_clear_flag(on);
        }
        if let Some(on) = self.load_store_increments_index {
            quirks = quirks.with_load_store_increments_index(on);
        }
        if let Some(on) = self.index_add_sets_overflow_flag {
            quirks = quirks.with_index_add_sets_overflow_flag(on);
        }
        if let Some(on) = self.sprites_wrap {
            quirks = quirks.with_sprites_wrap(on);
        }
        quirks
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Opt {
        Opt::from_iter_safe(std::iter::once("chip8").chain(args.iter().cloned())).unwrap()
    }

    #[test]
    fn defaults() {
        let opt = parse(&["game.ch8"]);
        assert_eq!(opt.input, PathBuf::from("game.ch8"));
        assert_eq!(opt.profile, Profile::Chip8);
        assert_eq!(opt.cycles_per_frame, DEFAULT_CYCLES_PER_FRAME);
        assert_eq!(opt.seed, None);
        assert_eq!(opt.quirks(), Quirks::chip8());
    }

    #[test]
    fn profile_and_overrides() {
        let opt = parse(&[
            "game.ch8",
            "--profile",
            "schip",
            "--load-store-increments-index",
            "true",
            "--sprites-wrap",
            "false",
        ]);
        assert_eq!(
            opt.quirks(),
            Quirks::super_chip()
                .with_load_store_increments_index(true)
                .with_sprites_wrap(false)
        );
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let args = ["chip8", "game.ch8", "--profile", "gameboy"];
        assert!(Opt::from_iter_safe(args.iter()).is_err());
    }
}
