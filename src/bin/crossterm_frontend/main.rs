use std::io;
use std::time::{Duration, Instant};

use structopt::StructOpt;

use chip8_vm::config::Opt;
use chip8_vm::emulator::display::HIRES_HEIGHT;
use chip8_vm::emulator::Emulator;
use chip8_vm::runner::{FrameOutcome, Runner, FRAME_DURATION};

mod crossterm_io;
mod key_buffer;
mod key_manager;

use crossterm_io::CrosstermOutput;
use key_manager::{Control, KeyManager};

/// Terminals only report presses, so a key counts as held for this long.
const KEY_HOLD_TIME: Duration = Duration::from_millis(200);

fn main() -> io::Result<()> {

    pretty_env_logger::init();

    // Get configuration and read input file
    let opt = Opt::from_args();
    log::info!("Executing {:?} as {}", &opt.input, opt.profile);
    let program = std::fs::read(&opt.input)?;

    let mut emulator = Emulator::with_quirks(opt.quirks());
    if let Some(seed) = opt.seed {
        emulator = emulator.with_seed(seed);
    }
    emulator
        .load(&program)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut key_manager = KeyManager::new(KEY_HOLD_TIME);
    let mut runner = Runner::new(opt.cycles_per_frame);
    let mut output = CrosstermOutput::new().map_err(to_io)?;
    let status_line = (HIRES_HEIGHT / 2 + 2) as u16;
    let mut paused = false;

    loop {
        let frame_start = Instant::now();

        for control in key_manager.poll().map_err(to_io)? {
            match control {
                Control::Quit => return Ok(()),
                Control::TogglePause => {
                    paused = !paused;
                    let text = if paused { "Paused" } else { "" };
                    output.status(status_line, text).map_err(to_io)?;
                }
                Control::Reload => {
                    log::info!("Reloading {:?}", &opt.input);
                    emulator
                        .reset()
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                    key_manager.release_all();
                }
            }
        }

        key_manager
            .key_buffer()
            .apply(emulator.keypad_mut(), Instant::now());

        if !paused {
            match runner.run_frame(&mut emulator) {
                FrameOutcome::Continue => {}
                FrameOutcome::Halted => {
                    log::info!("Program exited after {} frames", runner.frames());
                    return Ok(());
                }
                FrameOutcome::Fatal(result) => {
                    return Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("program stopped: {:?}", result),
                    ));
                }
            }
        }

        if emulator.take_redraw() {
            output.draw(emulator.display()).map_err(to_io)?;
        }
        output.sound(emulator.sound_active()).map_err(to_io)?;

        if opt.max_frames.map_or(false, |max| runner.frames() >= max) {
            return Ok(());
        }

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }
}

fn to_io(error: crossterm::ErrorKind) -> io::Error {
    match error {
        crossterm::ErrorKind::IoError(e) => e,
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    }
}
