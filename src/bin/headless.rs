use std::io;
use std::time::Instant;

use structopt::StructOpt;

use chip8_vm::config::Opt;
use chip8_vm::emulator::Emulator;
use chip8_vm::runner::{FrameOutcome, Runner, FRAME_DURATION};

fn main() -> io::Result<()> {
    env_logger::init();

    // Get configuration and read input file
    let opt = Opt::from_args();
    log::info!("Executing {:?} as {}", &opt.input, opt.profile);
    let program = std::fs::read(&opt.input)?;

    let mut emulator = Emulator::with_quirks(opt.quirks());
    if let Some(seed) = opt.seed {
        emulator = emulator.with_seed(seed);
    }

    // Load instructions into emulator memory
    emulator
        .load(&program)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    // Start execution
    let mut runner = Runner::new(opt.cycles_per_frame);
    loop {
        let started = Instant::now();
        match runner.run_frame(&mut emulator) {
            FrameOutcome::Continue => {}
            FrameOutcome::Halted => {
                log::info!("Program halted after {} frames", runner.frames());
                break;
            }
            FrameOutcome::Fatal(result) => {
                log::error!("Stopped after {} frames: {:?}", runner.frames(), result);
                return Err(io::Error::new(io::ErrorKind::Other, format!("{:?}", result)));
            }
        }

        // Nobody looks at the screen, but the frame is consumed all the same
        emulator.take_redraw();

        if opt.max_frames.map_or(false, |max| runner.frames() >= max) {
            log::info!("Stopping after {} frames", runner.frames());
            break;
        }

        if let Some(rest) = FRAME_DURATION.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    if runner.undefined_opcodes() > 0 {
        log::warn!("Skipped {} undefined opcodes", runner.undefined_opcodes());
    }
    Ok(())
}
