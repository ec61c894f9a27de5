/*!

A CHIP-8 interpreter as specified at https://en.wikipedia.org/wiki/CHIP-8,
including the SUPER-CHIP extensions (high resolution, scrolling, 16x16 sprites,
RPL flags) and the quirks that make programs written for one interpreter
misbehave on another.

# Frontends

If you want to try the interpreter on some programs, there is a ready-to-use terminal frontend
you can run by using `cargo run --release --bin crossterm_frontend -- <program>`.
The hex keypad is mapped to `1234`, `qwer`, `asdf` and `zxcv`, `Esc` quits,
`Space` pauses and `Backspace` reloads the program.
Use `--profile schip` or `--profile xochip` for programs written for those interpreters,
and `--help` for the individual quirk switches.

There is also `headless`, which runs a program without any output. Set `RUST_LOG=trace`
to see every executed instruction.

# Library

The core is plain data and step functions, it does no I/O and no timing of its own.
Whoever drives it calls `step` as often as it likes and `tick_timers` at 60 Hz.

```rust
use chip8_vm::emulator::{Emulator, StepResult};

let mut emulator = Emulator::new();

// Load a program at address 0x200.
let clear_display = [0x00, 0xE0];
emulator.load(&clear_display).unwrap();
assert_eq!(emulator.step(), StepResult::Ok); // Will now clear the display
assert!(emulator.take_redraw());
```

Alternatively, you can experiment by executing instructions manually.

```rust
use chip8_vm::emulator::Emulator;
use chip8_vm::emulator::instruction::{Instruction, Reg, Const, Addr};

let mut emulator = Emulator::new();

// Execute instructions manually
emulator.execute_single(Instruction::ClearScreen);

// Or many sequentially
emulator.execute_many(&[
    Instruction::Goto(Addr(0x250)),
    Instruction::SetRegToConst(Reg(0xA), Const(35)),
    Instruction::SetRegToReg(Reg(0xB), Reg(0xA))
]);
assert_eq!(emulator.machine().registers[0xB], 35);
```

## Quirks

Pick a profile and adjust single quirks where a program needs it.

```rust
use chip8_vm::emulator::{Emulator, Quirks};

let quirks = Quirks::super_chip().with_load_store_increments_index(true);
let mut emulator = Emulator::with_quirks(quirks).with_seed(42);
emulator.load(&[0x00, 0xFF]).unwrap(); // Switch to high resolution
emulator.step();
assert_eq!(emulator.display().width(), 128);
```

## Driving the machine directly

`Machine` holds the state, `step` and `tick_timers` operate on it.
Input is written to `machine.keypad`, output is read from `machine.display`.

```rust
use chip8_vm::emulator::{step, tick_timers, Machine, Quirks, StepResult};

let quirks = Quirks::chip8();
let mut machine = Machine::new(&quirks);
machine.load(&[0xF0, 0x0A]).unwrap(); // Wait for a key, store it in V0

let mut rng = rand::thread_rng();
assert_eq!(step(&mut machine, &quirks, &mut rng), StepResult::Ok);
assert_eq!(machine.program_counter, 0x200); // Still waiting

machine.keypad.press(0x5);
step(&mut machine, &quirks, &mut rng);
assert_eq!(machine.registers[0], 0x5);
tick_timers(&mut machine);
```
*/

pub mod config;
pub mod emulator;
pub mod runner;
