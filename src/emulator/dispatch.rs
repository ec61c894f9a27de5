//! Fetching, decoding and executing instructions.

use rand::Rng;

use crate::emulator::display::{Resolution, Sprite};
use crate::emulator::error::StackError;
use crate::emulator::font;
use crate::emulator::instruction::*;
use crate::emulator::machine::{Machine, ADDR_MASK, NUM_RPL_FLAGS, VF};
use crate::emulator::quirks::Quirks;

/// The outcome of executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Ok,
    /// The word did not decode to an instruction. It was skipped and
    /// execution can go on.
    UndefinedOpcode(u16),
    /// A call was made with a full stack. Fatal.
    StackOverflow,
    /// A return was made with an empty stack. Fatal.
    StackUnderflow,
    /// The program asked the interpreter to exit.
    HaltRequested,
}

impl StepResult {
    /// Fatal results mean the program is broken. The machine is left as it
    /// was before the step and should not be stepped again.
    pub fn is_fatal(self) -> bool {
        match self {
            StepResult::StackOverflow | StepResult::StackUnderflow => true,
            _ => false,
        }
    }

    pub fn is_ok(self) -> bool {
        self == StepResult::Ok
    }
}

impl From<StackError> for StepResult {
    fn from(error: StackError) -> Self {
        match error {
            StackError::Overflow => StepResult::StackOverflow,
            StackError::Underflow => StepResult::StackUnderflow,
        }
    }
}

/// Fetch the instruction at the program counter and execute it.
///
/// The program counter is moved past the instruction before it runs,
/// so jumps overwrite the advanced value and skips add to it.
pub fn step<R: Rng + ?Sized>(machine: &mut Machine, quirks: &Quirks, rng: &mut R) -> StepResult {
    let pc = machine.program_counter;
    let opcode = machine.fetch();
    machine.program_counter = pc.wrapping_add(2);

    let instruction = match Instruction::decode(opcode, quirks.profile) {
        Some(instruction) => instruction,
        None => {
            log::warn!(
                "Undefined opcode {:#06x} (binary {:016b}) at {:#05x}",
                opcode.word,
                opcode.word,
                pc
            );
            return StepResult::UndefinedOpcode(opcode.word);
        }
    };

    log::trace!("{:#05x}: {:?}", pc, instruction);

    let result = execute(machine, quirks, rng, instruction);
    if result.is_fatal() {
        // Leave the machine exactly as it was before this step
        machine.program_counter = pc;
        log::error!("{:?} at {:#05x} executing {:?}", result, pc, instruction);
    }
    result
}

/// Execute a single instruction, as if it had just been fetched.
pub fn execute<R: Rng + ?Sized>(
    machine: &mut Machine,
    quirks: &Quirks,
    rng: &mut R,
    instruction: Instruction,
) -> StepResult {
    match instruction {

        // Clear the screen
        Instruction::ClearScreen => {
            machine.display.clear();
            machine.request_redraw();
        }

        // Return to the previous call site via the stack.
        Instruction::Return => match machine.stack.pop() {
            Ok(addr) => machine.program_counter = addr,
            Err(error) => return error.into(),
        },

        Instruction::ScrollDown(Const(n)) => {
            machine.display.scroll_down(n as usize);
            machine.request_redraw();
        }

        Instruction::ScrollUp(Const(n)) => {
            machine.display.scroll_up(n as usize);
            machine.request_redraw();
        }

        Instruction::ScrollRight => {
            machine.display.scroll_right(4);
            machine.request_redraw();
        }

        Instruction::ScrollLeft => {
            machine.display.scroll_left(4);
            machine.request_redraw();
        }

        Instruction::Exit => {
            log::info!("Program requested exit");
            return StepResult::HaltRequested;
        }

        Instruction::LowRes => {
            machine.display.set_resolution(Resolution::Standard);
            machine.request_redraw();
        }

        Instruction::HighRes => {
            machine.display.set_resolution(Resolution::Extended);
            machine.request_redraw();
        }

        // Go to a specific memory address
        Instruction::Goto(Addr(addr)) => {
            machine.program_counter = addr;
        }

        // Store the current address on the stack, then jump to the specified address
        Instruction::Call(Addr(addr)) => {
            if let Err(error) = machine.stack.push(machine.program_counter) {
                return error.into();
            }
            machine.program_counter = addr;
        }

        // If the register equals the constant, skip the next instruction
        Instruction::IfRegEqConst(Reg(x), Const(n)) => {
            if machine.reg(x) == n {
                skip(machine);
            }
        }

        Instruction::IfRegNeqConst(Reg(x), Const(n)) => {
            if machine.reg(x) != n {
                skip(machine);
            }
        }

        Instruction::IfRegEqReg(Reg(x), Reg(y)) => {
            if machine.reg(x) == machine.reg(y) {
                skip(machine);
            }
        }

        Instruction::SetRegToConst(Reg(x), Const(n)) => {
            machine.set_reg(x, n);
        }

        // Wraps around, VF is left alone
        Instruction::IncRegByConst(Reg(x), Const(n)) => {
            machine.set_reg(x, machine.reg(x).wrapping_add(n));
        }

        Instruction::SetRegToReg(Reg(x), Reg(y)) => {
            machine.set_reg(x, machine.reg(y));
        }

        Instruction::BitwiseOr(Reg(x), Reg(y)) => {
            machine.set_reg(x, machine.reg(x) | machine.reg(y));
            clear_flag_after_bitwise(machine, quirks);
        }

        Instruction::BitwiseAnd(Reg(x), Reg(y)) => {
            machine.set_reg(x, machine.reg(x) & machine.reg(y));
            clear_flag_after_bitwise(machine, quirks);
        }

        Instruction::BitwiseXor(Reg(x), Reg(y)) => {
            machine.set_reg(x, machine.reg(x) ^ machine.reg(y));
            clear_flag_after_bitwise(machine, quirks);
        }

        // VF is 1 on carry. The flag is written last, so it wins when X is F.
        Instruction::IncRegByReg(Reg(x), Reg(y)) => {
            let (sum, carry) = machine.reg(x).overflowing_add(machine.reg(y));
            machine.set_reg(x, sum);
            machine.registers[VF] = carry as u8;
        }

        // VF is 1 when there is no borrow
        Instruction::DecRegByReg(Reg(x), Reg(y)) => {
            let (vx, vy) = (machine.reg(x), machine.reg(y));
            machine.set_reg(x, vx.wrapping_sub(vy));
            machine.registers[VF] = (vx >= vy) as u8;
        }

        Instruction::BitshiftRight(Reg(x), Reg(y)) => {
            let source = shift_source(machine, quirks, x, y);
            machine.set_reg(x, source >> 1);
            machine.registers[VF] = source & 1;
        }

        Instruction::SetVxVyMinusVx(Reg(x), Reg(y)) => {
            let (vx, vy) = (machine.reg(x), machine.reg(y));
            machine.set_reg(x, vy.wrapping_sub(vx));
            machine.registers[VF] = (vy >= vx) as u8;
        }

        Instruction::BitshiftLeft(Reg(x), Reg(y)) => {
            let source = shift_source(machine, quirks, x, y);
            machine.set_reg(x, source << 1);
            machine.registers[VF] = source >> 7;
        }

        Instruction::IfRegNeqReg(Reg(x), Reg(y)) => {
            if machine.reg(x) != machine.reg(y) {
                skip(machine);
            }
        }

        Instruction::SetI(Addr(addr)) => {
            machine.i = addr;
        }

        // Jump to NNN plus V0, or plus VX where X is the top nibble of NNN
        Instruction::JumpWithOffset(Addr(addr)) => {
            let offset_reg = if quirks.jump_offset_uses_vx {
                (addr >> 8) as u8
            } else {
                0
            };
            machine.program_counter = addr.wrapping_add(machine.reg(offset_reg) as u16) & ADDR_MASK;
        }

        Instruction::SetVxRand(Reg(x), Const(n)) => {
            machine.set_reg(x, rng.gen::<u8>() & n);
        }

        Instruction::Draw(Reg(x), Reg(y), Const(height)) => {
            let mut rows = [0u8; 15];
            let rows = &mut rows[..(height as usize).min(15)];
            machine.read_into(machine.i, rows);
            draw(machine, quirks, x, y, &Sprite::narrow(rows));
        }

        Instruction::DrawLarge(Reg(x), Reg(y)) => {
            let mut rows = [0u8; 32];
            machine.read_into(machine.i, &mut rows);
            draw(machine, quirks, x, y, &Sprite::wide(&rows));
        }

        Instruction::IfKeyEqVx(Reg(x)) => {
            if machine.keypad.is_pressed(machine.reg(x)) {
                skip(machine);
            }
        }

        Instruction::IfKeyNeqVx(Reg(x)) => {
            if !machine.keypad.is_pressed(machine.reg(x)) {
                skip(machine);
            }
        }

        Instruction::SetRegToDelayTimer(Reg(x)) => {
            machine.set_reg(x, machine.timers.delay);
        }

        // Wait for a key by running this instruction again until one is held
        Instruction::SetRegToGetKey(Reg(x)) => match machine.keypad.first_pressed() {
            Some(key) => machine.set_reg(x, key),
            None => machine.program_counter = machine.program_counter.wrapping_sub(2),
        },

        Instruction::SetDelayTimerToReg(Reg(x)) => {
            machine.timers.delay = machine.reg(x);
        }

        Instruction::SetSoundTimerToReg(Reg(x)) => {
            machine.timers.sound = machine.reg(x);
        }

        Instruction::AddRegToI(Reg(x)) => {
            machine.i = machine.i.wrapping_add(machine.reg(x) as u16);
            if quirks.index_add_sets_overflow_flag {
                machine.registers[VF] = (machine.i > ADDR_MASK) as u8;
            }
        }

        // Set i to character address. Each font element is 5 bytes high.
        Instruction::SetIToSpriteAddrVx(Reg(x)) => {
            machine.i = font::glyph_addr(machine.reg(x));
        }

        Instruction::SetIToBigSpriteAddrVx(Reg(x)) => {
            machine.i = font::big_glyph_addr(machine.reg(x));
        }

        Instruction::SetIToBcdOfReg(Reg(x)) => {
            let value = machine.reg(x);
            let i = machine.i;
            machine.write(i, value / 100);
            machine.write(i.wrapping_add(1), (value / 10) % 10);
            machine.write(i.wrapping_add(2), value % 10);
        }

        // Dump register values up to Vx
        Instruction::RegDump(Reg(x)) => {
            let i = machine.i;
            for reg_no in 0..=x {
                machine.write(i.wrapping_add(reg_no as u16), machine.reg(reg_no));
            }
            advance_index_after_transfer(machine, quirks, x);
        }

        // Load register values up to Vx
        Instruction::RegLoad(Reg(x)) => {
            let i = machine.i;
            for reg_no in 0..=x {
                machine.set_reg(reg_no, machine.read(i.wrapping_add(reg_no as u16)));
            }
            advance_index_after_transfer(machine, quirks, x);
        }

        Instruction::RplDump(Reg(x)) => {
            let count = rpl_count(x);
            machine.rpl_flags[..count].copy_from_slice(&machine.registers[..count]);
        }

        Instruction::RplLoad(Reg(x)) => {
            let count = rpl_count(x);
            machine.registers[..count].copy_from_slice(&machine.rpl_flags[..count]);
        }
    };

    StepResult::Ok
}

fn skip(machine: &mut Machine) {
    machine.program_counter = machine.program_counter.wrapping_add(2);
}

fn clear_flag_after_bitwise(machine: &mut Machine, quirks: &Quirks) {
    if quirks.bitwise_ops_clear_flag {
        machine.registers[VF] = 0;
    }
}

fn shift_source(machine: &Machine, quirks: &Quirks, x: u8, y: u8) -> u8 {
    if quirks.shift_uses_vy {
        machine.reg(y)
    } else {
        machine.reg(x)
    }
}

fn advance_index_after_transfer(machine: &mut Machine, quirks: &Quirks, x: u8) {
    if quirks.load_store_increments_index {
        machine.i = machine.i.wrapping_add(x as u16 + 1);
    }
}

/// Registers V0..=VX that fit in the RPL flags.
fn rpl_count(x: u8) -> usize {
    (x as usize + 1).min(NUM_RPL_FLAGS)
}

fn draw(machine: &mut Machine, quirks: &Quirks, x: u8, y: u8, sprite: &Sprite<'_>) {
    let (vx, vy) = (machine.reg(x) as usize, machine.reg(y) as usize);
    let collision = machine.display.draw(vx, vy, sprite, quirks.sprites_wrap);
    machine.registers[VF] = collision as u8;
    machine.request_redraw();
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::emulator::machine::PC_START;
    use proptest::prelude::*;
    use rand::rngs::mock::StepRng;
    use test_case::test_case;

    fn rng() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    /// A machine with `program` loaded, given as opcodes.
    fn machine_with(quirks: &Quirks, program: &[u16]) -> Machine {
        let bytes: Vec<u8> = program.iter().flat_map(|op| op.to_be_bytes().to_vec()).collect();
        let mut machine = Machine::new(quirks);
        machine.load(&bytes).unwrap();
        machine
    }

    fn run(machine: &mut Machine, quirks: &Quirks, steps: usize) -> Vec<StepResult> {
        let mut rng = rng();
        (0..steps).map(|_| step(machine, quirks, &mut rng)).collect()
    }

    fn exec(machine: &mut Machine, quirks: &Quirks, instruction: Instruction) -> StepResult {
        execute(machine, quirks, &mut rng(), instruction)
    }

    #[test]
    fn goto_goes_to() {
        let quirks = Quirks::chip8();
        let mut machine = Machine::new(&quirks);
        exec(&mut machine, &quirks, Instruction::Goto(Addr(0x250)));
        assert_eq!(machine.program_counter, 0x250);
    }

    #[test]
    fn return_after_call_is_neutral() {
        let quirks = Quirks::chip8();
        let mut machine = machine_with(&quirks, &[
            0x2206, // 0x200, call 0x206
            0x0000, // 0x202
            0x0000, // 0x204
            0x00EE, // 0x206, return
        ]);

        assert_eq!(run(&mut machine, &quirks, 1), vec![StepResult::Ok]);
        assert_eq!(machine.program_counter, 0x206);
        assert_eq!(machine.stack.as_slice(), &[0x202]);
        assert_eq!(run(&mut machine, &quirks, 1), vec![StepResult::Ok]);
        assert_eq!(machine.program_counter, 0x202);
        assert!(machine.stack.is_empty());
    }

    #[test_case(Quirks::chip8(), 12 ; "chip8")]
    #[test_case(Quirks::super_chip(), 16 ; "super chip")]
    fn call_past_capacity_overflows_without_side_effects(quirks: Quirks, capacity: usize) {
        // Calls itself forever
        let mut machine = machine_with(&quirks, &[0x2200]);
        let results = run(&mut machine, &quirks, capacity);
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(machine.stack.depth(), capacity);

        let before = machine.clone();
        let result = run(&mut machine, &quirks, 1)[0];
        assert_eq!(result, StepResult::StackOverflow);
        assert!(result.is_fatal());
        assert_eq!(machine, before);
    }

    #[test]
    fn return_on_empty_stack_underflows_without_side_effects() {
        let quirks = Quirks::chip8();
        let mut machine = machine_with(&quirks, &[0x00EE]);
        let before = machine.clone();
        assert_eq!(run(&mut machine, &quirks, 1), vec![StepResult::StackUnderflow]);
        assert_eq!(machine, before);
        assert_eq!(machine.program_counter, PC_START);
    }

    #[test]
    fn skip_never_executes_skipped_instruction() {
        let quirks = Quirks::chip8();
        let mut machine = machine_with(&quirks, &[
            0x6005, // V0 = 5
            0x3005, // skip if V0 == 5
            0xFFFF, // undefined
            0x6101, // V1 = 1
        ]);
        let results = run(&mut machine, &quirks, 3);
        assert_eq!(results, vec![StepResult::Ok; 3]);
        assert_eq!(machine.registers[1], 1);
        assert_eq!(machine.program_counter, 0x208);
    }

    #[test_case(Instruction::IfRegEqConst(Reg(1), Const(7)), 0x204 ; "eq const")]
    #[test_case(Instruction::IfRegNeqConst(Reg(1), Const(7)), 0x202 ; "neq const")]
    #[test_case(Instruction::IfRegEqReg(Reg(1), Reg(2)), 0x204 ; "eq reg")]
    #[test_case(Instruction::IfRegNeqReg(Reg(1), Reg(2)), 0x202 ; "neq reg equal")]
    #[test_case(Instruction::IfRegNeqReg(Reg(1), Reg(3)), 0x204 ; "neq reg different")]
    fn conditional_skips(instruction: Instruction, expected_pc: u16) {
        let quirks = Quirks::chip8();
        let mut machine = Machine::new(&quirks);
        machine.registers[1] = 7;
        machine.registers[2] = 7;
        machine.registers[3] = 8;
        machine.program_counter = 0x202;
        exec(&mut machine, &quirks, instruction);
        assert_eq!(machine.program_counter, expected_pc);
    }

    #[test]
    fn undefined_opcode_is_skipped() {
        let quirks = Quirks::chip8();
        let mut machine = machine_with(&quirks, &[0x8008, 0x6A01]);
        assert_eq!(
            run(&mut machine, &quirks, 2),
            vec![StepResult::UndefinedOpcode(0x8008), StepResult::Ok]
        );
        assert!(!StepResult::UndefinedOpcode(0x8008).is_fatal());
        assert_eq!(machine.registers[0xA], 1);
    }

    #[test_case(250, 10 => (4, 1) ; "carry")]
    #[test_case(10, 10 => (20, 0) ; "no carry")]
    #[test_case(255, 1 => (0, 1) ; "wraps to zero")]
    fn add_sets_carry(vx: u8, vy: u8) -> (u8, u8) {
        let quirks = Quirks::chip8();
        let mut machine = Machine::new(&quirks);
        machine.registers[1] = vx;
        machine.registers[2] = vy;
        exec(&mut machine, &quirks, Instruction::IncRegByReg(Reg(1), Reg(2)));
        (machine.registers[1], machine.registers[VF])
    }

    #[test_case(5, 10 => (251, 0) ; "borrow")]
    #[test_case(10, 5 => (5, 1) ; "no borrow")]
    #[test_case(7, 7 => (0, 1) ; "equal operands")]
    fn sub_sets_not_borrow(vx: u8, vy: u8) -> (u8, u8) {
        let quirks = Quirks::chip8();
        let mut machine = Machine::new(&quirks);
        machine.registers[1] = vx;
        machine.registers[2] = vy;
        exec(&mut machine, &quirks, Instruction::DecRegByReg(Reg(1), Reg(2)));
        (machine.registers[1], machine.registers[VF])
    }

    #[test_case(5, 10 => (5, 1) ; "no borrow")]
    #[test_case(10, 5 => (251, 0) ; "borrow")]
    fn reverse_sub_sets_not_borrow(vx: u8, vy: u8) -> (u8, u8) {
        let quirks = Quirks::chip8();
        let mut machine = Machine::new(&quirks);
        machine.registers[1] = vx;
        machine.registers[2] = vy;
        exec(&mut machine, &quirks, Instruction::SetVxVyMinusVx(Reg(1), Reg(2)));
        (machine.registers[1], machine.registers[VF])
    }

    #[test]
    fn flag_wins_when_vf_is_the_destination() {
        let quirks = Quirks::chip8();
        let mut machine = Machine::new(&quirks);
        machine.registers[VF] = 200;
        machine.registers[1] = 100;
        exec(&mut machine, &quirks, Instruction::IncRegByReg(Reg(0xF), Reg(1)));
        assert_eq!(machine.registers[VF], 1);
    }

    #[test_case(Instruction::DecRegByReg(Reg(0xF), Reg(1)), false, 5, 10 => 0 ; "sub borrows")]
    #[test_case(Instruction::SetVxVyMinusVx(Reg(0xF), Reg(1)), false, 10, 5 => 0 ; "reverse sub borrows")]
    #[test_case(Instruction::BitshiftRight(Reg(0xF), Reg(1)), true, 0x81, 0b10 => 0 ; "right from vy")]
    #[test_case(Instruction::BitshiftRight(Reg(0xF), Reg(1)), false, 0x81, 0b10 => 1 ; "right in place")]
    #[test_case(Instruction::BitshiftLeft(Reg(0xF), Reg(1)), true, 0x81, 0x01 => 0 ; "left from vy")]
    #[test_case(Instruction::BitshiftLeft(Reg(0xF), Reg(1)), false, 0x81, 0x01 => 1 ; "left in place")]
    fn flag_overwrites_result_in_vf(instruction: Instruction, shift_uses_vy: bool, vf: u8, v1: u8) -> u8 {
        let quirks = Quirks::chip8().with_shift_uses_vy(shift_uses_vy);
        let mut machine = Machine::new(&quirks);
        machine.registers[VF] = vf;
        machine.registers[1] = v1;
        exec(&mut machine, &quirks, instruction);
        machine.registers[VF]
    }

    #[test]
    fn add_const_wraps_and_leaves_flag() {
        let quirks = Quirks::chip8();
        let mut machine = Machine::new(&quirks);
        machine.registers[3] = 250;
        machine.registers[VF] = 9;
        exec(&mut machine, &quirks, Instruction::IncRegByConst(Reg(3), Const(10)));
        assert_eq!(machine.registers[3], 4);
        assert_eq!(machine.registers[VF], 9);
    }

    #[test_case(true => 0 ; "flag cleared")]
    #[test_case(false => 9 ; "flag kept")]
    fn bitwise_ops_clear_flag_quirk(clear: bool) -> u8 {
        let quirks = Quirks::chip8().with_bitwise_ops_clear_flag(clear);
        let mut machine = Machine::new(&quirks);
        machine.registers[1] = 0b1100;
        machine.registers[2] = 0b1010;
        machine.registers[VF] = 9;
        exec(&mut machine, &quirks, Instruction::BitwiseXor(Reg(1), Reg(2)));
        assert_eq!(machine.registers[1], 0b0110);
        machine.registers[VF]
    }

    #[test]
    fn bitwise_ops_compute() {
        let quirks = Quirks::super_chip();
        let mut machine = Machine::new(&quirks);
        machine.registers[1] = 0b1100;
        machine.registers[2] = 0b1010;
        exec(&mut machine, &quirks, Instruction::BitwiseOr(Reg(1), Reg(2)));
        assert_eq!(machine.registers[1], 0b1110);
        exec(&mut machine, &quirks, Instruction::BitwiseAnd(Reg(1), Reg(2)));
        assert_eq!(machine.registers[1], 0b1010);
    }

    #[test_case(true, Instruction::BitshiftRight(Reg(1), Reg(2)) => (0b0100_0000, 1) ; "right from vy")]
    #[test_case(false, Instruction::BitshiftRight(Reg(1), Reg(2)) => (0b0000_0010, 0) ; "right in place")]
    #[test_case(true, Instruction::BitshiftLeft(Reg(1), Reg(2)) => (0b0000_0010, 1) ; "left from vy")]
    #[test_case(false, Instruction::BitshiftLeft(Reg(1), Reg(2)) => (0b0000_1000, 0) ; "left in place")]
    fn shift_quirk(uses_vy: bool, instruction: Instruction) -> (u8, u8) {
        let quirks = Quirks::chip8().with_shift_uses_vy(uses_vy);
        let mut machine = Machine::new(&quirks);
        machine.registers[1] = 0b0000_0100;
        machine.registers[2] = 0b1000_0001;
        exec(&mut machine, &quirks, instruction);
        (machine.registers[1], machine.registers[VF])
    }

    #[test_case(false => 0x310 ; "offset from v0")]
    #[test_case(true => 0x320 ; "offset from vx")]
    fn jump_offset_quirk(uses_vx: bool) -> u16 {
        let quirks = Quirks::chip8().with_jump_offset_uses_vx(uses_vx);
        let mut machine = Machine::new(&quirks);
        machine.registers[0] = 0x10;
        machine.registers[3] = 0x20;
        exec(&mut machine, &quirks, Instruction::JumpWithOffset(Addr(0x300)));
        machine.program_counter
    }

    #[test]
    fn jump_offset_stays_in_memory() {
        let quirks = Quirks::chip8();
        let mut machine = Machine::new(&quirks);
        machine.registers[0] = 0xFF;
        exec(&mut machine, &quirks, Instruction::JumpWithOffset(Addr(0xFFF)));
        assert_eq!(machine.program_counter, 0x0FE);
    }

    #[test_case(true => 0x304 ; "index moves past last register")]
    #[test_case(false => 0x300 ; "index is kept")]
    fn load_store_quirk(increments: bool) -> u16 {
        let quirks = Quirks::chip8().with_load_store_increments_index(increments);
        let mut machine = Machine::new(&quirks);
        machine.registers[..4].copy_from_slice(&[1, 2, 3, 4]);
        machine.i = 0x300;
        exec(&mut machine, &quirks, Instruction::RegDump(Reg(3)));
        assert_eq!(&machine.memory[0x300..0x305], &[1, 2, 3, 4, 0]);

        machine.registers = [0; 16];
        machine.i = 0x300;
        exec(&mut machine, &quirks, Instruction::RegLoad(Reg(3)));
        assert_eq!(&machine.registers[..5], &[1, 2, 3, 4, 0]);
        machine.i
    }

    #[test]
    fn bcd_is_stored_at_index() {
        let quirks = Quirks::chip8();
        let mut machine = Machine::new(&quirks);
        machine.registers[5] = 157;
        machine.i = 0x400;
        exec(&mut machine, &quirks, Instruction::SetIToBcdOfReg(Reg(5)));
        assert_eq!(&machine.memory[0x400..0x403], &[1, 5, 7]);
        assert_eq!(machine.i, 0x400);
    }

    #[test_case(true, 0x0FFE, 2 => (0x1000, 1) ; "overflow sets flag")]
    #[test_case(true, 0x0FFE, 1 => (0x0FFF, 0) ; "in range clears flag")]
    #[test_case(false, 0x0FFE, 2 => (0x1000, 7) ; "flag untouched")]
    fn add_to_index(flag_quirk: bool, i: u16, vx: u8) -> (u16, u8) {
        let quirks = Quirks::chip8().with_index_add_sets_overflow_flag(flag_quirk);
        let mut machine = Machine::new(&quirks);
        machine.i = i;
        machine.registers[2] = vx;
        machine.registers[VF] = 7;
        exec(&mut machine, &quirks, Instruction::AddRegToI(Reg(2)));
        (machine.i, machine.registers[VF])
    }

    #[test]
    fn font_addresses() {
        let quirks = Quirks::super_chip();
        let mut machine = Machine::new(&quirks);
        machine.registers[1] = 0xA;
        exec(&mut machine, &quirks, Instruction::SetIToSpriteAddrVx(Reg(1)));
        assert_eq!(machine.i, 0x50 + 50);
        assert_eq!(machine.read(machine.i), 0xF0);
        machine.registers[1] = 2;
        exec(&mut machine, &quirks, Instruction::SetIToBigSpriteAddrVx(Reg(1)));
        assert_eq!(machine.i, 0xA0 + 20);
        assert_eq!(machine.read(machine.i), 0x3E);
    }

    #[test]
    fn random_is_masked() {
        let quirks = Quirks::chip8();
        let mut machine = Machine::new(&quirks);
        exec(&mut machine, &quirks, Instruction::SetVxRand(Reg(4), Const(0x3C)));
        assert_eq!(machine.registers[4], 0x3C);
        exec(&mut machine, &quirks, Instruction::SetVxRand(Reg(4), Const(0)));
        assert_eq!(machine.registers[4], 0);
    }

    #[test]
    fn timers_are_set_and_read() {
        let quirks = Quirks::chip8();
        let mut machine = Machine::new(&quirks);
        machine.registers[1] = 30;
        exec(&mut machine, &quirks, Instruction::SetDelayTimerToReg(Reg(1)));
        exec(&mut machine, &quirks, Instruction::SetSoundTimerToReg(Reg(1)));
        assert_eq!(machine.timers.delay, 30);
        assert!(machine.sound_active());
        machine.timers.delay = 12;
        exec(&mut machine, &quirks, Instruction::SetRegToDelayTimer(Reg(2)));
        assert_eq!(machine.registers[2], 12);
    }

    #[test]
    fn drawing_same_sprite_twice_erases_and_collides() {
        let quirks = Quirks::chip8();
        let mut machine = machine_with(&quirks, &[
            0xA20A, // I = 0x20A, the sprite below
            0xD011, // draw 1 row at (V0, V1)
            0xD011, // and again
            0x1206, // loop
            0x0000,
            0xF000, // sprite byte 0xF0 at 0x20A
        ]);

        run(&mut machine, &quirks, 2);
        assert_eq!(machine.registers[VF], 0);
        assert_eq!(machine.display.lit_count(), 4);
        assert!(machine.take_redraw());

        run(&mut machine, &quirks, 1);
        assert_eq!(machine.registers[VF], 1);
        assert_eq!(machine.display.lit_count(), 0);
        assert!(machine.take_redraw());
    }

    #[test]
    fn draw_clips_or_wraps_per_quirk() {
        for &wrap in [false, true].iter() {
            let quirks = Quirks::chip8().with_sprites_wrap(wrap);
            let mut machine = Machine::new(&quirks);
            machine.memory[0x300] = 0xFF;
            machine.i = 0x300;
            machine.registers[0] = 60;
            exec(&mut machine, &quirks, Instruction::Draw(Reg(0), Reg(1), Const(1)));
            assert_eq!(machine.display.get(0, 0), wrap);
            assert!(machine.display.get(63, 0));
        }
    }

    #[test]
    fn draw_large_uses_sixteen_by_sixteen_sprites() {
        let quirks = Quirks::super_chip();
        let mut machine = Machine::new(&quirks);
        exec(&mut machine, &quirks, Instruction::HighRes);
        for byte in machine.memory[0x300..0x320].iter_mut() {
            *byte = 0xFF;
        }
        machine.i = 0x300;
        exec(&mut machine, &quirks, Instruction::DrawLarge(Reg(0), Reg(1)));
        assert_eq!(machine.display.lit_count(), 256);
        assert!(machine.display.get(15, 15));
        assert_eq!(machine.registers[VF], 0);
    }

    #[test]
    fn resolution_switch_keeps_pixels_and_timers() {
        let quirks = Quirks::super_chip();
        let mut machine = Machine::new(&quirks);
        machine.memory[0x300] = 0x80;
        machine.i = 0x300;
        machine.timers.delay = 10;
        exec(&mut machine, &quirks, Instruction::Draw(Reg(0), Reg(0), Const(1)));
        exec(&mut machine, &quirks, Instruction::HighRes);
        assert_eq!(machine.display.resolution(), Resolution::Extended);
        assert!(machine.display.get(0, 0));
        assert_eq!(machine.timers.delay, 10);
        exec(&mut machine, &quirks, Instruction::LowRes);
        assert_eq!(machine.display.resolution(), Resolution::Standard);
        assert!(machine.display.get(0, 0));
    }

    #[test]
    fn scrolls_request_redraw() {
        let quirks = Quirks::xo_chip();
        let mut machine = Machine::new(&quirks);
        machine.memory[0x300] = 0x80;
        machine.i = 0x300;
        exec(&mut machine, &quirks, Instruction::Draw(Reg(0), Reg(0), Const(1)));
        machine.take_redraw();

        exec(&mut machine, &quirks, Instruction::ScrollDown(Const(2)));
        assert!(machine.take_redraw());
        exec(&mut machine, &quirks, Instruction::ScrollRight);
        assert!(machine.take_redraw());
        assert!(machine.display.get(4, 2));
        exec(&mut machine, &quirks, Instruction::ScrollUp(Const(1)));
        exec(&mut machine, &quirks, Instruction::ScrollLeft);
        assert!(machine.take_redraw());
        assert!(machine.display.get(0, 1));
        assert_eq!(machine.display.lit_count(), 1);
    }

    #[test]
    fn exit_requests_halt() {
        let quirks = Quirks::super_chip();
        let mut machine = machine_with(&quirks, &[0x00FD]);
        assert_eq!(run(&mut machine, &quirks, 1), vec![StepResult::HaltRequested]);
        assert!(!StepResult::HaltRequested.is_fatal());
    }

    #[test]
    fn rpl_flags_round_trip_and_clamp() {
        let quirks = Quirks::super_chip();
        let mut machine = Machine::new(&quirks);
        for (n, reg) in machine.registers.iter_mut().enumerate() {
            *reg = n as u8 + 1;
        }
        exec(&mut machine, &quirks, Instruction::RplDump(Reg(0xF)));
        assert_eq!(machine.rpl_flags, [1, 2, 3, 4, 5, 6, 7, 8]);

        machine.registers = [0; 16];
        exec(&mut machine, &quirks, Instruction::RplLoad(Reg(2)));
        assert_eq!(&machine.registers[..4], &[1, 2, 3, 0]);
    }

    #[test]
    fn key_skips_read_keypad() {
        let quirks = Quirks::chip8();
        let mut machine = Machine::new(&quirks);
        machine.registers[1] = 0xB;

        exec(&mut machine, &quirks, Instruction::IfKeyEqVx(Reg(1)));
        assert_eq!(machine.program_counter, 0x200);
        exec(&mut machine, &quirks, Instruction::IfKeyNeqVx(Reg(1)));
        assert_eq!(machine.program_counter, 0x202);

        machine.keypad.press(0xB);
        exec(&mut machine, &quirks, Instruction::IfKeyEqVx(Reg(1)));
        assert_eq!(machine.program_counter, 0x204);
        exec(&mut machine, &quirks, Instruction::IfKeyNeqVx(Reg(1)));
        assert_eq!(machine.program_counter, 0x204);
    }

    #[test]
    fn await_key_repeats_until_pressed() {
        let quirks = Quirks::chip8();
        let mut machine = machine_with(&quirks, &[0xF30A, 0x6101]);

        for _ in 0..5 {
            assert_eq!(run(&mut machine, &quirks, 1), vec![StepResult::Ok]);
            assert_eq!(machine.program_counter, PC_START);
            assert_eq!(machine.registers[3], 0);
        }

        machine.keypad.press(0x7);
        run(&mut machine, &quirks, 1);
        assert_eq!(machine.program_counter, PC_START + 2);
        assert_eq!(machine.registers[3], 0x7);

        run(&mut machine, &quirks, 1);
        assert_eq!(machine.registers[1], 1);
    }

    proptest! {
        #[test]
        fn add_flag_is_carry(vx: u8, vy: u8) {
            let quirks = Quirks::chip8();
            let mut machine = Machine::new(&quirks);
            machine.registers[0] = vx;
            machine.registers[1] = vy;
            exec(&mut machine, &quirks, Instruction::IncRegByReg(Reg(0), Reg(1)));
            prop_assert_eq!(machine.registers[0], ((vx as u16 + vy as u16) % 256) as u8);
            prop_assert_eq!(machine.registers[VF] == 1, vx as u16 + vy as u16 > 255);
        }

        #[test]
        fn sub_flag_is_not_borrow(vx: u8, vy: u8) {
            let quirks = Quirks::chip8();
            let mut machine = Machine::new(&quirks);
            machine.registers[0] = vx;
            machine.registers[1] = vy;
            exec(&mut machine, &quirks, Instruction::DecRegByReg(Reg(0), Reg(1)));
            prop_assert_eq!(machine.registers[0], vx.wrapping_sub(vy));
            prop_assert_eq!(machine.registers[VF] == 1, vx >= vy);
        }

        #[test]
        fn any_word_steps_without_panicking(word: u16, v: u8) {
            for quirks in [Quirks::chip8(), Quirks::super_chip(), Quirks::xo_chip()].iter() {
                let mut machine = machine_with(quirks, &[word]);
                machine.registers = [v; 16];
                machine.i = 0xFFF;
                let result = run(&mut machine, quirks, 1)[0];
                if let StepResult::UndefinedOpcode(undefined) = result {
                    prop_assert_eq!(undefined, word);
                    prop_assert_eq!(machine.program_counter, PC_START + 2);
                }
            }
        }
    }
}
