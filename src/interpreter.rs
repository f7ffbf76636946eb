use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::consts::{ADDRESS_MASK, FLAG_REGISTER, FONT_ADDRESS, FONT_GLYPH_SIZE};
use crate::display::Display;
use crate::error::{LoadError, StackError, StepError};
use crate::keypad::Keypad;
use crate::parser::Instruction;
use crate::state::State;

/// What a successful step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub instruction: Instruction,
    /// The step was a key wait with no key held: PC did not move and the same
    /// instruction runs again next step.
    pub waiting: bool,
    /// The sound timer went from 1 to 0 during this step's timer tick.
    pub tone: bool,
}

/// How PC moves once an instruction has executed.
enum Flow {
    Next,
    Skip,
    Jump(u16),
    Wait,
}

impl Flow {
    fn skip_if(condition: bool) -> Self {
        if condition { Flow::Skip } else { Flow::Next }
    }
}

/// The machine state plus its random source. `step` is the whole of the
/// interpreter; loading, rendering, input, sound and pacing are up to the caller.
pub struct Interpreter {
    state: State,
    rng: StdRng,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Same seed, same program, same inputs: same run.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Interpreter {
            state: State::new(),
            rng,
        }
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub fn load(&mut self, program: &[u8]) -> Result<(), LoadError> {
        self.state.load(program)
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn display(&self) -> &Display {
        &self.state.display
    }

    /// Checks and clears the redraw flag
    pub fn take_redraw(&mut self) -> bool {
        self.state.display.take_redraw()
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.state.keypad
    }

    /// Moves PC past the current word without executing it.
    pub fn skip_instruction(&mut self) {
        self.state.pc = self.state.pc.wrapping_add(2) & ADDRESS_MASK;
    }

    /// Fetches, decodes and executes one instruction, then ticks the timers.
    ///
    /// On error nothing has changed, timers included.
    pub fn step(&mut self) -> Result<StepOutcome, StepError> {
        let pc = self.state.pc;
        let opcode = self.state.read_word(pc);
        let instruction =
            Instruction::from_opcode(opcode).map_err(|source| StepError::Decode { pc, source })?;
        trace!("{pc:03X}: {opcode:04X}  {instruction}");

        let flow = self
            .execute(instruction)
            .map_err(|source| StepError::Stack { pc, source })?;

        let waiting = match flow {
            Flow::Next => {
                self.state.pc = pc.wrapping_add(2) & ADDRESS_MASK;
                false
            }
            Flow::Skip => {
                self.state.pc = pc.wrapping_add(4) & ADDRESS_MASK;
                false
            }
            Flow::Jump(address) => {
                self.state.pc = address & ADDRESS_MASK;
                false
            }
            Flow::Wait => true,
        };

        let tone = self.update_timers();
        Ok(StepOutcome {
            instruction,
            waiting,
            tone,
        })
    }

    fn execute(&mut self, instruction: Instruction) -> Result<Flow, StackError> {
        let state = &mut self.state;
        let v = &mut state.registers;

        match instruction {
            Instruction::ClearScreen => {
                state.display.clear();
            }
            Instruction::Return => {
                let address = state.pop()?;
                return Ok(Flow::Jump(address.wrapping_add(2)));
            }
            Instruction::Jump(address) => return Ok(Flow::Jump(address)),
            Instruction::Call(address) => {
                state.push(state.pc)?;
                return Ok(Flow::Jump(address));
            }
            Instruction::SkipIfEqual(x, value) => return Ok(Flow::skip_if(v[x] == value)),
            Instruction::SkipIfNotEqual(x, value) => return Ok(Flow::skip_if(v[x] != value)),
            Instruction::SkipIfRegistersEqual(x, y) => return Ok(Flow::skip_if(v[x] == v[y])),
            Instruction::LoadByte(x, value) => {
                v[x] = value;
            }
            Instruction::AddByte(x, value) => {
                v[x] = v[x].wrapping_add(value);
            }
            Instruction::LoadRegister(x, y) => {
                v[x] = v[y];
            }
            Instruction::Or(x, y) => {
                v[x] |= v[y];
            }
            Instruction::And(x, y) => {
                v[x] &= v[y];
            }
            Instruction::Xor(x, y) => {
                v[x] ^= v[y];
            }
            // VF is written after VX in all of the flag-setting ops, so the
            // flag wins when X is F.
            Instruction::AddRegisters(x, y) => {
                let (sum, carry) = v[x].overflowing_add(v[y]);
                v[x] = sum;
                v[FLAG_REGISTER] = carry as u8;
            }
            Instruction::Subtract(x, y) => {
                let no_borrow = v[x] > v[y];
                v[x] = v[x].wrapping_sub(v[y]);
                v[FLAG_REGISTER] = no_borrow as u8;
            }
            Instruction::ShiftRight(x) => {
                let bit = v[x] & 1;
                v[x] >>= 1;
                v[FLAG_REGISTER] = bit;
            }
            Instruction::SubtractReversed(x, y) => {
                let no_borrow = v[y] > v[x];
                v[x] = v[y].wrapping_sub(v[x]);
                v[FLAG_REGISTER] = no_borrow as u8;
            }
            Instruction::ShiftLeft(x) => {
                let bit = (v[x] >> 7) & 1;
                v[x] <<= 1;
                v[FLAG_REGISTER] = bit;
            }
            Instruction::SkipIfRegistersNotEqual(x, y) => {
                return Ok(Flow::skip_if(v[x] != v[y]));
            }
            Instruction::LoadIndex(address) => {
                state.index_register = address;
            }
            Instruction::JumpOffset(address) => {
                return Ok(Flow::Jump(address.wrapping_add(v[0] as u16)));
            }
            Instruction::Random(x, mask) => {
                v[x] = self.rng.random::<u8>() & mask;
            }
            Instruction::Draw(x, y, rows) => {
                let i = state.index_register;
                let ram = &state.ram;
                let sprite: [u8; 15] = std::array::from_fn(|row| {
                    ram[(i.wrapping_add(row as u16) & ADDRESS_MASK) as usize]
                });
                let collision = state.display.draw(v[x], v[y], &sprite[..rows as usize]);
                v[FLAG_REGISTER] = collision as u8;
            }
            Instruction::SkipIfKeyPressed(x) => {
                return Ok(Flow::skip_if(state.keypad.is_pressed(v[x])));
            }
            Instruction::SkipIfKeyNotPressed(x) => {
                return Ok(Flow::skip_if(!state.keypad.is_pressed(v[x])));
            }
            Instruction::LoadDelayTimer(x) => {
                v[x] = state.delay_timer;
            }
            Instruction::WaitForKey(x) => match state.keypad.last_pressed() {
                Some(key) => v[x] = key,
                None => return Ok(Flow::Wait),
            },
            Instruction::SetDelayTimer(x) => {
                state.delay_timer = v[x];
            }
            Instruction::SetSoundTimer(x) => {
                state.sound_timer = v[x];
            }
            Instruction::AddIndex(x) => {
                let sum = (state.index_register & ADDRESS_MASK) + v[x] as u16;
                state.index_register = sum & ADDRESS_MASK;
                v[FLAG_REGISTER] = (sum > ADDRESS_MASK) as u8;
            }
            Instruction::LoadFont(x) => {
                state.index_register = FONT_ADDRESS + v[x] as u16 * FONT_GLYPH_SIZE;
            }
            Instruction::StoreBcd(x) => {
                let num = v[x];
                let i = state.index_register;
                state.write(i, num / 100);
                state.write(i.wrapping_add(1), (num / 10) % 10);
                state.write(i.wrapping_add(2), num % 10);
            }
            Instruction::StoreRegisters(x) => {
                let i = state.index_register;
                for r in 0..=x {
                    state.ram[(i.wrapping_add(r as u16) & ADDRESS_MASK) as usize] = v[r];
                }
                state.index_register = i.wrapping_add(x as u16 + 1) & ADDRESS_MASK;
            }
            Instruction::LoadRegisters(x) => {
                let i = state.index_register;
                for r in 0..=x {
                    v[r] = state.ram[(i.wrapping_add(r as u16) & ADDRESS_MASK) as usize];
                }
                state.index_register = i.wrapping_add(x as u16 + 1) & ADDRESS_MASK;
            }
        }

        Ok(Flow::Next)
    }

    /// One decrement per step. Returns true when the sound timer just ran out.
    fn update_timers(&mut self) -> bool {
        if self.state.delay_timer > 0 {
            self.state.delay_timer -= 1;
        }

        let mut tone = false;
        if self.state.sound_timer > 0 {
            tone = self.state.sound_timer == 1;
            self.state.sound_timer -= 1;
        }
        tone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpreter_with(program: &[u8]) -> Interpreter {
        let mut intr = Interpreter::with_seed(7);
        intr.load(program).unwrap();
        intr
    }

    #[test]
    fn op_00e0() {
        let mut intr = interpreter_with(&[0x00, 0xE0]);
        intr.state_mut().display.draw(0, 0, &[0xFF]);
        intr.take_redraw();
        intr.step().unwrap();
        assert!(intr.display().screen().iter().flatten().all(|p| !p));
        assert!(intr.take_redraw());
        assert_eq!(intr.state().pc, 0x202);
    }

    #[test]
    fn op_2nnn_and_00ee() {
        // 200: CALL 0x206 / 202: JP 0x202 / 206: RET
        let mut intr = interpreter_with(&[0x22, 0x06, 0x12, 0x02, 0x00, 0x00, 0x00, 0xEE]);
        intr.step().unwrap();
        assert_eq!(intr.state().pc, 0x206);
        assert_eq!(intr.state().sp, 1);
        assert_eq!(intr.state().stack[0], 0x200);
        intr.step().unwrap();
        assert_eq!(intr.state().pc, 0x202);
        assert_eq!(intr.state().sp, 0);
    }

    #[test]
    fn op_00ee_underflow_leaves_state_alone() {
        let mut intr = interpreter_with(&[0x00, 0xEE]);
        intr.state_mut().delay_timer = 3;
        let before = intr.state().clone();
        let err = intr.step().unwrap_err();
        assert_eq!(
            err,
            StepError::Stack {
                pc: 0x200,
                source: StackError::Underflow
            }
        );
        assert_eq!(intr.state(), &before);
    }

    #[test]
    fn op_2nnn_overflow() {
        // calls itself forever
        let mut intr = interpreter_with(&[0x22, 0x00]);
        for _ in 0..16 {
            intr.step().unwrap();
        }
        let err = intr.step().unwrap_err();
        assert_eq!(
            err,
            StepError::Stack {
                pc: 0x200,
                source: StackError::Overflow
            }
        );
        assert_eq!(intr.state().sp, 16);
    }

    #[test]
    fn op_3xnn_and_4xnn() {
        let mut intr = interpreter_with(&[0x35, 0x10, 0x00, 0x00, 0x45, 0x10]);
        intr.state_mut().registers[5] = 0x10;
        intr.step().unwrap();
        assert_eq!(intr.state().pc, 0x204);
        intr.step().unwrap();
        assert_eq!(intr.state().pc, 0x206);
    }

    #[test]
    fn op_exa1_skips_when_key_is_up() {
        let mut intr = interpreter_with(&[0xE2, 0xA1, 0x00, 0x00, 0xE2, 0x9E]);
        intr.state_mut().registers[2] = 0xB;
        intr.step().unwrap();
        assert_eq!(intr.state().pc, 0x204);
        intr.step().unwrap();
        assert_eq!(intr.state().pc, 0x206);
    }

    #[test]
    fn out_of_range_index_wraps_instead_of_overflowing() {
        // LD B, V0 / LD [I], V1 / LD V1, [I] / DRW V0, V0, 2 / ADD I, V0
        let program = [0xF0, 0x33, 0xF1, 0x55, 0xF1, 0x65, 0xD0, 0x02, 0xF0, 0x1E];
        for pc in (0x200..0x20A).step_by(2) {
            let mut intr = interpreter_with(&program);
            intr.state_mut().pc = pc;
            intr.state_mut().index_register = 0xFFFF;
            intr.state_mut().registers[0] = 0xFF;
            intr.state_mut().registers[1] = 0x12;
            intr.step().unwrap();
            assert!(intr.state().index_register <= ADDRESS_MASK);
        }
    }

    #[test]
    fn op_7xnn_leaves_flag_alone() {
        let mut intr = interpreter_with(&[0x78, 0x11]);
        intr.state_mut().registers[8] = 0xF0;
        intr.state_mut().registers[0xF] = 0xA;
        intr.step().unwrap();
        assert_eq!(intr.state().registers[8], 0x01);
        assert_eq!(intr.state().registers[0xF], 0xA);
    }

    #[test]
    fn op_8xy6_and_8xye() {
        let mut intr = interpreter_with(&[0x81, 0x06, 0x82, 0x0E]);
        intr.state_mut().registers[1] = 0b0000_0011;
        intr.state_mut().registers[2] = 0b1000_0001;
        intr.step().unwrap();
        assert_eq!(intr.state().registers[1], 0b0000_0001);
        assert_eq!(intr.state().registers[0xF], 1);
        intr.step().unwrap();
        assert_eq!(intr.state().registers[2], 0b0000_0010);
        assert_eq!(intr.state().registers[0xF], 1);
    }

    #[test]
    fn op_8xy7() {
        let mut intr = interpreter_with(&[0x81, 0x27]);
        intr.state_mut().registers[1] = 10;
        intr.state_mut().registers[2] = 15;
        intr.step().unwrap();
        assert_eq!(intr.state().registers[1], 5);
        assert_eq!(intr.state().registers[0xF], 1);
    }

    #[test]
    fn flag_register_as_destination_keeps_flag() {
        // ADD VF, V1 with a carry: VF ends as the carry, not the sum
        let mut intr = interpreter_with(&[0x8F, 0x14]);
        intr.state_mut().registers[0xF] = 0xFF;
        intr.state_mut().registers[1] = 0x02;
        intr.step().unwrap();
        assert_eq!(intr.state().registers[0xF], 1);
    }

    #[test]
    fn op_bnnn_masks_to_twelve_bits() {
        let mut intr = interpreter_with(&[0xBF, 0xFE]);
        intr.state_mut().registers[0] = 0x04;
        intr.step().unwrap();
        assert_eq!(intr.state().pc, 0x002);
    }

    #[test]
    fn op_cxnn_respects_mask() {
        let mut intr = interpreter_with(&[0xC3, 0x0F, 0xC4, 0x00]);
        intr.step().unwrap();
        intr.step().unwrap();
        assert_eq!(intr.state().registers[3] & 0xF0, 0);
        assert_eq!(intr.state().registers[4], 0);
    }

    #[test]
    fn op_cxnn_is_reproducible_with_seed() {
        let mut a = interpreter_with(&[0xC0, 0xFF]);
        let mut b = interpreter_with(&[0xC0, 0xFF]);
        a.step().unwrap();
        b.step().unwrap();
        assert_eq!(a.state().registers[0], b.state().registers[0]);
    }

    #[test]
    fn op_dxyn_draws_font_glyph() {
        // LD I, 0x000 (glyph 0) / DRW V0, V1, 5
        let mut intr = interpreter_with(&[0xA0, 0x00, 0xD0, 0x15]);
        intr.state_mut().registers[0] = 8;
        intr.state_mut().registers[1] = 4;
        intr.step().unwrap();
        intr.step().unwrap();
        let display = intr.display();
        assert!((8..12).all(|x| display.pixel(x, 4)));
        assert!(display.pixel(8, 5) && !display.pixel(9, 5) && display.pixel(11, 5));
        assert_eq!(intr.state().registers[0xF], 0);
    }

    #[test]
    fn op_ex9e_and_exa1() {
        let mut intr = interpreter_with(&[0xE2, 0x9E, 0x00, 0x00, 0xE2, 0xA1]);
        intr.state_mut().registers[2] = 0xB;
        intr.keypad_mut().press(0xB);
        intr.step().unwrap();
        assert_eq!(intr.state().pc, 0x204);
        intr.step().unwrap();
        assert_eq!(intr.state().pc, 0x206);
    }

    #[test]
    fn op_fx07_fx15_fx18() {
        // LD V1, 0x09 / LD DT, V1 / LD ST, V1 / LD V2, DT
        let mut intr = interpreter_with(&[0x61, 0x09, 0xF1, 0x15, 0xF1, 0x18, 0xF2, 0x07]);
        for _ in 0..4 {
            intr.step().unwrap();
        }
        // DT set on step 2, ticked on steps 2 and 3, read on step 4
        assert_eq!(intr.state().registers[2], 7);
        assert_eq!(intr.state().delay_timer, 6);
        assert_eq!(intr.state().sound_timer, 7);
    }

    #[test]
    fn op_fx1e_sets_overflow_flag() {
        let mut intr = interpreter_with(&[0xF1, 0x1E, 0xF1, 0x1E]);
        intr.state_mut().index_register = 0xFFE;
        intr.state_mut().registers[1] = 1;
        intr.step().unwrap();
        assert_eq!(intr.state().index_register, 0xFFF);
        assert_eq!(intr.state().registers[0xF], 0);
        intr.step().unwrap();
        assert_eq!(intr.state().index_register, 0x000);
        assert_eq!(intr.state().registers[0xF], 1);
    }

    #[test]
    fn op_fx29() {
        let mut intr = interpreter_with(&[0xF3, 0x29]);
        intr.state_mut().registers[3] = 0xA;
        intr.step().unwrap();
        assert_eq!(intr.state().index_register, 50);
    }

    #[test]
    fn op_fx33() {
        let mut intr = interpreter_with(&[0xF0, 0x33]);
        intr.state_mut().registers[0] = 254;
        intr.state_mut().index_register = 0x300;
        intr.step().unwrap();
        assert_eq!(&intr.state().ram[0x300..0x303], &[2, 5, 4]);
    }

    #[test]
    fn unknown_opcode_keeps_pc() {
        let mut intr = interpreter_with(&[0xFF, 0xFF]);
        let err = intr.step().unwrap_err();
        assert_eq!(
            err,
            StepError::Decode {
                pc: 0x200,
                source: crate::error::DecodeError::UnknownOpcode(0xFFFF)
            }
        );
        assert_eq!(intr.state().pc, 0x200);
        intr.skip_instruction();
        assert_eq!(intr.state().pc, 0x202);
    }

    #[test]
    fn tone_fires_once_on_last_tick() {
        let mut intr = interpreter_with(&[0x12, 0x00]);
        intr.state_mut().sound_timer = 2;
        assert!(!intr.step().unwrap().tone);
        assert!(intr.step().unwrap().tone);
        assert!(!intr.step().unwrap().tone);
        assert_eq!(intr.state().sound_timer, 0);
    }
}
