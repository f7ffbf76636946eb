use log::debug;

use crate::consts::{
    ADDRESS_MASK, FONT_ADDRESS, FONT_DATA, INITIAL_PC, MAX_PROGRAM_SIZE, REGISTER_COUNT,
    STACK_DEPTH, TOTAL_RAM_SIZE,
};
use crate::display::Display;
use crate::error::{LoadError, StackError};
use crate::keypad::Keypad;

/// Complete machine state. Every instance is independent; nothing is global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub ram: [u8; TOTAL_RAM_SIZE],
    pub registers: [u8; REGISTER_COUNT],
    pub index_register: u16,
    pub pc: u16,
    pub stack: [u16; STACK_DEPTH],
    pub sp: usize,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub display: Display,
    pub keypad: Keypad,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    pub fn new() -> Self {
        let mut state = State {
            ram: [0; TOTAL_RAM_SIZE],
            registers: [0; REGISTER_COUNT],
            index_register: 0,
            pc: INITIAL_PC,
            stack: [0; STACK_DEPTH],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            display: Display::new(),
            keypad: Keypad::new(),
        };
        state.reset();
        state
    }

    /// Zeroes the whole machine, copies the font to low memory and flags the
    /// display for a redraw. Calling it twice is the same as calling it once.
    pub fn reset(&mut self) {
        self.ram = [0; TOTAL_RAM_SIZE];
        let font = FONT_ADDRESS as usize;
        self.ram[font..font + FONT_DATA.len()].copy_from_slice(&FONT_DATA);

        self.registers = [0; REGISTER_COUNT];
        self.index_register = 0;
        self.pc = INITIAL_PC;
        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.display.clear();
        self.keypad.release_all();
        debug!("machine reset");
    }

    /// Copies a program image to 0x200. Registers and PC are left alone, so
    /// call [`State::reset`] first for a clean start.
    pub fn load(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if program.len() >= MAX_PROGRAM_SIZE {
            return Err(LoadError::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }

        let start = INITIAL_PC as usize;
        self.ram[start..start + program.len()].copy_from_slice(program);
        debug!("loaded program [size: {}]", program.len());
        Ok(())
    }

    pub fn read(&self, address: u16) -> u8 {
        self.ram[(address & ADDRESS_MASK) as usize]
    }

    pub fn write(&mut self, address: u16, value: u8) {
        self.ram[(address & ADDRESS_MASK) as usize] = value;
    }

    /// Big-endian word at `address`; the second byte wraps to 0x000 at the top of memory.
    pub fn read_word(&self, address: u16) -> u16 {
        u16::from_be_bytes([self.read(address), self.read(address.wrapping_add(1))])
    }

    pub fn push(&mut self, address: u16) -> Result<(), StackError> {
        let slot = self.stack.get_mut(self.sp).ok_or(StackError::Overflow)?;
        *slot = address;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, StackError> {
        let top = self.sp.checked_sub(1).ok_or(StackError::Underflow)?;
        let address = *self.stack.get(top).ok_or(StackError::Overflow)?;
        self.sp = top;
        Ok(address)
    }
}
