use std::fmt;

use crate::error::DecodeError;

/// A decoded instruction. Register operands are indexes 0x0..=0xF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0 - clear screen
    ClearScreen,
    /// 00EE - return from subroutine
    Return,
    /// 1NNN - jump to NNN
    Jump(u16),
    /// 2NNN - call subroutine at NNN
    Call(u16),
    /// 3XNN - skip next if VX equals NN
    SkipIfEqual(usize, u8),
    /// 4XNN - skip next if VX does not equal NN
    SkipIfNotEqual(usize, u8),
    /// 5XY0 - skip next if VX equals VY
    SkipIfRegistersEqual(usize, usize),
    /// 6XNN - set VX to NN
    LoadByte(usize, u8),
    /// 7XNN - add NN to VX, VF untouched
    AddByte(usize, u8),
    /// 8XY0 - set VX to VY
    LoadRegister(usize, usize),
    /// 8XY1
    Or(usize, usize),
    /// 8XY2
    And(usize, usize),
    /// 8XY3
    Xor(usize, usize),
    /// 8XY4 - VX += VY, VF = carry
    AddRegisters(usize, usize),
    /// 8XY5 - VX -= VY, VF = 1 when VX > VY
    Subtract(usize, usize),
    /// 8XY6 - VX >>= 1, VF = old bit 0
    ShiftRight(usize),
    /// 8XY7 - VX = VY - VX, VF = 1 when VY > VX
    SubtractReversed(usize, usize),
    /// 8XYE - VX <<= 1, VF = old bit 7
    ShiftLeft(usize),
    /// 9XY0 - skip next if VX does not equal VY
    SkipIfRegistersNotEqual(usize, usize),
    /// ANNN - set I to NNN
    LoadIndex(u16),
    /// BNNN - jump to NNN + V0
    JumpOffset(u16),
    /// CXNN - set VX to a random byte masked with NN
    Random(usize, u8),
    /// DXYN - draw an N-row sprite from I at (VX, VY)
    Draw(usize, usize, u8),
    /// EX9E
    SkipIfKeyPressed(usize),
    /// EXA1
    SkipIfKeyNotPressed(usize),
    /// FX07 - set VX to the delay timer
    LoadDelayTimer(usize),
    /// FX0A - block until a key is held, store it in VX
    WaitForKey(usize),
    /// FX15
    SetDelayTimer(usize),
    /// FX18
    SetSoundTimer(usize),
    /// FX1E - I += VX, VF = 1 past 0xFFF
    AddIndex(usize),
    /// FX29 - point I at the font glyph for VX
    LoadFont(usize),
    /// FX33 - BCD of VX at I, I+1, I+2
    StoreBcd(usize),
    /// FX55 - store V0..=VX at I, then I += X + 1
    StoreRegisters(usize),
    /// FX65 - load V0..=VX from I, then I += X + 1
    LoadRegisters(usize),
}

impl Instruction {
    pub fn from_opcode(opcode: u16) -> Result<Self, DecodeError> {
        let n1 = (opcode >> 12) & 0xF;
        let x = ((opcode >> 8) & 0xF) as usize;
        let y = ((opcode >> 4) & 0xF) as usize;
        let n = (opcode & 0xF) as u8;
        let nn = (opcode & 0xFF) as u8;
        let nnn = opcode & 0x0FFF;

        let instruction = match (n1, x, y, n) {
            (0x0, 0, 0xE, 0x0) => Instruction::ClearScreen,
            (0x0, 0, 0xE, 0xE) => Instruction::Return,
            (0x1, ..) => Instruction::Jump(nnn),
            (0x2, ..) => Instruction::Call(nnn),
            (0x3, ..) => Instruction::SkipIfEqual(x, nn),
            (0x4, ..) => Instruction::SkipIfNotEqual(x, nn),
            (0x5, _, _, 0x0) => Instruction::SkipIfRegistersEqual(x, y),
            (0x6, ..) => Instruction::LoadByte(x, nn),
            (0x7, ..) => Instruction::AddByte(x, nn),
            (0x8, _, _, 0x0) => Instruction::LoadRegister(x, y),
            (0x8, _, _, 0x1) => Instruction::Or(x, y),
            (0x8, _, _, 0x2) => Instruction::And(x, y),
            (0x8, _, _, 0x3) => Instruction::Xor(x, y),
            (0x8, _, _, 0x4) => Instruction::AddRegisters(x, y),
            (0x8, _, _, 0x5) => Instruction::Subtract(x, y),
            (0x8, _, _, 0x6) => Instruction::ShiftRight(x),
            (0x8, _, _, 0x7) => Instruction::SubtractReversed(x, y),
            (0x8, _, _, 0xE) => Instruction::ShiftLeft(x),
            (0x9, _, _, 0x0) => Instruction::SkipIfRegistersNotEqual(x, y),
            (0xA, ..) => Instruction::LoadIndex(nnn),
            (0xB, ..) => Instruction::JumpOffset(nnn),
            (0xC, ..) => Instruction::Random(x, nn),
            (0xD, ..) => Instruction::Draw(x, y, n),
            (0xE, _, 0x9, 0xE) => Instruction::SkipIfKeyPressed(x),
            (0xE, _, 0xA, 0x1) => Instruction::SkipIfKeyNotPressed(x),
            (0xF, _, 0x0, 0x7) => Instruction::LoadDelayTimer(x),
            (0xF, _, 0x0, 0xA) => Instruction::WaitForKey(x),
            (0xF, _, 0x1, 0x5) => Instruction::SetDelayTimer(x),
            (0xF, _, 0x1, 0x8) => Instruction::SetSoundTimer(x),
            (0xF, _, 0x1, 0xE) => Instruction::AddIndex(x),
            (0xF, _, 0x2, 0x9) => Instruction::LoadFont(x),
            (0xF, _, 0x3, 0x3) => Instruction::StoreBcd(x),
            (0xF, _, 0x5, 0x5) => Instruction::StoreRegisters(x),
            (0xF, _, 0x6, 0x5) => Instruction::LoadRegisters(x),
            _ => return Err(DecodeError::UnknownOpcode(opcode)),
        };
        Ok(instruction)
    }
}

/// Conventional assembler mnemonics, used for tracing and `--disassemble`.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(addr) => write!(f, "JP {addr:#05X}"),
            Call(addr) => write!(f, "CALL {addr:#05X}"),
            SkipIfEqual(x, nn) => write!(f, "SE V{x:X}, {nn:#04X}"),
            SkipIfNotEqual(x, nn) => write!(f, "SNE V{x:X}, {nn:#04X}"),
            SkipIfRegistersEqual(x, y) => write!(f, "SE V{x:X}, V{y:X}"),
            LoadByte(x, nn) => write!(f, "LD V{x:X}, {nn:#04X}"),
            AddByte(x, nn) => write!(f, "ADD V{x:X}, {nn:#04X}"),
            LoadRegister(x, y) => write!(f, "LD V{x:X}, V{y:X}"),
            Or(x, y) => write!(f, "OR V{x:X}, V{y:X}"),
            And(x, y) => write!(f, "AND V{x:X}, V{y:X}"),
            Xor(x, y) => write!(f, "XOR V{x:X}, V{y:X}"),
            AddRegisters(x, y) => write!(f, "ADD V{x:X}, V{y:X}"),
            Subtract(x, y) => write!(f, "SUB V{x:X}, V{y:X}"),
            ShiftRight(x) => write!(f, "SHR V{x:X}"),
            SubtractReversed(x, y) => write!(f, "SUBN V{x:X}, V{y:X}"),
            ShiftLeft(x) => write!(f, "SHL V{x:X}"),
            SkipIfRegistersNotEqual(x, y) => write!(f, "SNE V{x:X}, V{y:X}"),
            LoadIndex(addr) => write!(f, "LD I, {addr:#05X}"),
            JumpOffset(addr) => write!(f, "JP V0, {addr:#05X}"),
            Random(x, nn) => write!(f, "RND V{x:X}, {nn:#04X}"),
            Draw(x, y, n) => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            SkipIfKeyPressed(x) => write!(f, "SKP V{x:X}"),
            SkipIfKeyNotPressed(x) => write!(f, "SKNP V{x:X}"),
            LoadDelayTimer(x) => write!(f, "LD V{x:X}, DT"),
            WaitForKey(x) => write!(f, "LD V{x:X}, K"),
            SetDelayTimer(x) => write!(f, "LD DT, V{x:X}"),
            SetSoundTimer(x) => write!(f, "LD ST, V{x:X}"),
            AddIndex(x) => write!(f, "ADD I, V{x:X}"),
            LoadFont(x) => write!(f, "LD F, V{x:X}"),
            StoreBcd(x) => write!(f, "LD B, V{x:X}"),
            StoreRegisters(x) => write!(f, "LD [I], V{x:X}"),
            LoadRegisters(x) => write!(f, "LD V{x:X}, [I]"),
        }
    }
}

/// One line of a program listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingLine {
    pub address: u16,
    pub opcode: u16,
    pub instruction: Result<Instruction, DecodeError>,
}

impl fmt::Display for ListingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X}: {:04X}  ", self.address, self.opcode)?;
        match self.instruction {
            Ok(instruction) => write!(f, "{instruction}"),
            // sprite data and padding land here
            Err(_) => write!(f, "DW {:#06X}", self.opcode),
        }
    }
}

/// Decodes a program image word by word, as it would sit in memory from `origin`.
/// A trailing odd byte is padded with zero.
pub fn disassemble(program: &[u8], origin: u16) -> impl Iterator<Item = ListingLine> + '_ {
    program.chunks(2).enumerate().map(move |(i, word)| {
        let opcode = u16::from_be_bytes([word[0], word.get(1).copied().unwrap_or(0)]);
        ListingLine {
            address: origin.wrapping_add((i as u16).wrapping_mul(2)),
            opcode,
            instruction: Instruction::from_opcode(opcode),
        }
    })
}
