use std::io;

use thiserror::Error;

/// Why a program image was rejected. Memory is untouched in every case.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("program is too large (at least {size} bytes), it must be smaller than {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("program source could not be read")]
    SourceUnavailable(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode {0:#06X}")]
    UnknownOpcode(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("call stack overflow: subroutine nesting exceeds 16 levels")]
    Overflow,

    #[error("call stack underflow: return with an empty call stack")]
    Underflow,
}

/// A step that could not be executed. The machine state is left exactly as it
/// was before the step, so the caller may halt, reset or skip the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("at {pc:#05X}: {source}")]
    Decode { pc: u16, source: DecodeError },

    #[error("at {pc:#05X}: {source}")]
    Stack { pc: u16, source: StackError },
}

impl StepError {
    /// Address of the instruction that failed.
    pub fn pc(&self) -> u16 {
        match *self {
            StepError::Decode { pc, .. } | StepError::Stack { pc, .. } => pc,
        }
    }
}
