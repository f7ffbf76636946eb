//! An interpreter for the classic 8-bit hex-keypad virtual machine: 4KB of
//! memory, sixteen 8-bit registers, a 64x32 monochrome display and two
//! countdown timers.
//!
//! [`Interpreter::step`] runs exactly one instruction. Reading program images,
//! drawing the screen, feeding keys, beeping and pacing the steps are left to
//! the caller.

pub mod consts;
pub mod display;
pub mod error;
pub mod interpreter;
pub mod keypad;
pub mod loader;
pub mod parser;
pub mod state;

pub use display::Display;
pub use error::{DecodeError, LoadError, StackError, StepError};
pub use interpreter::{Interpreter, StepOutcome};
pub use keypad::Keypad;
pub use parser::{Instruction, ListingLine, disassemble};
pub use state::State;
