use std::path::PathBuf;

use clap::Parser;

/// What the driver does when a step fails.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop and report the error.
    Halt,
    /// Log a warning, step over the offending word and carry on.
    Skip,
}

/// Runs a program image in the terminal.
///
/// Keys: 1 2 3 4 / q w e r / a s d f / z x c v. Esc quits. Logs go to
/// stderr, so redirect it (`2>trace.log`) when raising RUST_LOG.
#[derive(Parser, Debug, Clone)]
#[command(name = "chip8vm", version)]
pub struct Config {
    /// Program image, loaded at 0x200.
    #[arg(value_name = "ROM")]
    pub rom: PathBuf,

    /// Instructions executed per second. Timers tick once per instruction.
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u32).range(1..=100_000))]
    pub steps_per_second: u32,

    /// Seed for the random instruction, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Terminal columns per display pixel.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u16).range(1..=4))]
    pub scale: u16,

    #[arg(long, value_enum, default_value_t = ErrorPolicy::Halt)]
    pub on_error: ErrorPolicy,

    /// Print a listing of the program and exit without running it.
    #[arg(long)]
    pub disassemble: bool,
}
