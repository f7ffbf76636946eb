use anyhow::Context;
use chip8vm::consts::INITIAL_PC;
use chip8vm::{Interpreter, disassemble, loader};
use clap::Parser;
use log::info;

mod cli;
mod driver;
mod terminal;

use cli::Config;
use driver::Driver;
use terminal::TerminalFrontend;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::parse();

    let program = loader::read_program_file(&config.rom)
        .with_context(|| format!("could not load '{}'", config.rom.display()))?;

    if config.disassemble {
        for line in disassemble(&program, INITIAL_PC) {
            println!("{line}");
        }
        return Ok(());
    }

    let mut interpreter = match config.seed {
        Some(seed) => Interpreter::with_seed(seed),
        None => Interpreter::new(),
    };
    interpreter.reset();
    interpreter.load(&program)?;

    let frontend = TerminalFrontend::new(config.scale).context("could not set up the terminal")?;
    let mut driver = Driver::new(
        interpreter,
        frontend,
        config.steps_per_second,
        config.on_error,
    );
    let result = driver.run();

    // give the terminal back before anything is printed
    drop(driver);
    info!("Program finished. Exiting.");
    result
}
