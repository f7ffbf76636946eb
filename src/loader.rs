//! Program sources. The image is read completely before memory is touched, so
//! a failed read never leaves a half-written program behind.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use log::info;

use crate::consts::MAX_PROGRAM_SIZE;
use crate::error::LoadError;
use crate::interpreter::Interpreter;

/// Reads a whole program image, refusing anything that could not fit.
pub fn read_program(reader: &mut impl Read) -> Result<Vec<u8>, LoadError> {
    let mut buffer = Vec::new();
    // an image that fills the limit is already too large
    reader
        .take(MAX_PROGRAM_SIZE as u64)
        .read_to_end(&mut buffer)
        .map_err(LoadError::SourceUnavailable)?;

    if buffer.len() >= MAX_PROGRAM_SIZE {
        return Err(LoadError::ProgramTooLarge {
            size: buffer.len(),
            max: MAX_PROGRAM_SIZE,
        });
    }
    Ok(buffer)
}

pub fn read_program_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    let metadata = path.metadata().map_err(LoadError::SourceUnavailable)?;
    if !metadata.is_file() {
        return Err(LoadError::SourceUnavailable(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not a regular file", path.display()),
        )));
    }

    let size = metadata.len() as usize;
    if size >= MAX_PROGRAM_SIZE {
        return Err(LoadError::ProgramTooLarge {
            size,
            max: MAX_PROGRAM_SIZE,
        });
    }

    let mut file = File::open(path).map_err(LoadError::SourceUnavailable)?;
    let program = read_program(&mut file)?;
    info!("Read {} bytes from '{}'", program.len(), path.display());
    Ok(program)
}

pub fn load_from_reader(
    interpreter: &mut Interpreter,
    reader: &mut impl Read,
) -> Result<(), LoadError> {
    let program = read_program(reader)?;
    interpreter.load(&program)
}

pub fn load_from_path(interpreter: &mut Interpreter, path: &Path) -> Result<(), LoadError> {
    let program = read_program_file(path)?;
    interpreter.load(&program)
}
