//! This module provides the `MachineLoader` struct, responsible for reading persisted
//! machines from files and strings into machines or sessions, and for writing them back to disk.

use std::fs;
use std::path::Path;
use tracing::debug;

use crate::encoder::encode;
use crate::machine::Machine;
use crate::parser::parse;
use crate::session::Session;
use crate::types::TuringMachineError;

/// `MachineLoader` is a utility struct for loading and saving persisted machines.
pub struct MachineLoader;

impl MachineLoader {
    /// Loads a single machine from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Machine)` if the file is successfully read and parsed.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * `Err(TuringMachineError::ParseError | MalformedRecord)` if the content is not a valid dump.
    pub fn load_machine(path: &Path) -> Result<Machine, TuringMachineError> {
        let content = read(path)?;
        debug!(path = %path.display(), bytes = content.len(), "loading machine");
        parse(&content)
    }

    /// Loads a single machine from the provided string content.
    pub fn load_machine_from_string(content: &str) -> Result<Machine, TuringMachineError> {
        parse(content)
    }

    /// Writes `machine` to `path` in the persisted format.
    pub fn save_machine(path: &Path, machine: &Machine) -> Result<(), TuringMachineError> {
        write(path, &encode(machine)?)
    }

    /// Reads the dump at `path` into `session`.
    ///
    /// A file that cannot be read leaves the session untouched. Content that does not parse
    /// resets the session to an empty machine, as [`Session::load`] does.
    pub fn load_session(path: &Path, session: &mut Session) -> Result<(), TuringMachineError> {
        let content = read(path)?;
        debug!(path = %path.display(), bytes = content.len(), "loading session");
        session.load(&content)
    }

    /// Writes the flattened machine of `session` to `path`.
    pub fn save_session(path: &Path, session: &Session) -> Result<(), TuringMachineError> {
        write(path, &session.dump()?)
    }
}

fn read(path: &Path) -> Result<String, TuringMachineError> {
    fs::read_to_string(path).map_err(|e| {
        TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
    })
}

fn write(path: &Path, content: &str) -> Result<(), TuringMachineError> {
    fs::write(path, content).map_err(|e| {
        TuringMachineError::FileError(format!("Failed to write file {}: {}", path.display(), e))
    })
}
