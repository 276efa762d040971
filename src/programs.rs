use std::sync::RwLock;
use tracing::warn;

use crate::machine::Machine;
use crate::parser::parse;
use crate::session::{Session, SessionConfig};
use crate::types::{Symbol, TuringMachineError};

// Default embedded machines: name, input tape, dump
const PROGRAM_TEXTS: [(&str, &[&str], &str); 3] = [
    (
        "Binary increment",
        &["1", "0", "1", "1"],
        include_str!("../programs/binary-increment.tm"),
    ),
    (
        "Parity",
        &["1", "0", "1"],
        include_str!("../programs/parity.tm"),
    ),
    (
        "Busy beaver (2 states)",
        &[],
        include_str!("../programs/busy-beaver-2.tm"),
    ),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: RwLock<Vec<Program>> = RwLock::new(Vec::new());
}

/// A named sample machine with the input it is meant to run on.
#[derive(Debug, Clone)]
pub struct Program {
    pub name: String,
    pub input: Vec<Symbol>,
    pub machine: Machine,
}

impl Program {
    /// Opens a session on this program with its input loaded.
    pub fn session(&self, config: SessionConfig) -> Result<Session, TuringMachineError> {
        let mut session = Session::from_machine(self.machine.clone(), config);
        session.set_input(self.input.clone())?;
        Ok(session)
    }
}

/// Summary of a registered program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub input: Vec<Symbol>,
    pub state_count: usize,
    pub transition_count: usize,
}

pub struct ProgramManager;

impl ProgramManager {
    /// Parses the embedded programs into the registry, once.
    pub fn load() -> Result<(), TuringMachineError> {
        if PROGRAMS.read().is_ok_and(|programs| !programs.is_empty()) {
            return Ok(());
        }

        let mut programs = Vec::new();
        for (name, input, text) in PROGRAM_TEXTS {
            match parse(text) {
                Ok(machine) => programs.push(Program {
                    name: name.to_string(),
                    input: input.iter().map(|s| s.to_string()).collect(),
                    machine,
                }),
                Err(e) => warn!(name, error = %e, "failed to parse embedded program"),
            }
        }

        let mut write_guard = PROGRAMS.write().map_err(|_| {
            TuringMachineError::FileError("Failed to acquire write lock".to_string())
        })?;
        *write_guard = programs;

        Ok(())
    }

    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        let _ = Self::load();

        PROGRAMS.read().map(|programs| programs.len()).unwrap_or(0)
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<Program, TuringMachineError> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| TuringMachineError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Program index {} out of range", index))
            })
    }

    /// Get a program by its name
    pub fn get_program_by_name(name: &str) -> Result<Program, TuringMachineError> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| TuringMachineError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|program| program.name == name)
            .cloned()
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Program '{}' not found", name))
            })
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        let _ = Self::load();

        PROGRAMS
            .read()
            .map(|programs| {
                programs
                    .iter()
                    .map(|program| program.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get information about a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, TuringMachineError> {
        let program = Self::get_program_by_index(index)?;

        Ok(ProgramInfo {
            index,
            name: program.name.clone(),
            input: program.input.clone(),
            state_count: program.machine.state_count(),
            transition_count: program.machine.transition_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use crate::types::{Halt, Step};

    #[test]
    fn test_all_programs_load() {
        assert_eq!(ProgramManager::get_program_count(), PROGRAM_TEXTS.len());
        assert_eq!(
            ProgramManager::list_program_names(),
            vec!["Binary increment", "Parity", "Busy beaver (2 states)"]
        );
    }

    #[test]
    fn test_programs_pass_analysis() {
        for index in 0..ProgramManager::get_program_count() {
            let program = ProgramManager::get_program_by_index(index).unwrap();
            let session = program.session(SessionConfig::default()).unwrap();
            assert!(
                analyze(session.global()).is_ok(),
                "{} failed analysis",
                program.name
            );
        }
    }

    #[test]
    fn test_binary_increment_program() {
        let program = ProgramManager::get_program_by_name("Binary increment").unwrap();
        let mut session = program.session(SessionConfig::default()).unwrap();

        assert_eq!(session.run().unwrap(), Step::Halt(Halt::Accept));
        assert_eq!(session.read_tape().contents(), vec!["1", "1", "0", "0"]);
    }

    #[test]
    fn test_parity_program() {
        let program = ProgramManager::get_program_by_name("Parity").unwrap();
        let mut session = program.session(SessionConfig::default()).unwrap();
        assert_eq!(session.run().unwrap(), Step::Halt(Halt::Accept));

        session.set_input(["1", "1", "1"]).unwrap();
        session.reset();
        assert_eq!(session.run().unwrap(), Step::Halt(Halt::Reject));
    }

    #[test]
    fn test_busy_beaver_program() {
        let program = ProgramManager::get_program_by_name("Busy beaver (2 states)").unwrap();
        let mut session = program.session(SessionConfig::default()).unwrap();

        assert_eq!(session.run().unwrap(), Step::Halt(Halt::Accept));
        assert_eq!(session.global().step_count(), 6);
        assert_eq!(session.read_tape().contents(), vec!["1"; 4]);
    }

    #[test]
    fn test_program_info() {
        let info = ProgramManager::get_program_info(0).unwrap();

        assert_eq!(info.name, "Binary increment");
        assert_eq!(info.state_count, 3);
        assert_eq!(info.transition_count, 6);
        assert!(ProgramManager::get_program_info(99).is_err());
    }
}
