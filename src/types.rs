//! This module defines the shared vocabulary of the hierarchical Turing machine core:
//! identifiers, symbols, head directions, write actions, execution results and the
//! error type returned by every fallible operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::Rule;

/// The blank symbol. Every cell that has not been written holds it.
pub const BLANK_SYMBOL: &str = "";
/// The wildcard read symbol, matched only when no exact transition exists.
pub const ELSE_SYMBOL: &str = "else";
/// The write token meaning "leave the cell unchanged".
pub const NOTHING_TOKEN: &str = "nothing";
/// The maximum allowed size for a persisted machine in bytes.
pub const MAX_PROGRAM_SIZE: usize = 1 << 20; // 1MB

/// Identifier of a state, unique across a whole session.
pub type StateId = u64;

/// A tape symbol. Symbols are strings; the blank symbol is the empty string.
pub type Symbol = String;

/// Represents the possible directions the tape head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Neutral,
}

impl Direction {
    /// Returns the single-letter token used in persisted transition records.
    pub fn token(self) -> &'static str {
        match self {
            Direction::Left => "L",
            Direction::Right => "R",
            Direction::Neutral => "N",
        }
    }
}

impl FromStr for Direction {
    type Err = TuringMachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L" => Ok(Direction::Left),
            "R" => Ok(Direction::Right),
            "N" => Ok(Direction::Neutral),
            other => Err(TuringMachineError::InvalidMove(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// What a transition writes under the head before moving.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Write {
    /// Overwrite the current cell with the symbol.
    Symbol(Symbol),
    /// Leave the current cell untouched.
    Nothing,
}

impl Write {
    /// Creates a `Write` from its persisted token, mapping `"nothing"` to [`Write::Nothing`].
    pub fn from_token(token: &str) -> Self {
        if token == NOTHING_TOKEN {
            Write::Nothing
        } else {
            Write::Symbol(token.to_string())
        }
    }

    /// Returns the persisted token for this write.
    pub fn token(&self) -> &str {
        match self {
            Write::Symbol(symbol) => symbol,
            Write::Nothing => NOTHING_TOKEN,
        }
    }

    /// Returns the written symbol, if any.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Write::Symbol(symbol) => Some(symbol),
            Write::Nothing => None,
        }
    }
}

impl From<&str> for Write {
    fn from(symbol: &str) -> Self {
        Write::Symbol(symbol.to_string())
    }
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The machine performed a step and is in a non-halting state.
    Continue,
    /// The machine is in a halting state.
    Halt(Halt),
}

/// The kind of halting state a machine stopped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    Accept,
    Reject,
}

/// Represents the errors returned by the machine core.
///
/// Every variant is recoverable: the operation that produced it is aborted and the
/// machine it targeted is left unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// A state with this name already exists in the target machine.
    #[error("Duplicate state name: {0}")]
    DuplicateName(String),
    /// A state was asked to be both accepting and rejecting.
    #[error("State {0} cannot be both accepting and rejecting")]
    ConflictingRole(String),
    /// A state with this id already exists in the target machine.
    #[error("Duplicate state id: {0}")]
    DuplicateId(StateId),
    /// The referenced state is not a member of the machine.
    #[error("Unknown state: {0}")]
    UnknownState(StateId),
    /// The referenced tree node does not exist or was removed.
    #[error("Unknown tree node: {0}")]
    UnknownNode(usize),
    /// The super-state already has a sub-machine attached.
    #[error("Super-state {0} already expands a sub-machine")]
    SuperStateInUse(StateId),
    /// Simulation was requested on a machine without a start state.
    #[error("Machine has no start state")]
    NoStartState,
    /// Neither an exact nor a wildcard transition exists; simulation halts abnormally.
    #[error("No transition defined for state {state} and symbol {symbol:?}")]
    NoTransition { state: StateId, symbol: Symbol },
    /// A move token outside `L`, `R` and `N`.
    #[error("Invalid move: {0:?}")]
    InvalidMove(String),
    /// A reserved token (`else`, `nothing`) used where a tape symbol is expected.
    #[error("Reserved token {0:?} cannot be used as a tape symbol")]
    ReservedSymbol(String),
    /// A cursor position outside the materialized tape.
    #[error("Tape boundary exceeded")]
    TapeBoundary,
    /// The persisted text does not follow the record framing.
    #[error("Machine parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// A persisted record is well framed but its content is invalid.
    #[error("Malformed record at line {line}: {message}")]
    MalformedRecord { line: usize, message: String },
    /// A name or symbol cannot be represented in the persisted format.
    #[error("Cannot encode {0:?}")]
    Unencodable(String),
    /// Indicates an error during the validation of a machine's structure or logic.
    #[error("Machine validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
    /// A removal plan no longer matches the session it was made for.
    #[error("Removal plan is out of date")]
    StalePlan,
}
