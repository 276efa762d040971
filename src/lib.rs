//! This crate provides the core of a hierarchical Turing machine simulator.
//! It includes the machine model and its tape, the tree of nested sub-machines, the
//! composition engine that flattens that tree into one runnable machine, and the
//! line-oriented dump format machines are persisted in.

pub mod analyzer;
pub mod composer;
pub mod encoder;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod session;
pub mod state;
pub mod tape;
pub mod tree;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the analysis entry points and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, analyze_detached, AnalysisError};
/// Re-exports the composition operations and the shared id allocator.
pub use composer::{expand, flatten, merge, IdAllocator};
/// Re-exports the dump encoder.
pub use encoder::encode;
/// Re-exports the `MachineLoader` struct from the loader module.
pub use loader::MachineLoader;
/// Re-exports the `Machine` struct and its transition types from the machine module.
pub use machine::{Machine, Transition};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `Program`, `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{Program, ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the editing session and its configuration.
pub use session::{RemovalPlan, Session, SessionConfig};
/// Re-exports state and alphabet types.
pub use state::{Alphabet, Roles, State};
/// Re-exports the `Tape` struct.
pub use tape::Tape;
/// Re-exports the machine tree types.
pub use tree::{MachineTree, NodeId, Position, TreeNode};
/// Re-exports the shared vocabulary of the crate.
pub use types::{
    Direction, Halt, StateId, Step, Symbol, TuringMachineError, Write, BLANK_SYMBOL, ELSE_SYMBOL,
    MAX_PROGRAM_SIZE, NOTHING_TOKEN,
};
