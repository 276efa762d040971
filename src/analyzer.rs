//! This module provides functions for analyzing machines to detect common mistakes before
//! simulation. This includes checks for a start state, reachable halting states, unreachable
//! states, and input symbols no transition can read.

use std::collections::{BTreeSet, HashSet};

use crate::machine::Machine;
use crate::types::{StateId, Symbol, TuringMachineError, BLANK_SYMBOL, ELSE_SYMBOL};

/// Represents the problems that can be found during the analysis of a machine.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The machine has no start state.
    MissingStartState,
    /// No accepting or rejecting state can be reached from the start state.
    NoReachableHaltingState,
    /// States that cannot be reached from the start state, by id.
    UnreachableStates(Vec<StateId>),
    /// Symbols on the input tape that no transition reads and no wildcard covers.
    InvalidTapeSymbols(Vec<Symbol>),
}

impl From<AnalysisError> for TuringMachineError {
    /// Converts an `AnalysisError` into a `TuringMachineError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::MissingStartState => {
                TuringMachineError::ValidationError("Missing start state".to_string())
            }
            AnalysisError::NoReachableHaltingState => TuringMachineError::ValidationError(
                "No accepting or rejecting state is reachable".to_string(),
            ),
            AnalysisError::UnreachableStates(states) => TuringMachineError::ValidationError(
                format!("Unreachable states detected: {:?}", states),
            ),
            AnalysisError::InvalidTapeSymbols(symbols) => {
                TuringMachineError::ValidationError(format!(
                    "Input tape contains symbols not handled by any transition: {:?}",
                    symbols
                ))
            }
        }
    }
}

/// Analyzes a machine for structural and logical errors.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(TuringMachineError::ValidationError)` describing the first problem found.
pub fn analyze(machine: &Machine) -> Result<(), TuringMachineError> {
    analyze_detached(machine, &HashSet::new())
}

/// Analyzes a flattened machine whose `detached` states belong to merged sub-machines.
///
/// Sub-machines are entered through their super-state, never through a transition, so
/// their states are exempt from the reachability check.
pub fn analyze_detached(
    machine: &Machine,
    detached: &HashSet<StateId>,
) -> Result<(), TuringMachineError> {
    match findings_detached(machine, detached).into_iter().next() {
        Some(first_error) => Err(first_error.into()),
        None => Ok(()),
    }
}

/// Runs every check and returns all problems found, in check order.
pub fn findings(machine: &Machine) -> Vec<AnalysisError> {
    findings_detached(machine, &HashSet::new())
}

pub fn findings_detached(machine: &Machine, detached: &HashSet<StateId>) -> Vec<AnalysisError> {
    [
        check_start_state,
        check_halting_states,
        check_unreachable_states,
        check_tape_symbols,
    ]
    .iter()
    .filter_map(|f| f(machine, detached).err())
    .collect()
}

fn check_start_state(machine: &Machine, _: &HashSet<StateId>) -> Result<(), AnalysisError> {
    machine
        .start_state()
        .map(|_| ())
        .ok_or(AnalysisError::MissingStartState)
}

/// Checks that some accepting or rejecting state is reachable from the start state.
fn check_halting_states(machine: &Machine, _: &HashSet<StateId>) -> Result<(), AnalysisError> {
    if machine.start_state().is_none() {
        return Ok(());
    }

    let reachable = reachable_states(machine);
    let halts = machine
        .accepting_states()
        .iter()
        .chain(machine.rejecting_states())
        .any(|state| reachable.contains(state));

    if !halts {
        return Err(AnalysisError::NoReachableHaltingState);
    }

    Ok(())
}

/// Checks for states that no sequence of transitions leads to from the start state.
fn check_unreachable_states(
    machine: &Machine,
    detached: &HashSet<StateId>,
) -> Result<(), AnalysisError> {
    if machine.start_state().is_none() {
        return Ok(());
    }

    let reachable = reachable_states(machine);
    let unreachable: Vec<StateId> = machine
        .states()
        .map(|state| state.id)
        .filter(|id| !reachable.contains(id) && !detached.contains(id))
        .collect();

    if !unreachable.is_empty() {
        return Err(AnalysisError::UnreachableStates(unreachable));
    }

    Ok(())
}

/// Checks that every symbol on the input tape is read by at least one transition, unless a
/// wildcard transition exists.
fn check_tape_symbols(machine: &Machine, _: &HashSet<StateId>) -> Result<(), AnalysisError> {
    let transitions = machine.transitions();
    if transitions.iter().any(|t| t.read == ELSE_SYMBOL) {
        return Ok(());
    }

    let handled: HashSet<&str> = transitions.iter().map(|t| t.read.as_str()).collect();
    let unhandled: BTreeSet<Symbol> = machine
        .tape()
        .cells()
        .iter()
        .filter(|symbol| symbol.as_str() != BLANK_SYMBOL && !handled.contains(symbol.as_str()))
        .cloned()
        .collect();

    if !unhandled.is_empty() {
        return Err(AnalysisError::InvalidTapeSymbols(
            unhandled.into_iter().collect(),
        ));
    }

    Ok(())
}

/// Collects the states reachable from the start state with a depth-first traversal.
fn reachable_states(machine: &Machine) -> HashSet<StateId> {
    let transitions = machine.transitions();
    let mut visited = HashSet::new();
    let mut stack: Vec<StateId> = machine.start_state().into_iter().collect();

    while let Some(state) = stack.pop() {
        if !visited.insert(state) {
            continue;
        }

        stack.extend(
            transitions
                .iter()
                .filter(|t| t.from == state && !visited.contains(&t.to))
                .map(|t| t.to),
        );
    }

    visited
}
