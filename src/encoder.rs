//! This module provides encoding of a machine into the persisted line-oriented format.
//!
//! Format:
//! - one JSON object per state (`id`, `name`, `isStarting`, `isAccepting`, `isRejecting`),
//!   one per line, followed by a blank line;
//! - one comma-separated record per transition:
//!   `fromId,fromName,fromIsStarting,fromIsAccepting,fromIsRejecting,read,`
//!   `toId,toName,toIsStarting,toIsAccepting,toIsRejecting,write,move`.
//!
//! The blank symbol is an empty field and `write` is `nothing` when the cell is kept.

use crate::machine::Machine;
use crate::state::State;
use crate::types::{StateId, TuringMachineError};

/// Encodes a machine into the persisted format.
///
/// # Returns
///
/// * `Ok(String)` - The encoded machine.
/// * `Err(TuringMachineError::Unencodable)` if a name or symbol contains `,` or a line break.
pub fn encode(machine: &Machine) -> Result<String, TuringMachineError> {
    let mut output = String::new();

    for state in machine.states() {
        let line = serde_json::to_string(state)
            .map_err(|e| TuringMachineError::Unencodable(format!("{}: {}", state.name, e)))?;
        output.push_str(&line);
        output.push('\n');
    }
    output.push('\n');

    for transition in machine.transitions() {
        let from = lookup(machine, transition.from)?;
        let to = lookup(machine, transition.to)?;

        let record = [
            encode_state(from)?,
            field(&transition.read)?.to_string(),
            encode_state(to)?,
            field(transition.write.token())?.to_string(),
            transition.direction.token().to_string(),
        ];

        output.push_str(&record.join(","));
        output.push('\n');
    }

    Ok(output)
}

/// Encodes the five state columns of a transition record.
fn encode_state(state: &State) -> Result<String, TuringMachineError> {
    Ok(format!(
        "{},{},{},{},{}",
        state.id,
        field(&state.name)?,
        state.is_starting,
        state.is_accepting,
        state.is_rejecting
    ))
}

fn lookup(machine: &Machine, id: StateId) -> Result<&State, TuringMachineError> {
    machine.state(id).ok_or(TuringMachineError::UnknownState(id))
}

/// Checks that a value fits in a single comma-separated field.
fn field(value: &str) -> Result<&str, TuringMachineError> {
    if value.contains(&[',', '\n', '\r'][..]) {
        return Err(TuringMachineError::Unencodable(value.to_string()));
    }

    Ok(value)
}
