//! States, their role flags, and the input/working alphabets of a machine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{StateId, Symbol, TuringMachineError, BLANK_SYMBOL, ELSE_SYMBOL, NOTHING_TOKEN};

/// A single state of a machine.
///
/// Serializes to the JSON object used by the persisted state block:
/// `{"id":0,"name":"q0","isStarting":true,"isAccepting":false,"isRejecting":false}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub id: StateId,
    pub name: String,
    pub is_starting: bool,
    pub is_accepting: bool,
    pub is_rejecting: bool,
}

impl State {
    /// Creates a state, rejecting the accept+reject combination.
    pub fn new(id: StateId, name: &str, roles: Roles) -> Result<Self, TuringMachineError> {
        roles.check(name)?;

        Ok(Self {
            id,
            name: name.to_string(),
            is_starting: roles.starting,
            is_accepting: roles.accepting,
            is_rejecting: roles.rejecting,
        })
    }

    /// Returns the role flags of this state.
    pub fn roles(&self) -> Roles {
        Roles {
            starting: self.is_starting,
            accepting: self.is_accepting,
            rejecting: self.is_rejecting,
        }
    }

    /// Whether simulation stops when it reaches this state.
    pub fn is_halting(&self) -> bool {
        self.is_accepting || self.is_rejecting
    }
}

/// Role flags requested for a new state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Roles {
    pub starting: bool,
    pub accepting: bool,
    pub rejecting: bool,
}

impl Roles {
    /// An ordinary state with no role.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn start() -> Self {
        Self {
            starting: true,
            ..Self::default()
        }
    }

    pub fn accept() -> Self {
        Self {
            accepting: true,
            ..Self::default()
        }
    }

    pub fn reject() -> Self {
        Self {
            rejecting: true,
            ..Self::default()
        }
    }

    /// The roles a state keeps once merged into an enclosing machine: never starting,
    /// never accepting, rejecting preserved.
    pub fn merged(self) -> Self {
        Self {
            starting: false,
            accepting: false,
            rejecting: self.rejecting,
        }
    }

    fn check(&self, name: &str) -> Result<(), TuringMachineError> {
        if self.accepting && self.rejecting {
            return Err(TuringMachineError::ConflictingRole(name.to_string()));
        }

        Ok(())
    }
}

/// The input alphabet `sigma` and the working alphabet `gamma` of a machine.
///
/// `gamma` always contains the blank symbol and every symbol used by a transition;
/// `sigma` holds the symbols explicitly entered as input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    sigma: BTreeSet<Symbol>,
    gamma: BTreeSet<Symbol>,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            sigma: BTreeSet::new(),
            gamma: BTreeSet::from([BLANK_SYMBOL.to_string()]),
        }
    }
}

impl Alphabet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input symbol to both alphabets. Idempotent; the blank is never an input symbol.
    pub fn add_symbol(&mut self, symbol: &str) {
        if symbol == BLANK_SYMBOL {
            return;
        }

        self.sigma.insert(symbol.to_string());
        self.gamma.insert(symbol.to_string());
    }

    /// Adds a working symbol to `gamma`. The reserved `else` and `nothing` tokens are skipped.
    pub fn add_working_symbol(&mut self, symbol: &str) {
        if symbol == ELSE_SYMBOL || symbol == NOTHING_TOKEN {
            return;
        }

        self.gamma.insert(symbol.to_string());
    }

    /// Unions both alphabets of `other` into this one.
    pub fn union(&mut self, other: &Alphabet) {
        self.sigma.extend(other.sigma.iter().cloned());
        self.gamma.extend(other.gamma.iter().cloned());
    }

    pub fn sigma(&self) -> &BTreeSet<Symbol> {
        &self.sigma
    }

    pub fn gamma(&self) -> &BTreeSet<Symbol> {
        &self.gamma
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serialization_uses_camel_case() {
        let state = State::new(7, "q7", Roles::start()).unwrap();
        let json = serde_json::to_string(&state).unwrap();

        assert_eq!(
            json,
            r#"{"id":7,"name":"q7","isStarting":true,"isAccepting":false,"isRejecting":false}"#
        );
        assert_eq!(serde_json::from_str::<State>(&json).unwrap(), state);
    }

    #[test]
    fn test_conflicting_roles() {
        let roles = Roles {
            accepting: true,
            rejecting: true,
            ..Roles::default()
        };

        assert_eq!(
            State::new(1, "bad", roles),
            Err(TuringMachineError::ConflictingRole("bad".to_string()))
        );
    }

    #[test]
    fn test_merged_roles_keep_only_rejecting() {
        let roles = Roles {
            starting: true,
            rejecting: true,
            ..Roles::default()
        };

        assert_eq!(roles.merged(), Roles::reject());
        assert_eq!(Roles::accept().merged(), Roles::none());
    }

    #[test]
    fn test_add_symbol_is_idempotent() {
        let mut alphabet = Alphabet::new();
        alphabet.add_symbol("a");
        let once = alphabet.clone();
        alphabet.add_symbol("a");

        assert_eq!(alphabet, once);
        assert!(alphabet.sigma().contains("a"));
        assert!(alphabet.gamma().contains("a"));
    }

    #[test]
    fn test_blank_is_working_symbol_only() {
        let mut alphabet = Alphabet::new();
        alphabet.add_symbol("");

        assert!(alphabet.sigma().is_empty());
        assert!(alphabet.gamma().contains(""));
    }

    #[test]
    fn test_reserved_tokens_stay_out_of_gamma() {
        let mut alphabet = Alphabet::new();
        alphabet.add_working_symbol("else");
        alphabet.add_working_symbol("nothing");
        alphabet.add_working_symbol("x");

        assert_eq!(alphabet.gamma().len(), 2);
        assert!(alphabet.sigma().is_empty());
    }
}
