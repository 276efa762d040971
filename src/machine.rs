//! This module defines the `Machine` struct: a single-tape Turing machine with a state set,
//! alphabets, a transition table keyed by value, and the tape it runs on. It owns the
//! single-step execution function and run-to-completion semantics.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::state::{Alphabet, Roles, State};
use crate::tape::Tape;
use crate::types::{
    Direction, Halt, StateId, Step, Symbol, TuringMachineError, Write, ELSE_SYMBOL,
    NOTHING_TOKEN,
};

/// The lookup key of a transition: source state and read symbol, compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionKey {
    pub state: StateId,
    pub read: Symbol,
}

impl TransitionKey {
    pub fn new(state: StateId, read: &str) -> Self {
        Self {
            state,
            read: read.to_string(),
        }
    }
}

/// The effect of a transition once its key matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub next: StateId,
    pub write: Write,
    pub direction: Direction,
}

/// A transition as exposed to callers: `(from, read) -> (to, write, direction)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub read: Symbol,
    pub to: StateId,
    pub write: Write,
    pub direction: Direction,
}

/// A single-tape Turing machine.
#[derive(Debug, Clone, Default)]
pub struct Machine {
    states: BTreeMap<StateId, State>,
    alphabet: Alphabet,
    transitions: HashMap<TransitionKey, Action>,
    tape: Tape,
    input: Tape,
    start: Option<StateId>,
    accepting: BTreeSet<StateId>,
    rejecting: BTreeSet<StateId>,
    current: Option<StateId>,
    step_count: usize,
}

impl Machine {
    /// Creates an empty machine with a single blank tape cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a machine that runs on `tape`.
    pub fn with_tape(tape: Tape) -> Self {
        Self {
            input: tape.clone(),
            tape,
            ..Self::default()
        }
    }

    /// Creates a state from user input.
    ///
    /// Fails with `DuplicateName` if the name is taken, `ConflictingRole` if both accept and
    /// reject are requested, and `DuplicateId` if the id is taken. A new start state replaces
    /// the previous one, which becomes an ordinary state.
    pub fn create_state(
        &mut self,
        id: StateId,
        name: &str,
        roles: Roles,
    ) -> Result<&State, TuringMachineError> {
        if self.state_by_name(name).is_some() {
            return Err(TuringMachineError::DuplicateName(name.to_string()));
        }

        self.insert_state(State::new(id, name, roles)?)
    }

    /// Inserts a state without the name uniqueness check.
    ///
    /// Flattened machines may hold several states sharing a name (every sub-machine has its
    /// own `start`), told apart by id.
    pub fn insert_state(&mut self, state: State) -> Result<&State, TuringMachineError> {
        if self.states.contains_key(&state.id) {
            return Err(TuringMachineError::DuplicateId(state.id));
        }
        if state.is_accepting && state.is_rejecting {
            return Err(TuringMachineError::ConflictingRole(state.name));
        }

        let id = state.id;
        if state.is_starting {
            if let Some(previous) = self.start.filter(|&previous| previous != id) {
                warn!(previous, id, "start state replaced");
                if let Some(old) = self.states.get_mut(&previous) {
                    old.is_starting = false;
                }
            }
            self.start = Some(id);
            if self.current.is_none() || self.step_count == 0 {
                self.current = Some(id);
            }
        }
        if state.is_accepting {
            self.accepting.insert(id);
        }
        if state.is_rejecting {
            self.rejecting.insert(id);
        }

        debug!(id, name = %state.name, "state created");
        Ok(self.states.entry(id).or_insert(state))
    }

    /// Removes a state and every transition leaving or entering it.
    pub fn remove_state(&mut self, id: StateId) -> Result<State, TuringMachineError> {
        let state = self
            .states
            .remove(&id)
            .ok_or(TuringMachineError::UnknownState(id))?;

        self.transitions
            .retain(|key, action| key.state != id && action.next != id);
        self.accepting.remove(&id);
        self.rejecting.remove(&id);
        if self.start == Some(id) {
            self.start = None;
        }
        if self.current == Some(id) {
            self.current = self.start;
        }

        debug!(id, "state removed");
        Ok(state)
    }

    /// Adds an input symbol to `sigma` and `gamma`.
    pub fn add_symbol(&mut self, symbol: &str) {
        self.alphabet.add_symbol(symbol);
    }

    /// Registers `(from, read) -> (to, write, direction)`, replacing any transition already
    /// registered for `(from, read)`. Both states must belong to the machine.
    pub fn create_transition(
        &mut self,
        from: StateId,
        read: &str,
        to: StateId,
        write: Write,
        direction: Direction,
    ) -> Result<(), TuringMachineError> {
        for id in [from, to] {
            if !self.states.contains_key(&id) {
                return Err(TuringMachineError::UnknownState(id));
            }
        }
        if read == NOTHING_TOKEN {
            return Err(TuringMachineError::ReservedSymbol(read.to_string()));
        }
        if let Some(symbol @ (ELSE_SYMBOL | NOTHING_TOKEN)) = write.symbol() {
            return Err(TuringMachineError::ReservedSymbol(symbol.to_string()));
        }

        self.alphabet.add_working_symbol(read);
        if let Some(symbol) = write.symbol() {
            self.alphabet.add_working_symbol(symbol);
        }

        debug!(from, read, to, write = write.token(), %direction, "transition created");
        self.transitions.insert(
            TransitionKey::new(from, read),
            Action {
                next: to,
                write,
                direction,
            },
        );

        Ok(())
    }

    /// Removes the transition registered for `(from, read)`, if any.
    pub fn remove_transition(&mut self, from: StateId, read: &str) -> Option<Transition> {
        let key = TransitionKey::new(from, read);
        self.transitions
            .remove(&key)
            .map(|action| to_transition(key, action))
    }

    /// Resolves the transition for `(state, symbol)`, falling back to `(state, "else")`.
    pub fn lookup(&self, state: StateId, symbol: &str) -> Option<&Action> {
        self.transitions
            .get(&TransitionKey::new(state, symbol))
            .or_else(|| self.transitions.get(&TransitionKey::new(state, ELSE_SYMBOL)))
    }

    /// The single-step state-transition function.
    ///
    /// Looks up `(state, symbol)` then `(state, "else")`, applies the write and the move to
    /// the tape, and returns the next state. When no transition matches the tape is left
    /// untouched and `NoTransition` is returned.
    pub fn step_from(
        &mut self,
        state: StateId,
        symbol: &str,
    ) -> Result<StateId, TuringMachineError> {
        let action = self
            .lookup(state, symbol)
            .cloned()
            .ok_or_else(|| TuringMachineError::NoTransition {
                state,
                symbol: symbol.to_string(),
            })?;

        self.tape.write(&action.write);
        self.tape.shift(action.direction);

        Ok(action.next)
    }

    /// Executes one step from the current state, reading the symbol under the cursor.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Continue)` if the machine moved to a non-halting state.
    /// * `Ok(Step::Halt(_))` if the machine is, or now is, in an accepting or rejecting state.
    /// * `Err(TuringMachineError::NoTransition)` if no transition applies.
    pub fn step(&mut self) -> Result<Step, TuringMachineError> {
        let state = self
            .current
            .or(self.start)
            .ok_or(TuringMachineError::NoStartState)?;

        if let Some(halt) = self.halt_of(state) {
            return Ok(Step::Halt(halt));
        }

        let symbol = self.tape.read().to_string();
        let next = match self.step_from(state, &symbol) {
            Ok(next) => next,
            Err(e) => {
                warn!(state, symbol = %symbol, "no transition, halting");
                return Err(e);
            }
        };

        self.current = Some(next);
        self.step_count += 1;
        debug!(
            step = self.step_count,
            from = state,
            to = next,
            symbol = %symbol,
            cursor = self.tape.cursor(),
            "step"
        );

        Ok(match self.halt_of(next) {
            Some(halt) => Step::Halt(halt),
            None => Step::Continue,
        })
    }

    /// Steps until an accepting or rejecting state is reached.
    ///
    /// Machines may loop forever; use [`Machine::run_bounded`] when that matters.
    pub fn run(&mut self) -> Result<Step, TuringMachineError> {
        loop {
            if let Step::Halt(halt) = self.step()? {
                return Ok(Step::Halt(halt));
            }
        }
    }

    /// Steps until a halting state is reached or `limit` steps were executed, in which
    /// case `Step::Continue` is returned.
    pub fn run_bounded(&mut self, limit: usize) -> Result<Step, TuringMachineError> {
        for _ in 0..limit {
            if let Step::Halt(halt) = self.step()? {
                return Ok(Step::Halt(halt));
            }
        }

        Ok(Step::Continue)
    }

    /// Replaces the tape with `symbols`, cursor on the first cell, and registers each
    /// symbol as input. The tape is also kept for [`Machine::reset`].
    pub fn set_input<I, S>(&mut self, symbols: I) -> Result<(), TuringMachineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let tape = Tape::from_symbols(symbols, 0)?;
        for symbol in tape.cells() {
            self.alphabet.add_symbol(symbol);
        }

        self.input = tape.clone();
        self.tape = tape;
        Ok(())
    }

    /// Restores the input tape, returns to the start state and clears the step count.
    pub fn reset(&mut self) {
        self.tape = self.input.clone();
        self.current = self.start;
        self.step_count = 0;
    }

    fn halt_of(&self, state: StateId) -> Option<Halt> {
        if self.accepting.contains(&state) {
            Some(Halt::Accept)
        } else if self.rejecting.contains(&state) {
            Some(Halt::Reject)
        } else {
            None
        }
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(&id)
    }

    pub fn state_by_name(&self, name: &str) -> Option<&State> {
        self.states.values().find(|state| state.name == name)
    }

    /// Returns all states ordered by id.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Returns all transitions ordered by source state and read symbol.
    pub fn transitions(&self) -> Vec<Transition> {
        let mut transitions: Vec<Transition> = self
            .transitions
            .iter()
            .map(|(key, action)| to_transition(key.clone(), action.clone()))
            .collect();
        transitions.sort_by(|a, b| (a.from, &a.read).cmp(&(b.from, &b.read)));
        transitions
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub(crate) fn alphabet_mut(&mut self) -> &mut Alphabet {
        &mut self.alphabet
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn start_state(&self) -> Option<StateId> {
        self.start
    }

    pub fn accepting_states(&self) -> &BTreeSet<StateId> {
        &self.accepting
    }

    pub fn rejecting_states(&self) -> &BTreeSet<StateId> {
        &self.rejecting
    }

    /// Returns the state simulation is in, or will start from.
    pub fn current_state(&self) -> Option<StateId> {
        self.current.or(self.start)
    }

    /// Returns the total number of steps executed since the last reset.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Returns the largest state id in use.
    pub fn max_state_id(&self) -> Option<StateId> {
        self.states.keys().next_back().copied()
    }
}

fn to_transition(key: TransitionKey, action: Action) -> Transition {
    Transition {
        from: key.state,
        read: key.read,
        to: action.next,
        write: action.write,
        direction: action.direction,
    }
}
