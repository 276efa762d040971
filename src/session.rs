//! The editing and simulation session.
//!
//! A `Session` owns the machine tree, the flattened global machine built from it, the
//! state id allocator shared by every machine, and the currently selected tree node.
//! Edits target the selected node's machine and are mirrored into the global machine,
//! which is the one simulation runs on.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::analyzer::analyze_detached;
use crate::composer::{self, IdAllocator};
use crate::encoder::encode;
use crate::machine::{Machine, Transition};
use crate::parser::parse;
use crate::state::{Roles, State};
use crate::tape::Tape;
use crate::tree::{MachineTree, NodeId, Position};
use crate::types::{Direction, StateId, Step, Symbol, TuringMachineError, Write};

/// Session settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of steps [`Session::run`] executes. `None` runs until a halting state.
    pub step_limit: Option<usize>,
}

/// A pending state removal, listing everything it will delete.
///
/// Removing a super-state also removes the sub-machine it expands and all of that
/// sub-machine's descendants. The plan is shown to the user for confirmation and then
/// handed back to [`Session::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPlan {
    node: NodeId,
    state: StateId,
    nodes: Vec<NodeId>,
    states: Vec<StateId>,
}

impl RemovalPlan {
    /// The node whose machine holds the state.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    /// Sub-machine nodes removed along with the state.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Every state removed from the global machine.
    pub fn states(&self) -> &[StateId] {
        &self.states
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    tree: MachineTree,
    global: Machine,
    ids: IdAllocator,
    selected: NodeId,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_config(SessionConfig::default())
    }
}

impl Session {
    /// Creates a session with an empty root machine.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self::from_machine(Machine::new(), config)
    }

    /// Creates a session whose root machine is `machine`, e.g. a loaded dump.
    pub fn from_machine(machine: Machine, config: SessionConfig) -> Self {
        let tree = MachineTree::new(machine.clone());
        Self {
            config,
            selected: tree.root(),
            ids: IdAllocator::after(&machine),
            tree,
            global: machine,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tree(&self) -> &MachineTree {
        &self.tree
    }

    /// The flattened machine simulation runs on.
    pub fn global(&self) -> &Machine {
        &self.global
    }

    pub fn selected(&self) -> NodeId {
        self.selected
    }

    /// Makes `node` the target of subsequent edits.
    pub fn select(&mut self, node: NodeId) -> Result<(), TuringMachineError> {
        self.tree.get(node)?;
        self.selected = node;
        Ok(())
    }

    /// The machine of the selected node.
    pub fn current_machine(&self) -> Result<&Machine, TuringMachineError> {
        Ok(self.tree.get(self.selected)?.machine())
    }

    fn current_machine_mut(&mut self) -> Result<&mut Machine, TuringMachineError> {
        Ok(self.tree.get_mut(self.selected)?.machine_mut())
    }

    /// Creates a state in the selected machine and returns its id.
    ///
    /// States of sub-machines enter the global machine without start and accept roles.
    pub fn create_state(&mut self, name: &str, roles: Roles) -> Result<StateId, TuringMachineError> {
        let id = self.ids.allocate();
        let global_roles = if self.selected == self.tree.root() {
            roles
        } else {
            roles.merged()
        };

        self.current_machine_mut()?.create_state(id, name, roles)?;
        self.global
            .insert_state(State::new(id, name, global_roles)?)?;

        Ok(id)
    }

    /// Adds an input symbol to the selected and global machines.
    pub fn add_symbol(&mut self, symbol: &str) -> Result<(), TuringMachineError> {
        self.current_machine_mut()?.add_symbol(symbol);
        self.global.add_symbol(symbol);
        Ok(())
    }

    /// Creates a transition between two states of the selected machine.
    pub fn create_transition(
        &mut self,
        from: StateId,
        read: &str,
        to: StateId,
        write: Write,
        direction: Direction,
    ) -> Result<(), TuringMachineError> {
        self.current_machine_mut()?
            .create_transition(from, read, to, write.clone(), direction)?;
        self.global
            .create_transition(from, read, to, write, direction)
    }

    /// Removes the transition for `(from, read)` from the selected and global machines.
    pub fn remove_transition(
        &mut self,
        from: StateId,
        read: &str,
    ) -> Result<Option<Transition>, TuringMachineError> {
        let removed = self.current_machine_mut()?.remove_transition(from, read);
        if removed.is_some() {
            self.global.remove_transition(from, read);
        }

        Ok(removed)
    }

    /// Introduces a super-state named `name` in the selected machine and returns the node
    /// of its sub-machine. The sub-machine is merged into the global machine at once.
    pub fn expand(&mut self, name: &str) -> Result<NodeId, TuringMachineError> {
        let super_state = self.ids.allocate();
        let node = composer::expand(
            &mut self.tree,
            &mut self.ids,
            self.selected,
            super_state,
            name,
        )?;

        self.global
            .insert_state(State::new(super_state, name, Roles::none())?)?;
        composer::merge(&mut self.global, self.tree.get(node)?.machine())?;

        Ok(node)
    }

    /// Lists what removing `state` from the selected machine deletes.
    pub fn plan_removal(&self, state: StateId) -> Result<RemovalPlan, TuringMachineError> {
        self.plan_removal_in(self.selected, state)
    }

    fn plan_removal_in(
        &self,
        node: NodeId,
        state: StateId,
    ) -> Result<RemovalPlan, TuringMachineError> {
        if self.tree.get(node)?.machine().state(state).is_none() {
            return Err(TuringMachineError::UnknownState(state));
        }

        let nodes = self
            .tree
            .child_for(node, state)
            .map(|child| self.tree.subtree(child))
            .unwrap_or_default();

        let mut states = vec![state];
        for &id in &nodes {
            states.extend(self.tree.get(id)?.machine().states().map(|s| s.id));
        }

        Ok(RemovalPlan {
            node,
            state,
            nodes,
            states,
        })
    }

    /// Carries out a confirmed removal plan.
    ///
    /// Fails with `StalePlan` if the session changed in a way that affects the plan.
    pub fn remove(&mut self, plan: RemovalPlan) -> Result<(), TuringMachineError> {
        if self.plan_removal_in(plan.node, plan.state).ok().as_ref() != Some(&plan) {
            return Err(TuringMachineError::StalePlan);
        }

        if let Some(&child) = plan.nodes.first() {
            self.tree.remove_subtree(child)?;
        }
        let node = self.tree.get_mut(plan.node)?;
        node.machine_mut().remove_state(plan.state)?;
        node.remove_position(plan.state);
        for &state in &plan.states {
            self.global.remove_state(state)?;
        }

        if !self.tree.contains(self.selected) {
            self.selected = plan.node;
        }

        info!(
            state = plan.state,
            nodes = plan.nodes.len(),
            states = plan.states.len(),
            "state removed"
        );
        Ok(())
    }

    /// Stores the canvas position of a state of the selected machine.
    pub fn set_position(
        &mut self,
        state: StateId,
        position: Position,
    ) -> Result<(), TuringMachineError> {
        self.tree
            .get_mut(self.selected)?
            .set_position(state, position);
        Ok(())
    }

    pub fn position(&self, state: StateId) -> Option<Position> {
        self.tree.get(self.selected).ok()?.position(state)
    }

    /// Loads input onto the tape of the root and global machines.
    pub fn set_input<I, S>(&mut self, symbols: I) -> Result<(), TuringMachineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let tape = Tape::from_symbols(symbols, 0)?;
        let root = self.tree.root();
        self.tree
            .get_mut(root)?
            .machine_mut()
            .set_input(tape.cells().to_vec())?;
        self.global.set_input(tape.cells().to_vec())
    }

    pub fn read_tape(&self) -> &Tape {
        self.global.tape()
    }

    /// Executes one step of the global machine.
    pub fn step(&mut self) -> Result<Step, TuringMachineError> {
        self.global.step()
    }

    /// Runs the global machine until it halts, or until the configured step limit.
    pub fn run(&mut self) -> Result<Step, TuringMachineError> {
        let result = match self.config.step_limit {
            Some(limit) => self.global.run_bounded(limit),
            None => self.global.run(),
        };

        debug!(steps = self.global.step_count(), ?result, "run finished");
        result
    }

    /// Rewinds the global machine to its input and start state.
    pub fn reset(&mut self) {
        self.global.reset();
    }

    /// Checks the global machine for problems that would prevent a meaningful run.
    ///
    /// States of sub-machines are not expected to be reachable from the root start state.
    pub fn validate(&self) -> Result<(), TuringMachineError> {
        let root = self.tree.root();
        let detached: HashSet<StateId> = self
            .tree
            .iter()
            .filter(|(id, _)| *id != root)
            .flat_map(|(_, node)| node.machine().states().map(|state| state.id))
            .collect();

        analyze_detached(&self.global, &detached)
    }

    /// Serializes the global machine into the persisted format.
    pub fn dump(&self) -> Result<String, TuringMachineError> {
        encode(&self.global)
    }

    /// Replaces the session with a machine read from the persisted format.
    ///
    /// On failure nothing of the input is kept: the session is reset to an empty machine.
    pub fn load(&mut self, content: &str) -> Result<(), TuringMachineError> {
        let config = self.config.clone();
        match parse(content) {
            Ok(machine) => {
                info!(states = machine.state_count(), "machine loaded");
                *self = Self::from_machine(machine, config);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "load aborted, session reset");
                *self = Self::with_config(config);
                Err(e)
            }
        }
    }
}
