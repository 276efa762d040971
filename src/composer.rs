//! Hierarchical composition: expanding a super-state into a fresh sub-machine, and
//! merging sub-machines into the flattened machine that simulation runs on.

use tracing::info;

use crate::machine::Machine;
use crate::state::{Roles, State};
use crate::tree::{MachineTree, NodeId};
use crate::types::{Direction, StateId, TuringMachineError, Write, ELSE_SYMBOL};

/// Name of the start state of every fresh sub-machine.
pub const SUB_START_NAME: &str = "start";
/// Name of the accepting state of every fresh sub-machine.
pub const SUB_END_NAME: &str = "end";

/// Monotonic state id counter shared by every machine of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    next: StateId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator whose first id follows every id already used by `machine`.
    pub fn after(machine: &Machine) -> Self {
        Self {
            next: machine.max_state_id().map_or(0, |id| id + 1),
        }
    }

    /// Returns a fresh id.
    pub fn allocate(&mut self) -> StateId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Returns the id the next call to `allocate` will hand out.
    pub fn peek(&self) -> StateId {
        self.next
    }
}

/// Expands a new super-state of `parent`'s machine into a sub-machine.
///
/// Adds a plain state `super_state` named `name` to the parent machine, then attaches a child
/// node whose machine holds a `start` state, an accepting `end` state and the transition
/// `(start, else) -> (end, nothing, N)`. The child starts on a copy of the parent's tape.
///
/// Fails with `DuplicateName` if `name` is taken in the parent machine; the tree is left
/// unchanged on any error.
pub fn expand(
    tree: &mut MachineTree,
    ids: &mut IdAllocator,
    parent: NodeId,
    super_state: StateId,
    name: &str,
) -> Result<NodeId, TuringMachineError> {
    let parent_machine = tree.get_mut(parent)?.machine_mut();
    parent_machine.create_state(super_state, name, Roles::none())?;

    let mut child = Machine::with_tape(parent_machine.tape().clone());
    let start = ids.allocate();
    let end = ids.allocate();
    child.create_state(start, SUB_START_NAME, Roles::start())?;
    child.create_state(end, SUB_END_NAME, Roles::accept())?;
    child.create_transition(start, ELSE_SYMBOL, end, Write::Nothing, Direction::Neutral)?;

    match tree.insert_child(parent, super_state, child) {
        Ok(node) => {
            info!(%parent, %node, super_state, name, "super-state expanded");
            Ok(node)
        }
        Err(e) => {
            tree.get_mut(parent)?.machine_mut().remove_state(super_state)?;
            Err(e)
        }
    }
}

/// Merges every state, symbol and transition of `source` into `target`.
///
/// Merged states keep their id and name; they are never starting or accepting in `target`,
/// rejecting is preserved. Fails with `DuplicateId`, before touching `target`, if a state id
/// of `source` is already used in `target`.
pub fn merge(target: &mut Machine, source: &Machine) -> Result<(), TuringMachineError> {
    if let Some(state) = source.states().find(|s| target.state(s.id).is_some()) {
        return Err(TuringMachineError::DuplicateId(state.id));
    }

    for state in source.states() {
        target.insert_state(State::new(state.id, &state.name, state.roles().merged())?)?;
    }

    target.alphabet_mut().union(source.alphabet());

    for transition in source.transitions() {
        target.create_transition(
            transition.from,
            &transition.read,
            transition.to,
            transition.write,
            transition.direction,
        )?;
    }

    info!(
        states = source.state_count(),
        transitions = source.transition_count(),
        "machine merged"
    );
    Ok(())
}

/// Builds the flattened machine of a tree: the root machine with every descendant merged
/// into it in pre-order.
pub fn flatten(tree: &MachineTree) -> Result<Machine, TuringMachineError> {
    let root = tree.root();
    let mut global = tree.get(root)?.machine().clone();

    for (id, node) in tree.iter() {
        if id != root {
            merge(&mut global, node.machine())?;
        }
    }

    Ok(global)
}
