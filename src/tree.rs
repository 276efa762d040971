//! The machine tree: every node holds one machine, and every non-root node expands a
//! super-state of its parent's machine.
//!
//! Nodes live in an arena and refer to each other through [`NodeId`] handles. Removed
//! nodes leave an empty slot behind so handles are never reused.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::machine::Machine;
use crate::types::{StateId, TuringMachineError};

/// Stable handle of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Canvas coordinates of a state. The core stores them and never reads them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    machine: Machine,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    super_state: Option<StateId>,
    positions: BTreeMap<StateId, Position>,
}

impl TreeNode {
    fn new(machine: Machine, parent: Option<NodeId>, super_state: Option<StateId>) -> Self {
        Self {
            machine,
            parent,
            children: Vec::new(),
            super_state,
            positions: BTreeMap::new(),
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The state of the parent machine this node expands. `None` for the root.
    pub fn super_state(&self) -> Option<StateId> {
        self.super_state
    }

    pub fn position(&self, state: StateId) -> Option<Position> {
        self.positions.get(&state).copied()
    }

    pub fn set_position(&mut self, state: StateId, position: Position) {
        self.positions.insert(state, position);
    }

    /// Forgets the position of a removed state.
    pub fn remove_position(&mut self, state: StateId) -> Option<Position> {
        self.positions.remove(&state)
    }

    pub fn positions(&self) -> &BTreeMap<StateId, Position> {
        &self.positions
    }
}

/// A rooted tree of machines stored in an arena.
#[derive(Debug, Clone)]
pub struct MachineTree {
    nodes: Vec<Option<TreeNode>>,
}

impl Default for MachineTree {
    fn default() -> Self {
        Self::new(Machine::new())
    }
}

impl MachineTree {
    /// Creates a tree whose root holds `machine`.
    pub fn new(machine: Machine) -> Self {
        Self {
            nodes: vec![Some(TreeNode::new(machine, None, None))],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> Result<&TreeNode, TuringMachineError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(TuringMachineError::UnknownNode(id.0))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut TreeNode, TuringMachineError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TuringMachineError::UnknownNode(id.0))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_ok()
    }

    /// Attaches `machine` as a child of `parent`, expanding `super_state`.
    ///
    /// The super-state must exist in the parent's machine and must not be expanded yet.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        super_state: StateId,
        machine: Machine,
    ) -> Result<NodeId, TuringMachineError> {
        let parent_node = self.get(parent)?;
        if parent_node.machine.state(super_state).is_none() {
            return Err(TuringMachineError::UnknownState(super_state));
        }
        if self.child_for(parent, super_state).is_some() {
            return Err(TuringMachineError::SuperStateInUse(super_state));
        }

        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Some(TreeNode::new(machine, Some(parent), Some(super_state))));
        self.get_mut(parent)?.children.push(id);

        Ok(id)
    }

    /// Returns the child of `parent` that expands `super_state`.
    pub fn child_for(&self, parent: NodeId, super_state: StateId) -> Option<NodeId> {
        let node = self.get(parent).ok()?;
        node.children.iter().copied().find(|&child| {
            self.get(child)
                .is_ok_and(|child| child.super_state == Some(super_state))
        })
    }

    /// Returns `id` and all its descendants in pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];

        while let Some(next) = stack.pop() {
            if let Ok(node) = self.get(next) {
                order.push(next);
                stack.extend(node.children.iter().rev().copied());
            }
        }

        order
    }

    /// Removes `id` and all its descendants, returning the removed nodes in pre-order.
    /// The root cannot be removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<Vec<TreeNode>, TuringMachineError> {
        let parent = self
            .get(id)?
            .parent
            .ok_or(TuringMachineError::UnknownNode(id.0))?;

        self.get_mut(parent)?.children.retain(|&child| child != id);

        Ok(self
            .subtree(id)
            .into_iter()
            .filter_map(|node| self.nodes[node.0].take())
            .collect())
    }

    /// Returns the handles from `id` up to the root, `id` first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut next = Some(id);

        while let Some(node) = next {
            match self.get(node) {
                Ok(tree_node) => {
                    path.push(node);
                    next = tree_node.parent;
                }
                Err(_) => break,
            }
        }

        path
    }

    /// Returns every live node handle in pre-order from the root.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.subtree(self.root())
            .into_iter()
            .filter_map(move |id| self.get(id).ok().map(|node| (id, node)))
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Roles;

    fn machine_with(states: &[(StateId, &str)]) -> Machine {
        let mut machine = Machine::new();
        for &(id, name) in states {
            machine.create_state(id, name, Roles::none()).unwrap();
        }
        machine
    }

    #[test]
    fn test_root_has_no_parent() {
        let tree = MachineTree::default();
        let root = tree.get(tree.root()).unwrap();

        assert!(root.parent().is_none());
        assert!(root.super_state().is_none());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_insert_child_links_both_ways() {
        let mut tree = MachineTree::new(machine_with(&[(0, "a"), (1, "b")]));
        let root = tree.root();
        let child = tree.insert_child(root, 1, Machine::new()).unwrap();

        assert_eq!(tree.get(child).unwrap().parent(), Some(root));
        assert_eq!(tree.get(root).unwrap().children(), &[child]);
        assert_eq!(tree.child_for(root, 1), Some(child));
        assert_eq!(tree.child_for(root, 0), None);
    }

    #[test]
    fn test_super_state_must_exist_and_be_free() {
        let mut tree = MachineTree::new(machine_with(&[(0, "a")]));
        let root = tree.root();

        assert_eq!(
            tree.insert_child(root, 5, Machine::new()).unwrap_err(),
            TuringMachineError::UnknownState(5)
        );

        tree.insert_child(root, 0, Machine::new()).unwrap();
        assert_eq!(
            tree.insert_child(root, 0, Machine::new()).unwrap_err(),
            TuringMachineError::SuperStateInUse(0)
        );
    }

    #[test]
    fn test_remove_subtree() {
        let mut tree = MachineTree::new(machine_with(&[(0, "a"), (1, "b")]));
        let root = tree.root();
        let child = tree
            .insert_child(root, 0, machine_with(&[(2, "c")]))
            .unwrap();
        let grandchild = tree.insert_child(child, 2, Machine::new()).unwrap();
        let sibling = tree.insert_child(root, 1, Machine::new()).unwrap();

        assert_eq!(tree.subtree(root), vec![root, child, grandchild, sibling]);
        assert_eq!(tree.ancestors(grandchild), vec![grandchild, child, root]);

        let removed = tree.remove_subtree(child).unwrap();

        assert_eq!(removed.len(), 2);
        assert!(!tree.contains(child));
        assert!(!tree.contains(grandchild));
        assert_eq!(tree.get(root).unwrap().children(), &[sibling]);
        assert_eq!(tree.len(), 2);
        assert!(matches!(
            tree.remove_subtree(root),
            Err(TuringMachineError::UnknownNode(0))
        ));
    }

    #[test]
    fn test_positions_pass_through() {
        let mut tree = MachineTree::default();
        let root = tree.root();
        let position = Position { x: 10.5, y: -3.0 };

        tree.get_mut(root).unwrap().set_position(42, position);

        assert_eq!(tree.get(root).unwrap().position(42), Some(position));
        assert_eq!(tree.get(root).unwrap().position(1), None);

        assert_eq!(tree.get_mut(root).unwrap().remove_position(42), Some(position));
        assert!(tree.get(root).unwrap().positions().is_empty());
    }
}
