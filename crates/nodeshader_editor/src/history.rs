// SPDX-License-Identifier: MIT OR Apache-2.0
//! Snapshot-based undo/redo history.
//!
//! Every entry is a full copy of the [`Graph`]. Change detection compares the
//! candidate graph with the last recorded one, so interactions that leave the
//! graph untouched never produce history entries.

use nodeshader_graph::Graph;
use std::collections::VecDeque;

/// Default maximum undo history depth
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded undo/redo history of graph snapshots
#[derive(Debug, Clone)]
pub struct UndoStack {
    /// Last recorded state, the one the live graph is compared against
    next_undo_graph: Graph,
    /// Undo snapshots, newest at the front
    undo_state: VecDeque<Graph>,
    /// Redo snapshots, newest at the front
    redo_state: VecDeque<Graph>,
    /// Maximum entries kept in each direction
    capacity: usize,
}

impl UndoStack {
    /// Create an empty history with the given capacity (at least one entry)
    pub fn new(capacity: usize) -> Self {
        Self {
            next_undo_graph: Graph::new(),
            undo_state: VecDeque::new(),
            redo_state: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Drop all history and start over from `graph`
    pub fn clear(&mut self, graph: Graph) {
        self.undo_state.clear();
        self.redo_state.clear();
        self.next_undo_graph = graph;
    }

    /// Record `graph` as the new current state.
    ///
    /// Returns `false` without touching the history if it equals the last
    /// recorded state.
    pub fn push_undo(&mut self, graph: Graph) -> bool {
        if graph == self.next_undo_graph {
            return false;
        }

        self.redo_state.clear();
        let previous = std::mem::replace(&mut self.next_undo_graph, graph);
        Self::push_front(&mut self.undo_state, previous, self.capacity);

        tracing::debug!("Recorded undo entry ({} in history)", self.undo_state.len());
        true
    }

    /// Step back one entry.
    ///
    /// `for_redo` is the live graph, kept for a later redo. Returns it
    /// unchanged when there is nothing to undo.
    pub fn pop_undo(&mut self, for_redo: Graph) -> Graph {
        let Some(graph) = self.undo_state.pop_front() else {
            return for_redo;
        };

        Self::push_front(&mut self.redo_state, for_redo, self.capacity);
        self.next_undo_graph = graph.clone();
        graph
    }

    /// Step forward one entry.
    ///
    /// `for_undo` is the live graph, kept for a later undo. Returns it
    /// unchanged when there is nothing to redo.
    pub fn pop_redo(&mut self, for_undo: Graph) -> Graph {
        let Some(graph) = self.redo_state.pop_front() else {
            return for_undo;
        };

        Self::push_front(&mut self.undo_state, for_undo, self.capacity);
        self.next_undo_graph = graph.clone();
        graph
    }

    /// Check if undo is available
    pub fn undo_available(&self) -> bool {
        !self.undo_state.is_empty()
    }

    /// Check if redo is available
    pub fn redo_available(&self) -> bool {
        !self.redo_state.is_empty()
    }

    /// Number of undo entries
    pub fn undo_depth(&self) -> usize {
        self.undo_state.len()
    }

    /// Number of redo entries
    pub fn redo_depth(&self) -> usize {
        self.redo_state.len()
    }

    /// Maximum entries kept in each direction
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Last recorded state
    pub fn current(&self) -> &Graph {
        &self.next_undo_graph
    }

    fn push_front(queue: &mut VecDeque<Graph>, graph: Graph, capacity: usize) {
        queue.push_front(graph);
        queue.truncate(capacity);
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeshader_graph::{NodeType, SlotId};

    fn float_graph() -> (Graph, SlotId) {
        let mut graph = Graph::new();
        let value = graph.add(NodeType::Value, [0, 0]);
        (graph, SlotId::new(value, 0))
    }

    #[test]
    fn test_undo_redo_symmetry() {
        let (g0, slot) = float_graph();
        let mut stack = UndoStack::default();
        stack.clear(g0.clone());
        assert!(!stack.undo_available());

        let mut g1 = g0.clone();
        assert!(g1.set_float(slot, 2.0).unwrap());
        assert!(stack.push_undo(g1.clone()));
        assert!(stack.undo_available());
        assert!(!stack.redo_available());

        let undone = stack.pop_undo(g1.clone());
        assert_eq!(undone, g0);
        assert_eq!(stack.current(), &g0);
        assert!(stack.redo_available());

        let redone = stack.pop_redo(undone);
        assert_eq!(redone, g1);
        assert!(stack.undo_available());
        assert!(!stack.redo_available());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let (g0, slot) = float_graph();
        let mut stack = UndoStack::default();
        stack.clear(g0.clone());

        let mut g1 = g0.clone();
        g1.set_float(slot, 2.0).unwrap();
        stack.push_undo(g1.clone());
        let mut live = stack.pop_undo(g1);
        assert!(stack.redo_available());

        live.set_float(slot, 3.0).unwrap();
        assert!(stack.push_undo(live));
        assert!(!stack.redo_available());
        assert_eq!(stack.undo_depth(), 1);
    }

    #[test]
    fn test_no_op_suppression() {
        let (g0, slot) = float_graph();
        let mut stack = UndoStack::default();
        stack.clear(g0.clone());

        assert!(!stack.push_undo(g0.clone()));
        assert!(!stack.undo_available());

        let mut g1 = g0.clone();
        g1.set_float(slot, 2.0).unwrap();
        assert!(stack.push_undo(g1.clone()));
        assert!(!stack.push_undo(g1.clone()));
        assert_eq!(stack.undo_depth(), 1);

        // Writing the current value is not a change either
        assert!(!g1.set_float(slot, 2.0).unwrap());
        assert!(!stack.push_undo(g1));
        assert_eq!(stack.undo_depth(), 1);
    }

    #[test]
    fn test_pop_at_boundary_is_no_op() {
        let (g0, slot) = float_graph();
        let mut stack = UndoStack::default();
        stack.clear(g0.clone());

        let mut live = g0.clone();
        live.set_float(slot, 5.0).unwrap();
        assert_eq!(stack.pop_undo(live.clone()), live);
        assert_eq!(stack.pop_redo(live.clone()), live);
        assert!(!stack.undo_available());
        assert!(!stack.redo_available());
    }

    #[test]
    fn test_history_bound() {
        let (g0, slot) = float_graph();
        let mut stack = UndoStack::default();
        stack.clear(g0.clone());

        let mut live = g0;
        for i in 1..=51 {
            live.set_float(slot, i as f32).unwrap();
            assert!(stack.push_undo(live.clone()));
        }
        assert_eq!(stack.undo_depth(), DEFAULT_HISTORY_CAPACITY);

        // The 50 most recent predecessors are 50.0 down to 1.0; 0.0 is gone
        for expected in (1..=50).rev() {
            live = stack.pop_undo(live);
            assert_eq!(live.slot_value(slot).and_then(|v| v.as_float()), Some(expected as f32));
        }
        assert!(!stack.undo_available());
        assert_eq!(stack.pop_undo(live.clone()), live);
    }

    #[test]
    fn test_clear() {
        let (g0, slot) = float_graph();
        let mut stack = UndoStack::new(4);
        stack.clear(g0.clone());
        let mut g1 = g0.clone();
        g1.set_float(slot, 1.0).unwrap();
        stack.push_undo(g1.clone());
        stack.pop_undo(g1.clone());

        stack.clear(g1.clone());
        assert!(!stack.undo_available());
        assert!(!stack.redo_available());
        assert_eq!(stack.current(), &g1);
        assert_eq!(stack.capacity(), 4);
    }
}
