// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and connections.
//!
//! The graph owns every node (in display order) and the set of slot
//! connections, keyed by destination so an input can have at most one
//! incoming connection. The node-level dependency graph is kept acyclic:
//! [`Graph::add_connection`] rejects any edge that would close a cycle.

use crate::catalog::NodeType;
use crate::connection::Connection;
use crate::node::{Int2, Node, NodeId};
use crate::slot::{SlotDecl, SlotId, SlotType};
use crate::value::{ColorRamp, ImageRef, InvalidValue, RgbCurve, SlotValue, VectorCurve};
use indexmap::IndexMap;
use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// Offset applied to duplicated nodes
pub const DUPLICATE_OFFSET: Int2 = [20, 20];

/// Largest id accepted from callers and documents.
///
/// Ids above it are only ever handed out by the allocator itself, which
/// leaves half the id space for [`Graph::add`].
pub const MAX_NODE_ID: NodeId = NodeId(i64::MAX as u64);

/// A shader node graph
#[derive(Debug, Clone)]
pub struct Graph {
    /// Nodes in display order
    nodes: IndexMap<NodeId, Node>,
    /// Connections by destination slot
    connections: BTreeMap<SlotId, SlotId>,
    /// Next id handed out by [`Graph::add`]
    next_id: u64,
    /// Topological order cache, reset on structural changes
    nodes_by_order: OnceCell<Vec<NodeId>>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            connections: BTreeMap::new(),
            next_id: 1,
            nodes_by_order: OnceCell::new(),
        }
    }

    /// Add a node with default slot values
    pub fn add(&mut self, node_type: NodeType, position: Int2) -> NodeId {
        let id = self.allocate_id();
        self.nodes.insert(id, Node::new(id, node_type, position));
        self.invalidate_order();
        tracing::debug!("Added {} node {}", node_type.key(), id);
        id
    }

    /// Add a node under a caller-chosen id
    pub fn add_with_id(
        &mut self,
        node_type: NodeType,
        position: Int2,
        id: NodeId,
    ) -> Result<(), GraphError> {
        self.insert_node(Node::new(id, node_type, position))
    }

    pub(crate) fn insert_node(&mut self, node: Node) -> Result<(), GraphError> {
        if node.id > MAX_NODE_ID {
            return Err(GraphError::IdOutOfRange(node.id));
        }
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.reserve_id(node.id);
        self.nodes.insert(node.id, node);
        self.invalidate_order();
        Ok(())
    }

    /// Make sure `id` (and everything below it) is never handed out again
    pub(crate) fn reserve_id(&mut self, id: NodeId) {
        self.next_id = self.next_id.max(id.0.saturating_add(1));
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        // Reserved ids stop at MAX_NODE_ID, so the counter cannot reach u64::MAX
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Remove nodes and every connection touching them; returns how many were removed
    pub fn remove(&mut self, ids: impl IntoIterator<Item = NodeId>) -> usize {
        let removed: HashSet<NodeId> = ids
            .into_iter()
            .filter(|id| self.nodes.shift_remove(id).is_some())
            .collect();

        if removed.is_empty() {
            return 0;
        }

        self.connections
            .retain(|dest, source| !removed.contains(&dest.node) && !removed.contains(&source.node));
        self.invalidate_order();
        tracing::debug!("Removed {} node(s)", removed.len());
        removed.len()
    }

    /// Clone a node under a new id, offset by [`DUPLICATE_OFFSET`]
    pub fn duplicate(&mut self, node_id: NodeId) -> Option<NodeId> {
        let source = self.nodes.get(&node_id)?;
        let id = NodeId(self.next_id);
        let position = [
            source.position[0].saturating_add(DUPLICATE_OFFSET[0]),
            source.position[1].saturating_add(DUPLICATE_OFFSET[1]),
        ];
        let node = Node::from_values(id, source.node_type(), position, source.values().to_vec())?;

        self.allocate_id();
        self.nodes.insert(id, node);
        self.invalidate_order();
        Some(id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Check if a node exists
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get all nodes in display order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs in display order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Declaration of a slot
    pub fn slot_decl(&self, slot: SlotId) -> Option<&'static SlotDecl> {
        self.nodes.get(&slot.node)?.decl(slot.index)
    }

    /// Current value of a slot
    pub fn slot_value(&self, slot: SlotId) -> Option<&SlotValue> {
        self.nodes.get(&slot.node)?.value(slot.index)
    }

    /// Connect an output slot to an input slot.
    ///
    /// Replaces (and returns) any connection previously feeding `dest`. On
    /// error the graph is left unchanged.
    pub fn add_connection(
        &mut self,
        source: SlotId,
        dest: SlotId,
    ) -> Result<Option<Connection>, ConnectionError> {
        let source_decl = self
            .slot_decl(source)
            .ok_or(ConnectionError::SlotNotFound(source))?;
        let dest_decl = self
            .slot_decl(dest)
            .ok_or(ConnectionError::SlotNotFound(dest))?;

        if !source_decl.is_output() {
            return Err(ConnectionError::NotAnOutput(source));
        }
        if !dest_decl.is_input() {
            return Err(ConnectionError::NotAnInput(dest));
        }
        if !source_decl.can_connect(dest_decl) {
            if !dest_decl.connectable {
                return Err(ConnectionError::NotConnectable(dest));
            }
            return Err(ConnectionError::IncompatibleTypes {
                from: source_decl.slot_type(),
                to: dest_decl.slot_type(),
            });
        }

        if source.node == dest.node || self.depends_on(source.node, dest.node) {
            tracing::debug!("Rejected connection {} -> {}: would create a cycle", source, dest);
            return Err(ConnectionError::WouldCycle { from: source, to: dest });
        }

        let previous = self
            .connections
            .insert(dest, source)
            .map(|old| Connection::new(old, dest));
        if previous.map(|c| c.source) != Some(source) {
            self.invalidate_order();
        }
        Ok(previous)
    }

    /// Disconnect whatever feeds `dest`
    pub fn remove_connection(&mut self, dest: SlotId) -> Option<Connection> {
        let source = self.connections.remove(&dest)?;
        self.invalidate_order();
        Some(Connection::new(source, dest))
    }

    /// Connection feeding `dest`, if any
    pub fn get_connection(&self, dest: SlotId) -> Option<Connection> {
        self.connections
            .get(&dest)
            .map(|source| Connection::new(*source, dest))
    }

    /// Get all connections, ordered by destination
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.connections
            .iter()
            .map(|(dest, source)| Connection::new(*source, *dest))
    }

    /// Get connections from a specific output slot
    pub fn connections_from(&self, source: SlotId) -> impl Iterator<Item = Connection> + '_ {
        self.connections().filter(move |c| c.source == source)
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = Connection> + '_ {
        self.connections().filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Write a slot value after checking it against the slot declaration.
    ///
    /// Returns `Ok(true)` only if the stored value actually changed.
    pub fn set_value(&mut self, slot: SlotId, value: SlotValue) -> Result<bool, ValueError> {
        let node = self
            .nodes
            .get_mut(&slot.node)
            .ok_or(ValueError::SlotNotFound(slot))?;
        let decl = node.decl(slot.index).ok_or(ValueError::SlotNotFound(slot))?;

        if !decl.is_input() {
            return Err(ValueError::OutputSlot(slot));
        }
        if decl.slot_type() != value.slot_type() {
            return Err(ValueError::TypeMismatch {
                slot,
                expected: decl.slot_type(),
                found: value.slot_type(),
            });
        }
        if let SlotValue::Enum(index) = value {
            let options = decl.enum_options().len();
            if index as usize >= options {
                return Err(ValueError::EnumOutOfRange { slot, index, options });
            }
        }
        value
            .check()
            .map_err(|reason| ValueError::Invalid { slot, reason })?;

        let current = node
            .value_mut(slot.index)
            .ok_or(ValueError::SlotNotFound(slot))?;
        if *current == value {
            return Ok(false);
        }
        *current = value;
        Ok(true)
    }

    /// Set a boolean slot
    pub fn set_bool(&mut self, slot: SlotId, value: bool) -> Result<bool, ValueError> {
        self.set_value(slot, SlotValue::Bool(value))
    }

    /// Set a color slot
    pub fn set_color(&mut self, slot: SlotId, value: [f32; 3]) -> Result<bool, ValueError> {
        self.set_value(slot, SlotValue::Color(value))
    }

    /// Set an enum slot
    pub fn set_enum(&mut self, slot: SlotId, index: u32) -> Result<bool, ValueError> {
        self.set_value(slot, SlotValue::Enum(index))
    }

    /// Set a float slot
    pub fn set_float(&mut self, slot: SlotId, value: f32) -> Result<bool, ValueError> {
        self.set_value(slot, SlotValue::Float(value))
    }

    /// Set an integer slot
    pub fn set_int(&mut self, slot: SlotId, value: i32) -> Result<bool, ValueError> {
        self.set_value(slot, SlotValue::Int(value))
    }

    /// Set a vector slot
    pub fn set_vector(&mut self, slot: SlotId, value: [f32; 3]) -> Result<bool, ValueError> {
        self.set_value(slot, SlotValue::Vector(value))
    }

    /// Set a color ramp slot
    pub fn set_color_ramp(&mut self, slot: SlotId, ramp: ColorRamp) -> Result<bool, ValueError> {
        self.set_value(slot, SlotValue::ColorRamp(ramp))
    }

    /// Set an RGB curves slot
    pub fn set_curve_rgb(&mut self, slot: SlotId, curves: RgbCurve) -> Result<bool, ValueError> {
        self.set_value(slot, SlotValue::RgbCurve(curves))
    }

    /// Set a vector curves slot
    pub fn set_curve_vec(&mut self, slot: SlotId, curves: VectorCurve) -> Result<bool, ValueError> {
        self.set_value(slot, SlotValue::VectorCurve(curves))
    }

    /// Set an image slot
    pub fn set_image_value(&mut self, slot: SlotId, image: ImageRef) -> Result<bool, ValueError> {
        self.set_value(slot, SlotValue::Image(image))
    }

    /// Translate node positions; returns whether any node moved
    pub fn move_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>, delta: Int2) -> bool {
        if delta == [0, 0] {
            return false;
        }
        let mut moved = false;
        for id in ids {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.position[0] = node.position[0].saturating_add(delta[0]);
                node.position[1] = node.position[1].saturating_add(delta[1]);
                moved = true;
            }
        }
        moved
    }

    /// Move a node to the end of the display order (drawn on top).
    ///
    /// Display order is cosmetic: it affects neither equality nor code generation.
    pub fn raise(&mut self, node_id: NodeId) -> bool {
        match self.nodes.get_index_of(&node_id) {
            Some(index) if index + 1 < self.nodes.len() => {
                if let Some(node) = self.nodes.shift_remove(&node_id) {
                    self.nodes.insert(node_id, node);
                }
                true
            }
            _ => false,
        }
    }

    /// The designated output node: the `Output` node with the lowest id
    pub fn output_node(&self) -> Option<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.node_type() == NodeType::Output)
            .map(|n| n.id)
            .min()
    }

    /// Nodes in dependency order (sources before the nodes they feed).
    ///
    /// Ties between independent nodes go to the lower id. The order is cached
    /// until the next structural change.
    pub fn nodes_by_order(&self) -> Result<&[NodeId], CycleError> {
        if let Some(order) = self.nodes_by_order.get() {
            return Ok(order);
        }
        let order = self.topological_order()?;
        Ok(self.nodes_by_order.get_or_init(|| order))
    }

    /// Whether the order cache is currently populated
    pub fn is_order_cached(&self) -> bool {
        self.nodes_by_order.get().is_some()
    }

    fn invalidate_order(&mut self) {
        self.nodes_by_order = OnceCell::new();
    }

    /// Kahn's algorithm with a min-id ready set
    fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut in_degree: HashMap<NodeId, usize> = self.nodes.keys().map(|id| (*id, 0)).collect();
        let mut dependents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (dest, source) in &self.connections {
            dependents.entry(source.node).or_default().push(dest.node);
            *in_degree.entry(dest.node).or_default() += 1;
        }

        let mut ready: BTreeSet<NodeId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = ready.pop_first() {
            order.push(id);
            for dependent in dependents.get(&id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if order.len() < in_degree.len() {
            let placed: HashSet<NodeId> = order.iter().copied().collect();
            let mut nodes: Vec<NodeId> = in_degree
                .keys()
                .filter(|id| !placed.contains(id))
                .copied()
                .collect();
            nodes.sort();
            return Err(CycleError { nodes });
        }

        Ok(order)
    }

    /// Whether `target` is reachable downstream from `start`
    fn depends_on(&self, target: NodeId, start: NodeId) -> bool {
        let mut dependents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (dest, source) in &self.connections {
            dependents.entry(source.node).or_default().push(dest.node);
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            if id == target {
                return true;
            }
            if visited.insert(id) {
                queue.extend(dependents.get(&id).into_iter().flatten().copied());
            }
        }
        false
    }

    /// Insert a connection without any validation (for exercising cycle detection)
    #[cfg(test)]
    pub(crate) fn insert_connection_unchecked(&mut self, source: SlotId, dest: SlotId) {
        self.connections.insert(dest, source);
        self.invalidate_order();
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: nodes compared by id regardless of display order, plus the connection set
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes.len() == other.nodes.len()
            && self
                .nodes
                .iter()
                .all(|(id, node)| other.nodes.get(id) == Some(node))
            && self.connections == other.connections
    }
}

/// Error from a structural graph operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Node id already in use
    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Explicit id past [`MAX_NODE_ID`]
    #[error("Node id {0} is out of range")]
    IdOutOfRange(NodeId),
}

/// Error when creating a connection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Slot not found
    #[error("Slot not found: {0}")]
    SlotNotFound(SlotId),

    /// Source slot is an input
    #[error("Slot is not an output: {0}")]
    NotAnOutput(SlotId),

    /// Destination slot is an output
    #[error("Slot is not an input: {0}")]
    NotAnInput(SlotId),

    /// Destination is a property slot
    #[error("Slot does not accept connections: {0}")]
    NotConnectable(SlotId),

    /// Incompatible slot types
    #[error("Cannot connect {from:?} output to {to:?} input")]
    IncompatibleTypes {
        /// Source slot type
        from: SlotType,
        /// Destination slot type
        to: SlotType,
    },

    /// Connection would close a dependency cycle
    #[error("Connecting {from} to {to} would create a cycle")]
    WouldCycle {
        /// Source slot
        from: SlotId,
        /// Destination slot
        to: SlotId,
    },
}

/// Error when writing a slot value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// Slot not found
    #[error("Slot not found: {0}")]
    SlotNotFound(SlotId),

    /// Output slots have no editable value
    #[error("Slot is an output: {0}")]
    OutputSlot(SlotId),

    /// Value type differs from the declared slot type
    #[error("Slot {slot} expects {expected:?}, got {found:?}")]
    TypeMismatch {
        /// Target slot
        slot: SlotId,
        /// Declared type
        expected: SlotType,
        /// Type of the rejected value
        found: SlotType,
    },

    /// Enum index past the option list
    #[error("Enum index {index} out of range for slot {slot} ({options} options)")]
    EnumOutOfRange {
        /// Target slot
        slot: SlotId,
        /// Rejected index
        index: u32,
        /// Number of options
        options: usize,
    },

    /// Malformed payload
    #[error("Invalid value for slot {slot}: {reason}")]
    Invalid {
        /// Target slot
        slot: SlotId,
        /// What was wrong
        reason: InvalidValue,
    },
}

/// Error when graph contains a cycle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Graph contains a cycle through {} node(s)", .nodes.len())]
pub struct CycleError {
    /// Nodes that could not be ordered
    pub nodes: Vec<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(node: NodeId, index: u32) -> SlotId {
        SlotId::new(node, index)
    }

    #[test]
    fn test_ids_never_reused() {
        let mut graph = Graph::new();
        let a = graph.add(NodeType::Value, [0, 0]);
        graph.remove([a]);
        let b = graph.add(NodeType::Value, [0, 0]);
        assert_ne!(a, b);

        assert_eq!(
            graph.add_with_id(NodeType::Rgb, [0, 0], b),
            Err(GraphError::DuplicateNode(b))
        );
        graph.add_with_id(NodeType::Rgb, [0, 0], NodeId(40)).unwrap();
        assert!(graph.add(NodeType::Value, [0, 0]) > NodeId(40));
    }

    #[test]
    fn test_explicit_id_range() {
        let mut graph = Graph::new();
        assert_eq!(
            graph.add_with_id(NodeType::Value, [0, 0], NodeId(u64::MAX)),
            Err(GraphError::IdOutOfRange(NodeId(u64::MAX)))
        );
        assert_eq!(graph.node_count(), 0);

        graph.add_with_id(NodeType::Value, [0, 0], MAX_NODE_ID).unwrap();
        let a = graph.add(NodeType::Value, [0, 0]);
        let b = graph.duplicate(a).unwrap();
        assert!(a > MAX_NODE_ID);
        assert!(b > a);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_remove_cascades_connections() {
        let mut graph = Graph::new();
        let value = graph.add(NodeType::Value, [0, 0]);
        let math = graph.add(NodeType::Math, [100, 0]);
        let out = graph.add(NodeType::Output, [200, 0]);
        graph.add_connection(slot(value, 1), slot(math, 2)).unwrap();
        graph.add_connection(slot(math, 4), slot(out, 1)).unwrap();

        assert_eq!(graph.remove([math, NodeId(999)]), 1);
        assert_eq!(graph.connection_count(), 0);
        assert_eq!(graph.remove([math]), 0);
    }

    #[test]
    fn test_connection_validation() {
        let mut graph = Graph::new();
        let value = graph.add(NodeType::Value, [0, 0]);
        let math = graph.add(NodeType::Math, [0, 0]);
        let ramp = graph.add(NodeType::ColorRamp, [0, 0]);

        assert_eq!(
            graph.add_connection(slot(math, 2), slot(value, 1)),
            Err(ConnectionError::NotAnOutput(slot(math, 2)))
        );
        assert_eq!(
            graph.add_connection(slot(value, 1), slot(math, 4)),
            Err(ConnectionError::NotAnInput(slot(math, 4)))
        );
        assert_eq!(
            graph.add_connection(slot(value, 1), slot(math, 0)),
            Err(ConnectionError::NotConnectable(slot(math, 0)))
        );
        assert_eq!(
            graph.add_connection(slot(value, 1), slot(ramp, 0)),
            Err(ConnectionError::NotConnectable(slot(ramp, 0)))
        );
        assert_eq!(
            graph.add_connection(slot(value, 7), slot(math, 2)),
            Err(ConnectionError::SlotNotFound(slot(value, 7)))
        );
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_at_most_one_incoming() {
        let mut graph = Graph::new();
        let a = graph.add(NodeType::Value, [0, 0]);
        let b = graph.add(NodeType::Value, [0, 0]);
        let math = graph.add(NodeType::Math, [0, 0]);

        assert_eq!(graph.add_connection(slot(a, 1), slot(math, 2)), Ok(None));
        let replaced = graph.add_connection(slot(b, 1), slot(math, 2)).unwrap();
        assert_eq!(replaced, Some(Connection::new(slot(a, 1), slot(math, 2))));
        assert_eq!(graph.connection_count(), 1);
        assert_eq!(
            graph.get_connection(slot(math, 2)),
            Some(Connection::new(slot(b, 1), slot(math, 2)))
        );

        // Fan-out from one source is fine
        graph.add_connection(slot(b, 1), slot(math, 3)).unwrap();
        assert_eq!(graph.connections_from(slot(b, 1)).count(), 2);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut graph = Graph::new();
        let a = graph.add(NodeType::Math, [0, 0]);
        let b = graph.add(NodeType::Math, [0, 0]);
        let c = graph.add(NodeType::Math, [0, 0]);
        graph.add_connection(slot(a, 4), slot(b, 2)).unwrap();
        graph.add_connection(slot(b, 4), slot(c, 2)).unwrap();

        let before = graph.clone();
        assert!(matches!(
            graph.add_connection(slot(c, 4), slot(a, 2)),
            Err(ConnectionError::WouldCycle { .. })
        ));
        assert!(matches!(
            graph.add_connection(slot(a, 4), slot(a, 3)),
            Err(ConnectionError::WouldCycle { .. })
        ));
        assert_eq!(graph, before);
        assert!(graph.nodes_by_order().is_ok());
    }

    #[test]
    fn test_connection_error_messages() {
        use std::error::Error;

        let mut graph = Graph::new();
        let a = graph.add(NodeType::Math, [0, 0]);
        let err = graph.add_connection(slot(a, 4), slot(a, 2)).unwrap_err();
        assert!(err.to_string().ends_with("would create a cycle"));
        assert!(err.source().is_none());

        let err = ConnectionError::IncompatibleTypes {
            from: SlotType::Color,
            to: SlotType::Int,
        };
        assert_eq!(err.to_string(), "Cannot connect Color output to Int input");
    }

    #[test]
    fn test_set_value_reports_change() {
        let mut graph = Graph::new();
        let math = graph.add(NodeType::Math, [0, 0]);

        assert_eq!(graph.set_float(slot(math, 2), 0.5), Ok(false));
        assert_eq!(graph.set_float(slot(math, 2), 2.0), Ok(true));
        assert_eq!(graph.set_float(slot(math, 2), 2.0), Ok(false));
        assert_eq!(graph.slot_value(slot(math, 2)), Some(&SlotValue::Float(2.0)));

        assert!(matches!(
            graph.set_int(slot(math, 2), 3),
            Err(ValueError::TypeMismatch { .. })
        ));
        assert_eq!(
            graph.set_float(slot(math, 4), 1.0),
            Err(ValueError::OutputSlot(slot(math, 4)))
        );
        assert!(matches!(
            graph.set_enum(slot(math, 0), 42),
            Err(ValueError::EnumOutOfRange { .. })
        ));
        assert!(matches!(
            graph.set_float(slot(math, 2), f32::NAN),
            Err(ValueError::Invalid { .. })
        ));
        assert_eq!(
            graph.set_bool(slot(NodeId(77), 0), true),
            Err(ValueError::SlotNotFound(slot(NodeId(77), 0)))
        );
    }

    #[test]
    fn test_value_edits_keep_order_cache() {
        let mut graph = Graph::new();
        let value = graph.add(NodeType::Value, [0, 0]);
        let out = graph.add(NodeType::Output, [0, 0]);
        graph.add_connection(slot(value, 1), slot(out, 1)).unwrap();

        graph.nodes_by_order().unwrap();
        assert!(graph.is_order_cached());

        graph.set_float(slot(value, 0), 3.0).unwrap();
        graph.move_nodes([value], [5, 5]);
        graph.raise(value);
        assert!(graph.is_order_cached());

        graph.remove_connection(slot(out, 1));
        assert!(!graph.is_order_cached());
    }

    #[test]
    fn test_duplicate() {
        let mut graph = Graph::new();
        let rgb = graph.add(NodeType::Rgb, [10, 10]);
        graph.set_color(slot(rgb, 0), [1.0, 0.0, 0.0]).unwrap();

        let copy = graph.duplicate(rgb).unwrap();
        let node = graph.node(copy).unwrap();
        assert_eq!(node.position, [30, 30]);
        assert_eq!(node.value(0), Some(&SlotValue::Color([1.0, 0.0, 0.0])));
        assert_eq!(graph.duplicate(NodeId(500)), None);
    }

    #[test]
    fn test_raise_and_equality() {
        let mut graph = Graph::new();
        let a = graph.add(NodeType::Value, [0, 0]);
        let b = graph.add(NodeType::Value, [0, 0]);
        let before = graph.clone();

        assert!(graph.raise(a));
        assert!(!graph.raise(a));
        assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(graph, before);

        graph.move_nodes([a], [1, 0]);
        assert_ne!(graph, before);
        assert!(!graph.move_nodes([NodeId(1234)], [1, 0]));
        assert!(!graph.move_nodes(Vec::new(), [1, 0]));
    }

    #[test]
    fn test_topological_order_and_ties() {
        let mut graph = Graph::new();
        let out = graph.add(NodeType::Output, [0, 0]);
        let math = graph.add(NodeType::Math, [0, 0]);
        let value = graph.add(NodeType::Value, [0, 0]);
        let other = graph.add(NodeType::Value, [0, 0]);
        graph.add_connection(slot(math, 4), slot(out, 1)).unwrap();
        graph.add_connection(slot(value, 1), slot(math, 2)).unwrap();

        assert_eq!(graph.nodes_by_order().unwrap(), &[value, math, out, other]);
    }

    #[test]
    fn test_cycle_detected_in_order() {
        let mut graph = Graph::new();
        let a = graph.add(NodeType::Math, [0, 0]);
        let b = graph.add(NodeType::Math, [0, 0]);
        let c = graph.add(NodeType::Value, [0, 0]);
        graph.insert_connection_unchecked(slot(a, 4), slot(b, 2));
        graph.insert_connection_unchecked(slot(b, 4), slot(a, 2));

        let err = graph.nodes_by_order().unwrap_err();
        assert_eq!(err.nodes, vec![a, b]);
        assert!(!graph.is_order_cached());
        assert!(graph.contains(c));
    }
}
