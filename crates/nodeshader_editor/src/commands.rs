// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor commands.
//!
//! Commands are the only way the editing layer mutates a graph. Each one
//! reports whether it changed anything and whether the change can alter the
//! generated code, which decides how the session recompiles.

use nodeshader_graph::{
    ConnectionError, Graph, GraphError, Int2, NodeId, NodeType, SlotId, SlotValue, ValueError,
};
use serde::{Deserialize, Serialize};

/// Trait for editor commands applied to the active graph
pub trait EditorCommand: Send + Sync {
    /// Get a description of this command
    fn description(&self) -> &str;

    /// Execute the command
    fn execute(&self, graph: &mut Graph) -> Result<CommandOutcome, CommandError>;
}

/// What a command did to the graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// The graph differs from before
    pub changed: bool,
    /// The change can alter the generated statements
    pub structural: bool,
    /// Node created by the command
    pub created: Option<NodeId>,
}

impl CommandOutcome {
    /// Nothing happened
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// A change that needs a full rebuild
    pub fn structural(changed: bool) -> Self {
        Self {
            changed,
            structural: changed,
            created: None,
        }
    }

    /// A change that only touches parameter values or layout
    pub fn cosmetic(changed: bool) -> Self {
        Self {
            changed,
            structural: false,
            created: None,
        }
    }
}

/// Error type for command execution
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Node-level failure
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Connection rejected
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Value rejected
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
}

/// Command to add a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddNodeCommand {
    /// Type of the new node
    pub node_type: NodeType,
    /// Canvas position
    pub position: Int2,
}

impl AddNodeCommand {
    /// Create a new add command
    pub fn new(node_type: NodeType, position: Int2) -> Self {
        Self {
            node_type,
            position,
        }
    }
}

impl EditorCommand for AddNodeCommand {
    fn description(&self) -> &str {
        "Add Node"
    }

    fn execute(&self, graph: &mut Graph) -> Result<CommandOutcome, CommandError> {
        let id = graph.add(self.node_type, self.position);
        Ok(CommandOutcome {
            created: Some(id),
            ..CommandOutcome::structural(true)
        })
    }
}

/// Command to delete nodes and their connections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveNodesCommand {
    /// Nodes to delete
    pub nodes: Vec<NodeId>,
}

impl RemoveNodesCommand {
    /// Create a new delete command
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }
}

impl EditorCommand for RemoveNodesCommand {
    fn description(&self) -> &str {
        "Delete Nodes"
    }

    fn execute(&self, graph: &mut Graph) -> Result<CommandOutcome, CommandError> {
        let removed = graph.remove(self.nodes.iter().copied());
        Ok(CommandOutcome::structural(removed > 0))
    }
}

/// Command to duplicate a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateNodeCommand {
    /// Source node
    pub node: NodeId,
}

impl DuplicateNodeCommand {
    /// Create a new duplicate command
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }
}

impl EditorCommand for DuplicateNodeCommand {
    fn description(&self) -> &str {
        "Duplicate Node"
    }

    fn execute(&self, graph: &mut Graph) -> Result<CommandOutcome, CommandError> {
        let id = graph
            .duplicate(self.node)
            .ok_or(CommandError::NodeNotFound(self.node))?;
        Ok(CommandOutcome {
            created: Some(id),
            ..CommandOutcome::structural(true)
        })
    }
}

/// Command to connect an output slot to an input slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectCommand {
    /// Output slot
    pub source: SlotId,
    /// Input slot
    pub dest: SlotId,
}

impl ConnectCommand {
    /// Create a new connect command
    pub fn new(source: SlotId, dest: SlotId) -> Self {
        Self { source, dest }
    }
}

impl EditorCommand for ConnectCommand {
    fn description(&self) -> &str {
        "Connect"
    }

    fn execute(&self, graph: &mut Graph) -> Result<CommandOutcome, CommandError> {
        let previous = graph.add_connection(self.source, self.dest)?;
        let changed = previous.map_or(true, |p| p.source != self.source);
        Ok(CommandOutcome::structural(changed))
    }
}

/// Command to remove the connection into an input slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectCommand {
    /// Input slot
    pub dest: SlotId,
}

impl DisconnectCommand {
    /// Create a new disconnect command
    pub fn new(dest: SlotId) -> Self {
        Self { dest }
    }
}

impl EditorCommand for DisconnectCommand {
    fn description(&self) -> &str {
        "Disconnect"
    }

    fn execute(&self, graph: &mut Graph) -> Result<CommandOutcome, CommandError> {
        let removed = graph.remove_connection(self.dest);
        Ok(CommandOutcome::structural(removed.is_some()))
    }
}

/// Command to write a slot value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetSlotValueCommand {
    /// Slot being edited
    pub slot: SlotId,
    /// New value
    pub value: SlotValue,
}

impl SetSlotValueCommand {
    /// Create a new value edit command
    pub fn new(slot: SlotId, value: SlotValue) -> Self {
        Self { slot, value }
    }
}

impl EditorCommand for SetSlotValueCommand {
    fn description(&self) -> &str {
        "Edit Value"
    }

    fn execute(&self, graph: &mut Graph) -> Result<CommandOutcome, CommandError> {
        let changed = graph.set_value(self.slot, self.value.clone())?;
        // Enum options select a different statement template
        if matches!(self.value, SlotValue::Enum(_)) {
            Ok(CommandOutcome::structural(changed))
        } else {
            Ok(CommandOutcome::cosmetic(changed))
        }
    }
}

/// Command to move nodes on the canvas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveNodesCommand {
    /// Nodes being moved
    pub nodes: Vec<NodeId>,
    /// Offset applied to each node
    pub delta: Int2,
}

impl MoveNodesCommand {
    /// Create a new move command
    pub fn new(nodes: Vec<NodeId>, delta: Int2) -> Self {
        Self { nodes, delta }
    }
}

impl EditorCommand for MoveNodesCommand {
    fn description(&self) -> &str {
        "Move Nodes"
    }

    fn execute(&self, graph: &mut Graph) -> Result<CommandOutcome, CommandError> {
        let moved = graph.move_nodes(self.nodes.iter().copied(), self.delta);
        Ok(CommandOutcome::cosmetic(moved))
    }
}

/// Command to bring a node to the front
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaiseNodeCommand {
    /// Node to raise
    pub node: NodeId,
}

impl RaiseNodeCommand {
    /// Create a new raise command
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }
}

impl EditorCommand for RaiseNodeCommand {
    fn description(&self) -> &str {
        "Raise Node"
    }

    fn execute(&self, graph: &mut Graph) -> Result<CommandOutcome, CommandError> {
        if !graph.contains(self.node) {
            return Err(CommandError::NodeNotFound(self.node));
        }
        // Display order is not part of graph equality, so this never records history
        graph.raise(self.node);
        Ok(CommandOutcome::unchanged())
    }
}
