// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeId;
use crate::slot::SlotId;
use serde::{Deserialize, Serialize};

/// A connection from an output slot to an input slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Output slot feeding the connection
    pub source: SlotId,
    /// Input slot receiving the value
    pub dest: SlotId,
}

impl Connection {
    /// Create a new connection
    pub fn new(source: SlotId, dest: SlotId) -> Self {
        Self { source, dest }
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.source.node == node_id || self.dest.node == node_id
    }
}
