// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node instances.

use crate::catalog::NodeType;
use crate::slot::{SlotDecl, SlotId};
use crate::value::SlotValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node within a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Integer position of a node in the editor canvas
pub type Int2 = [i32; 2];

/// A node instance in the graph
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Position in the graph UI
    pub position: Int2,
    node_type: NodeType,
    values: Vec<SlotValue>,
}

impl Node {
    /// Create a node with the type's default slot values
    pub fn new(id: NodeId, node_type: NodeType, position: Int2) -> Self {
        Self {
            id,
            position,
            node_type,
            values: node_type.slots().iter().map(|s| s.default.value()).collect(),
        }
    }

    /// Rebuild a node from stored values; `None` if they do not match the type's slots
    pub(crate) fn from_values(
        id: NodeId,
        node_type: NodeType,
        position: Int2,
        values: Vec<SlotValue>,
    ) -> Option<Self> {
        let decls = node_type.slots();
        if decls.len() != values.len() {
            return None;
        }
        let valid = decls.iter().zip(&values).all(|(decl, value)| {
            decl.slot_type() == value.slot_type()
                && value.check().is_ok()
                && value
                    .as_enum()
                    .map_or(true, |index| (index as usize) < decl.enum_options().len())
        });
        valid.then_some(Self {
            id,
            position,
            node_type,
            values,
        })
    }

    /// Node type (fixed at creation)
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Address of the slot at `index`
    pub fn slot_id(&self, index: u32) -> SlotId {
        SlotId::new(self.id, index)
    }

    /// Declaration of the slot at `index`
    pub fn decl(&self, index: u32) -> Option<&'static SlotDecl> {
        self.node_type.slots().get(index as usize)
    }

    /// Current value of the slot at `index`
    pub fn value(&self, index: u32) -> Option<&SlotValue> {
        self.values.get(index as usize)
    }

    pub(crate) fn value_mut(&mut self, index: u32) -> Option<&mut SlotValue> {
        self.values.get_mut(index as usize)
    }

    /// All slot values in declaration order
    pub fn values(&self) -> &[SlotValue] {
        &self.values
    }

    /// Slots as `(id, declaration, value)` in declaration order
    pub fn slots(&self) -> impl Iterator<Item = (SlotId, &'static SlotDecl, &SlotValue)> + '_ {
        self.node_type
            .slots()
            .iter()
            .zip(&self.values)
            .enumerate()
            .map(|(i, (decl, value))| (self.slot_id(i as u32), decl, value))
    }

    /// Input slots only
    pub fn inputs(&self) -> impl Iterator<Item = (SlotId, &'static SlotDecl, &SlotValue)> + '_ {
        self.slots().filter(|(_, decl, _)| decl.is_input())
    }

    /// Output slots only
    pub fn outputs(&self) -> impl Iterator<Item = (SlotId, &'static SlotDecl, &SlotValue)> + '_ {
        self.slots().filter(|(_, decl, _)| decl.is_output())
    }
}
