// SPDX-License-Identifier: MIT OR Apache-2.0
//! Textual graph documents.
//!
//! Graphs are stored as pretty-printed RON:
//!
//! ```text
//! (
//!     version: 1,
//!     next_id: 4,
//!     nodes: [
//!         (id: (1), type: value, position: (0, 0), values: [Float(0.5), Float(0.0)]),
//!     ],
//!     connections: [((node: (1), index: 1), (node: (3), index: 0))],
//! )
//! ```
//!
//! Nodes are written in display order and connections sorted by destination,
//! so identical graphs always serialize to identical text.

use crate::catalog::NodeType;
use crate::graph::{ConnectionError, Graph, GraphError, MAX_NODE_ID};
use crate::node::{Int2, Node, NodeId};
use crate::slot::SlotId;
use crate::value::SlotValue;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Current graph document format version
pub const DOCUMENT_VERSION: u32 = 1;

/// Serialized form of a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Format version
    pub version: u32,
    /// Id allocator state
    pub next_id: u64,
    /// Nodes in display order
    pub nodes: Vec<NodeRecord>,
    /// `(source, dest)` pairs sorted by destination
    pub connections: Vec<(SlotId, SlotId)>,
}

/// Serialized form of a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node id
    pub id: NodeId,
    /// Node type
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Canvas position
    pub position: Int2,
    /// Slot values in declaration order
    pub values: Vec<SlotValue>,
}

impl GraphDocument {
    /// Capture a graph
    pub fn from_graph(graph: &Graph) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            next_id: graph.next_id(),
            nodes: graph
                .nodes()
                .map(|node| NodeRecord {
                    id: node.id,
                    node_type: node.node_type(),
                    position: node.position,
                    values: node.values().to_vec(),
                })
                .collect(),
            connections: graph.connections().map(|c| (c.source, c.dest)).collect(),
        }
    }

    /// Rebuild the graph, validating every node and connection
    pub fn into_graph(self) -> Result<Graph, DocumentError> {
        if self.version > DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion(self.version));
        }

        if self.next_id > MAX_NODE_ID.0 + 1 {
            return Err(DocumentError::InvalidNextId(self.next_id));
        }

        let mut graph = Graph::new();
        graph.reserve_id(NodeId(self.next_id.saturating_sub(1)));

        for record in self.nodes {
            let id = record.id;
            let node = Node::from_values(id, record.node_type, record.position, record.values)
                .ok_or(DocumentError::InvalidValues(id))?;
            graph.insert_node(node)?;
        }

        for (source, dest) in self.connections {
            if graph.get_connection(dest).is_some() {
                return Err(DocumentError::DuplicateConnection(dest));
            }
            graph.add_connection(source, dest)?;
        }

        Ok(graph)
    }

    /// Render as pretty RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(false)
            .enumerate_arrays(false);
        ron::ser::to_string_pretty(self, config)
    }

    /// Parse from RON
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

impl Graph {
    /// Deterministic textual encoding of the full graph
    pub fn serialize(&self) -> Result<String, ron::Error> {
        GraphDocument::from_graph(self).to_ron().inspect_err(|err| {
            tracing::error!("Failed to serialize graph: {}", err);
        })
    }

    /// Parse a document produced by [`Graph::serialize`].
    ///
    /// Either the whole graph is rebuilt or an error is returned.
    pub fn parse(text: &str) -> Result<Graph, DocumentError> {
        let document = GraphDocument::from_ron(text)?;
        let graph = document.into_graph()?;
        tracing::debug!(
            "Parsed graph ({} nodes, {} connections)",
            graph.node_count(),
            graph.connection_count()
        );
        Ok(graph)
    }
}

impl FromStr for Graph {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Graph::parse(s)
    }
}

/// Error when reading a graph document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Malformed RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Written by a newer version
    #[error("Document version {0} is newer than supported version {v}", v = DOCUMENT_VERSION)]
    UnsupportedVersion(u32),

    /// Id allocator state past the accepted id range
    #[error("Invalid next id: {0}")]
    InvalidNextId(u64),

    /// Slot values do not fit the node type
    #[error("Invalid slot values for node {0}")]
    InvalidValues(NodeId),

    /// Two connections into one input
    #[error("Multiple connections into {0}")]
    DuplicateConnection(SlotId),

    /// Node-level problem (duplicate id)
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Connection rejected by the graph
    #[error("Invalid connection: {0}")]
    Connection(#[from] ConnectionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ColorRamp, ColorStop, Curve, ImageRef, RampInterpolation, RgbCurve};

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        let ramp = graph.add(NodeType::ColorRamp, [0, 0]);
        let curves = graph.add(NodeType::RgbCurves, [120, -40]);
        let image = graph.add(NodeType::ImageTexture, [-200, 10]);
        let out = graph.add(NodeType::Output, [300, 0]);

        graph
            .set_color_ramp(
                SlotId::new(ramp, 0),
                ColorRamp {
                    interpolation: RampInterpolation::Ease,
                    stops: vec![
                        ColorStop { position: 0.1, color: [0.25, 0.0, 1.0, 1.0] },
                        ColorStop { position: 0.7, color: [1.0, 0.3, 0.0, 0.5] },
                    ],
                },
            )
            .unwrap();
        graph
            .set_curve_rgb(
                SlotId::new(curves, 0),
                RgbCurve {
                    r: Curve { points: vec![[0.0, 0.1], [0.33, 0.9], [1.0, 1.0]] },
                    ..RgbCurve::default()
                },
            )
            .unwrap();
        graph
            .set_image_value(SlotId::new(image, 0), ImageRef::new("textures/brick.png"))
            .unwrap();
        graph.set_enum(SlotId::new(image, 1), 1).unwrap();
        graph.set_float(SlotId::new(out, 1), 0.123_456_79).unwrap();

        graph.add_connection(SlotId::new(image, 4), SlotId::new(ramp, 1)).unwrap();
        graph.add_connection(SlotId::new(ramp, 2), SlotId::new(curves, 2)).unwrap();
        graph.add_connection(SlotId::new(curves, 3), SlotId::new(out, 0)).unwrap();
        graph.raise(ramp);
        graph
    }

    #[test]
    fn test_round_trip() {
        let graph = sample_graph();
        let text = graph.serialize().unwrap();
        let parsed = Graph::parse(&text).unwrap();
        assert_eq!(parsed, graph);
        assert_eq!(parsed.serialize().unwrap(), text);
        assert_eq!(
            parsed.node_ids().collect::<Vec<_>>(),
            graph.node_ids().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_round_trip_keeps_id_allocator() {
        let mut graph = sample_graph();
        let last = graph.add(NodeType::Value, [0, 0]);
        graph.remove([last]);

        let mut parsed: Graph = graph.serialize().unwrap().parse().unwrap();
        assert!(parsed.add(NodeType::Value, [0, 0]) > last);
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(matches!(Graph::parse("not ron at all"), Err(DocumentError::Parse(_))));
        assert!(matches!(Graph::parse(""), Err(DocumentError::Parse(_))));
    }

    #[test]
    fn test_invalid_documents_rejected() {
        let text = sample_graph().serialize().unwrap();

        let mut doc = GraphDocument::from_ron(&text).unwrap();
        doc.version = DOCUMENT_VERSION + 1;
        let err = doc.into_graph().unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedVersion(2)));
        assert_eq!(err.to_string(), "Document version 2 is newer than supported version 1");

        let mut doc = GraphDocument::from_ron(&text).unwrap();
        doc.nodes[0].values.pop();
        assert!(matches!(doc.into_graph(), Err(DocumentError::InvalidValues(_))));

        let mut doc = GraphDocument::from_ron(&text).unwrap();
        let duplicate = doc.nodes[0].clone();
        doc.nodes.push(duplicate);
        assert!(matches!(doc.into_graph(), Err(DocumentError::Graph(GraphError::DuplicateNode(_)))));

        let mut doc = GraphDocument::from_ron(&text).unwrap();
        let (source, dest) = doc.connections[0];
        doc.connections.push((SlotId::new(source.node, source.index), dest));
        assert!(matches!(doc.into_graph(), Err(DocumentError::DuplicateConnection(_))));

        let mut doc = GraphDocument::from_ron(&text).unwrap();
        doc.connections.push((SlotId::new(NodeId(999), 0), SlotId::new(NodeId(998), 0)));
        assert!(matches!(doc.into_graph(), Err(DocumentError::Connection(_))));
    }

    #[test]
    fn test_id_range_enforced() {
        let text = sample_graph().serialize().unwrap();

        let mut doc = GraphDocument::from_ron(&text).unwrap();
        doc.next_id = u64::MAX;
        assert!(matches!(doc.into_graph(), Err(DocumentError::InvalidNextId(u64::MAX))));

        let mut doc = GraphDocument::from_ron(&text).unwrap();
        doc.nodes[0].id = NodeId(u64::MAX);
        assert!(matches!(
            doc.into_graph(),
            Err(DocumentError::Graph(GraphError::IdOutOfRange(_)))
        ));

        let mut doc = GraphDocument::from_ron(&text).unwrap();
        doc.next_id = MAX_NODE_ID.0 + 1;
        let mut graph = doc.into_graph().unwrap();
        let first = graph.add(NodeType::Value, [0, 0]);
        let second = graph.add(NodeType::Value, [0, 0]);
        assert_eq!(first, NodeId(MAX_NODE_ID.0 + 1));
        assert!(second > first);
    }

    #[test]
    fn test_cyclic_document_rejected() {
        let mut graph = Graph::new();
        let a = graph.add(NodeType::Math, [0, 0]);
        let b = graph.add(NodeType::Math, [0, 0]);
        graph.add_connection(SlotId::new(a, 4), SlotId::new(b, 2)).unwrap();

        let mut doc = GraphDocument::from_graph(&graph);
        doc.connections.push((SlotId::new(b, 4), SlotId::new(a, 2)));
        assert!(matches!(
            doc.into_graph(),
            Err(DocumentError::Connection(ConnectionError::WouldCycle { .. }))
        ));
    }
}
