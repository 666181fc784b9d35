// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node-based shader authoring core for `nodeshader`.
//!
//! This crate provides the data model and compiler behind the editor:
//! - Typed node catalog (inputs, math, color, textures, output)
//! - Graph with validated, acyclic slot connections
//! - Deterministic RON documents
//! - Code generation into a backend-neutral statement list
//! - WGSL and GLSL backends
//!
//! ## Architecture
//!
//! A [`Graph`] owns [`Node`]s, each an instance of a [`NodeType`] with a fixed
//! slot table. Connections run from output slots to input slots, at most one
//! per input. [`Graph::generate_code`] orders the nodes feeding the output
//! node and lowers them to [`CodeGenerateData`], which a [`Backend`] turns
//! into source text.

pub mod backend;
pub mod catalog;
pub mod codegen;
pub mod connection;
pub mod document;
pub mod graph;
pub mod node;
pub mod slot;
pub mod value;

pub use backend::{Backend, BackendError, BackendKind, GlslBackend, WgslBackend};
pub use catalog::{NodeCategory, NodeType};
pub use codegen::{CodeGenerateData, CodegenError, ParameterTable, ParameterValue};
pub use connection::Connection;
pub use document::{DocumentError, GraphDocument, DOCUMENT_VERSION};
pub use graph::{ConnectionError, CycleError, Graph, GraphError, ValueError, MAX_NODE_ID};
pub use node::{Int2, Node, NodeId};
pub use slot::{SlotDecl, SlotDirection, SlotId, SlotType};
pub use value::{
    ColorRamp, ColorStop, Curve, ImageRef, InvalidValue, RampInterpolation, RgbCurve, SlotValue,
    VectorCurve,
};
