// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader code generation.
//!
//! Lowers the nodes upstream of the designated output into
//! [`CodeGenerateData`]: typed statements in dependency order, a parameter
//! table holding every editable value and the output binding.
//!
//! Unconnected inputs become parameters named `p_n{node}_{slot}`, so editing
//! a value only ever changes the table. Enum slots (math operations, blend
//! modes, filters) pick the statements themselves and need a regeneration.

mod ir;

pub use ir::{
    BinaryOp, Builtin, CodeGenerateData, Expr, Parameter, ParameterTable, ParameterValue,
    ShaderInput, ShaderOutput, ShaderType, Statement,
};

use crate::catalog::NodeType;
use crate::graph::{CycleError, Graph};
use crate::node::{Node, NodeId};
use crate::slot::{SlotId, SlotType};
use crate::value::SlotValue;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Samples per baked ramp or curve lookup table
pub const LUT_SIZE: usize = 256;

/// Parameter name for an unconnected input slot
pub fn param_name(slot: SlotId) -> String {
    format!("p_{}_{}", slot.node, slot.index)
}

/// Variable name holding an output slot's value
pub fn var_name(slot: SlotId) -> String {
    format!("v_{}_{}", slot.node, slot.index)
}

fn temp_name(node: NodeId, tag: &str) -> String {
    format!("t_{node}_{tag}")
}

/// Geometry input read by an unconnected texture vector slot
fn implicit_input(node_type: NodeType, index: u32) -> Option<ShaderInput> {
    match (node_type, index) {
        (NodeType::ImageTexture, 2) => Some(ShaderInput::Uv),
        (NodeType::NoiseTexture | NodeType::CheckerTexture, 0) => Some(ShaderInput::Generated),
        _ => None,
    }
}

fn parameter_value(value: &SlotValue) -> Option<ParameterValue> {
    Some(match value {
        SlotValue::Bool(v) => ParameterValue::Bool(*v),
        SlotValue::Int(v) => ParameterValue::Int(*v),
        SlotValue::Float(v) => ParameterValue::Float(*v),
        SlotValue::Vector(v) | SlotValue::Color(v) => ParameterValue::Vec3(*v),
        SlotValue::ColorRamp(ramp) => ParameterValue::Lut(ramp.bake(LUT_SIZE)),
        SlotValue::RgbCurve(curves) => ParameterValue::Lut(curves.bake(LUT_SIZE)),
        SlotValue::VectorCurve(curves) => ParameterValue::Lut(curves.bake(LUT_SIZE)),
        SlotValue::Image(image) => ParameterValue::Image(image.clone()),
        SlotValue::Enum(_) => return None,
    })
}

/// Explicit conversion between connected slot types
fn convert(expr: Expr, from: SlotType, to: SlotType) -> Expr {
    match (from, to) {
        (SlotType::Int, SlotType::Float) => expr.convert(ShaderType::Float),
        (SlotType::Float, SlotType::Int) => expr.convert(ShaderType::Int),
        (SlotType::Float, SlotType::Vector | SlotType::Color) => expr.convert(ShaderType::Vec3),
        (SlotType::Int, SlotType::Vector | SlotType::Color) => {
            expr.convert(ShaderType::Float).convert(ShaderType::Vec3)
        }
        (SlotType::Color, SlotType::Float) => Expr::call(Builtin::Luminance, [expr]),
        (SlotType::Vector, SlotType::Float) => Expr::call(Builtin::Average, [expr]),
        // Same type, or vector and color (both vec3)
        _ => expr,
    }
}

/// Error from code generation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    /// Dependency cycle; nothing was generated
    #[error("Graph contains a cycle through {}", format_nodes(.nodes))]
    Cycle {
        /// Nodes on or behind the cycle
        nodes: Vec<NodeId>,
    },

    /// No output node in the graph
    #[error("Graph has no output node")]
    MissingOutput,

    /// A connection references a slot the node type does not declare
    #[error("Slot not found: {0}")]
    SlotNotFound(SlotId),
}

fn format_nodes(nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<CycleError> for CodegenError {
    fn from(err: CycleError) -> Self {
        Self::Cycle { nodes: err.nodes }
    }
}

impl Graph {
    /// Generate backend-neutral shader code for the designated output node
    pub fn generate_code(&self) -> Result<CodeGenerateData, CodegenError> {
        let (output_id, schedule) = self.schedule()?;
        tracing::debug!(
            "[codegen] Phase 1: {} of {} node(s) reach output {}",
            schedule.len(),
            self.node_count(),
            output_id
        );

        let parameters = collect_parameters(self, &schedule);
        tracing::debug!("[codegen] Phase 2: {} parameter(s)", parameters.len());

        let mut emitter = Emitter {
            graph: self,
            statements: Vec::new(),
        };
        for node in &schedule {
            emitter.emit_node(node)?;
        }
        let output_node = self.node(output_id).ok_or(CodegenError::MissingOutput)?;
        let output = ShaderOutput {
            color: emitter.input(output_node, 0)?,
            alpha: emitter.input(output_node, 1)?,
        };

        let mut data = CodeGenerateData {
            statements: emitter.statements,
            parameters,
            output,
            features: BTreeSet::new(),
        };
        data.features = collect_features(&data);
        tracing::debug!(
            "[codegen] Phase 3: {} statement(s), {} helper(s)",
            data.statements.len(),
            data.features.len()
        );
        Ok(data)
    }

    /// Collect the parameter table only.
    ///
    /// Matches the table of [`Graph::generate_code`] for the same graph, at a
    /// fraction of the cost; used for value-only edits.
    pub fn generate_parameters(&self) -> Result<ParameterTable, CodegenError> {
        let (_, schedule) = self.schedule()?;
        Ok(collect_parameters(self, &schedule))
    }

    /// Output node and the nodes feeding it, in dependency order
    fn schedule(&self) -> Result<(NodeId, Vec<&Node>), CodegenError> {
        let order = self.nodes_by_order()?;
        let output = self.output_node().ok_or(CodegenError::MissingOutput)?;

        let mut sources: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for connection in self.connections() {
            sources
                .entry(connection.dest.node)
                .or_default()
                .push(connection.source.node);
        }
        let mut live = HashSet::new();
        let mut stack = vec![output];
        while let Some(id) = stack.pop() {
            if live.insert(id) {
                stack.extend(sources.get(&id).into_iter().flatten().copied());
            }
        }

        let schedule = order
            .iter()
            .filter(|id| live.contains(*id))
            .filter_map(|id| self.node(*id))
            .collect();
        Ok((output, schedule))
    }
}

fn collect_parameters(graph: &Graph, schedule: &[&Node]) -> ParameterTable {
    let mut table = ParameterTable::new();
    for node in schedule {
        for (slot, _, value) in node.inputs() {
            if graph.get_connection(slot).is_some()
                || implicit_input(node.node_type(), slot.index).is_some()
            {
                continue;
            }
            if let Some(value) = parameter_value(value) {
                table.insert(param_name(slot), Parameter { slot, value });
            }
        }
    }
    table
}

fn collect_features(data: &CodeGenerateData) -> BTreeSet<Builtin> {
    let mut features = BTreeSet::new();
    for expr in data.expressions() {
        expr.walk(&mut |e| {
            if let Expr::Call { func, .. } = e {
                if func.is_helper() {
                    features.insert(*func);
                }
            }
        });
    }
    let mut pending: Vec<Builtin> = features.iter().copied().collect();
    while let Some(func) = pending.pop() {
        for dep in func.dependencies() {
            if features.insert(*dep) {
                pending.push(*dep);
            }
        }
    }
    features
}

fn enum_index(node: &Node, index: u32) -> u32 {
    node.value(index).and_then(SlotValue::as_enum).unwrap_or(0)
}

struct Emitter<'a> {
    graph: &'a Graph,
    statements: Vec<Statement>,
}

impl Emitter<'_> {
    fn push(&mut self, node: NodeId, name: String, ty: ShaderType, expr: Expr) -> Expr {
        let var = Expr::var(name.as_str());
        self.statements.push(Statement {
            node,
            name,
            ty,
            expr,
        });
        var
    }

    /// Bind an output slot
    fn output(&mut self, node: &Node, index: u32, ty: ShaderType, expr: Expr) -> Expr {
        self.push(node.id, var_name(node.slot_id(index)), ty, expr)
    }

    /// Bind an intermediate value
    fn temp(&mut self, node: &Node, tag: &str, ty: ShaderType, expr: Expr) -> Expr {
        self.push(node.id, temp_name(node.id, tag), ty, expr)
    }

    /// Expression for an input slot, converted to the slot's type
    fn input(&self, node: &Node, index: u32) -> Result<Expr, CodegenError> {
        let slot = node.slot_id(index);
        let decl = node.decl(index).ok_or(CodegenError::SlotNotFound(slot))?;

        if let Some(connection) = self.graph.get_connection(slot) {
            let source = self
                .graph
                .slot_decl(connection.source)
                .ok_or(CodegenError::SlotNotFound(connection.source))?;
            let var = Expr::var(var_name(connection.source));
            return Ok(convert(var, source.slot_type(), decl.slot_type()));
        }
        if let Some(input) = implicit_input(node.node_type(), index) {
            return Ok(Expr::Input(input));
        }
        Ok(Expr::param(param_name(slot)))
    }

    /// Apply the node's clamp toggle to `value`
    fn clamped(
        &mut self,
        node: &Node,
        clamp_slot: u32,
        ty: ShaderType,
        value: Expr,
    ) -> Result<Expr, CodegenError> {
        let raw = self.temp(node, "raw", ty, value);
        let clamp = self.input(node, clamp_slot)?;
        Ok(Expr::select(
            clamp,
            Expr::call(Builtin::Saturate, [raw.clone()]),
            raw,
        ))
    }

    fn emit_node(&mut self, node: &Node) -> Result<(), CodegenError> {
        match node.node_type() {
            NodeType::Value => {
                let value = self.input(node, 0)?;
                self.output(node, 1, ShaderType::Float, value);
            }
            NodeType::Rgb | NodeType::Vector => {
                let value = self.input(node, 0)?;
                self.output(node, 1, ShaderType::Vec3, value);
            }
            NodeType::TextureCoordinate => {
                for (index, input) in [ShaderInput::Generated, ShaderInput::Normal, ShaderInput::Uv]
                    .into_iter()
                    .enumerate()
                {
                    self.output(node, index as u32, ShaderType::Vec3, Expr::Input(input));
                }
            }
            NodeType::Math => self.emit_math(node)?,
            NodeType::VectorMath => self.emit_vector_math(node)?,
            NodeType::MixRgb => self.emit_mix_rgb(node)?,
            NodeType::Invert => {
                let fac = self.input(node, 0)?;
                let color = self.input(node, 1)?;
                let inverted = Expr::binary(BinaryOp::Sub, Expr::splat(1.0), color.clone());
                self.output(
                    node,
                    2,
                    ShaderType::Vec3,
                    Expr::call(Builtin::Mix, [color, inverted, fac]),
                );
            }
            NodeType::SeparateRgb => {
                let color = self.input(node, 0)?;
                for (index, channel) in [(1, "x"), (2, "y"), (3, "z")] {
                    self.output(node, index, ShaderType::Float, color.clone().swizzle(channel));
                }
            }
            NodeType::CombineRgb => {
                let args = vec![self.input(node, 0)?, self.input(node, 1)?, self.input(node, 2)?];
                self.output(
                    node,
                    3,
                    ShaderType::Vec3,
                    Expr::Construct {
                        ty: ShaderType::Vec3,
                        args,
                    },
                );
            }
            NodeType::ColorRamp => {
                let lut = self.input(node, 0)?;
                let fac = self.input(node, 1)?;
                let sample = self.temp(
                    node,
                    "ramp",
                    ShaderType::Vec4,
                    Expr::call(Builtin::SampleRamp, [lut, fac]),
                );
                self.output(node, 2, ShaderType::Vec3, sample.clone().swizzle("xyz"));
                self.output(node, 3, ShaderType::Float, sample.swizzle("w"));
            }
            NodeType::RgbCurves | NodeType::VectorCurves => {
                let func = if node.node_type() == NodeType::RgbCurves {
                    Builtin::RgbCurves
                } else {
                    Builtin::VectorCurves
                };
                let lut = self.input(node, 0)?;
                let fac = self.input(node, 1)?;
                let value = self.input(node, 2)?;
                self.output(node, 3, ShaderType::Vec3, Expr::call(func, [lut, value, fac]));
            }
            NodeType::ImageTexture => {
                let func = match enum_index(node, 1) {
                    1 => Builtin::ImageClosest,
                    _ => Builtin::ImageLinear,
                };
                let image = self.input(node, 0)?;
                let uv = self.input(node, 2)?;
                let sample = self.temp(node, "sample", ShaderType::Vec4, Expr::call(func, [image, uv]));
                self.output(node, 3, ShaderType::Vec3, sample.clone().swizzle("xyz"));
                self.output(node, 4, ShaderType::Float, sample.swizzle("w"));
            }
            NodeType::NoiseTexture => {
                let args = [self.input(node, 0)?, self.input(node, 1)?, self.input(node, 2)?];
                self.output(
                    node,
                    3,
                    ShaderType::Float,
                    Expr::call(Builtin::Noise, args.clone()),
                );
                self.output(node, 4, ShaderType::Vec3, Expr::call(Builtin::NoiseColor, args));
            }
            NodeType::CheckerTexture => {
                let position = self.input(node, 0)?;
                let color1 = self.input(node, 1)?;
                let color2 = self.input(node, 2)?;
                let scale = self.input(node, 3)?;
                let fac = self.output(
                    node,
                    5,
                    ShaderType::Float,
                    Expr::call(Builtin::Checker, [position, scale]),
                );
                self.output(
                    node,
                    4,
                    ShaderType::Vec3,
                    Expr::call(Builtin::Mix, [color2, color1, fac]),
                );
            }
            // Bound by the caller as the shader output
            NodeType::Output => {}
        }
        Ok(())
    }

    fn emit_math(&mut self, node: &Node) -> Result<(), CodegenError> {
        let a = self.input(node, 2)?;
        let b = self.input(node, 3)?;
        let value = match enum_index(node, 0) {
            1 => Expr::binary(BinaryOp::Sub, a, b),
            2 => Expr::binary(BinaryOp::Mul, a, b),
            3 => Expr::binary(BinaryOp::Div, a, b),
            4 => Expr::call(Builtin::Pow, [a, b]),
            5 => Expr::call(Builtin::Min, [a, b]),
            6 => Expr::call(Builtin::Max, [a, b]),
            7 => Expr::call(Builtin::Sin, [a]),
            8 => Expr::call(Builtin::Cos, [a]),
            9 => Expr::call(Builtin::Abs, [a]),
            _ => Expr::binary(BinaryOp::Add, a, b),
        };
        let value = self.clamped(node, 1, ShaderType::Float, value)?;
        self.output(node, 4, ShaderType::Float, value);
        Ok(())
    }

    fn emit_vector_math(&mut self, node: &Node) -> Result<(), CodegenError> {
        let a = self.input(node, 1)?;
        let b = self.input(node, 2)?;
        let (vector, value) = match enum_index(node, 0) {
            1 => (Expr::binary(BinaryOp::Sub, a, b), Expr::Float(0.0)),
            2 => (Expr::binary(BinaryOp::Mul, a, b), Expr::Float(0.0)),
            3 => (Expr::call(Builtin::Cross, [a, b]), Expr::Float(0.0)),
            4 => (Expr::splat(0.0), Expr::call(Builtin::Dot, [a, b])),
            5 => (Expr::call(Builtin::Normalize, [a]), Expr::Float(0.0)),
            6 => (Expr::splat(0.0), Expr::call(Builtin::Length, [a])),
            _ => (Expr::binary(BinaryOp::Add, a, b), Expr::Float(0.0)),
        };
        self.output(node, 3, ShaderType::Vec3, vector);
        self.output(node, 4, ShaderType::Float, value);
        Ok(())
    }

    fn emit_mix_rgb(&mut self, node: &Node) -> Result<(), CodegenError> {
        let fac = self.input(node, 2)?;
        let c1 = self.input(node, 3)?;
        let c2 = self.input(node, 4)?;
        let one = || Expr::splat(1.0);
        let blended = match enum_index(node, 0) {
            1 => Expr::binary(BinaryOp::Add, c1.clone(), c2),
            2 => Expr::binary(BinaryOp::Mul, c1.clone(), c2),
            3 => Expr::binary(
                BinaryOp::Sub,
                one(),
                Expr::binary(
                    BinaryOp::Mul,
                    Expr::binary(BinaryOp::Sub, one(), c1.clone()),
                    Expr::binary(BinaryOp::Sub, one(), c2),
                ),
            ),
            4 => Expr::binary(BinaryOp::Sub, c1.clone(), c2),
            5 => Expr::call(Builtin::Abs, [Expr::binary(BinaryOp::Sub, c1.clone(), c2)]),
            _ => c2,
        };
        let mixed = Expr::call(Builtin::Mix, [c1, blended, fac]);
        let value = self.clamped(node, 1, ShaderType::Vec3, mixed)?;
        self.output(node, 5, ShaderType::Vec3, value);
        Ok(())
    }
}
