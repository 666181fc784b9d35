// SPDX-License-Identifier: MIT OR Apache-2.0
//! Backend-neutral shader representation.
//!
//! The generator lowers a graph into a flat list of typed `let` statements
//! over a small expression language. Anything that can change without
//! altering the statement structure lives in the [`ParameterTable`].

use crate::node::NodeId;
use crate::slot::SlotId;
use crate::value::ImageRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Shader value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderType {
    /// Boolean
    Bool,
    /// 32-bit signed integer
    Int,
    /// 32-bit float
    Float,
    /// Three-component float vector
    Vec3,
    /// Four-component float vector
    Vec4,
}

/// Per-fragment geometry input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderInput {
    /// Object-space generated coordinates
    Generated,
    /// Surface normal
    Normal,
    /// Texture coordinates (z is zero)
    Uv,
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl BinaryOp {
    /// Operator token (identical in every supported shading language)
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// Function called from an expression.
///
/// Intrinsics map onto the target language's built-ins; the rest are library
/// helpers a backend has to define before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Builtin {
    /// `pow(x, y)`
    Pow,
    /// `min(a, b)`
    Min,
    /// `max(a, b)`
    Max,
    /// `sin(x)`
    Sin,
    /// `cos(x)`
    Cos,
    /// `abs(x)`
    Abs,
    /// Clamp to [0, 1]
    Saturate,
    /// `mix(a, b, t)`
    Mix,
    /// `cross(a, b)`
    Cross,
    /// `dot(a, b)`
    Dot,
    /// `normalize(v)`
    Normalize,
    /// `length(v)`
    Length,
    /// Rec. 709 luminance of a color
    Luminance,
    /// Mean of the three components of a vector
    Average,
    /// Fractal value noise `(p, scale, octaves) -> f32`
    Noise,
    /// Three decorrelated noise channels `(p, scale, octaves) -> vec3`
    NoiseColor,
    /// Checkerboard mask `(p, scale) -> f32`
    Checker,
    /// Sample a baked ramp `(lut, t) -> vec4`
    SampleRamp,
    /// Apply baked RGB curves `(lut, color, fac) -> vec3`
    RgbCurves,
    /// Apply baked vector curves `(lut, vector, fac) -> vec3`
    VectorCurves,
    /// Filtered image lookup `(image, uv) -> vec4`
    ImageLinear,
    /// Unfiltered image lookup `(image, uv) -> vec4`
    ImageClosest,
}

impl Builtin {
    /// Whether the backend must provide a definition
    pub fn is_helper(&self) -> bool {
        matches!(
            self,
            Self::Luminance
                | Self::Average
                | Self::Noise
                | Self::NoiseColor
                | Self::Checker
                | Self::SampleRamp
                | Self::RgbCurves
                | Self::VectorCurves
                | Self::ImageLinear
                | Self::ImageClosest
        )
    }

    /// Helpers this helper calls in turn
    pub fn dependencies(&self) -> &'static [Builtin] {
        match self {
            Self::NoiseColor => &[Self::Noise],
            Self::RgbCurves | Self::VectorCurves => &[Self::SampleRamp],
            _ => &[],
        }
    }
}

/// Shader expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Boolean literal
    Bool(bool),
    /// Integer literal
    Int(i32),
    /// Float literal
    Float(f32),
    /// Parameter from the [`ParameterTable`]
    Param(String),
    /// Earlier statement
    Var(String),
    /// Geometry input
    Input(ShaderInput),
    /// Vector constructor from components
    Construct {
        /// Constructed type
        ty: ShaderType,
        /// One argument per component
        args: Vec<Expr>,
    },
    /// Type conversion; a scalar converted to a vector is splatted
    Convert {
        /// Target type
        to: ShaderType,
        /// Converted expression
        expr: Box<Expr>,
    },
    /// Component selection (`"x"`, `"xyz"`, `"w"`)
    Swizzle {
        /// Vector expression
        expr: Box<Expr>,
        /// Component letters
        components: &'static str,
    },
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Function call
    Call {
        /// Called function
        func: Builtin,
        /// Arguments
        args: Vec<Expr>,
    },
    /// `cond ? on_true : on_false`
    Select {
        /// Boolean condition
        cond: Box<Expr>,
        /// Value when true
        on_true: Box<Expr>,
        /// Value when false
        on_false: Box<Expr>,
    },
}

impl Expr {
    /// Reference a parameter
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    /// Reference a statement
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// `vec3(v, v, v)`
    pub fn splat(value: f32) -> Self {
        Self::Float(value).convert(ShaderType::Vec3)
    }

    /// Convert to another type
    pub fn convert(self, to: ShaderType) -> Self {
        Self::Convert {
            to,
            expr: Box::new(self),
        }
    }

    /// Select components
    pub fn swizzle(self, components: &'static str) -> Self {
        Self::Swizzle {
            expr: Box::new(self),
            components,
        }
    }

    /// Binary operation
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Function call
    pub fn call(func: Builtin, args: impl Into<Vec<Expr>>) -> Self {
        Self::Call {
            func,
            args: args.into(),
        }
    }

    /// Conditional
    pub fn select(cond: Expr, on_true: Expr, on_false: Expr) -> Self {
        Self::Select {
            cond: Box::new(cond),
            on_true: Box::new(on_true),
            on_false: Box::new(on_false),
        }
    }

    /// Visit this expression and all sub-expressions, parents first
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Self::Bool(_)
            | Self::Int(_)
            | Self::Float(_)
            | Self::Param(_)
            | Self::Var(_)
            | Self::Input(_) => {}
            Self::Construct { args, .. } | Self::Call { args, .. } => {
                for arg in args {
                    arg.walk(f);
                }
            }
            Self::Convert { expr, .. } | Self::Swizzle { expr, .. } => expr.walk(f),
            Self::Binary { lhs, rhs, .. } => {
                lhs.walk(f);
                rhs.walk(f);
            }
            Self::Select {
                cond,
                on_true,
                on_false,
            } => {
                cond.walk(f);
                on_true.walk(f);
                on_false.walk(f);
            }
        }
    }
}

/// `let name: ty = expr`
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Node the statement was generated for
    pub node: NodeId,
    /// Variable name
    pub name: String,
    /// Declared type
    pub ty: ShaderType,
    /// Initializer
    pub expr: Expr,
}

/// Current value of a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    /// Uniform boolean
    Bool(bool),
    /// Uniform integer
    Int(i32),
    /// Uniform float
    Float(f32),
    /// Uniform vector or color
    Vec3([f32; 3]),
    /// Baked lookup table, bound as a 1-row RGBA texture
    Lut(Vec<[f32; 4]>),
    /// Image texture
    Image(ImageRef),
}

impl ParameterValue {
    /// Shader type for uniform values; `None` for textures
    pub fn uniform_type(&self) -> Option<ShaderType> {
        match self {
            Self::Bool(_) => Some(ShaderType::Bool),
            Self::Int(_) => Some(ShaderType::Int),
            Self::Float(_) => Some(ShaderType::Float),
            Self::Vec3(_) => Some(ShaderType::Vec3),
            Self::Lut(_) | Self::Image(_) => None,
        }
    }

    /// Whether the value is bound as a texture
    pub fn is_texture(&self) -> bool {
        self.uniform_type().is_none()
    }
}

/// A named shader parameter bound to the slot it reads from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Source slot
    pub slot: SlotId,
    /// Current value
    pub value: ParameterValue,
}

/// Parameters by name, in generation order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterTable {
    entries: IndexMap<String, Parameter>,
}

impl ParameterTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: String, parameter: Parameter) {
        self.entries.insert(name, parameter);
    }

    /// Look up a parameter by name
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.entries.get(name)
    }

    /// Whether a parameter exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Parameters in generation order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.entries.iter().map(|(name, p)| (name.as_str(), p))
    }

    /// Parameter names in generation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether both tables bind the same names, in the same order, to the same kinds of value
    pub fn same_layout(&self, other: &ParameterTable) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().zip(&other.entries).all(|((a, pa), (b, pb))| {
                a == b
                    && pa.slot == pb.slot
                    && std::mem::discriminant(&pa.value) == std::mem::discriminant(&pb.value)
            })
    }
}

/// Final color and alpha of the shader
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderOutput {
    /// `vec3` color
    pub color: Expr,
    /// `f32` alpha
    pub alpha: Expr,
}

/// Everything a backend needs to emit a shader
#[derive(Debug, Clone, PartialEq)]
pub struct CodeGenerateData {
    /// Statements in dependency order
    pub statements: Vec<Statement>,
    /// Parameters referenced by the statements
    pub parameters: ParameterTable,
    /// Output binding
    pub output: ShaderOutput,
    /// Library helpers used, including transitive dependencies
    pub features: BTreeSet<Builtin>,
}

impl CodeGenerateData {
    /// Replace the parameter values with a freshly collected table.
    ///
    /// Returns `false` (and leaves the data untouched) if the layouts differ,
    /// in which case the code has to be regenerated.
    pub fn refresh_parameters(&mut self, parameters: ParameterTable) -> bool {
        if !self.parameters.same_layout(&parameters) {
            return false;
        }
        self.parameters = parameters;
        true
    }

    /// Every expression in the shader: statement initializers, then the output binding
    pub fn expressions(&self) -> impl Iterator<Item = &Expr> {
        self.statements
            .iter()
            .map(|s| &s.expr)
            .chain([&self.output.color, &self.output.alpha])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, ParameterValue)]) -> ParameterTable {
        let mut table = ParameterTable::new();
        for (i, (name, value)) in entries.iter().enumerate() {
            table.insert(
                (*name).to_string(),
                Parameter {
                    slot: SlotId::new(NodeId(1), i as u32),
                    value: value.clone(),
                },
            );
        }
        table
    }

    #[test]
    fn test_same_layout_ignores_values() {
        let a = table(&[("p_n1_0", ParameterValue::Float(1.0)), ("p_n1_1", ParameterValue::Bool(true))]);
        let b = table(&[("p_n1_0", ParameterValue::Float(7.0)), ("p_n1_1", ParameterValue::Bool(false))]);
        let c = table(&[("p_n1_0", ParameterValue::Int(7)), ("p_n1_1", ParameterValue::Bool(false))]);
        let d = table(&[("p_n1_0", ParameterValue::Float(7.0))]);

        assert!(a.same_layout(&b));
        assert!(!a.same_layout(&c));
        assert!(!a.same_layout(&d));
    }

    #[test]
    fn test_walk_visits_every_node() {
        let expr = Expr::select(
            Expr::param("p_n1_1"),
            Expr::call(Builtin::Saturate, [Expr::var("t_n1")]),
            Expr::binary(BinaryOp::Add, Expr::Float(1.0), Expr::var("t_n1").swizzle("x")),
        );
        let mut count = 0;
        expr.walk(&mut |_| count += 1);
        assert_eq!(count, 8);
    }

    #[test]
    fn test_helper_classification() {
        assert!(!Builtin::Mix.is_helper());
        assert!(Builtin::Noise.is_helper());
        assert_eq!(Builtin::NoiseColor.dependencies(), &[Builtin::Noise]);
    }
}
