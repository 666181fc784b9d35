// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader source backends.
//!
//! A [`Backend`] turns [`CodeGenerateData`] into source text for one shading
//! language. Uniform parameters are packed into a single `params` block in
//! table order; lookup tables and images become texture bindings named after
//! their parameter.

mod glsl;
mod wgsl;

pub use glsl::GlslBackend;
pub use wgsl::WgslBackend;

use crate::codegen::{
    Builtin, CodeGenerateData, Expr, ParameterTable, ParameterValue, ShaderInput, ShaderType,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Emits shader source for one target language
pub trait Backend {
    /// Backend name (`"wgsl"`, `"glsl"`)
    fn name(&self) -> &'static str;

    /// Extension for emitted files, without the dot
    fn file_extension(&self) -> &'static str;

    /// Emit a complete fragment shader
    fn emit(&self, data: &CodeGenerateData) -> Result<Vec<u8>, BackendError>;
}

/// Available backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// WebGPU shading language
    #[default]
    Wgsl,
    /// GLSL 450
    Glsl,
}

impl BackendKind {
    /// All backends
    pub const ALL: &'static [BackendKind] = &[Self::Wgsl, Self::Glsl];

    /// Backend name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wgsl => "wgsl",
            Self::Glsl => "glsl",
        }
    }

    /// Instantiate the backend
    pub fn create(&self) -> Box<dyn Backend> {
        match self {
            Self::Wgsl => Box::new(WgslBackend),
            Self::Glsl => Box::new(GlslBackend),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BackendError::UnknownBackend(s.to_string()))
    }
}

/// Error when emitting shader source
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No backend with this name
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    /// Expression refers to a parameter missing from the table
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Texture parameter used where a value was expected, or the reverse
    #[error("Parameter {0} has the wrong kind for its use")]
    ParameterKind(String),

    /// Formatting failure
    #[error("Format error: {0}")]
    Fmt(#[from] fmt::Error),
}

/// Syntax differences between target languages
pub(crate) trait Dialect {
    /// Type name, also used as the constructor
    fn type_name(&self, ty: ShaderType) -> &'static str;

    /// Access a parameter by name
    fn parameter(&self, name: &str, value: &ParameterValue) -> String;

    /// Access a geometry input
    fn input(&self, input: ShaderInput) -> &'static str;

    /// Component-wise conditional
    fn select(&self, cond: String, on_true: String, on_false: String) -> String;

    /// Function call
    fn call(&self, func: Builtin, args: Vec<String>) -> String {
        format!("{}({})", function_name(func), args.join(", "))
    }
}

/// Source-level name of a built-in or helper function
pub(crate) fn function_name(func: Builtin) -> &'static str {
    match func {
        Builtin::Pow => "pow",
        Builtin::Min => "min",
        Builtin::Max => "max",
        Builtin::Sin => "sin",
        Builtin::Cos => "cos",
        Builtin::Abs => "abs",
        Builtin::Saturate => "saturate",
        Builtin::Mix => "mix",
        Builtin::Cross => "cross",
        Builtin::Dot => "dot",
        Builtin::Normalize => "normalize",
        Builtin::Length => "length",
        Builtin::Luminance => "ns_luminance",
        Builtin::Average => "ns_average",
        Builtin::Noise => "ns_noise",
        Builtin::NoiseColor => "ns_noise_color",
        Builtin::Checker => "ns_checker",
        Builtin::SampleRamp => "ns_sample_ramp",
        Builtin::RgbCurves => "ns_rgb_curves",
        Builtin::VectorCurves => "ns_vector_curves",
        Builtin::ImageLinear => "ns_image_linear",
        Builtin::ImageClosest => "ns_image_closest",
    }
}

/// Float literal that always parses as a float (`1.0`, `0.5`, `1e-5`)
pub(crate) fn float_literal(value: f32) -> String {
    format!("{value:?}")
}

/// Renders expressions for one dialect against one parameter table
pub(crate) struct ExprWriter<'a, D> {
    pub(crate) dialect: &'a D,
    pub(crate) parameters: &'a ParameterTable,
}

impl<D: Dialect> ExprWriter<'_, D> {
    pub(crate) fn write(&self, expr: &Expr) -> Result<String, BackendError> {
        Ok(match expr {
            Expr::Bool(v) => v.to_string(),
            Expr::Int(v) if *v < 0 => format!("({v})"),
            Expr::Int(v) => v.to_string(),
            Expr::Float(v) => float_literal(*v),
            Expr::Param(name) => {
                let parameter = self
                    .parameters
                    .get(name)
                    .ok_or_else(|| BackendError::UnknownParameter(name.clone()))?;
                self.dialect.parameter(name, &parameter.value)
            }
            Expr::Var(name) => name.clone(),
            Expr::Input(input) => self.dialect.input(*input).to_string(),
            Expr::Construct { ty, args } => {
                format!("{}({})", self.dialect.type_name(*ty), self.write_all(args)?.join(", "))
            }
            Expr::Convert { to, expr } => {
                format!("{}({})", self.dialect.type_name(*to), self.write(expr)?)
            }
            Expr::Swizzle { expr, components } => format!("{}.{}", self.write(expr)?, components),
            Expr::Binary { op, lhs, rhs } => {
                format!("({} {} {})", self.write(lhs)?, op.symbol(), self.write(rhs)?)
            }
            Expr::Call { func, args } => self.dialect.call(*func, self.write_all(args)?),
            Expr::Select {
                cond,
                on_true,
                on_false,
            } => self.dialect.select(
                self.write(cond)?,
                self.write(on_true)?,
                self.write(on_false)?,
            ),
        })
    }

    fn write_all(&self, exprs: &[Expr]) -> Result<Vec<String>, BackendError> {
        exprs.iter().map(|e| self.write(e)).collect()
    }
}

/// Check every texture argument of a helper call is a texture parameter
pub(crate) fn check_texture_arguments(data: &CodeGenerateData) -> Result<(), BackendError> {
    let mut result = Ok(());
    for expr in data.expressions() {
        expr.walk(&mut |e| {
            let Expr::Call { func, args } = e else {
                return;
            };
            let takes_texture = matches!(
                func,
                Builtin::SampleRamp
                    | Builtin::RgbCurves
                    | Builtin::VectorCurves
                    | Builtin::ImageLinear
                    | Builtin::ImageClosest
            );
            if !takes_texture || result.is_err() {
                return;
            }
            match args.first() {
                Some(Expr::Param(name)) => match data.parameters.get(name) {
                    Some(p) if p.value.is_texture() => {}
                    Some(_) => result = Err(BackendError::ParameterKind(name.clone())),
                    None => result = Err(BackendError::UnknownParameter(name.clone())),
                },
                _ => result = Err(BackendError::ParameterKind(function_name(*func).to_string())),
            }
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NodeType;
    use crate::graph::Graph;
    use crate::slot::SlotId;

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("wgsl".parse::<BackendKind>().unwrap(), BackendKind::Wgsl);
        assert_eq!("GLSL".parse::<BackendKind>().unwrap(), BackendKind::Glsl);
        assert!(matches!(
            "hlsl".parse::<BackendKind>(),
            Err(BackendError::UnknownBackend(_))
        ));
        for kind in BackendKind::ALL {
            assert_eq!(kind.create().name(), kind.name());
        }
    }

    #[test]
    fn test_float_literal() {
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(0.5), "0.5");
        assert_eq!(float_literal(-2.0), "-2.0");
    }

    #[test]
    fn test_texture_arguments_checked() {
        let mut graph = Graph::new();
        let ramp = graph.add(NodeType::ColorRamp, [0, 0]);
        let out = graph.add(NodeType::Output, [0, 0]);
        graph
            .add_connection(SlotId::new(ramp, 2), SlotId::new(out, 0))
            .unwrap();
        let mut data = graph.generate_code().unwrap();
        assert!(check_texture_arguments(&data).is_ok());

        data.statements[0].expr = Expr::call(
            Builtin::SampleRamp,
            [Expr::param("p_n1_1"), Expr::Float(0.0)],
        );
        assert!(matches!(
            check_texture_arguments(&data),
            Err(BackendError::ParameterKind(_))
        ));
    }
}
