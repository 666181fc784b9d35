// SPDX-License-Identifier: MIT OR Apache-2.0
//! WGSL backend.

use super::{check_texture_arguments, Backend, BackendError, Dialect, ExprWriter};
use crate::codegen::{Builtin, CodeGenerateData, ParameterValue, ShaderInput, ShaderType};
use std::fmt::Write;

/// Emits a WGSL fragment shader (`fs_main`) for wgpu
#[derive(Debug, Clone, Copy, Default)]
pub struct WgslBackend;

impl Dialect for WgslBackend {
    fn type_name(&self, ty: ShaderType) -> &'static str {
        match ty {
            ShaderType::Bool => "bool",
            ShaderType::Int => "i32",
            ShaderType::Float => "f32",
            ShaderType::Vec3 => "vec3<f32>",
            ShaderType::Vec4 => "vec4<f32>",
        }
    }

    fn parameter(&self, name: &str, value: &ParameterValue) -> String {
        match value {
            // Uniform buffers cannot hold `bool`
            ParameterValue::Bool(_) => format!("(params.{name} != 0u)"),
            ParameterValue::Lut(_) | ParameterValue::Image(_) => name.to_string(),
            _ => format!("params.{name}"),
        }
    }

    fn input(&self, input: ShaderInput) -> &'static str {
        match input {
            ShaderInput::Generated => "in.generated",
            ShaderInput::Normal => "in.normal",
            ShaderInput::Uv => "in.uv",
        }
    }

    fn select(&self, cond: String, on_true: String, on_false: String) -> String {
        format!("select({on_false}, {on_true}, {cond})")
    }
}

fn uniform_type(value: &ParameterValue) -> &'static str {
    match value {
        ParameterValue::Bool(_) => "u32",
        ParameterValue::Int(_) => "i32",
        ParameterValue::Float(_) => "f32",
        ParameterValue::Vec3(_) => "vec3<f32>",
        ParameterValue::Lut(_) | ParameterValue::Image(_) => "texture_2d<f32>",
    }
}

impl Backend for WgslBackend {
    fn name(&self) -> &'static str {
        "wgsl"
    }

    fn file_extension(&self) -> &'static str {
        "wgsl"
    }

    fn emit(&self, data: &CodeGenerateData) -> Result<Vec<u8>, BackendError> {
        check_texture_arguments(data)?;
        let writer = ExprWriter {
            dialect: self,
            parameters: &data.parameters,
        };
        let (textures, uniforms): (Vec<_>, Vec<_>) =
            data.parameters.iter().partition(|(_, p)| p.value.is_texture());

        let mut out = String::new();
        writeln!(out, "// Generated by nodeshader. Do not edit.")?;
        writeln!(out)?;

        let mut binding = 0;
        if !uniforms.is_empty() {
            writeln!(out, "struct Params {{")?;
            for (name, parameter) in &uniforms {
                writeln!(
                    out,
                    "    {name}: {}, // {}",
                    uniform_type(&parameter.value),
                    parameter.slot
                )?;
            }
            writeln!(out, "}}")?;
            writeln!(out)?;
            writeln!(out, "@group(0) @binding({binding}) var<uniform> params: Params;")?;
            binding += 1;
        }
        if !textures.is_empty() {
            writeln!(out, "@group(0) @binding({binding}) var ns_linear_sampler: sampler;")?;
            writeln!(out, "@group(0) @binding({}) var ns_nearest_sampler: sampler;", binding + 1)?;
            binding += 2;
            for (name, parameter) in &textures {
                writeln!(
                    out,
                    "@group(0) @binding({binding}) var {name}: texture_2d<f32>; // {}",
                    parameter.slot
                )?;
                binding += 1;
            }
        }
        writeln!(out)?;

        out.push_str(FRAGMENT_INPUT);
        for func in &data.features {
            if let Some(source) = helper_source(*func) {
                writeln!(out)?;
                out.push_str(source);
            }
        }

        writeln!(out)?;
        writeln!(out, "@fragment")?;
        writeln!(out, "fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {{")?;
        for statement in &data.statements {
            writeln!(
                out,
                "    let {}: {} = {};",
                statement.name,
                self.type_name(statement.ty),
                writer.write(&statement.expr)?
            )?;
        }
        writeln!(
            out,
            "    return vec4<f32>({}, {});",
            writer.write(&data.output.color)?,
            writer.write(&data.output.alpha)?
        )?;
        writeln!(out, "}}")?;

        tracing::debug!(
            "Emitted WGSL: {} statement(s), {} uniform(s), {} texture(s)",
            data.statements.len(),
            uniforms.len(),
            textures.len()
        );
        Ok(out.into_bytes())
    }
}

const FRAGMENT_INPUT: &str = "struct FragmentInput {
    @location(0) generated: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec3<f32>,
}
";

fn helper_source(func: Builtin) -> Option<&'static str> {
    Some(match func {
        Builtin::Luminance => {
            "fn ns_luminance(c: vec3<f32>) -> f32 {
    return dot(c, vec3<f32>(0.2126, 0.7152, 0.0722));
}
"
        }
        Builtin::Average => {
            "fn ns_average(v: vec3<f32>) -> f32 {
    return (v.x + v.y + v.z) / 3.0;
}
"
        }
        Builtin::Noise => {
            "fn ns_hash(p: vec3<f32>) -> f32 {
    return fract(sin(dot(p, vec3<f32>(12.9898, 78.233, 37.719))) * 43758.5453);
}

fn ns_value_noise(p: vec3<f32>) -> f32 {
    let i = floor(p);
    let f = fract(p);
    let u = f * f * (3.0 - 2.0 * f);
    let x00 = mix(ns_hash(i), ns_hash(i + vec3<f32>(1.0, 0.0, 0.0)), u.x);
    let x10 = mix(ns_hash(i + vec3<f32>(0.0, 1.0, 0.0)), ns_hash(i + vec3<f32>(1.0, 1.0, 0.0)), u.x);
    let x01 = mix(ns_hash(i + vec3<f32>(0.0, 0.0, 1.0)), ns_hash(i + vec3<f32>(1.0, 0.0, 1.0)), u.x);
    let x11 = mix(ns_hash(i + vec3<f32>(0.0, 1.0, 1.0)), ns_hash(i + vec3<f32>(1.0, 1.0, 1.0)), u.x);
    return mix(mix(x00, x10, u.y), mix(x01, x11, u.y), u.z);
}

fn ns_noise(p: vec3<f32>, scale: f32, octaves: i32) -> f32 {
    var sum = 0.0;
    var amplitude = 1.0;
    var total = 0.0;
    var q = p * scale;
    let count = clamp(octaves, 1, 16);
    for (var i = 0; i < count; i = i + 1) {
        sum = sum + amplitude * ns_value_noise(q);
        total = total + amplitude;
        amplitude = amplitude * 0.5;
        q = q * 2.0;
    }
    return sum / total;
}
"
        }
        Builtin::NoiseColor => {
            "fn ns_noise_color(p: vec3<f32>, scale: f32, octaves: i32) -> vec3<f32> {
    return vec3<f32>(
        ns_noise(p, scale, octaves),
        ns_noise(p + vec3<f32>(19.19, 7.31, 3.17), scale, octaves),
        ns_noise(p + vec3<f32>(5.47, 23.11, 11.83), scale, octaves)
    );
}
"
        }
        Builtin::Checker => {
            "fn ns_checker(p: vec3<f32>, scale: f32) -> f32 {
    let q = floor(p * scale + vec3<f32>(0.00001));
    return select(0.0, 1.0, fract((q.x + q.y + q.z) * 0.5) < 0.25);
}
"
        }
        Builtin::SampleRamp => {
            "fn ns_sample_ramp(lut: texture_2d<f32>, t: f32) -> vec4<f32> {
    let size = f32(textureDimensions(lut).x);
    let u = (clamp(t, 0.0, 1.0) * (size - 1.0) + 0.5) / size;
    return textureSampleLevel(lut, ns_linear_sampler, vec2<f32>(u, 0.5), 0.0);
}
"
        }
        Builtin::RgbCurves => {
            "fn ns_rgb_curves(lut: texture_2d<f32>, color: vec3<f32>, fac: f32) -> vec3<f32> {
    let c = vec3<f32>(
        ns_sample_ramp(lut, color.x).w,
        ns_sample_ramp(lut, color.y).w,
        ns_sample_ramp(lut, color.z).w
    );
    let mapped = vec3<f32>(
        ns_sample_ramp(lut, c.x).x,
        ns_sample_ramp(lut, c.y).y,
        ns_sample_ramp(lut, c.z).z
    );
    return mix(color, mapped, fac);
}
"
        }
        Builtin::VectorCurves => {
            "fn ns_vector_curves(lut: texture_2d<f32>, v: vec3<f32>, fac: f32) -> vec3<f32> {
    let t = v * 0.5 + vec3<f32>(0.5);
    let mapped = vec3<f32>(
        ns_sample_ramp(lut, t.x).x,
        ns_sample_ramp(lut, t.y).y,
        ns_sample_ramp(lut, t.z).z
    );
    return mix(v, mapped, fac);
}
"
        }
        Builtin::ImageLinear => {
            "fn ns_image_linear(tex: texture_2d<f32>, uv: vec3<f32>) -> vec4<f32> {
    return textureSample(tex, ns_linear_sampler, uv.xy);
}
"
        }
        Builtin::ImageClosest => {
            "fn ns_image_closest(tex: texture_2d<f32>, uv: vec3<f32>) -> vec4<f32> {
    return textureSample(tex, ns_nearest_sampler, uv.xy);
}
"
        }
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NodeType;
    use crate::codegen::Expr;
    use crate::graph::Graph;
    use crate::slot::SlotId;

    fn emit(graph: &Graph) -> String {
        let data = graph.generate_code().unwrap();
        String::from_utf8(WgslBackend.emit(&data).unwrap()).unwrap()
    }

    #[test]
    fn test_every_parameter_declared() {
        let mut graph = Graph::new();
        let math = graph.add(NodeType::Math, [0, 0]);
        let ramp = graph.add(NodeType::ColorRamp, [0, 0]);
        let out = graph.add(NodeType::Output, [0, 0]);
        graph.add_connection(SlotId::new(math, 4), SlotId::new(ramp, 1)).unwrap();
        graph.add_connection(SlotId::new(ramp, 2), SlotId::new(out, 0)).unwrap();

        let data = graph.generate_code().unwrap();
        let source = emit(&graph);
        for name in data.parameters.names() {
            assert!(source.contains(name), "{name} missing from:\n{source}");
        }
        assert!(source.contains("p_n1_1: u32,"));
        assert!(source.contains("var p_n2_0: texture_2d<f32>;"));
        assert!(source.contains("var<uniform> params: Params;"));
        assert!(source.contains("fn ns_sample_ramp("));
        assert!(!source.contains("fn ns_noise("));
        assert!(source.contains("select(t_n1_raw, saturate(t_n1_raw), (params.p_n1_1 != 0u))"));
        assert!(source.contains("return vec4<f32>(v_n2_2, params.p_n3_1);"));
    }

    #[test]
    fn test_statements_emitted_in_order() {
        let mut graph = Graph::new();
        let value = graph.add(NodeType::Value, [0, 0]);
        let math = graph.add(NodeType::Math, [0, 0]);
        let out = graph.add(NodeType::Output, [0, 0]);
        graph.add_connection(SlotId::new(value, 1), SlotId::new(math, 2)).unwrap();
        graph.add_connection(SlotId::new(math, 4), SlotId::new(out, 1)).unwrap();

        let source = emit(&graph);
        let first = source.find("let v_n1_1: f32 = params.p_n1_0;").unwrap();
        let second = source.find("let t_n2_raw: f32 = (v_n1_1 + params.p_n2_3);").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_no_uniform_block_without_uniforms() {
        let mut graph = Graph::new();
        let coords = graph.add(NodeType::TextureCoordinate, [0, 0]);
        let out = graph.add(NodeType::Output, [0, 0]);
        graph.add_connection(SlotId::new(coords, 2), SlotId::new(out, 0)).unwrap();
        graph.add_connection(SlotId::new(coords, 1), SlotId::new(out, 1)).unwrap();

        let source = emit(&graph);
        assert!(!source.contains("struct Params"));
        assert!(!source.contains("sampler"));
        assert!(source.contains("let v_n1_2: vec3<f32> = in.uv;"));
        assert!(source.contains("ns_average(v_n1_1)"));
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let mut graph = Graph::new();
        graph.add(NodeType::Output, [0, 0]);
        let mut data = graph.generate_code().unwrap();
        data.output.alpha = Expr::param("p_n9_9");
        assert!(matches!(
            WgslBackend.emit(&data),
            Err(BackendError::UnknownParameter(name)) if name == "p_n9_9"
        ));
    }
}
