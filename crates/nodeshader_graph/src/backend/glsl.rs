// SPDX-License-Identifier: MIT OR Apache-2.0
//! GLSL 450 backend.

use super::{check_texture_arguments, function_name, Backend, BackendError, Dialect, ExprWriter};
use crate::codegen::{Builtin, CodeGenerateData, ParameterValue, ShaderInput, ShaderType};
use std::fmt::Write;

/// Emits a Vulkan-flavoured GLSL 450 fragment shader
#[derive(Debug, Clone, Copy, Default)]
pub struct GlslBackend;

impl Dialect for GlslBackend {
    fn type_name(&self, ty: ShaderType) -> &'static str {
        match ty {
            ShaderType::Bool => "bool",
            ShaderType::Int => "int",
            ShaderType::Float => "float",
            ShaderType::Vec3 => "vec3",
            ShaderType::Vec4 => "vec4",
        }
    }

    fn parameter(&self, name: &str, value: &ParameterValue) -> String {
        if value.is_texture() {
            name.to_string()
        } else {
            format!("params.{name}")
        }
    }

    fn input(&self, input: ShaderInput) -> &'static str {
        match input {
            ShaderInput::Generated => "in_generated",
            ShaderInput::Normal => "in_normal",
            ShaderInput::Uv => "in_uv",
        }
    }

    fn select(&self, cond: String, on_true: String, on_false: String) -> String {
        format!("({cond} ? {on_true} : {on_false})")
    }

    fn call(&self, func: Builtin, args: Vec<String>) -> String {
        match func {
            Builtin::Saturate => format!("clamp({}, 0.0, 1.0)", args.join(", ")),
            _ => format!("{}({})", function_name(func), args.join(", ")),
        }
    }
}

fn uniform_type(value: &ParameterValue) -> &'static str {
    match value {
        ParameterValue::Bool(_) => "bool",
        ParameterValue::Int(_) => "int",
        ParameterValue::Float(_) => "float",
        ParameterValue::Vec3(_) => "vec3",
        ParameterValue::Lut(_) | ParameterValue::Image(_) => "sampler2D",
    }
}

impl Backend for GlslBackend {
    fn name(&self) -> &'static str {
        "glsl"
    }

    fn file_extension(&self) -> &'static str {
        "frag"
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
        writeln!(out, "#version 450")?;
        writeln!(out, "// Generated by nodeshader. Do not edit.")?;
        writeln!(out)?;
        out.push_str(INTERFACE);
        writeln!(out)?;

        let mut binding = 0;
        if !uniforms.is_empty() {
            writeln!(out, "layout(std140, set = 0, binding = {binding}) uniform Params {{")?;
            for (name, parameter) in &uniforms {
                writeln!(
                    out,
                    "    {} {name}; // {}",
                    uniform_type(&parameter.value),
                    parameter.slot
                )?;
            }
            writeln!(out, "}} params;")?;
            binding += 1;
        }
        for (name, parameter) in &textures {
            writeln!(
                out,
                "layout(set = 0, binding = {binding}) uniform sampler2D {name}; // {}",
                parameter.slot
            )?;
            binding += 1;
        }

        for func in &data.features {
            if let Some(source) = helper_source(*func) {
                writeln!(out)?;
                out.push_str(source);
            }
        }

        writeln!(out)?;
        writeln!(out, "void main() {{")?;
        for statement in &data.statements {
            writeln!(
                out,
                "    {} {} = {};",
                self.type_name(statement.ty),
                statement.name,
                writer.write(&statement.expr)?
            )?;
        }
        writeln!(
            out,
            "    out_color = vec4({}, {});",
            writer.write(&data.output.color)?,
            writer.write(&data.output.alpha)?
        )?;
        writeln!(out, "}}")?;

        tracing::debug!(
            "Emitted GLSL: {} statement(s), {} uniform(s), {} texture(s)",
            data.statements.len(),
            uniforms.len(),
            textures.len()
        );
        Ok(out.into_bytes())
    }
}

const INTERFACE: &str = "layout(location = 0) in vec3 in_generated;
layout(location = 1) in vec3 in_normal;
layout(location = 2) in vec3 in_uv;
layout(location = 0) out vec4 out_color;
";

// Helpers are emitted in `Builtin` order, which puts every helper after the ones it calls.
fn helper_source(func: Builtin) -> Option<&'static str> {
    Some(match func {
        Builtin::Luminance => {
            "float ns_luminance(vec3 c) {
    return dot(c, vec3(0.2126, 0.7152, 0.0722));
}
"
        }
        Builtin::Average => {
            "float ns_average(vec3 v) {
    return (v.x + v.y + v.z) / 3.0;
}
"
        }
        Builtin::Noise => {
            "float ns_hash(vec3 p) {
    return fract(sin(dot(p, vec3(12.9898, 78.233, 37.719))) * 43758.5453);
}

float ns_value_noise(vec3 p) {
    vec3 i = floor(p);
    vec3 f = fract(p);
    vec3 u = f * f * (3.0 - 2.0 * f);
    float x00 = mix(ns_hash(i), ns_hash(i + vec3(1.0, 0.0, 0.0)), u.x);
    float x10 = mix(ns_hash(i + vec3(0.0, 1.0, 0.0)), ns_hash(i + vec3(1.0, 1.0, 0.0)), u.x);
    float x01 = mix(ns_hash(i + vec3(0.0, 0.0, 1.0)), ns_hash(i + vec3(1.0, 0.0, 1.0)), u.x);
    float x11 = mix(ns_hash(i + vec3(0.0, 1.0, 1.0)), ns_hash(i + vec3(1.0, 1.0, 1.0)), u.x);
    return mix(mix(x00, x10, u.y), mix(x01, x11, u.y), u.z);
}

float ns_noise(vec3 p, float scale, int octaves) {
    float sum = 0.0;
    float amplitude = 1.0;
    float total = 0.0;
    vec3 q = p * scale;
    int count = clamp(octaves, 1, 16);
    for (int i = 0; i < count; i++) {
        sum += amplitude * ns_value_noise(q);
        total += amplitude;
        amplitude *= 0.5;
        q *= 2.0;
    }
    return sum / total;
}
"
        }
        Builtin::NoiseColor => {
            "vec3 ns_noise_color(vec3 p, float scale, int octaves) {
    return vec3(
        ns_noise(p, scale, octaves),
        ns_noise(p + vec3(19.19, 7.31, 3.17), scale, octaves),
        ns_noise(p + vec3(5.47, 23.11, 11.83), scale, octaves)
    );
}
"
        }
        Builtin::Checker => {
            "float ns_checker(vec3 p, float scale) {
    vec3 q = floor(p * scale + 0.00001);
    return fract((q.x + q.y + q.z) * 0.5) < 0.25 ? 1.0 : 0.0;
}
"
        }
        Builtin::SampleRamp => {
            "vec4 ns_sample_ramp(sampler2D lut, float t) {
    float size = float(textureSize(lut, 0).x);
    float u = (clamp(t, 0.0, 1.0) * (size - 1.0) + 0.5) / size;
    return textureLod(lut, vec2(u, 0.5), 0.0);
}
"
        }
        Builtin::RgbCurves => {
            "vec3 ns_rgb_curves(sampler2D lut, vec3 color, float fac) {
    vec3 c = vec3(
        ns_sample_ramp(lut, color.x).w,
        ns_sample_ramp(lut, color.y).w,
        ns_sample_ramp(lut, color.z).w
    );
    vec3 mapped = vec3(
        ns_sample_ramp(lut, c.x).x,
        ns_sample_ramp(lut, c.y).y,
        ns_sample_ramp(lut, c.z).z
    );
    return mix(color, mapped, fac);
}
"
        }
        Builtin::VectorCurves => {
            "vec3 ns_vector_curves(sampler2D lut, vec3 v, float fac) {
    vec3 t = v * 0.5 + 0.5;
    vec3 mapped = vec3(
        ns_sample_ramp(lut, t.x).x,
        ns_sample_ramp(lut, t.y).y,
        ns_sample_ramp(lut, t.z).z
    );
    return mix(v, mapped, fac);
}
"
        }
        Builtin::ImageLinear => {
            "vec4 ns_image_linear(sampler2D tex, vec3 uv) {
    return texture(tex, uv.xy);
}
"
        }
        Builtin::ImageClosest => {
            "vec4 ns_image_closest(sampler2D tex, vec3 uv) {
    ivec2 size = textureSize(tex, 0);
    ivec2 texel = clamp(ivec2(fract(uv.xy) * vec2(size)), ivec2(0), size - 1);
    return texelFetch(tex, texel, 0);
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
    use crate::graph::Graph;
    use crate::slot::SlotId;
    use crate::value::ImageRef;

    #[test]
    fn test_image_graph() {
        let mut graph = Graph::new();
        let image = graph.add(NodeType::ImageTexture, [0, 0]);
        let mix = graph.add(NodeType::MixRgb, [0, 0]);
        let out = graph.add(NodeType::Output, [0, 0]);
        graph
            .set_image_value(SlotId::new(image, 0), ImageRef::new("brick.png"))
            .unwrap();
        graph.set_enum(SlotId::new(image, 1), 1).unwrap();
        graph.add_connection(SlotId::new(image, 3), SlotId::new(mix, 3)).unwrap();
        graph.add_connection(SlotId::new(image, 4), SlotId::new(mix, 2)).unwrap();
        graph.add_connection(SlotId::new(mix, 5), SlotId::new(out, 0)).unwrap();

        let data = graph.generate_code().unwrap();
        let source = String::from_utf8(GlslBackend.emit(&data).unwrap()).unwrap();

        assert!(source.starts_with("#version 450\n"));
        for name in data.parameters.names() {
            assert!(source.contains(name), "{name} missing from:\n{source}");
        }
        assert!(source.contains("uniform sampler2D p_n1_0;"));
        assert!(source.contains("bool p_n2_1;"));
        assert!(source.contains("vec4 t_n1_sample = ns_image_closest(p_n1_0, in_uv);"));
        assert!(source.contains("vec4 ns_image_closest("));
        assert!(!source.contains("vec4 ns_image_linear("));
        assert!(source.contains("clamp(t_n2_raw, 0.0, 1.0)"));
        assert!(source.contains("out_color = vec4(v_n2_5, params.p_n3_1);"));
    }

    #[test]
    fn test_dependencies_precede_callers() {
        let mut graph = Graph::new();
        let noise = graph.add(NodeType::NoiseTexture, [0, 0]);
        let curves = graph.add(NodeType::VectorCurves, [0, 0]);
        let out = graph.add(NodeType::Output, [0, 0]);
        graph.add_connection(SlotId::new(noise, 4), SlotId::new(curves, 2)).unwrap();
        graph.add_connection(SlotId::new(curves, 3), SlotId::new(out, 0)).unwrap();

        let data = graph.generate_code().unwrap();
        let source = String::from_utf8(GlslBackend.emit(&data).unwrap()).unwrap();
        let position = |needle: &str| source.find(needle).unwrap();

        assert!(position("float ns_noise(") < position("vec3 ns_noise_color("));
        assert!(position("vec4 ns_sample_ramp(") < position("vec3 ns_vector_curves("));
        assert!(position("vec3 ns_vector_curves(") < position("void main()"));
    }
}
