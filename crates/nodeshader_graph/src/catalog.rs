// SPDX-License-Identifier: MIT OR Apache-2.0
//! Catalog of shading node types.
//!
//! Every node type declares a fixed, ordered slot table. A slot's index in
//! that table is its address inside the node ([`crate::SlotId::index`]), so
//! tables may only ever be appended to.

use crate::slot::{SlotDecl, SlotDefault, SlotType};
use serde::{Deserialize, Serialize};

/// Operations of the [`NodeType::Math`] node
pub const MATH_OPERATIONS: &[&str] = &[
    "Add", "Subtract", "Multiply", "Divide", "Power", "Minimum", "Maximum", "Sine", "Cosine",
    "Absolute",
];

/// Operations of the [`NodeType::VectorMath`] node
pub const VECTOR_MATH_OPERATIONS: &[&str] = &[
    "Add",
    "Subtract",
    "Multiply",
    "Cross Product",
    "Dot Product",
    "Normalize",
    "Length",
];

/// Blend modes of the [`NodeType::MixRgb`] node
pub const MIX_BLEND_MODES: &[&str] = &["Mix", "Add", "Multiply", "Screen", "Subtract", "Difference"];

/// Image sampling filters
pub const IMAGE_INTERPOLATIONS: &[&str] = &["Linear", "Closest"];

const GREY: [f32; 3] = [0.5, 0.5, 0.5];
const LIGHT_GREY: [f32; 3] = [0.8, 0.8, 0.8];
const DARK_GREY: [f32; 3] = [0.2, 0.2, 0.2];
const BLACK: [f32; 3] = [0.0, 0.0, 0.0];
const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const ORIGIN: [f32; 3] = [0.0, 0.0, 0.0];

const VALUE_SLOTS: &[SlotDecl] = &[
    SlotDecl::property("Value", SlotDefault::Float(0.5)),
    SlotDecl::output("Value", SlotType::Float),
];

const RGB_SLOTS: &[SlotDecl] = &[
    SlotDecl::property("Color", SlotDefault::Color(GREY)),
    SlotDecl::output("Color", SlotType::Color),
];

const VECTOR_SLOTS: &[SlotDecl] = &[
    SlotDecl::property("Vector", SlotDefault::Vector(ORIGIN)),
    SlotDecl::output("Vector", SlotType::Vector),
];

const TEXTURE_COORDINATE_SLOTS: &[SlotDecl] = &[
    SlotDecl::output("Generated", SlotType::Vector),
    SlotDecl::output("Normal", SlotType::Vector),
    SlotDecl::output("UV", SlotType::Vector),
];

const MATH_SLOTS: &[SlotDecl] = &[
    SlotDecl::property(
        "Operation",
        SlotDefault::Enum {
            index: 0,
            options: MATH_OPERATIONS,
        },
    ),
    SlotDecl::property("Clamp", SlotDefault::Bool(false)),
    SlotDecl::input("A", SlotDefault::Float(0.5)),
    SlotDecl::input("B", SlotDefault::Float(0.5)),
    SlotDecl::output("Value", SlotType::Float),
];

const VECTOR_MATH_SLOTS: &[SlotDecl] = &[
    SlotDecl::property(
        "Operation",
        SlotDefault::Enum {
            index: 0,
            options: VECTOR_MATH_OPERATIONS,
        },
    ),
    SlotDecl::input("A", SlotDefault::Vector(ORIGIN)),
    SlotDecl::input("B", SlotDefault::Vector(ORIGIN)),
    SlotDecl::output("Vector", SlotType::Vector),
    SlotDecl::output("Value", SlotType::Float),
];

const MIX_RGB_SLOTS: &[SlotDecl] = &[
    SlotDecl::property(
        "Blend",
        SlotDefault::Enum {
            index: 0,
            options: MIX_BLEND_MODES,
        },
    ),
    SlotDecl::property("Clamp", SlotDefault::Bool(false)),
    SlotDecl::input("Fac", SlotDefault::Float(0.5)),
    SlotDecl::input("Color1", SlotDefault::Color(GREY)),
    SlotDecl::input("Color2", SlotDefault::Color(GREY)),
    SlotDecl::output("Color", SlotType::Color),
];

const INVERT_SLOTS: &[SlotDecl] = &[
    SlotDecl::input("Fac", SlotDefault::Float(1.0)),
    SlotDecl::input("Color", SlotDefault::Color(BLACK)),
    SlotDecl::output("Color", SlotType::Color),
];

const SEPARATE_RGB_SLOTS: &[SlotDecl] = &[
    SlotDecl::input("Color", SlotDefault::Color(LIGHT_GREY)),
    SlotDecl::output("R", SlotType::Float),
    SlotDecl::output("G", SlotType::Float),
    SlotDecl::output("B", SlotType::Float),
];

const COMBINE_RGB_SLOTS: &[SlotDecl] = &[
    SlotDecl::input("R", SlotDefault::Float(0.0)),
    SlotDecl::input("G", SlotDefault::Float(0.0)),
    SlotDecl::input("B", SlotDefault::Float(0.0)),
    SlotDecl::output("Color", SlotType::Color),
];

const COLOR_RAMP_SLOTS: &[SlotDecl] = &[
    SlotDecl::property("Ramp", SlotDefault::ColorRamp),
    SlotDecl::input("Fac", SlotDefault::Float(0.5)),
    SlotDecl::output("Color", SlotType::Color),
    SlotDecl::output("Alpha", SlotType::Float),
];

const RGB_CURVES_SLOTS: &[SlotDecl] = &[
    SlotDecl::property("Curves", SlotDefault::RgbCurve),
    SlotDecl::input("Fac", SlotDefault::Float(1.0)),
    SlotDecl::input("Color", SlotDefault::Color(WHITE)),
    SlotDecl::output("Color", SlotType::Color),
];

const VECTOR_CURVES_SLOTS: &[SlotDecl] = &[
    SlotDecl::property("Curves", SlotDefault::VectorCurve),
    SlotDecl::input("Fac", SlotDefault::Float(1.0)),
    SlotDecl::input("Vector", SlotDefault::Vector(ORIGIN)),
    SlotDecl::output("Vector", SlotType::Vector),
];

const IMAGE_TEXTURE_SLOTS: &[SlotDecl] = &[
    SlotDecl::property("Image", SlotDefault::Image),
    SlotDecl::property(
        "Interpolation",
        SlotDefault::Enum {
            index: 0,
            options: IMAGE_INTERPOLATIONS,
        },
    ),
    SlotDecl::input("Vector", SlotDefault::Vector(ORIGIN)),
    SlotDecl::output("Color", SlotType::Color),
    SlotDecl::output("Alpha", SlotType::Float),
];

const NOISE_TEXTURE_SLOTS: &[SlotDecl] = &[
    SlotDecl::input("Vector", SlotDefault::Vector(ORIGIN)),
    SlotDecl::input("Scale", SlotDefault::Float(5.0)),
    SlotDecl::input("Octaves", SlotDefault::Int(4)),
    SlotDecl::output("Fac", SlotType::Float),
    SlotDecl::output("Color", SlotType::Color),
];

const CHECKER_TEXTURE_SLOTS: &[SlotDecl] = &[
    SlotDecl::input("Vector", SlotDefault::Vector(ORIGIN)),
    SlotDecl::input("Color1", SlotDefault::Color(LIGHT_GREY)),
    SlotDecl::input("Color2", SlotDefault::Color(DARK_GREY)),
    SlotDecl::input("Scale", SlotDefault::Float(5.0)),
    SlotDecl::output("Color", SlotType::Color),
    SlotDecl::output("Fac", SlotType::Float),
];

const OUTPUT_SLOTS: &[SlotDecl] = &[
    SlotDecl::input("Color", SlotDefault::Color(LIGHT_GREY)),
    SlotDecl::input("Alpha", SlotDefault::Float(1.0)),
];

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Constants and geometry inputs
    Input,
    /// Final shader output
    Output,
    /// Procedural and image textures
    Texture,
    /// Color adjustments
    Color,
    /// Vector operations
    Vector,
    /// Type converters and math
    Converter,
}

/// Shading node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Constant float
    Value,
    /// Constant color
    Rgb,
    /// Constant vector
    Vector,
    /// Geometry coordinates
    TextureCoordinate,
    /// Scalar math
    Math,
    /// Vector math
    VectorMath,
    /// Blend two colors
    MixRgb,
    /// Invert a color
    Invert,
    /// Split a color into channels
    SeparateRgb,
    /// Build a color from channels
    CombineRgb,
    /// Map a factor through a gradient
    ColorRamp,
    /// Per-channel color curves
    RgbCurves,
    /// Per-axis vector curves
    VectorCurves,
    /// Sample an image
    ImageTexture,
    /// Fractal value noise
    NoiseTexture,
    /// Checkerboard pattern
    CheckerTexture,
    /// Final shader output
    Output,
}

impl NodeType {
    /// All node types, in menu order
    pub const ALL: &'static [NodeType] = &[
        Self::Value,
        Self::Rgb,
        Self::Vector,
        Self::TextureCoordinate,
        Self::Math,
        Self::VectorMath,
        Self::MixRgb,
        Self::Invert,
        Self::SeparateRgb,
        Self::CombineRgb,
        Self::ColorRamp,
        Self::RgbCurves,
        Self::VectorCurves,
        Self::ImageTexture,
        Self::NoiseTexture,
        Self::CheckerTexture,
        Self::Output,
    ];

    /// Slot table for this type
    pub fn slots(&self) -> &'static [SlotDecl] {
        match self {
            Self::Value => VALUE_SLOTS,
            Self::Rgb => RGB_SLOTS,
            Self::Vector => VECTOR_SLOTS,
            Self::TextureCoordinate => TEXTURE_COORDINATE_SLOTS,
            Self::Math => MATH_SLOTS,
            Self::VectorMath => VECTOR_MATH_SLOTS,
            Self::MixRgb => MIX_RGB_SLOTS,
            Self::Invert => INVERT_SLOTS,
            Self::SeparateRgb => SEPARATE_RGB_SLOTS,
            Self::CombineRgb => COMBINE_RGB_SLOTS,
            Self::ColorRamp => COLOR_RAMP_SLOTS,
            Self::RgbCurves => RGB_CURVES_SLOTS,
            Self::VectorCurves => VECTOR_CURVES_SLOTS,
            Self::ImageTexture => IMAGE_TEXTURE_SLOTS,
            Self::NoiseTexture => NOISE_TEXTURE_SLOTS,
            Self::CheckerTexture => CHECKER_TEXTURE_SLOTS,
            Self::Output => OUTPUT_SLOTS,
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Value => "Value",
            Self::Rgb => "RGB",
            Self::Vector => "Vector",
            Self::TextureCoordinate => "Texture Coordinate",
            Self::Math => "Math",
            Self::VectorMath => "Vector Math",
            Self::MixRgb => "Mix RGB",
            Self::Invert => "Invert",
            Self::SeparateRgb => "Separate RGB",
            Self::CombineRgb => "Combine RGB",
            Self::ColorRamp => "Color Ramp",
            Self::RgbCurves => "RGB Curves",
            Self::VectorCurves => "Vector Curves",
            Self::ImageTexture => "Image Texture",
            Self::NoiseTexture => "Noise Texture",
            Self::CheckerTexture => "Checker Texture",
            Self::Output => "Material Output",
        }
    }

    /// Category for menus
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::Value | Self::Rgb | Self::Vector | Self::TextureCoordinate => NodeCategory::Input,
            Self::Output => NodeCategory::Output,
            Self::ImageTexture | Self::NoiseTexture | Self::CheckerTexture => NodeCategory::Texture,
            Self::MixRgb | Self::Invert | Self::RgbCurves => NodeCategory::Color,
            Self::VectorMath | Self::VectorCurves => NodeCategory::Vector,
            Self::Math | Self::SeparateRgb | Self::CombineRgb | Self::ColorRamp => {
                NodeCategory::Converter
            }
        }
    }

    /// Types in a category
    pub fn in_category(category: NodeCategory) -> impl Iterator<Item = NodeType> {
        Self::ALL.iter().copied().filter(move |t| t.category() == category)
    }

    /// Look up a type by its serialized name (`"mix_rgb"`, ...)
    pub fn from_key(key: &str) -> Option<NodeType> {
        Self::ALL.iter().copied().find(|t| t.key() == key)
    }

    /// Serialized name
    pub fn key(&self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Rgb => "rgb",
            Self::Vector => "vector",
            Self::TextureCoordinate => "texture_coordinate",
            Self::Math => "math",
            Self::VectorMath => "vector_math",
            Self::MixRgb => "mix_rgb",
            Self::Invert => "invert",
            Self::SeparateRgb => "separate_rgb",
            Self::CombineRgb => "combine_rgb",
            Self::ColorRamp => "color_ramp",
            Self::RgbCurves => "rgb_curves",
            Self::VectorCurves => "vector_curves",
            Self::ImageTexture => "image_texture",
            Self::NoiseTexture => "noise_texture",
            Self::CheckerTexture => "checker_texture",
            Self::Output => "output",
        }
    }
}
