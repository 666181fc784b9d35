// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot addressing and slot declarations for node inputs/outputs.

use crate::node::NodeId;
use crate::value::{ColorRamp, ImageRef, RgbCurve, SlotValue, VectorCurve};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of one input or output slot on a node.
///
/// Ordered by node id first, then by slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId {
    /// Owning node
    pub node: NodeId,
    /// Index into the node type's slot declarations
    pub index: u32,
}

impl SlotId {
    /// Create a slot address
    pub const fn new(node: NodeId, index: u32) -> Self {
        Self { node, index }
    }

    /// Compact 64-bit key: low 32 bits of the node id in the high half, slot index in the low half.
    ///
    /// Lossy once node ids exceed `u32::MAX`, so it must only ever be used as a
    /// cache key next to the composite id, never as the sole identity of a slot.
    pub fn packed(&self) -> u64 {
        (u64::from(self.node.0 as u32) << 32) | u64::from(self.index)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.index)
    }
}

/// Slot direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotDirection {
    /// Input slot
    Input,
    /// Output slot
    Output,
}

/// Declared type of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotType {
    /// Boolean value
    Bool,
    /// Floating point value
    Float,
    /// Integer value
    Int,
    /// 3D vector
    Vector,
    /// RGB color
    Color,
    /// Index into a fixed list of options
    Enum,
    /// Color ramp (gradient)
    ColorRamp,
    /// Per-channel RGB curves
    RgbCurve,
    /// Per-axis vector curves
    VectorCurve,
    /// Image reference
    Image,
}

impl SlotType {
    /// Whether values of this type can flow through connections
    pub fn is_connectable(&self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Float | Self::Int | Self::Vector | Self::Color
        )
    }

    /// Check if an output of this type can feed an input of `other`
    pub fn can_connect_to(&self, other: &SlotType) -> bool {
        if !self.is_connectable() || !other.is_connectable() {
            return false;
        }

        if self == other {
            return true;
        }

        // Implicit conversions
        match (self, other) {
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => true,
            (Self::Float | Self::Int, Self::Vector | Self::Color) => true,
            (Self::Vector, Self::Color) | (Self::Color, Self::Vector) => true,
            (Self::Vector | Self::Color, Self::Float) => true,
            _ => false,
        }
    }
}

/// Compile-time default for a declared slot.
///
/// Kept separate from [`SlotValue`] because ramps and curves own heap data and
/// slot tables are `static`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotDefault {
    /// Boolean default
    Bool(bool),
    /// Float default
    Float(f32),
    /// Integer default
    Int(i32),
    /// Vector default
    Vector([f32; 3]),
    /// Color default
    Color([f32; 3]),
    /// Enum default with its option labels
    Enum {
        /// Selected option
        index: u32,
        /// Option labels, in index order
        options: &'static [&'static str],
    },
    /// Default black-to-white ramp
    ColorRamp,
    /// Identity RGB curves
    RgbCurve,
    /// Identity vector curves
    VectorCurve,
    /// No image bound
    Image,
}

impl SlotDefault {
    /// Zero default for a type (used for output slots)
    pub const fn zero(ty: SlotType) -> Self {
        match ty {
            SlotType::Bool => Self::Bool(false),
            SlotType::Float => Self::Float(0.0),
            SlotType::Int => Self::Int(0),
            SlotType::Vector => Self::Vector([0.0; 3]),
            SlotType::Color => Self::Color([0.0; 3]),
            SlotType::Enum => Self::Enum { index: 0, options: &[] },
            SlotType::ColorRamp => Self::ColorRamp,
            SlotType::RgbCurve => Self::RgbCurve,
            SlotType::VectorCurve => Self::VectorCurve,
            SlotType::Image => Self::Image,
        }
    }

    /// Type of the slot this default belongs to
    pub const fn slot_type(&self) -> SlotType {
        match self {
            Self::Bool(_) => SlotType::Bool,
            Self::Float(_) => SlotType::Float,
            Self::Int(_) => SlotType::Int,
            Self::Vector(_) => SlotType::Vector,
            Self::Color(_) => SlotType::Color,
            Self::Enum { .. } => SlotType::Enum,
            Self::ColorRamp => SlotType::ColorRamp,
            Self::RgbCurve => SlotType::RgbCurve,
            Self::VectorCurve => SlotType::VectorCurve,
            Self::Image => SlotType::Image,
        }
    }

    /// Materialize the default into an owned value
    pub fn value(&self) -> SlotValue {
        match *self {
            Self::Bool(v) => SlotValue::Bool(v),
            Self::Float(v) => SlotValue::Float(v),
            Self::Int(v) => SlotValue::Int(v),
            Self::Vector(v) => SlotValue::Vector(v),
            Self::Color(v) => SlotValue::Color(v),
            Self::Enum { index, .. } => SlotValue::Enum(index),
            Self::ColorRamp => SlotValue::ColorRamp(ColorRamp::default()),
            Self::RgbCurve => SlotValue::RgbCurve(RgbCurve::default()),
            Self::VectorCurve => SlotValue::VectorCurve(VectorCurve::default()),
            Self::Image => SlotValue::Image(ImageRef::default()),
        }
    }
}

/// Static declaration of one slot of a node type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotDecl {
    /// Display name
    pub name: &'static str,
    /// Slot direction
    pub direction: SlotDirection,
    /// Default value (also fixes the slot type)
    pub default: SlotDefault,
    /// Whether a connection may target this slot
    pub connectable: bool,
}

impl SlotDecl {
    /// Connectable input slot
    pub const fn input(name: &'static str, default: SlotDefault) -> Self {
        Self {
            name,
            direction: SlotDirection::Input,
            default,
            connectable: true,
        }
    }

    /// Input that is only edited in place (enum, ramp, curve, image, or a node's constant)
    pub const fn property(name: &'static str, default: SlotDefault) -> Self {
        Self {
            name,
            direction: SlotDirection::Input,
            default,
            connectable: false,
        }
    }

    /// Output slot
    pub const fn output(name: &'static str, ty: SlotType) -> Self {
        Self {
            name,
            direction: SlotDirection::Output,
            default: SlotDefault::zero(ty),
            connectable: true,
        }
    }

    /// Declared type
    pub const fn slot_type(&self) -> SlotType {
        self.default.slot_type()
    }

    /// Whether this is an input slot
    pub fn is_input(&self) -> bool {
        self.direction == SlotDirection::Input
    }

    /// Whether this is an output slot
    pub fn is_output(&self) -> bool {
        self.direction == SlotDirection::Output
    }

    /// Option labels for enum slots (empty otherwise)
    pub fn enum_options(&self) -> &'static [&'static str] {
        match self.default {
            SlotDefault::Enum { options, .. } => options,
            _ => &[],
        }
    }

    /// Check if this output can feed `other` (an input)
    pub fn can_connect(&self, other: &SlotDecl) -> bool {
        self.is_output()
            && other.is_input()
            && other.connectable
            && self.slot_type().can_connect_to(&other.slot_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_ordering() {
        let a = SlotId::new(NodeId(1), 5);
        let b = SlotId::new(NodeId(2), 0);
        let c = SlotId::new(NodeId(2), 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_packed_key() {
        let slot = SlotId::new(NodeId(7), 3);
        assert_eq!(slot.packed(), (7 << 32) | 3);

        // Only the low 32 bits of the node id survive packing
        let wide = SlotId::new(NodeId((1 << 32) + 7), 3);
        assert_eq!(wide.packed(), slot.packed());
        assert_ne!(wide, slot);
    }

    #[test]
    fn test_type_conversions() {
        assert!(SlotType::Float.can_connect_to(&SlotType::Color));
        assert!(SlotType::Color.can_connect_to(&SlotType::Float));
        assert!(SlotType::Int.can_connect_to(&SlotType::Float));
        assert!(SlotType::Bool.can_connect_to(&SlotType::Bool));
        assert!(!SlotType::Bool.can_connect_to(&SlotType::Float));
        assert!(!SlotType::Float.can_connect_to(&SlotType::Enum));
        assert!(!SlotType::ColorRamp.can_connect_to(&SlotType::ColorRamp));
    }

    #[test]
    fn test_property_not_connectable() {
        let out = SlotDecl::output("Value", SlotType::Float);
        let prop = SlotDecl::property("Value", SlotDefault::Float(0.5));
        let input = SlotDecl::input("A", SlotDefault::Float(0.5));
        assert!(out.can_connect(&input));
        assert!(!out.can_connect(&prop));
        assert!(!input.can_connect(&out));
    }
}
