// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed slot values.
//!
//! [`SlotValue`] is a closed sum type: adding a new kind of value is a
//! compile-time checked change across mutation, serialization and code
//! generation.

use crate::slot::SlotType;
use serde::{Deserialize, Serialize};

/// Value stored in a slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotValue {
    /// Boolean
    Bool(bool),
    /// Float
    Float(f32),
    /// Integer
    Int(i32),
    /// 3D vector
    Vector([f32; 3]),
    /// RGB color
    Color([f32; 3]),
    /// Enum option index
    Enum(u32),
    /// Color ramp
    ColorRamp(ColorRamp),
    /// RGB curves
    RgbCurve(RgbCurve),
    /// Vector curves
    VectorCurve(VectorCurve),
    /// Image reference
    Image(ImageRef),
}

impl SlotValue {
    /// Get the slot type for this value
    pub fn slot_type(&self) -> SlotType {
        match self {
            Self::Bool(_) => SlotType::Bool,
            Self::Float(_) => SlotType::Float,
            Self::Int(_) => SlotType::Int,
            Self::Vector(_) => SlotType::Vector,
            Self::Color(_) => SlotType::Color,
            Self::Enum(_) => SlotType::Enum,
            Self::ColorRamp(_) => SlotType::ColorRamp,
            Self::RgbCurve(_) => SlotType::RgbCurve,
            Self::VectorCurve(_) => SlotType::VectorCurve,
            Self::Image(_) => SlotType::Image,
        }
    }

    /// Check the payload is well formed (finite floats, ordered ramps and curves)
    pub fn check(&self) -> Result<(), InvalidValue> {
        match self {
            Self::Bool(_) | Self::Int(_) | Self::Enum(_) | Self::Image(_) => Ok(()),
            Self::Float(v) => finite(&[*v]),
            Self::Vector(v) | Self::Color(v) => finite(v),
            Self::ColorRamp(ramp) => ramp.check(),
            Self::RgbCurve(curves) => {
                for curve in [&curves.combined, &curves.r, &curves.g, &curves.b] {
                    curve.check()?;
                }
                Ok(())
            }
            Self::VectorCurve(curves) => {
                for curve in [&curves.x, &curves.y, &curves.z] {
                    curve.check()?;
                }
                Ok(())
            }
        }
    }

    /// Float payload, if any
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Enum payload, if any
    pub fn as_enum(&self) -> Option<u32> {
        match self {
            Self::Enum(v) => Some(*v),
            _ => None,
        }
    }
}

fn finite(values: &[f32]) -> Result<(), InvalidValue> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(InvalidValue::NonFinite)
    }
}

/// Reason a value payload was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidValue {
    /// NaN or infinity in a float payload
    #[error("value is not finite")]
    NonFinite,
    /// Color ramp without stops
    #[error("color ramp has no stops")]
    EmptyRamp,
    /// Ramp stop outside [0, 1] or out of order
    #[error("color ramp stops must be ordered within [0, 1]")]
    RampOrder,
    /// Curve with fewer than two points
    #[error("curve needs at least two points")]
    CurveTooShort,
    /// Curve points not strictly increasing in x
    #[error("curve points must be strictly increasing in x")]
    CurveOrder,
}

/// Interpolation between color ramp stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RampInterpolation {
    /// Linear blend
    #[default]
    Linear,
    /// Hold the left stop
    Constant,
    /// Smoothstep blend
    Ease,
}

/// One stop of a color ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// Position in [0, 1]
    pub position: f32,
    /// RGBA color
    pub color: [f32; 4],
}

/// Gradient defined by ordered color stops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRamp {
    /// Interpolation mode
    pub interpolation: RampInterpolation,
    /// Stops ordered by position
    pub stops: Vec<ColorStop>,
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self {
            interpolation: RampInterpolation::Linear,
            stops: vec![
                ColorStop {
                    position: 0.0,
                    color: [0.0, 0.0, 0.0, 1.0],
                },
                ColorStop {
                    position: 1.0,
                    color: [1.0, 1.0, 1.0, 1.0],
                },
            ],
        }
    }
}

impl ColorRamp {
    fn check(&self) -> Result<(), InvalidValue> {
        if self.stops.is_empty() {
            return Err(InvalidValue::EmptyRamp);
        }
        for stop in &self.stops {
            finite(&[stop.position])?;
            finite(&stop.color)?;
            if !(0.0..=1.0).contains(&stop.position) {
                return Err(InvalidValue::RampOrder);
            }
        }
        if self.stops.windows(2).any(|w| w[0].position > w[1].position) {
            return Err(InvalidValue::RampOrder);
        }
        Ok(())
    }

    /// Evaluate the ramp at `t` (clamped to [0, 1])
    pub fn evaluate(&self, t: f32) -> [f32; 4] {
        let Some(first) = self.stops.first() else {
            return [0.0; 4];
        };
        let t = t.clamp(0.0, 1.0);
        if t <= first.position {
            return first.color;
        }

        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t < b.position {
                let span = b.position - a.position;
                let f = if span > 0.0 { (t - a.position) / span } else { 0.0 };
                let f = match self.interpolation {
                    RampInterpolation::Linear => f,
                    RampInterpolation::Constant => 0.0,
                    RampInterpolation::Ease => f * f * (3.0 - 2.0 * f),
                };
                return lerp4(a.color, b.color, f);
            }
        }

        self.stops[self.stops.len() - 1].color
    }

    /// Sample the ramp into `size` evenly spaced RGBA entries over [0, 1]
    pub fn bake(&self, size: usize) -> Vec<[f32; 4]> {
        sample_domain(size, 0.0, 1.0)
            .map(|t| self.evaluate(t))
            .collect()
    }
}

/// Piecewise linear curve through ordered control points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Control points `(x, y)`, strictly increasing in x
    pub points: Vec<[f32; 2]>,
}

impl Curve {
    /// Identity curve over `[min, max]`
    pub fn identity(min: f32, max: f32) -> Self {
        Self {
            points: vec![[min, min], [max, max]],
        }
    }

    fn check(&self) -> Result<(), InvalidValue> {
        if self.points.len() < 2 {
            return Err(InvalidValue::CurveTooShort);
        }
        for point in &self.points {
            finite(point)?;
        }
        if self.points.windows(2).any(|w| w[0][0] >= w[1][0]) {
            return Err(InvalidValue::CurveOrder);
        }
        Ok(())
    }

    /// Evaluate at `x`; values outside the control range hold the end points
    pub fn evaluate(&self, x: f32) -> f32 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return x;
        };
        if x <= first[0] {
            return first[1];
        }
        if x >= last[0] {
            return last[1];
        }
        for pair in self.points.windows(2) {
            let ([x0, y0], [x1, y1]) = (pair[0], pair[1]);
            if x < x1 {
                let f = (x - x0) / (x1 - x0);
                return y0 + (y1 - y0) * f;
            }
        }
        last[1]
    }
}

/// Per-channel color curves; `combined` is applied before the channel curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgbCurve {
    /// Applied to all channels first
    pub combined: Curve,
    /// Red channel
    pub r: Curve,
    /// Green channel
    pub g: Curve,
    /// Blue channel
    pub b: Curve,
}

impl Default for RgbCurve {
    fn default() -> Self {
        Self {
            combined: Curve::identity(0.0, 1.0),
            r: Curve::identity(0.0, 1.0),
            g: Curve::identity(0.0, 1.0),
            b: Curve::identity(0.0, 1.0),
        }
    }
}

impl RgbCurve {
    /// Apply to a color
    pub fn evaluate(&self, color: [f32; 3]) -> [f32; 3] {
        [
            self.r.evaluate(self.combined.evaluate(color[0])),
            self.g.evaluate(self.combined.evaluate(color[1])),
            self.b.evaluate(self.combined.evaluate(color[2])),
        ]
    }

    /// Lookup table over [0, 1]: `(r, g, b, combined)` per entry
    pub fn bake(&self, size: usize) -> Vec<[f32; 4]> {
        sample_domain(size, 0.0, 1.0)
            .map(|x| {
                [
                    self.r.evaluate(x),
                    self.g.evaluate(x),
                    self.b.evaluate(x),
                    self.combined.evaluate(x),
                ]
            })
            .collect()
    }
}

/// Per-axis vector curves over [-1, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorCurve {
    /// X axis
    pub x: Curve,
    /// Y axis
    pub y: Curve,
    /// Z axis
    pub z: Curve,
}

impl Default for VectorCurve {
    fn default() -> Self {
        Self {
            x: Curve::identity(-1.0, 1.0),
            y: Curve::identity(-1.0, 1.0),
            z: Curve::identity(-1.0, 1.0),
        }
    }
}

impl VectorCurve {
    /// Apply to a vector
    pub fn evaluate(&self, v: [f32; 3]) -> [f32; 3] {
        [self.x.evaluate(v[0]), self.y.evaluate(v[1]), self.z.evaluate(v[2])]
    }

    /// Lookup table over [-1, 1]: `(x, y, z, 1)` per entry
    pub fn bake(&self, size: usize) -> Vec<[f32; 4]> {
        sample_domain(size, -1.0, 1.0)
            .map(|v| [self.x.evaluate(v), self.y.evaluate(v), self.z.evaluate(v), 1.0])
            .collect()
    }
}

/// Reference to an image used by a texture node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageRef {
    /// Image path or asset name; `None` when nothing is bound
    pub path: Option<String>,
}

impl ImageRef {
    /// Reference an image by path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

fn lerp4(a: [f32; 4], b: [f32; 4], f: f32) -> [f32; 4] {
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * f)
}

fn sample_domain(size: usize, min: f32, max: f32) -> impl Iterator<Item = f32> {
    let last = size.saturating_sub(1).max(1) as f32;
    (0..size).map(move |i| min + (max - min) * (i as f32 / last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_evaluate() {
        let ramp = ColorRamp::default();
        assert_eq!(ramp.evaluate(0.0), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(ramp.evaluate(1.0), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(ramp.evaluate(0.5), [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(ramp.evaluate(-3.0), [0.0, 0.0, 0.0, 1.0]);

        let constant = ColorRamp {
            interpolation: RampInterpolation::Constant,
            ..ColorRamp::default()
        };
        assert_eq!(constant.evaluate(0.75), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_ramp_validation() {
        let mut ramp = ColorRamp::default();
        assert!(SlotValue::ColorRamp(ramp.clone()).check().is_ok());

        ramp.stops.reverse();
        assert_eq!(
            SlotValue::ColorRamp(ramp).check(),
            Err(InvalidValue::RampOrder)
        );

        let empty = ColorRamp {
            interpolation: RampInterpolation::Linear,
            stops: Vec::new(),
        };
        assert_eq!(
            SlotValue::ColorRamp(empty).check(),
            Err(InvalidValue::EmptyRamp)
        );
    }

    #[test]
    fn test_curve_evaluate() {
        let curve = Curve {
            points: vec![[0.0, 0.0], [0.5, 1.0], [1.0, 0.0]],
        };
        assert_eq!(curve.evaluate(0.25), 0.5);
        assert_eq!(curve.evaluate(0.5), 1.0);
        assert_eq!(curve.evaluate(2.0), 0.0);

        let identity = RgbCurve::default();
        assert_eq!(identity.evaluate([0.2, 0.4, 0.6]), [0.2, 0.4, 0.6]);
    }

    #[test]
    fn test_curve_validation() {
        let bad = Curve {
            points: vec![[0.5, 0.0], [0.5, 1.0]],
        };
        let curves = VectorCurve {
            x: bad,
            ..VectorCurve::default()
        };
        assert_eq!(
            SlotValue::VectorCurve(curves).check(),
            Err(InvalidValue::CurveOrder)
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(
            SlotValue::Float(f32::NAN).check(),
            Err(InvalidValue::NonFinite)
        );
        assert_eq!(
            SlotValue::Color([0.0, f32::INFINITY, 0.0]).check(),
            Err(InvalidValue::NonFinite)
        );
    }

    #[test]
    fn test_bake_sizes() {
        let lut = VectorCurve::default().bake(5);
        assert_eq!(lut.len(), 5);
        assert_eq!(lut[0], [-1.0, -1.0, -1.0, 1.0]);
        assert_eq!(lut[4], [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(ColorRamp::default().bake(3)[1], [0.5, 0.5, 0.5, 1.0]);
    }
}
