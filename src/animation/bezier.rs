use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{FlycartError, FlycartResult};

const NEWTON_ITERATIONS: usize = 8;
const SOLVE_EPSILON: f64 = 1e-3;

/// CSS-style cubic bezier easing with implicit end points `(0,0)` and `(1,1)`.
///
/// `x` is the time axis and must stay within `[0, 1]` for both control points so the
/// curve is a function of time. `y` is unconstrained, which is what allows overshoot
/// and anticipation curves such as [`CubicBezier::CART_X`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    /// First control point, time axis.
    pub x1: f64,
    /// First control point, output axis.
    pub y1: f64,
    /// Second control point, time axis.
    pub x2: f64,
    /// Second control point, output axis.
    pub y2: f64,
}

impl CubicBezier {
    /// CSS `linear`.
    pub const LINEAR: Self = Self::raw(0.0, 0.0, 1.0, 1.0);
    /// CSS `ease`.
    pub const EASE: Self = Self::raw(0.25, 0.1, 0.25, 1.0);
    /// CSS `ease-in`.
    pub const EASE_IN: Self = Self::raw(0.42, 0.0, 1.0, 1.0);
    /// CSS `ease-out`.
    pub const EASE_OUT: Self = Self::raw(0.0, 0.0, 0.58, 1.0);
    /// CSS `ease-in-out`.
    pub const EASE_IN_OUT: Self = Self::raw(0.42, 0.0, 0.58, 1.0);

    /// Quadratic ease-in.
    pub const EASE_IN_QUAD: Self = Self::raw(0.55, 0.085, 0.68, 0.53);
    /// Quadratic ease-out.
    pub const EASE_OUT_QUAD: Self = Self::raw(0.25, 0.46, 0.45, 0.94);
    /// Quadratic ease-in-out.
    pub const EASE_IN_OUT_QUAD: Self = Self::raw(0.455, 0.03, 0.515, 0.955);

    /// Cubic ease-in.
    pub const EASE_IN_CUBIC: Self = Self::raw(0.55, 0.055, 0.675, 0.19);
    /// Cubic ease-out.
    pub const EASE_OUT_CUBIC: Self = Self::raw(0.215, 0.61, 0.355, 1.0);
    /// Cubic ease-in-out.
    pub const EASE_IN_OUT_CUBIC: Self = Self::raw(0.645, 0.045, 0.355, 1.0);

    /// Quartic ease-in.
    pub const EASE_IN_QUART: Self = Self::raw(0.895, 0.03, 0.685, 0.22);
    /// Quartic ease-out.
    pub const EASE_OUT_QUART: Self = Self::raw(0.165, 0.84, 0.44, 1.0);
    /// Quartic ease-in-out.
    pub const EASE_IN_OUT_QUART: Self = Self::raw(0.77, 0.0, 0.175, 1.0);

    /// Quintic ease-in.
    pub const EASE_IN_QUINT: Self = Self::raw(0.755, 0.05, 0.855, 0.06);
    /// Quintic ease-out.
    pub const EASE_OUT_QUINT: Self = Self::raw(0.23, 1.0, 0.32, 1.0);
    /// Quintic ease-in-out.
    pub const EASE_IN_OUT_QUINT: Self = Self::raw(0.86, 0.0, 0.07, 1.0);

    /// Anticipation: dips below zero before accelerating.
    pub const EASE_IN_BACK: Self = Self::raw(0.6, -0.28, 0.735, 0.045);
    /// Overshoot past one, then settle.
    pub const EASE_OUT_BACK: Self = Self::raw(0.175, 0.885, 0.32, 1.275);
    /// Anticipation and overshoot.
    pub const EASE_IN_OUT_BACK: Self = Self::raw(0.68, -0.55, 0.265, 1.55);

    /// Horizontal travel: pulls back before launching toward the destination.
    pub const CART_X: Self = Self::raw(0.59, -0.75, 0.91, 0.5);
    /// Vertical travel: fast rise with a slight overshoot at the end.
    pub const CART_Y: Self = Self::raw(0.15, 0.57, 0.9, 1.05);
    /// Shrink: holds size until late in the flight.
    pub const CART_SCALE: Self = Self::raw(0.85, 0.06, 0.97, 1.01);

    const fn raw(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a validated curve.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> FlycartResult<Self> {
        let curve = Self::raw(x1, y1, x2, y2);
        curve.validate()?;
        Ok(curve)
    }

    /// Control points must be finite, with `x1` and `x2` in `[0, 1]`.
    pub fn validate(&self) -> FlycartResult<()> {
        if ![self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(FlycartError::validation(
                "cubic bezier control points must be finite",
            ));
        }
        if !(0.0..=1.0).contains(&self.x1) || !(0.0..=1.0).contains(&self.x2) {
            return Err(FlycartError::validation(format!(
                "cubic bezier x1/x2 must be in [0, 1], got {self}"
            )));
        }
        Ok(())
    }

    /// Look up a named preset (`"ease_in_out"`, `"cart_x"`, ...).
    pub fn preset(name: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, curve)| *curve)
    }

    /// Every named preset, in listing order.
    pub fn presets() -> &'static [(&'static str, CubicBezier)] {
        PRESETS
    }

    /// Time coordinate at curve parameter `t`.
    pub fn x_at(&self, t: f64) -> f64 {
        sample_curve(self.x1, self.x2, t)
    }

    /// Output coordinate at curve parameter `t`.
    pub fn y_at(&self, t: f64) -> f64 {
        sample_curve(self.y1, self.y2, t)
    }

    /// Invert `x(t) = x` for the curve parameter.
    ///
    /// Newton-Raphson from `t = x`, clamped to `[0, 1]` after every step. Returns the
    /// last iterate when the tolerance is not reached within the iteration budget.
    pub fn solve_t(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        self.newton(x, x, NEWTON_ITERATIONS)
    }

    // Stops early on a flat tangent; the current iterate is the best estimate left.
    fn newton(&self, x: f64, start: f64, iterations: usize) -> f64 {
        let mut t = start;
        for _ in 0..iterations {
            let err = self.x_at(t) - x;
            if err.abs() < SOLVE_EPSILON {
                return t;
            }
            let d = sample_curve_derivative(self.x1, self.x2, t);
            if d.abs() < 1e-7 {
                break;
            }
            t = (t - err / d).clamp(0.0, 1.0);
        }
        t
    }

    /// Eased output for time progress `x`.
    pub fn sample(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        self.y_at(self.solve_t(x))
    }

    /// `[x1, y1, x2, y2]`, the serialized form.
    pub fn to_array(self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

impl Default for CubicBezier {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl fmt::Display for CubicBezier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cubic-bezier({:.2},{:.2},{:.2},{:.2})",
            self.x1, self.y1, self.x2, self.y2
        )
    }
}

impl Serialize for CubicBezier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_array().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CubicBezier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Points([f64; 4]),
            Preset(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Points([x1, y1, x2, y2]) => {
                Self::new(x1, y1, x2, y2).map_err(serde::de::Error::custom)
            }
            Repr::Preset(name) => Self::preset(&name).ok_or_else(|| {
                serde::de::Error::custom(format!("unknown easing preset \"{name}\""))
            }),
        }
    }
}

/// Independent easings for each animated channel of a flight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Easings {
    /// Horizontal travel.
    pub x: CubicBezier,
    /// Vertical travel.
    pub y: CubicBezier,
    /// Shrink toward [`crate::END_SCALE`].
    pub scale: CubicBezier,
}

impl Easings {
    /// Validate all three curves.
    pub fn validate(&self) -> FlycartResult<()> {
        self.x.validate()?;
        self.y.validate()?;
        self.scale.validate()
    }
}

impl Default for Easings {
    fn default() -> Self {
        Self {
            x: CubicBezier::CART_X,
            y: CubicBezier::CART_Y,
            scale: CubicBezier::CART_SCALE,
        }
    }
}

static PRESETS: &[(&str, CubicBezier)] = &[
    ("linear", CubicBezier::LINEAR),
    ("ease", CubicBezier::EASE),
    ("ease_in", CubicBezier::EASE_IN),
    ("ease_out", CubicBezier::EASE_OUT),
    ("ease_in_out", CubicBezier::EASE_IN_OUT),
    ("ease_in_quad", CubicBezier::EASE_IN_QUAD),
    ("ease_out_quad", CubicBezier::EASE_OUT_QUAD),
    ("ease_in_out_quad", CubicBezier::EASE_IN_OUT_QUAD),
    ("ease_in_cubic", CubicBezier::EASE_IN_CUBIC),
    ("ease_out_cubic", CubicBezier::EASE_OUT_CUBIC),
    ("ease_in_out_cubic", CubicBezier::EASE_IN_OUT_CUBIC),
    ("ease_in_quart", CubicBezier::EASE_IN_QUART),
    ("ease_out_quart", CubicBezier::EASE_OUT_QUART),
    ("ease_in_out_quart", CubicBezier::EASE_IN_OUT_QUART),
    ("ease_in_quint", CubicBezier::EASE_IN_QUINT),
    ("ease_out_quint", CubicBezier::EASE_OUT_QUINT),
    ("ease_in_out_quint", CubicBezier::EASE_IN_OUT_QUINT),
    ("ease_in_back", CubicBezier::EASE_IN_BACK),
    ("ease_out_back", CubicBezier::EASE_OUT_BACK),
    ("ease_in_out_back", CubicBezier::EASE_IN_OUT_BACK),
    ("cart_x", CubicBezier::CART_X),
    ("cart_y", CubicBezier::CART_Y),
    ("cart_scale", CubicBezier::CART_SCALE),
];

// Bernstein form with P0 = 0 and P3 = 1.
fn sample_curve(a1: f64, a2: f64, t: f64) -> f64 {
    let omt = 1.0 - t;
    3.0 * omt * omt * t * a1 + 3.0 * omt * t * t * a2 + t * t * t
}

fn sample_curve_derivative(a1: f64, a2: f64, t: f64) -> f64 {
    let omt = 1.0 - t;
    3.0 * omt * omt * a1 + 6.0 * omt * t * (a2 - a1) + 3.0 * t * t * (1.0 - a2)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/bezier.rs"]
mod tests;
