use crate::foundation::error::{FlycartError, FlycartResult};

pub use kurbo::{Point, Rect, Vec2};

/// Measured element box in viewport pixels, as reported by the host layout layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Geometry {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width; zero is legal.
    pub width: f64,
    /// Height; zero is legal.
    pub height: f64,
}

impl Geometry {
    /// Box from its top-left corner and extents.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rejects boxes that no layout engine could have produced.
    ///
    /// Zero extents are valid here; see [`Geometry::is_zero_area`].
    pub fn validate(&self, what: &str) -> FlycartResult<()> {
        let all_finite = [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(FlycartError::validation(format!(
                "{what} geometry must be finite"
            )));
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(FlycartError::validation(format!(
                "{what} geometry must have non-negative extents"
            )));
        }
        Ok(())
    }

    /// `true` when either extent is zero, so there is nothing to fly.
    pub fn is_zero_area(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// The box as a kurbo [`Rect`].
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left + self.width,
            self.top + self.height,
        )
    }

    /// Center point of the box.
    pub fn center(&self) -> Point {
        self.rect().center()
    }
}

impl From<Rect> for Geometry {
    fn from(r: Rect) -> Self {
        let r = r.abs();
        Self::new(r.x0, r.y0, r.width(), r.height())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
