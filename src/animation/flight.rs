use crate::{
    animation::bezier::{CubicBezier, Easings},
    batch::store::BatchId,
    foundation::core::{Geometry, Point, Vec2},
};

/// Scale the clone shrinks to on arrival.
pub const END_SCALE: f64 = 0.2;
/// Eased opacity progress at which the clone starts fading out.
pub const FADE_START: f64 = 0.8;

/// Straight-line travel between two element centers.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct FlightPath {
    /// Center of the source element; the clone is placed here at progress 0.
    pub origin: Point,
    /// Destination center minus source center.
    pub travel: Vec2,
}

impl FlightPath {
    /// Path from the center of `source` to the center of `destination`.
    pub fn between(source: &Geometry, destination: &Geometry) -> Self {
        let origin = source.center();
        Self {
            origin,
            travel: destination.center() - origin,
        }
    }

    /// Sample the clone's visual state at local time progress `p`.
    ///
    /// Each channel is eased independently, so the clone follows a curved path even
    /// though the travel vector is straight.
    pub fn sample(&self, easings: &Easings, p: f64) -> FlightSample {
        let p = p.clamp(0.0, 1.0);
        let offset = Vec2::new(
            self.travel.x * easings.x.sample(p),
            self.travel.y * easings.y.sample(p),
        );
        FlightSample {
            offset,
            position: self.origin + offset,
            scale: 1.0 + (END_SCALE - 1.0) * easings.scale.sample(p),
            opacity: fade_out(p),
        }
    }
}

/// Visual state of one clone at one sample.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct FlightSample {
    /// Translation from the source center.
    pub offset: Vec2,
    /// Absolute clone center.
    pub position: Point,
    /// Uniform scale, from `1.0` down to [`END_SCALE`].
    pub scale: f64,
    /// `1.0` until the fade starts, `0.0` on arrival.
    pub opacity: f64,
}

/// A sample tagged with the run it belongs to; delivered to the host per tick.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct FlightFrame {
    /// Owning batch.
    pub batch: BatchId,
    /// Stagger index of the run.
    pub index: u32,
    /// Linear local time progress in `[0, 1]`.
    pub progress: f64,
    /// Eased visual state.
    #[serde(flatten)]
    pub sample: FlightSample,
}

// Opaque until the ease-out timeline passes FADE_START, then linear to zero.
fn fade_out(p: f64) -> f64 {
    let e = CubicBezier::EASE_OUT.sample(p);
    if e < FADE_START {
        1.0
    } else {
        ((1.0 - e) / (1.0 - FADE_START)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/flight.rs"]
mod tests;
