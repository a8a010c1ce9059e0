use std::path::Path;

use crate::{
    animation::bezier::{CubicBezier, Easings},
    foundation::core::Geometry,
    foundation::error::{FlycartError, FlycartResult},
    orchestrator::{DEFAULT_DURATION_MS, Driver, FlightRequest},
};

/// Per-trigger flight settings, as a host component would expose them.
///
/// Every field is optional in JSON. Easings accept either a `[x1, y1, x2, y2]` array or
/// a preset name such as `"ease_out_back"`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlightConfig {
    /// Flight time of each clone.
    pub duration_ms: f64,
    /// Clones per press.
    pub count: u32,
    /// Horizontal easing.
    pub easing_x: CubicBezier,
    /// Vertical easing.
    pub easing_y: CubicBezier,
    /// Shrink easing.
    pub easing_scale: CubicBezier,
    /// Resolve presses instantly without flying anything.
    pub reduced_motion: bool,
    /// Who advances the runs.
    pub driver: Driver,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            count: 1,
            easing_x: CubicBezier::CART_X,
            easing_y: CubicBezier::CART_Y,
            easing_scale: CubicBezier::CART_SCALE,
            reduced_motion: false,
            driver: Driver::Internal,
        }
    }
}

impl FlightConfig {
    /// The three channel curves as one [`Easings`].
    pub fn easings(&self) -> Easings {
        Easings {
            x: self.easing_x,
            y: self.easing_y,
            scale: self.easing_scale,
        }
    }

    /// Trigger request between two measured boxes.
    pub fn request(&self, source: Geometry, destination: Geometry) -> FlightRequest {
        FlightRequest {
            source,
            destination,
            count: self.count,
            duration_ms: self.duration_ms,
            easings: self.easings(),
            reduced_motion: self.reduced_motion,
            driver: self.driver,
        }
    }

    /// Apply trigger validation to the settings alone.
    pub fn validate(&self) -> FlycartResult<()> {
        self.request(
            Geometry::new(0.0, 0.0, 1.0, 1.0),
            Geometry::new(0.0, 0.0, 1.0, 1.0),
        )
        .validate()
    }
}

/// A scripted run of the orchestrator against a fixed refresh rate.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Settings applied to every press.
    #[serde(default)]
    pub flight: FlightConfig,
    /// Trigger element box.
    pub source: Geometry,
    /// Destination element box.
    pub destination: Geometry,
    /// Display refresh rate driving `tick`.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Number of times the trigger is pressed.
    #[serde(default = "default_triggers")]
    pub triggers: u32,
    /// Time between presses.
    #[serde(default)]
    pub trigger_interval_ms: f64,
}

/// Upper bound on scripted presses in one simulation.
pub const MAX_SIM_TRIGGERS: u32 = 10_000;

fn default_fps() -> u32 {
    60
}

fn default_triggers() -> u32 {
    1
}

impl SimulationConfig {
    /// One press at 60 fps with default flight settings.
    pub fn new(source: Geometry, destination: Geometry) -> Self {
        Self {
            flight: FlightConfig::default(),
            source,
            destination,
            fps: default_fps(),
            triggers: default_triggers(),
            trigger_interval_ms: 0.0,
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> FlycartResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: &Path) -> FlycartResult<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            FlycartError::config(format!("read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    /// Check the script and the flight it launches.
    pub fn validate(&self) -> FlycartResult<()> {
        if self.fps == 0 {
            return Err(FlycartError::config("fps must be > 0"));
        }
        if self.triggers > MAX_SIM_TRIGGERS {
            return Err(FlycartError::config(format!(
                "triggers must be at most {MAX_SIM_TRIGGERS}, got {}",
                self.triggers
            )));
        }
        if !(self.trigger_interval_ms.is_finite() && self.trigger_interval_ms >= 0.0) {
            return Err(FlycartError::config(
                "trigger_interval_ms must be finite and >= 0",
            ));
        }
        self.request().validate()
    }

    /// The request issued on every press.
    pub fn request(&self) -> FlightRequest {
        self.flight.request(self.source, self.destination)
    }

    /// Milliseconds between ticks.
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / f64::from(self.fps)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
