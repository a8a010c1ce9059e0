//! flycart animates the "fly to cart" effect: clones of a trigger element travel to a
//! destination element with independent per-axis easing, then disappear.
//!
//! The interesting part is the batching core. One press of the trigger is a *batch* that
//! fans out into `count` staggered runs. The [`Orchestrator`] aggregates their progress
//! into one throttled, non-decreasing signal and fires a single completion per batch,
//! even when presses overlap or completion signals arrive late, twice, or out of order.
//!
//! Rendering is the host's job. The host supplies element geometry, calls
//! [`Orchestrator::tick`] from its display loop, and implements [`FlightHost`] to
//! receive progress, completion, and per-run [`FlightFrame`]s.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod batch;
mod config;
mod foundation;
mod host;
mod orchestrator;
mod sim;

pub use animation::bezier::{CubicBezier, Easings};
pub use animation::flight::{END_SCALE, FADE_START, FlightFrame, FlightPath, FlightSample};
pub use animation::schedule::{RunState, SubRun, stagger_interval_ms, stagger_schedule};
pub use batch::store::{Batch, BatchId, BatchStore, Completion, PROGRESS_STEP};
pub use config::{FlightConfig, MAX_SIM_TRIGGERS, SimulationConfig};
pub use foundation::core::{Geometry, Point, Rect, Vec2};
pub use foundation::error::{FlycartError, FlycartResult};
pub use host::{FlightHost, HostEvent, NullHost, RecordingHost};
pub use orchestrator::{DEFAULT_DURATION_MS, Driver, FlightRequest, Launch, Orchestrator};
pub use sim::{SimulationReport, simulate};
