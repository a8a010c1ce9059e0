pub mod bezier;
pub mod flight;
pub mod schedule;
