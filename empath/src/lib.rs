//! User-facing layer of the empath RF interaction engine.
//!
//! [`empath_core`] carries the geometry, radio components, and the
//! interaction orchestrator; [`empath_models`] the physics model library.
//! This crate adds the detection policy on top: Marcum-Swerling and
//! Pd-table detectors, sensor modes and beams, and the antenna-pattern
//! plot utility.

pub mod detector;
pub mod error;
pub mod plot;
pub mod prelude;
pub mod sensor;

pub use empath_core as core;
pub use empath_models as models;

pub use detector::Detector;
pub use sensor::{SensorBeam, SensorMode};
