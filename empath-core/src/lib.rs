#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::unescaped_backticks)]

//! Core types and traits of the empath RF interaction engine.
//!
//! Given a transmitter, a receiver, and an optional target platform, the
//! engine decides whether a radio-frequency signal can be detected and with
//! what signal-to-interference ratio. Five effect families compose behind a
//! single [`Interaction`] object: antenna gain patterns, atmospheric
//! attenuation, the pattern-propagation factor, surface clutter, and
//! receiver noise.
//!
//! This crate holds the shared vocabulary: units, coordinate frames, the
//! [`Antenna`] mount, the [`AntennaPattern`] family, [`Xmtr`]/[`Rcvr`], the
//! [`Interaction`] orchestrator, and the [`EmManager`] that tracks which
//! transmitters and receivers can see each other. Concrete physics models
//! live in `empath-models`; detection policy lives in `empath`.
//!
//! [`Interaction`]: crate::interaction::Interaction
//! [`Antenna`]: crate::antenna::Antenna
//! [`AntennaPattern`]: crate::pattern::AntennaPattern
//! [`Xmtr`]: crate::radio::Xmtr
//! [`Rcvr`]: crate::radio::Rcvr
//! [`EmManager`]: crate::manager::EmManager

/// Antenna mount: offset, tilt, scan limits, electronic steering, field of view.
pub mod antenna;
/// Units, marker types, and physical constants.
pub mod common;
/// Atmosphere, ground, and terrain contracts.
pub mod environment;
/// Error types.
pub mod error;
/// Coordinate frames, geodesy, refraction, and masking geometry.
pub mod geometry;
/// The per-attempt interaction orchestrator.
pub mod interaction;
/// The electromagnetic manager: registration, interactor indexes, events.
pub mod manager;
/// Traits implemented by attenuation, propagation, and clutter models.
pub mod model;
/// Antenna gain patterns.
pub mod pattern;
/// The platform and articulated-part contracts.
pub mod platform;
/// Transmitters, receivers, and polarization.
pub mod radio;

pub use error::EmError;
