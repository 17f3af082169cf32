//! Atmospheric attenuation, pattern-propagation, and surface-clutter models
//! for the empath RF interaction engine.
//!
//! Every model implements one of the `empath-core` traits ([`Attenuation`],
//! [`Propagation`], [`Clutter`]) and reads only the signal-path geometry and
//! the environment; the interaction orchestrator composes them and never
//! knows which concrete model it is running. The open [`ModelRegistry`] maps
//! textual model names to factories so scenario files can pick models by
//! name.
//!
//! [`Attenuation`]: empath_core::model::Attenuation
//! [`Propagation`]: empath_core::model::Propagation
//! [`Clutter`]: empath_core::model::Clutter

pub mod attenuation;
pub mod clutter;
pub mod propagation;

mod error;
mod registry;

pub use error::ModelError;
pub use registry::ModelRegistry;
