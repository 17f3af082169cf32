mod polarization;
mod rcvr;
mod xmtr;

pub use polarization::{Polarization, PolarizationTable};
pub use rcvr::{Rcvr, RcvrFunction};
pub use xmtr::{PowerSchedule, PrfSchedule, Xmtr, XmtrFunction};

use std::sync::Arc;

use crate::pattern::AntennaPattern;

/// Per-polarization antenna-pattern selection with a default entry.
///
/// Lookups fall back to the default when no pattern is keyed to the exact
/// polarization. Patterns are shared; many transmitters and receivers may
/// hold the same one.
#[derive(Clone, Debug)]
pub struct PatternMap {
    default: Arc<dyn AntennaPattern>,
    by_polarization: Vec<(Polarization, Arc<dyn AntennaPattern>)>,
}

impl PatternMap {
    /// Creates a map with only a default pattern.
    #[must_use]
    pub fn new(default: Arc<dyn AntennaPattern>) -> Self {
        Self {
            default,
            by_polarization: Vec::new(),
        }
    }

    /// Keys a pattern to a polarization, replacing any earlier entry.
    pub fn insert(&mut self, polarization: Polarization, pattern: Arc<dyn AntennaPattern>) {
        if let Some(slot) = self
            .by_polarization
            .iter_mut()
            .find(|(p, _)| *p == polarization)
        {
            slot.1 = pattern;
        } else {
            self.by_polarization.push((polarization, pattern));
        }
    }

    /// The pattern for a polarization, or the default.
    #[must_use]
    pub fn pattern(&self, polarization: Polarization) -> &Arc<dyn AntennaPattern> {
        self.by_polarization
            .iter()
            .find(|(p, _)| *p == polarization)
            .map_or(&self.default, |(_, pattern)| pattern)
    }
}
