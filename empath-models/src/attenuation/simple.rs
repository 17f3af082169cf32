use empath_core::common::Ratio;
use empath_core::environment::Environment;
use empath_core::model::{Attenuation, SignalPath};

use crate::ModelError;

/// Fixed-loss attenuation.
///
/// Either a constant one-way factor for the whole path, or a constant
/// specific attenuation in dB per metre applied over the slant range.
#[derive(Clone, Copy, Debug)]
pub enum Simple {
    /// The same one-way factor regardless of geometry.
    Constant(Ratio),
    /// Specific attenuation in \[dB/m\] times the slant range.
    PerMeter(f64),
}

impl Simple {
    /// Builds a constant-factor model, rejecting factors outside `[0, 1]`.
    pub fn constant(factor: Ratio) -> Result<Self, ModelError> {
        if !(0.0..=1.0).contains(&factor.linear()) {
            return Err(ModelError::OutOfRange {
                name: "constant attenuation factor",
                value: factor.linear(),
            });
        }
        Ok(Self::Constant(factor))
    }

    /// Builds a per-metre model, rejecting negative rates.
    pub fn per_meter(db_per_meter: f64) -> Result<Self, ModelError> {
        if !db_per_meter.is_finite() || db_per_meter < 0.0 {
            return Err(ModelError::OutOfRange {
                name: "specific attenuation [dB/m]",
                value: db_per_meter,
            });
        }
        Ok(Self::PerMeter(db_per_meter))
    }
}

impl Attenuation for Simple {
    fn compute(&self, path: &SignalPath, _env: &Environment) -> Ratio {
        match *self {
            Self::Constant(factor) => factor,
            Self::PerMeter(rate) => {
                let db = rate * path.range;
                Ratio::from_linear(10f64.powf(-db / 10.0).clamp(0.0, 1.0))
            }
        }
    }
}
