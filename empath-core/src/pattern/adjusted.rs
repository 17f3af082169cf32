use std::sync::Arc;

use crate::common::{Angle, Freq, Ratio};
use crate::error::PatternError;

use super::AntennaPattern;

/// Per-frequency gain correction, interpolated between the table knots and
/// clamped outside them.
#[derive(Clone, Debug)]
pub struct GainAdjustmentTable {
    frequencies: Vec<f64>,
    factors: Vec<f64>,
}

impl GainAdjustmentTable {
    /// Creates a table from `(frequency, factor)` knots sorted by frequency.
    pub fn new(knots: Vec<(Freq<f64>, Ratio)>) -> Result<Self, PatternError> {
        if knots.is_empty() {
            return Err(PatternError::EmptyTable("gain adjustment"));
        }
        if knots.windows(2).any(|w| w[1].0.hz() <= w[0].0.hz()) {
            return Err(PatternError::NonMonotonicAxis("gain adjustment frequency"));
        }
        Ok(Self {
            frequencies: knots.iter().map(|(f, _)| f.hz()).collect(),
            factors: knots.iter().map(|(_, r)| r.linear()).collect(),
        })
    }

    /// Correction factor at `frequency`.
    #[must_use]
    pub fn factor(&self, frequency: Freq<f64>) -> Ratio {
        let x = frequency.hz();
        let linear = match self.frequencies.partition_point(|&f| f < x) {
            0 => self.factors[0],
            i if i == self.frequencies.len() => self.factors[i - 1],
            i => {
                let t = (x - self.frequencies[i - 1])
                    / (self.frequencies[i] - self.frequencies[i - 1]);
                self.factors[i - 1] + t * (self.factors[i] - self.factors[i - 1])
            }
        };
        Ratio::from_linear(linear)
    }
}

/// A pattern with a per-frequency gain-adjustment table applied to every
/// lookup, peak included.
#[derive(Debug)]
pub struct Adjusted {
    inner: Arc<dyn AntennaPattern>,
    table: GainAdjustmentTable,
}

impl Adjusted {
    /// Wraps `inner` with the adjustment `table`.
    #[must_use]
    pub fn new(inner: Arc<dyn AntennaPattern>, table: GainAdjustmentTable) -> Self {
        Self { inner, table }
    }
}

impl AntennaPattern for Adjusted {
    fn gain(
        &self,
        frequency: Freq<f64>,
        az: Angle,
        el: Angle,
        ebs_az: Angle,
        ebs_el: Angle,
    ) -> Ratio {
        self.inner.gain(frequency, az, el, ebs_az, ebs_el) * self.table.factor(frequency)
    }

    fn peak_gain(&self, frequency: Freq<f64>) -> Ratio {
        self.inner.peak_gain(frequency) * self.table.factor(frequency)
    }

    fn azimuth_beamwidth(&self, frequency: Freq<f64>, ebs_az: Angle, ebs_el: Angle) -> Angle {
        self.inner.azimuth_beamwidth(frequency, ebs_az, ebs_el)
    }

    fn elevation_beamwidth(&self, frequency: Freq<f64>, ebs_az: Angle, ebs_el: Angle) -> Angle {
        self.inner.elevation_beamwidth(frequency, ebs_az, ebs_el)
    }

    fn gain_threshold_fraction(&self, frequency: Freq<f64>, threshold: Ratio) -> f64 {
        let f = self.table.factor(frequency);
        self.inner
            .gain_threshold_fraction(frequency, threshold / f)
    }

    fn average_gain(&self, frequency: Freq<f64>) -> Ratio {
        self.inner.average_gain(frequency) * self.table.factor(frequency)
    }
}
