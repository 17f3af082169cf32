use crate::common::{Angle, Freq, Ratio};
use crate::error::PatternError;

use super::{AntennaPattern, GainSampler};

/// Gaussian main lobe, half power at half the configured beamwidths.
#[derive(Debug)]
pub struct Gaussian {
    peak_gain: Ratio,
    azimuth_beamwidth: Angle,
    elevation_beamwidth: Angle,
    minimum_gain: Ratio,
    sampler: GainSampler,
}

impl Gaussian {
    /// Creates a new [`Gaussian`].
    pub fn new(
        peak_gain: Ratio,
        azimuth_beamwidth: Angle,
        elevation_beamwidth: Angle,
        minimum_gain: Ratio,
    ) -> Result<Self, PatternError> {
        if peak_gain.linear() <= 0.0 {
            return Err(PatternError::InvalidPeakGain(peak_gain.linear()));
        }
        for bw in [azimuth_beamwidth, elevation_beamwidth] {
            if bw.radian() <= 0.0 || bw.radian() > std::f64::consts::PI {
                return Err(PatternError::InvalidBeamwidth(bw.radian()));
            }
        }
        Ok(Self {
            peak_gain,
            azimuth_beamwidth,
            elevation_beamwidth,
            minimum_gain,
            sampler: GainSampler::new(),
        })
    }
}

impl AntennaPattern for Gaussian {
    fn gain(
        &self,
        _frequency: Freq<f64>,
        az: Angle,
        el: Angle,
        _ebs_az: Angle,
        _ebs_el: Angle,
    ) -> Ratio {
        let four_ln2 = 4.0 * std::f64::consts::LN_2;
        let arg = (az.radian() / self.azimuth_beamwidth.radian()).powi(2)
            + (el.radian() / self.elevation_beamwidth.radian()).powi(2);
        let g = self.peak_gain.linear() * (-four_ln2 * arg).exp();
        Ratio::from_linear(g.max(self.minimum_gain.linear()))
    }

    fn peak_gain(&self, _frequency: Freq<f64>) -> Ratio {
        self.peak_gain
    }

    fn azimuth_beamwidth(&self, _frequency: Freq<f64>, _ebs_az: Angle, _ebs_el: Angle) -> Angle {
        self.azimuth_beamwidth
    }

    fn elevation_beamwidth(&self, _frequency: Freq<f64>, _ebs_az: Angle, _ebs_el: Angle) -> Angle {
        self.elevation_beamwidth
    }

    fn gain_threshold_fraction(&self, frequency: Freq<f64>, threshold: Ratio) -> f64 {
        self.sampler
            .histogram(self, frequency)
            .fraction_at_or_above(threshold)
    }

    fn average_gain(&self, frequency: Freq<f64>) -> Ratio {
        self.sampler.histogram(self, frequency).average()
    }
}
