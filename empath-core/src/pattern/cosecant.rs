use crate::common::{rad, Angle, Freq, Ratio};
use crate::error::PatternError;

use super::sinc::SINC_HALF_POWER_U;
use super::{AntennaPattern, GainSampler};

/// Cosecant-squared elevation coverage with a sinc² azimuth cut.
///
/// Peak gain holds from the bottom of the main beam up to the break angle;
/// above it the gain rolls off as csc²(break)/csc²(el) out to the coverage
/// limit. Below the main beam the sinc² elevation lobe applies.
#[derive(Debug)]
pub struct CosecantSquared {
    peak_gain: Ratio,
    azimuth_beamwidth: Angle,
    elevation_beamwidth: Angle,
    break_elevation: Angle,
    limit_elevation: Angle,
    minimum_gain: Ratio,
    sampler: GainSampler,
}

impl CosecantSquared {
    /// Creates a new [`CosecantSquared`].
    ///
    /// `break_elevation` is where the csc² rolloff starts; `limit_elevation`
    /// is the top of the shaped coverage.
    pub fn new(
        peak_gain: Ratio,
        azimuth_beamwidth: Angle,
        elevation_beamwidth: Angle,
        break_elevation: Angle,
        limit_elevation: Angle,
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
        if break_elevation.radian() <= 0.0
            || limit_elevation.radian() <= break_elevation.radian()
            || limit_elevation.radian() > std::f64::consts::FRAC_PI_2
        {
            return Err(PatternError::InvalidBeamwidth(limit_elevation.radian()));
        }
        Ok(Self {
            peak_gain,
            azimuth_beamwidth,
            elevation_beamwidth,
            break_elevation,
            limit_elevation,
            minimum_gain,
            sampler: GainSampler::new(),
        })
    }

    fn elevation_factor(&self, el: Angle) -> f64 {
        let e = el.radian();
        if e < 0.0 {
            // Below the beam the lower half of the sinc² lobe applies.
            let u = 2.0 * SINC_HALF_POWER_U * e / self.elevation_beamwidth.radian();
            if u.abs() < 1e-9 {
                1.0
            } else {
                (u.sin() / u).powi(2)
            }
        } else if e <= self.break_elevation.radian() {
            1.0
        } else if e <= self.limit_elevation.radian() {
            (self.break_elevation.radian().sin() / e.sin()).powi(2)
        } else {
            0.0
        }
    }
}

impl AntennaPattern for CosecantSquared {
    fn gain(
        &self,
        frequency: Freq<f64>,
        az: Angle,
        el: Angle,
        _ebs_az: Angle,
        _ebs_el: Angle,
    ) -> Ratio {
        let _ = frequency;
        let u = 2.0 * SINC_HALF_POWER_U * az.radian() / self.azimuth_beamwidth.radian();
        let az_factor = if u.abs() < 1e-9 {
            1.0
        } else {
            (u.sin() / u).powi(2)
        };
        let g = self.peak_gain.linear() * az_factor * self.elevation_factor(el);
        Ratio::from_linear(g.max(self.minimum_gain.linear()))
    }

    fn peak_gain(&self, _frequency: Freq<f64>) -> Ratio {
        self.peak_gain
    }

    fn azimuth_beamwidth(&self, _frequency: Freq<f64>, _ebs_az: Angle, _ebs_el: Angle) -> Angle {
        self.azimuth_beamwidth
    }

    fn elevation_beamwidth(&self, _frequency: Freq<f64>, _ebs_az: Angle, _ebs_el: Angle) -> Angle {
        // The shaped coverage spans from the lower half-power point to the limit.
        (self.limit_elevation.radian() + self.elevation_beamwidth.radian() / 2.0) * rad
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
