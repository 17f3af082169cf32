use crate::common::{Angle, Freq, Ratio};
use crate::error::PatternError;

use super::AntennaPattern;

/// Constant gain inside a rectangular beam, a floor outside.
///
/// The textbook "uniform" pattern: no main-lobe shape, just peak inside the
/// half-power rectangle. With beamwidths covering the full sphere it is the
/// isotropic radiator.
#[derive(Clone, Debug)]
pub struct Uniform {
    peak_gain: Ratio,
    azimuth_beamwidth: Angle,
    elevation_beamwidth: Angle,
    minimum_gain: Ratio,
}

impl Uniform {
    /// Default floor outside the beam, -100 dB down.
    pub const DEFAULT_MINIMUM_GAIN: Ratio = Ratio::from_linear(1e-10);

    /// Creates a new [`Uniform`].
    pub fn new(
        peak_gain: Ratio,
        azimuth_beamwidth: Angle,
        elevation_beamwidth: Angle,
    ) -> Result<Self, PatternError> {
        Self::with_minimum_gain(
            peak_gain,
            azimuth_beamwidth,
            elevation_beamwidth,
            Self::DEFAULT_MINIMUM_GAIN,
        )
    }

    /// Creates a new [`Uniform`] with an explicit out-of-beam floor.
    pub fn with_minimum_gain(
        peak_gain: Ratio,
        azimuth_beamwidth: Angle,
        elevation_beamwidth: Angle,
        minimum_gain: Ratio,
    ) -> Result<Self, PatternError> {
        if peak_gain.linear() <= 0.0 {
            return Err(PatternError::InvalidPeakGain(peak_gain.linear()));
        }
        if !(0.0..=std::f64::consts::TAU).contains(&azimuth_beamwidth.radian())
            || azimuth_beamwidth.radian() == 0.0
        {
            return Err(PatternError::InvalidBeamwidth(azimuth_beamwidth.radian()));
        }
        if !(0.0..=std::f64::consts::PI).contains(&elevation_beamwidth.radian())
            || elevation_beamwidth.radian() == 0.0
        {
            return Err(PatternError::InvalidBeamwidth(elevation_beamwidth.radian()));
        }
        Ok(Self {
            peak_gain,
            azimuth_beamwidth,
            elevation_beamwidth,
            minimum_gain: Ratio::from_linear(minimum_gain.linear().min(peak_gain.linear())),
        })
    }

    /// The 0 dBi isotropic radiator.
    #[must_use]
    pub fn isotropic() -> Self {
        Self {
            peak_gain: Ratio::ONE,
            azimuth_beamwidth: Angle::PI * 2.0,
            elevation_beamwidth: Angle::PI,
            minimum_gain: Ratio::ONE,
        }
    }

    /// Fraction of the sphere covered by the beam rectangle.
    fn beam_fraction(&self) -> f64 {
        (self.azimuth_beamwidth.radian() / std::f64::consts::TAU)
            * (self.elevation_beamwidth.radian() / 2.0).sin()
    }
}

impl AntennaPattern for Uniform {
    fn gain(
        &self,
        _frequency: Freq<f64>,
        az: Angle,
        el: Angle,
        _ebs_az: Angle,
        _ebs_el: Angle,
    ) -> Ratio {
        let inside = az.radian().abs() <= self.azimuth_beamwidth.radian() / 2.0
            && el.radian().abs() <= self.elevation_beamwidth.radian() / 2.0;
        if inside {
            self.peak_gain
        } else {
            self.minimum_gain
        }
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

    fn gain_threshold_fraction(&self, _frequency: Freq<f64>, threshold: Ratio) -> f64 {
        if threshold.linear() <= self.minimum_gain.linear() {
            1.0
        } else if threshold.linear() <= self.peak_gain.linear() {
            self.beam_fraction()
        } else {
            0.0
        }
    }

    fn average_gain(&self, _frequency: Freq<f64>) -> Ratio {
        let f = self.beam_fraction();
        Ratio::from_linear(self.peak_gain.linear() * f + self.minimum_gain.linear() * (1.0 - f))
    }
}
