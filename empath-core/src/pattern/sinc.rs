use crate::common::{Angle, Freq, Ratio};
use crate::error::PatternError;

use super::{AntennaPattern, GainSampler};

/// Half-power argument of sin(u)/u, the root of sinc(u)² = 1/2.
pub(crate) const SINC_HALF_POWER_U: f64 = 1.391_557_377_1;

/// (sin u / u)² main lobe of a uniformly illuminated line source, separable
/// in azimuth and elevation.
#[derive(Debug)]
pub struct Sinc {
    peak_gain: Ratio,
    azimuth_beamwidth: Angle,
    elevation_beamwidth: Angle,
    minimum_gain: Ratio,
    sampler: GainSampler,
}

impl Sinc {
    /// Creates a new [`Sinc`].
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

    fn lobe(offset: Angle, beamwidth: Angle) -> f64 {
        let u = 2.0 * SINC_HALF_POWER_U * offset.radian() / beamwidth.radian();
        if u.abs() < 1e-9 {
            1.0
        } else {
            (u.sin() / u).powi(2)
        }
    }
}

impl AntennaPattern for Sinc {
    fn gain(
        &self,
        _frequency: Freq<f64>,
        az: Angle,
        el: Angle,
        _ebs_az: Angle,
        _ebs_el: Angle,
    ) -> Ratio {
        let g = self.peak_gain.linear()
            * Self::lobe(az, self.azimuth_beamwidth)
            * Self::lobe(el, self.elevation_beamwidth);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{dB, deg, GHz};

    fn pattern() -> Sinc {
        Sinc::new(30.0 * dB, 4.0 * deg, 8.0 * deg, Ratio::from_linear(1e-10)).unwrap()
    }

    #[test]
    fn boresight_is_peak() {
        let p = pattern();
        approx::assert_relative_eq!(
            p.gain(3.0 * GHz, Angle::ZERO, Angle::ZERO, Angle::ZERO, Angle::ZERO)
                .db(),
            30.0,
            max_relative = 1e-12
        );
    }

    #[rstest::rstest]
    #[case::az_half_power(2.0, 0.0)]
    #[case::el_half_power(0.0, 4.0)]
    fn half_power_at_half_beamwidth(#[case] az_deg: f64, #[case] el_deg: f64) {
        let p = pattern();
        let g = p.gain(
            3.0 * GHz,
            az_deg * deg,
            el_deg * deg,
            Angle::ZERO,
            Angle::ZERO,
        );
        approx::assert_abs_diff_eq!(g.db(), 26.989_700_043_360_19, epsilon = 1e-6);
    }

    #[test]
    fn first_sidelobe_is_13_db_down() {
        let p = pattern();
        // First sidelobe of sinc² peaks near u = 4.4934 at -13.26 dB.
        let az = 4.4934 / (2.0 * SINC_HALF_POWER_U) * 4.0;
        let g = p.gain(3.0 * GHz, az * deg, Angle::ZERO, Angle::ZERO, Angle::ZERO);
        approx::assert_abs_diff_eq!(g.db() - 30.0, -13.26, epsilon = 0.05);
    }

    #[test]
    fn floor_applies_far_out() {
        let p = pattern();
        let g = p.gain(3.0 * GHz, 90.0 * deg, Angle::ZERO, Angle::ZERO, Angle::ZERO);
        approx::assert_abs_diff_eq!(g.db(), -100.0, epsilon = 1e-9);
    }

    #[test]
    fn average_gain_is_cached_and_below_peak() {
        let p = pattern();
        let a = p.average_gain(3.0 * GHz);
        assert!(a.linear() < p.peak_gain.linear());
        assert!(a.linear() > 0.0);
        assert_eq!(a.linear(), p.average_gain(3.0 * GHz).linear());
    }
}
