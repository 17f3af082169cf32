use std::sync::Arc;

use crate::common::{Angle, Freq, Ratio};

use super::{AntennaPattern, GainSampler};

/// Electronically steered array wrapper.
///
/// The wrapped pattern describes a single element (or the unsteered
/// aperture) in the array face frame. Steering the beam to
/// `(ebs_az, ebs_el)` shifts the whole pattern with it, so the lookup
/// subtracts the steering offsets before consulting the element pattern.
/// The cosine steering loss itself is the antenna mount's concern and is
/// not applied here.
#[derive(Debug)]
pub struct SteeredArray {
    element: Arc<dyn AntennaPattern>,
    sampler: GainSampler,
}

impl SteeredArray {
    /// Creates a new [`SteeredArray`] over an element pattern.
    #[must_use]
    pub fn new(element: Arc<dyn AntennaPattern>) -> Self {
        Self {
            element,
            sampler: GainSampler::new(),
        }
    }
}

impl AntennaPattern for SteeredArray {
    fn gain(
        &self,
        frequency: Freq<f64>,
        az: Angle,
        el: Angle,
        ebs_az: Angle,
        ebs_el: Angle,
    ) -> Ratio {
        self.element
            .gain(frequency, az - ebs_az, el - ebs_el, Angle::ZERO, Angle::ZERO)
    }

    fn peak_gain(&self, frequency: Freq<f64>) -> Ratio {
        self.element.peak_gain(frequency)
    }

    fn azimuth_beamwidth(&self, frequency: Freq<f64>, ebs_az: Angle, _ebs_el: Angle) -> Angle {
        // The projected aperture shrinks with steering, broadening the beam.
        let bw = self.element.azimuth_beamwidth(frequency, Angle::ZERO, Angle::ZERO);
        bw / ebs_az.radian().cos().max(1e-3)
    }

    fn elevation_beamwidth(&self, frequency: Freq<f64>, _ebs_az: Angle, ebs_el: Angle) -> Angle {
        let bw = self.element.elevation_beamwidth(frequency, Angle::ZERO, Angle::ZERO);
        bw / ebs_el.radian().cos().max(1e-3)
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
