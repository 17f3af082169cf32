mod adjusted;
mod aperture;
mod cosecant;
mod gaussian;
mod sinc;
mod steered_array;
mod tabular;
mod uniform;

pub use adjusted::{Adjusted, GainAdjustmentTable};
pub use aperture::{Aperture, ApertureShape};
pub use cosecant::CosecantSquared;
pub use gaussian::Gaussian;
pub use sinc::Sinc;
pub use steered_array::SteeredArray;
pub use tabular::{GainCut, Tabular};
pub use uniform::Uniform;

use std::sync::OnceLock;

use crate::common::{rad, Angle, Freq, Ratio};

/// Antenna gain as a function of direction.
///
/// Directions are in the beam frame: azimuth and elevation relative to the
/// boresight. Patterns that model electronically steered arrays use the EBS
/// offsets to translate into the element frame; all others ignore them.
///
/// Patterns are shared and read-only after construction; every method takes
/// `&self` and implementations must be safe to call from many threads.
pub trait AntennaPattern: Send + Sync + core::fmt::Debug {
    /// Linear gain toward `(az, el)`.
    fn gain(&self, frequency: Freq<f64>, az: Angle, el: Angle, ebs_az: Angle, ebs_el: Angle)
        -> Ratio;

    /// Boresight (peak) linear gain.
    fn peak_gain(&self, frequency: Freq<f64>) -> Ratio;

    /// Half-power azimuth beamwidth.
    fn azimuth_beamwidth(&self, frequency: Freq<f64>, ebs_az: Angle, ebs_el: Angle) -> Angle;

    /// Half-power elevation beamwidth.
    fn elevation_beamwidth(&self, frequency: Freq<f64>, ebs_az: Angle, ebs_el: Angle) -> Angle;

    /// Fraction of the full sphere whose gain is at or above `threshold`.
    ///
    /// The default samples the sphere on every call; patterns embedding a
    /// [`GainSampler`] serve this from a one-shot histogram instead.
    fn gain_threshold_fraction(&self, frequency: Freq<f64>, threshold: Ratio) -> f64 {
        sample_gain_histogram(self, frequency).fraction_at_or_above(threshold)
    }

    /// Mean linear gain over the sphere.
    fn average_gain(&self, frequency: Freq<f64>) -> Ratio {
        sample_gain_histogram(self, frequency).average()
    }
}

/// Sorted sample of a pattern's gain over the sphere.
#[derive(Clone, Debug)]
pub struct GainHistogram {
    /// Linear gains, ascending.
    gains: Vec<f64>,
}

/// Number of azimuth samples when building a histogram.
const HISTOGRAM_AZ_SAMPLES: usize = 180;
/// Number of sine-elevation bands when building a histogram.
const HISTOGRAM_EL_BANDS: usize = 90;

impl GainHistogram {
    /// Fraction of samples at or above the threshold.
    #[must_use]
    pub fn fraction_at_or_above(&self, threshold: Ratio) -> f64 {
        let t = threshold.linear();
        let below = self.gains.partition_point(|&g| g < t);
        (self.gains.len() - below) as f64 / self.gains.len() as f64
    }

    /// Mean of the samples.
    #[must_use]
    pub fn average(&self) -> Ratio {
        Ratio::from_linear(self.gains.iter().sum::<f64>() / self.gains.len() as f64)
    }
}

/// Builds a gain histogram by equal-solid-angle sampling at zero EBS.
///
/// Elevation bands are uniform in sin(el), so every sample covers the same
/// solid angle and the histogram is a true sphere-fraction estimate.
#[must_use]
pub fn sample_gain_histogram<P: AntennaPattern + ?Sized>(
    pattern: &P,
    frequency: Freq<f64>,
) -> GainHistogram {
    let mut gains = Vec::with_capacity(HISTOGRAM_AZ_SAMPLES * HISTOGRAM_EL_BANDS);
    gains.extend(
        itertools::iproduct!(0..HISTOGRAM_EL_BANDS, 0..HISTOGRAM_AZ_SAMPLES).map(|(i, j)| {
            let s = -1.0 + (2.0 * i as f64 + 1.0) / HISTOGRAM_EL_BANDS as f64;
            let el = s.clamp(-1.0, 1.0).asin();
            let az = -std::f64::consts::PI
                + std::f64::consts::TAU * (j as f64 + 0.5) / HISTOGRAM_AZ_SAMPLES as f64;
            pattern
                .gain(frequency, az * rad, el * rad, Angle::ZERO, Angle::ZERO)
                .linear()
        }),
    );
    gains.sort_by(f64::total_cmp);
    GainHistogram { gains }
}

/// One-shot histogram cell embedded by patterns that cache their sphere sample.
#[derive(Debug, Default)]
pub struct GainSampler {
    histogram: OnceLock<GainHistogram>,
}

impl GainSampler {
    /// Creates an empty sampler.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            histogram: OnceLock::new(),
        }
    }

    /// The histogram, sampling the pattern on first use.
    pub fn histogram<P: AntennaPattern + ?Sized>(
        &self,
        pattern: &P,
        frequency: Freq<f64>,
    ) -> &GainHistogram {
        self.histogram
            .get_or_init(|| sample_gain_histogram(pattern, frequency))
    }
}

/// Half-power beamwidth crossing for a symmetric main lobe described by
/// `g(x)`, searched outward from boresight up to `limit`.
pub(crate) fn half_power_width(g: impl Fn(f64) -> f64, limit: f64) -> Angle {
    let peak = g(0.0);
    let half = peak / 2.0;
    let steps = 1024;
    let dx = limit / steps as f64;
    let mut prev = peak;
    for i in 1..=steps {
        let x = i as f64 * dx;
        let v = g(x);
        if v <= half {
            // Linear crossing between the bracketing samples.
            let frac = if prev > v { (prev - half) / (prev - v) } else { 1.0 };
            return (2.0 * ((i - 1) as f64 + frac) * dx) * rad;
        }
        prev = v;
    }
    (2.0 * limit) * rad
}
