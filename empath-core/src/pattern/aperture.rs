use crate::common::{rad, Angle, Freq, Ratio};
use crate::error::PatternError;

use super::sinc::SINC_HALF_POWER_U;
use super::{AntennaPattern, GainSampler};

/// Half-power argument of (2·J1(x)/x)².
const AIRY_HALF_POWER_X: f64 = 1.616_34;

/// Physical aperture outline.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ApertureShape {
    /// Circular dish of the given diameter in \[m\].
    Circular {
        /// Diameter in \[m\].
        diameter: f64,
    },
    /// Elliptical aperture; `width` spans azimuth, `height` elevation, in \[m\].
    Elliptical {
        /// Azimuth-plane axis in \[m\].
        width: f64,
        /// Elevation-plane axis in \[m\].
        height: f64,
    },
    /// Rectangular aperture; `width` spans azimuth, `height` elevation, in \[m\].
    Rectangular {
        /// Azimuth-plane side in \[m\].
        width: f64,
        /// Elevation-plane side in \[m\].
        height: f64,
    },
}

impl ApertureShape {
    fn dimensions(self) -> (f64, f64) {
        match self {
            Self::Circular { diameter } => (diameter, diameter),
            Self::Elliptical { width, height } | Self::Rectangular { width, height } => {
                (width, height)
            }
        }
    }

    fn area(self) -> f64 {
        match self {
            Self::Circular { diameter } => std::f64::consts::FRAC_PI_4 * diameter * diameter,
            Self::Elliptical { width, height } => std::f64::consts::FRAC_PI_4 * width * height,
            Self::Rectangular { width, height } => width * height,
        }
    }
}

/// Uniformly illuminated physical aperture.
///
/// Circular and elliptical apertures produce the Airy pattern
/// (2·J1(x)/x)²; rectangular apertures the separable sinc². Peak gain
/// follows from the aperture area and efficiency, so gain and beamwidths
/// are frequency dependent.
#[derive(Debug)]
pub struct Aperture {
    shape: ApertureShape,
    efficiency: f64,
    minimum_gain: Ratio,
    sampler: GainSampler,
}

impl Aperture {
    /// Creates a new [`Aperture`].
    pub fn new(shape: ApertureShape, efficiency: f64) -> Result<Self, PatternError> {
        let (w, h) = shape.dimensions();
        if w <= 0.0 {
            return Err(PatternError::InvalidAperture(w));
        }
        if h <= 0.0 {
            return Err(PatternError::InvalidAperture(h));
        }
        if efficiency <= 0.0 || efficiency > 1.0 {
            return Err(PatternError::InvalidPeakGain(efficiency));
        }
        Ok(Self {
            shape,
            efficiency,
            minimum_gain: Ratio::from_linear(1e-10),
            sampler: GainSampler::new(),
        })
    }

    fn relative(&self, wavelength: f64, az: Angle, el: Angle) -> f64 {
        match self.shape {
            ApertureShape::Rectangular { width, height } => {
                let ux = std::f64::consts::PI * width * az.radian().sin() / wavelength;
                let uy = std::f64::consts::PI * height * el.radian().sin() / wavelength;
                sinc_sq(ux) * sinc_sq(uy)
            }
            ApertureShape::Circular { diameter } => {
                let sin_theta =
                    (1.0 - (az.radian().cos() * el.radian().cos()).powi(2)).max(0.0).sqrt();
                airy(std::f64::consts::PI * diameter * sin_theta / wavelength)
            }
            ApertureShape::Elliptical { width, height } => {
                let x = std::f64::consts::PI
                    * ((width * az.radian().sin()).powi(2)
                        + (height * el.radian().sin()).powi(2))
                    .sqrt()
                    / wavelength;
                airy(x)
            }
        }
    }

    fn beamwidth(dimension: f64, wavelength: f64, airy_lobe: bool) -> Angle {
        let factor = if airy_lobe {
            AIRY_HALF_POWER_X / std::f64::consts::PI
        } else {
            SINC_HALF_POWER_U / std::f64::consts::PI
        };
        let s = (factor * wavelength / dimension).min(1.0);
        (2.0 * s.asin()) * rad
    }
}

fn sinc_sq(u: f64) -> f64 {
    if u.abs() < 1e-9 {
        1.0
    } else {
        (u.sin() / u).powi(2)
    }
}

/// (2·J1(x)/x)², the Airy power pattern.
fn airy(x: f64) -> f64 {
    if x.abs() < 1e-9 {
        1.0
    } else {
        (2.0 * bessel_j1(x) / x).powi(2)
    }
}

/// J1 by the Abramowitz & Stegun 9.4.4/9.4.6 rational fits, |ε| < 1.3e-8.
fn bessel_j1(x: f64) -> f64 {
    let ax = x.abs();
    let j = if ax <= 3.0 {
        let t = (ax / 3.0).powi(2);
        ax * (0.5
            + t * (-0.562_499_85
                + t * (0.210_935_73
                    + t * (-0.039_542_89
                        + t * (0.004_433_19 + t * (-0.000_317_61 + t * 0.000_011_09))))))
    } else {
        let t = 3.0 / ax;
        let f1 = 0.797_884_56
            + t * (0.000_001_56
                + t * (0.016_596_67
                    + t * (0.000_171_05
                        + t * (-0.002_495_11 + t * (0.001_136_53 + t * -0.000_200_33)))));
        let theta1 = ax - 2.356_194_49
            + t * (0.124_996_12
                + t * (0.000_056_5
                    + t * (-0.006_378_79
                        + t * (0.000_743_48 + t * (0.000_798_24 + t * -0.000_291_66)))));
        f1 * theta1.cos() / ax.sqrt()
    };
    if x < 0.0 {
        -j
    } else {
        j
    }
}

impl AntennaPattern for Aperture {
    fn gain(
        &self,
        frequency: Freq<f64>,
        az: Angle,
        el: Angle,
        _ebs_az: Angle,
        _ebs_el: Angle,
    ) -> Ratio {
        let wavelength = frequency.wavelength();
        let g = self.peak_gain(frequency).linear() * self.relative(wavelength, az, el);
        Ratio::from_linear(g.max(self.minimum_gain.linear()))
    }

    fn peak_gain(&self, frequency: Freq<f64>) -> Ratio {
        let wavelength = frequency.wavelength();
        Ratio::from_linear(
            self.efficiency * 4.0 * std::f64::consts::PI * self.shape.area()
                / (wavelength * wavelength),
        )
    }

    fn azimuth_beamwidth(&self, frequency: Freq<f64>, _ebs_az: Angle, _ebs_el: Angle) -> Angle {
        let (w, _) = self.shape.dimensions();
        let airy_lobe = !matches!(self.shape, ApertureShape::Rectangular { .. });
        Self::beamwidth(w, frequency.wavelength(), airy_lobe)
    }

    fn elevation_beamwidth(&self, frequency: Freq<f64>, _ebs_az: Angle, _ebs_el: Angle) -> Angle {
        let (_, h) = self.shape.dimensions();
        let airy_lobe = !matches!(self.shape, ApertureShape::Rectangular { .. });
        Self::beamwidth(h, frequency.wavelength(), airy_lobe)
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
