use crate::common::{rad, Angle, Freq, Ratio};
use crate::error::PatternError;

use super::{AntennaPattern, GainSampler};

/// One principal-plane gain cut: linear gain sampled at ascending angles.
///
/// Lookups interpolate linearly between samples and clamp at the ends.
#[derive(Clone, Debug)]
pub struct GainCut {
    angles: Vec<f64>,
    gains: Vec<f64>,
}

impl GainCut {
    /// Creates a cut from `(angle, gain)` samples sorted by angle.
    pub fn new(points: Vec<(Angle, Ratio)>) -> Result<Self, PatternError> {
        if points.is_empty() {
            return Err(PatternError::EmptyTable("gain cut"));
        }
        if points
            .windows(2)
            .any(|w| w[1].0.radian() <= w[0].0.radian())
        {
            return Err(PatternError::NonMonotonicAxis("gain cut angle"));
        }
        Ok(Self {
            angles: points.iter().map(|(a, _)| a.radian()).collect(),
            gains: points.iter().map(|(_, g)| g.linear()).collect(),
        })
    }

    /// Linear gain at `angle`.
    #[must_use]
    pub fn sample(&self, angle: Angle) -> f64 {
        let x = angle.radian();
        match self.angles.partition_point(|&a| a < x) {
            0 => self.gains[0],
            i if i == self.angles.len() => self.gains[i - 1],
            i => {
                let t = (x - self.angles[i - 1]) / (self.angles[i] - self.angles[i - 1]);
                self.gains[i - 1] + t * (self.gains[i] - self.gains[i - 1])
            }
        }
    }

    /// Largest gain in the cut.
    #[must_use]
    pub fn peak(&self) -> f64 {
        self.gains.iter().copied().fold(f64::MIN, f64::max)
    }

    /// Half-power width around the cut's peak sample.
    fn half_power_width(&self) -> Angle {
        let peak = self.peak();
        let half = peak / 2.0;
        let center = self
            .gains
            .iter()
            .position(|&g| g == peak)
            .unwrap_or(0);
        let upper = self.crossing(center, half, true);
        let lower = self.crossing(center, half, false);
        (upper - lower) * rad
    }

    /// Angle where the interpolated cut crosses `half`, searching up or down
    /// from `center`. Falls back to the cut edge when it never crosses.
    fn crossing(&self, center: usize, half: f64, upward: bool) -> f64 {
        let indices: Vec<usize> = if upward {
            (center..self.angles.len()).collect()
        } else {
            (0..=center).rev().collect()
        };
        for w in indices.windows(2) {
            let (i, j) = (w[0], w[1]);
            if self.gains[j] <= half {
                let t = (self.gains[i] - half) / (self.gains[i] - self.gains[j]);
                return self.angles[i] + t * (self.angles[j] - self.angles[i]);
            }
        }
        self.angles[*indices.last().unwrap_or(&center)]
    }
}

/// Az/el cut pair valid from a lower band edge up.
#[derive(Clone, Debug)]
struct BandEntry {
    lower_edge: f64,
    azimuth: GainCut,
    elevation: GainCut,
}

/// Gain pattern built from measured or imported principal-plane cuts.
///
/// The two cuts combine by the cut-product approximation
/// `g(az, el) = g_az(az) · g_el(el) / g_peak`. Multiple cut pairs may be
/// supplied, each valid from its lower band edge; the lookup picks the
/// highest band whose edge is at or below the operating frequency.
#[derive(Debug)]
pub struct Tabular {
    bands: Vec<BandEntry>,
    minimum_gain: Ratio,
    sampler: GainSampler,
}

impl Tabular {
    /// Creates a single-band tabular pattern.
    pub fn new(azimuth: GainCut, elevation: GainCut) -> Result<Self, PatternError> {
        Self::with_bands(vec![(Freq::ZERO, azimuth, elevation)])
    }

    /// Creates a pattern from `(lower band edge, az cut, el cut)` entries.
    pub fn with_bands(
        bands: Vec<(Freq<f64>, GainCut, GainCut)>,
    ) -> Result<Self, PatternError> {
        if bands.is_empty() {
            return Err(PatternError::EmptyTable("tabular pattern bands"));
        }
        let mut bands: Vec<BandEntry> = bands
            .into_iter()
            .map(|(f, azimuth, elevation)| BandEntry {
                lower_edge: f.hz(),
                azimuth,
                elevation,
            })
            .collect();
        bands.sort_by(|a, b| a.lower_edge.total_cmp(&b.lower_edge));
        Ok(Self {
            bands,
            minimum_gain: Ratio::from_linear(1e-10),
            sampler: GainSampler::new(),
        })
    }

    fn band(&self, frequency: Freq<f64>) -> &BandEntry {
        let i = self
            .bands
            .partition_point(|b| b.lower_edge <= frequency.hz());
        &self.bands[i.saturating_sub(1)]
    }
}

impl AntennaPattern for Tabular {
    fn gain(
        &self,
        frequency: Freq<f64>,
        az: Angle,
        el: Angle,
        _ebs_az: Angle,
        _ebs_el: Angle,
    ) -> Ratio {
        let band = self.band(frequency);
        let peak = band.azimuth.peak().max(band.elevation.peak());
        let g = band.azimuth.sample(az) * band.elevation.sample(el) / peak;
        Ratio::from_linear(g.max(self.minimum_gain.linear()))
    }

    fn peak_gain(&self, frequency: Freq<f64>) -> Ratio {
        let band = self.band(frequency);
        Ratio::from_linear(band.azimuth.peak().max(band.elevation.peak()))
    }

    fn azimuth_beamwidth(&self, frequency: Freq<f64>, _ebs_az: Angle, _ebs_el: Angle) -> Angle {
        self.band(frequency).azimuth.half_power_width()
    }

    fn elevation_beamwidth(&self, frequency: Freq<f64>, _ebs_az: Angle, _ebs_el: Angle) -> Angle {
        self.band(frequency).elevation.half_power_width()
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
