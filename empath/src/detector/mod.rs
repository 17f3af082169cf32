//! Detection probability from SNR.
//!
//! Two detectors cover the sensor policies: the analytic Marcum-Swerling
//! family for a square-law detector integrating N pulses non-coherently,
//! and a user-supplied Pd-vs-SNR curve. Both expose the same surface so a
//! beam can invert either one into its detection threshold.

mod special;

use empath_core::common::{dB, Ratio};
use itertools::Itertools;

use crate::error::DetectorError;
use special::{gamma_p, gamma_q, ln_gamma, marcum_q};

/// Target amplitude fluctuation model.
///
/// Case 0 is the steady (non-fluctuating) target; odd cases fluctuate once
/// per scan, even cases pulse to pulse; 1 and 2 are Rayleigh
/// (chi-squared, 2 degrees), 3 and 4 one-dominant-plus-Rayleigh
/// (chi-squared, 4 degrees).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SwerlingCase {
    /// Steady target.
    #[default]
    Zero,
    /// Rayleigh, scan to scan.
    One,
    /// Rayleigh, pulse to pulse.
    Two,
    /// Chi-squared 4 DOF, scan to scan.
    Three,
    /// Chi-squared 4 DOF, pulse to pulse.
    Four,
}

/// Analytic detector: N-pulse non-coherent integration with a Swerling
/// fluctuation case.
///
/// The normalized square-law threshold is solved from the requested
/// false-alarm probability at construction; [`probability_of_detection`]
/// then evaluates the matching exact Pd expression for the case.
///
/// [`probability_of_detection`]: Self::probability_of_detection
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarcumSwerling {
    case: SwerlingCase,
    pulses: u32,
    false_alarm_probability: f64,
    /// Normalized square-law sum threshold.
    threshold: f64,
}

impl MarcumSwerling {
    /// Builds the detector and solves its threshold from `pfa`.
    pub fn new(case: SwerlingCase, pulses: u32, pfa: f64) -> Result<Self, DetectorError> {
        if pulses == 0 {
            return Err(DetectorError::InvalidPulseCount(pulses));
        }
        if !(pfa > 0.0 && pfa < 1.0) {
            return Err(DetectorError::InvalidProbability {
                name: "false-alarm probability",
                value: pfa,
            });
        }
        Ok(Self {
            case,
            pulses,
            false_alarm_probability: pfa,
            threshold: threshold_for(pulses, pfa),
        })
    }

    /// The fluctuation case.
    #[must_use]
    pub const fn case(&self) -> SwerlingCase {
        self.case
    }

    /// Pulses integrated non-coherently.
    #[must_use]
    pub const fn pulses(&self) -> u32 {
        self.pulses
    }

    /// The requested false-alarm probability.
    #[must_use]
    pub const fn false_alarm_probability(&self) -> f64 {
        self.false_alarm_probability
    }

    /// The normalized square-law sum threshold solved from Pfa.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Detection probability at a per-pulse SNR.
    #[must_use]
    pub fn probability_of_detection(&self, snr: Ratio) -> f64 {
        let x = snr.linear();
        if x <= 0.0 {
            return self.false_alarm_probability;
        }
        let n = f64::from(self.pulses);
        let vt = self.threshold;
        let pd = match self.case {
            SwerlingCase::Zero => {
                marcum_q(self.pulses, (2.0 * n * x).sqrt(), (2.0 * vt).sqrt())
            }
            SwerlingCase::One => {
                if self.pulses == 1 {
                    (-vt / (1.0 + x)).exp()
                } else {
                    let stretch = 1.0 + 1.0 / (n * x);
                    1.0 - gamma_p(n - 1.0, vt)
                        + stretch.powf(n - 1.0)
                            * gamma_p(n - 1.0, vt / stretch)
                            * (-vt / (1.0 + n * x)).exp()
                }
            }
            SwerlingCase::Two => gamma_q(n, vt / (1.0 + x)),
            SwerlingCase::Three => self.scan_fluctuating_chi4(x),
            SwerlingCase::Four => self.pulse_fluctuating_chi4(x),
        };
        pd.clamp(0.0, 1.0)
    }

    /// Swerling 3: the steady-target Pd averaged over the chi-squared
    /// 4-DOF scan fluctuation, by Simpson quadrature in normalized power.
    fn scan_fluctuating_chi4(&self, x: f64) -> f64 {
        const INTERVALS: usize = 300;
        const UPPER: f64 = 15.0;
        let n = f64::from(self.pulses);
        let b = (2.0 * self.threshold).sqrt();
        let h = UPPER / INTERVALS as f64;
        let f = |t: f64| {
            let density = 4.0 * t * (-2.0 * t).exp();
            density * marcum_q(self.pulses, (2.0 * n * x * t).sqrt(), b)
        };
        let mut sum = f(0.0) + f(UPPER);
        for i in 1..INTERVALS {
            let w = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += w * f(i as f64 * h);
        }
        sum * h / 3.0
    }

    /// Swerling 4: exact binomial mixture over the per-pulse chi-squared
    /// 4-DOF fluctuation.
    fn pulse_fluctuating_chi4(&self, x: f64) -> f64 {
        let n = f64::from(self.pulses);
        let beta = 1.0 + x / 2.0;
        let ln_half_x = (x / 2.0).ln();
        let ln_beta = beta.ln();
        let mut pd = 0.0;
        for k in 0..=self.pulses {
            let kf = f64::from(k);
            let ln_choose = ln_gamma(n + 1.0) - ln_gamma(kf + 1.0) - ln_gamma(n - kf + 1.0);
            let weight = (ln_choose + kf * ln_half_x - n * ln_beta).exp();
            pd += weight * gamma_q(n + kf, self.threshold / beta);
        }
        pd
    }
}

/// Solves `Q(n, vt) = pfa` for the square-law sum threshold by bisection.
fn threshold_for(pulses: u32, pfa: f64) -> f64 {
    let n = f64::from(pulses);
    let mut hi = n + 10.0 * n.sqrt() + 10.0;
    while gamma_q(n, hi) > pfa {
        hi *= 2.0;
    }
    let mut lo = 0.0;
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if gamma_q(n, mid) > pfa {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-12 * hi.max(1.0) {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// User-supplied Pd-vs-SNR curve.
///
/// Points are `(SNR [dB], Pd)` with strictly increasing SNR and
/// non-decreasing Pd; lookups interpolate linearly in the dB domain and
/// clamp at the ends.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PdCurve {
    points: Vec<(f64, f64)>,
}

impl PdCurve {
    /// Validates and stores the curve.
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, DetectorError> {
        if points.len() < 2 {
            return Err(DetectorError::CurveTooShort(points.len()));
        }
        for (i, (&(s0, p0), &(s1, p1))) in points.iter().tuple_windows().enumerate() {
            if s1 <= s0 || p1 < p0 {
                return Err(DetectorError::CurveNotMonotonic(i + 1));
            }
        }
        for &(_, p) in &points {
            if !(0.0..=1.0).contains(&p) {
                return Err(DetectorError::InvalidProbability {
                    name: "curve Pd",
                    value: p,
                });
            }
        }
        Ok(Self { points })
    }

    /// Detection probability at an SNR, clamped to the curve ends.
    #[must_use]
    pub fn probability_of_detection(&self, snr: Ratio) -> f64 {
        let s = snr.db();
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if s <= first.0 {
            return first.1;
        }
        if s >= last.0 {
            return last.1;
        }
        let hi = self.points.partition_point(|&(x, _)| x < s);
        let (s0, p0) = self.points[hi - 1];
        let (s1, p1) = self.points[hi];
        p0 + (p1 - p0) * (s - s0) / (s1 - s0)
    }

    /// The SNR at which the curve first reaches `pd`.
    pub fn invert(&self, pd: f64) -> Result<Ratio, DetectorError> {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if pd < first.1 || pd > last.1 {
            return Err(DetectorError::UnreachablePd(pd));
        }
        for (&(s0, p0), &(s1, p1)) in self.points.iter().tuple_windows() {
            if pd <= p1 {
                if p1 == p0 {
                    return Ok(s0 * dB);
                }
                return Ok((s0 + (s1 - s0) * (pd - p0) / (p1 - p0)) * dB);
            }
        }
        Ok(last.0 * dB)
    }
}

/// Either detection policy behind one surface.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Detector {
    /// Analytic Marcum-Swerling detector.
    MarcumSwerling(MarcumSwerling),
    /// Interpolated Pd-vs-SNR curve.
    Curve(PdCurve),
}

impl Detector {
    /// Detection probability at a per-pulse SNR.
    #[must_use]
    pub fn probability_of_detection(&self, snr: Ratio) -> f64 {
        match self {
            Self::MarcumSwerling(d) => d.probability_of_detection(snr),
            Self::Curve(c) => c.probability_of_detection(snr),
        }
    }

    /// Pulses integrated; a curve already bakes integration in.
    #[must_use]
    pub fn pulses(&self) -> u32 {
        match self {
            Self::MarcumSwerling(d) => d.pulses(),
            Self::Curve(_) => 1,
        }
    }

    /// The SNR whose detection probability is `pd`.
    ///
    /// Curves invert directly; the analytic detector is solved by bisection
    /// over a -20 to +50 dB bracket.
    pub fn snr_for(&self, pd: f64) -> Result<Ratio, DetectorError> {
        if !(pd > 0.0 && pd < 1.0) {
            return Err(DetectorError::InvalidProbability {
                name: "required Pd",
                value: pd,
            });
        }
        match self {
            Self::Curve(c) => c.invert(pd),
            Self::MarcumSwerling(d) => {
                let mut lo = -20.0;
                let mut hi = 50.0;
                if d.probability_of_detection(lo * dB) > pd
                    || d.probability_of_detection(hi * dB) < pd
                {
                    return Err(DetectorError::UnreachablePd(pd));
                }
                for _ in 0..100 {
                    let mid = 0.5 * (lo + hi);
                    if d.probability_of_detection(mid * dB) < pd {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }
                Ok(0.5 * (lo + hi) * dB)
            }
        }
    }
}

impl From<MarcumSwerling> for Detector {
    fn from(d: MarcumSwerling) -> Self {
        Self::MarcumSwerling(d)
    }
}

impl From<PdCurve> for Detector {
    fn from(c: PdCurve) -> Self {
        Self::Curve(c)
    }
}
