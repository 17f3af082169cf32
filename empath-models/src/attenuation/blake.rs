use empath_core::common::{Ratio, EARTH_MEAN_RADIUS};
use empath_core::environment::Environment;
use empath_core::model::{Attenuation, SignalPath};

/// Nomograph-style atmospheric absorption.
///
/// A fast table of the total one-way absorption through the troposphere,
/// keyed by frequency and ray elevation, with the fraction accrued growing
/// linearly in slant range until the ray leaves the absorbing shell. Built
/// for radar range computations where the full line-by-line model is too
/// expensive.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake;

/// Table frequencies \[GHz\]; interpolation runs in log-frequency.
const FREQS_GHZ: [f64; 5] = [0.1, 0.3, 1.0, 3.0, 10.0];

/// Table elevations \[deg\].
const ELEVS_DEG: [f64; 8] = [0.0, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 90.0];

/// Total one-way absorption through the standard atmosphere \[dB\],
/// rows by frequency, columns by elevation.
#[rustfmt::skip]
const TOTAL_DB: [[f64; 8]; 5] = [
    [0.35, 0.28, 0.22, 0.15, 0.080, 0.040, 0.015, 0.005],
    [0.85, 0.65, 0.50, 0.33, 0.170, 0.090, 0.030, 0.012],
    [1.30, 1.00, 0.78, 0.52, 0.260, 0.140, 0.050, 0.019],
    [1.40, 1.08, 0.85, 0.57, 0.290, 0.155, 0.055, 0.021],
    [1.70, 1.33, 1.05, 0.70, 0.360, 0.190, 0.068, 0.026],
];

/// Top of the absorbing shell \[m\] MSL; almost all gaseous absorption
/// happens below this altitude.
const SHELL_TOP: f64 = 20_000.0;

/// Index of the table cell bracketing `x`, and the interpolation fraction.
fn bracket(axis: &[f64], x: f64) -> (usize, f64) {
    if x <= axis[0] {
        return (0, 0.0);
    }
    if x >= axis[axis.len() - 1] {
        return (axis.len() - 2, 1.0);
    }
    let i = axis.partition_point(|&v| v <= x) - 1;
    let t = (x - axis[i]) / (axis[i + 1] - axis[i]);
    (i, t)
}

impl Blake {
    /// Total one-way absorption \[dB\] for an infinite ray, bilinear in
    /// (log f, elevation).
    fn total_db(frequency_ghz: f64, elevation_deg: f64) -> f64 {
        let log_axis = FREQS_GHZ.map(f64::log10);
        let (fi, ft) = bracket(&log_axis, frequency_ghz.max(1e-3).log10());
        let (ei, et) = bracket(&ELEVS_DEG, elevation_deg.clamp(0.0, 90.0));
        let lo = TOTAL_DB[fi][ei] * (1.0 - et) + TOTAL_DB[fi][ei + 1] * et;
        let hi = TOTAL_DB[fi + 1][ei] * (1.0 - et) + TOTAL_DB[fi + 1][ei + 1] * et;
        lo * (1.0 - ft) + hi * ft
    }

    /// Slant distance from `alt` to the shell top along a ray at `elevation`
    /// over the effective earth.
    fn shell_exit_range(alt: f64, elevation_rad: f64, earth_radius_scale: f64) -> f64 {
        let remaining = (SHELL_TOP - alt).max(0.0);
        if remaining <= 0.0 {
            return 0.0;
        }
        let ae = EARTH_MEAN_RADIUS * earth_radius_scale + alt;
        let s = elevation_rad.max(0.0).sin();
        // Law of cosines against the effective-earth center.
        ((ae * s).powi(2) + 2.0 * ae * remaining + remaining * remaining).sqrt() - ae * s
    }
}

impl Attenuation for Blake {
    fn compute(&self, path: &SignalPath, _env: &Environment) -> Ratio {
        let total = Self::total_db(path.frequency.ghz(), path.elevation.degree());
        let exit = Self::shell_exit_range(
            path.low_altitude(),
            path.elevation.radian(),
            path.earth_radius_scale,
        );
        if exit <= 0.0 {
            // Whole path above the absorbing shell.
            return Ratio::ONE;
        }
        let db = total * (path.range / exit).min(1.0);
        Ratio::from_linear(10f64.powf(-db / 10.0))
    }
}
