use empath_core::common::{Ratio, EARTH_MEAN_RADIUS};
use empath_core::environment::Environment;
use empath_core::model::{Attenuation, SignalPath};

use crate::ModelError;

/// Polarization sense the rain term assumes. Rain attenuation differs for
/// the two linear senses; circular takes the mixed coefficients.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RainPolarization {
    /// Horizontal linear.
    Horizontal,
    /// Vertical linear.
    Vertical,
    /// Circular, mixed coefficients.
    #[default]
    Circular,
}

/// ITU-R atmospheric attenuation.
///
/// Gaseous absorption follows the Rec. P.676 Annex 2 approximation (dry air
/// plus water vapor), rain follows Rec. P.838 regression coefficients, and
/// cloud liquid water follows the Rec. P.840 double-Debye model. The total
/// is integrated along the refracted ray through an exponentially scaled
/// atmosphere.
///
/// The dry-air term is valid below the 54 GHz oxygen complex; higher
/// frequencies clamp to the 54 GHz value.
#[derive(Clone, Copy, Debug)]
pub struct Itu {
    rain_polarization: RainPolarization,
    /// Integration step along the ray \[m\].
    step: f64,
}

impl Default for Itu {
    fn default() -> Self {
        Self {
            rain_polarization: RainPolarization::Circular,
            step: 250.0,
        }
    }
}

impl Itu {
    /// Default model with circular rain polarization.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the rain polarization sense.
    #[must_use]
    pub fn with_rain_polarization(mut self, polarization: RainPolarization) -> Self {
        self.rain_polarization = polarization;
        self
    }

    /// Overrides the path integration step, rejecting steps under a metre.
    pub fn with_step(mut self, step: f64) -> Result<Self, ModelError> {
        if !step.is_finite() || step < 1.0 {
            return Err(ModelError::OutOfRange {
                name: "integration step [m]",
                value: step,
            });
        }
        self.step = step;
        Ok(self)
    }
}

/// Pressure scale height \[m\].
const PRESSURE_SCALE_HEIGHT: f64 = 7_350.0;
/// Water-vapor scale height \[m\].
const VAPOR_SCALE_HEIGHT: f64 = 2_000.0;
/// Tropospheric lapse rate \[K/m\] down to the tropopause floor.
const LAPSE_RATE: f64 = 6.5e-3;
const TROPOPAUSE_TEMPERATURE: f64 = 216.65;

/// P.676 pressure/temperature shape function.
fn phi(rp: f64, rt: f64, a: f64, b: f64, c: f64, d: f64) -> f64 {
    rp.powf(a) * rt.powf(b) * (c * (1.0 - rp) + d * (1.0 - rt)).exp()
}

/// Dry-air specific attenuation \[dB/km\], Rec. P.676 Annex 2, f ≤ 54 GHz.
fn gamma_oxygen(f_ghz: f64, rp: f64, rt: f64) -> f64 {
    let f = f_ghz.min(54.0);
    let xi1 = phi(rp, rt, 0.0717, -1.8132, 0.0156, -1.6515);
    let xi2 = phi(rp, rt, 0.5146, -4.6368, -0.1921, -5.7416);
    let xi3 = phi(rp, rt, 0.3414, -6.5851, 0.2130, -8.5854);
    (7.2 * rt.powf(2.8) / (f * f + 0.34 * rp * rp * rt.powf(1.6))
        + 0.62 * xi3 / ((54.0 - f).powf(1.16 * xi1) + 0.83 * xi2))
        * f
        * f
        * rp
        * rp
        * 1e-3
}

/// Water-vapor specific attenuation \[dB/km\], Rec. P.676 Annex 2.
fn gamma_water_vapor(f_ghz: f64, rp: f64, rt: f64, rho: f64) -> f64 {
    let f = f_ghz;
    let eta1 = 0.955 * rp * rt.powf(0.68) + 0.006 * rho;
    let eta2 = 0.735 * rp * rt.powf(0.5) + 0.0353 * rt.powi(4) * rho;
    let g = |fi: f64| {
        let q = (f - fi) / (f + fi);
        1.0 + q * q
    };
    let line = |strength: f64, exponent: f64, fi: f64, width: f64, eta: f64| {
        strength * eta * (exponent * (1.0 - rt)).exp() / ((f - fi).powi(2) + width * eta * eta)
    };
    let sum = line(3.98, 2.23, 22.235, 9.42, eta1) * g(22.0)
        + line(11.96, 0.7, 183.31, 11.14, eta1)
        + line(0.081, 6.44, 321.226, 6.29, eta1)
        + line(3.66, 1.6, 325.153, 9.22, eta1)
        + 25.37 * eta1 * (1.09 * (1.0 - rt)).exp() / (f - 380.0).powi(2)
        + 17.4 * eta1 * (1.46 * (1.0 - rt)).exp() / (f - 448.0).powi(2)
        + 844.6 * eta1 * (0.17 * (1.0 - rt)).exp() / (f - 557.0).powi(2) * g(557.0)
        + 290.0 * eta1 * (0.41 * (1.0 - rt)).exp() / (f - 752.0).powi(2) * g(752.0)
        + 8.3328e4 * eta2 * (0.99 * (1.0 - rt)).exp() / (f - 1780.0).powi(2) * g(1780.0);
    sum * f * f * rt.powf(2.5) * rho * 1e-4
}

/// Gaseous specific attenuation \[dB/km\] at one point on the path.
pub(crate) fn gamma_gas(f_ghz: f64, pressure_hpa: f64, temperature_k: f64, vapor: f64) -> f64 {
    let rp = pressure_hpa / 1013.0;
    let rt = 288.0 / temperature_k;
    gamma_oxygen(f_ghz, rp, rt) + gamma_water_vapor(f_ghz, rp, rt, vapor)
}

/// Rec. P.838 regression anchors: `(f [GHz], kH, αH, kV, αV)`.
#[rustfmt::skip]
const RAIN_ANCHORS: [(f64, f64, f64, f64, f64); 16] = [
    (1.0,   2.59e-5,  0.9691, 3.08e-5,  0.8592),
    (2.0,   8.47e-5,  1.0664, 9.98e-5,  0.9490),
    (4.0,   1.071e-4, 1.6009, 2.461e-4, 1.2476),
    (6.0,   7.056e-4, 1.5900, 4.878e-4, 1.5728),
    (8.0,   4.115e-3, 1.3905, 3.450e-3, 1.3797),
    (10.0,  1.217e-2, 1.2571, 1.129e-2, 1.2156),
    (12.0,  2.386e-2, 1.1825, 2.455e-2, 1.1216),
    (15.0,  4.481e-2, 1.1233, 5.008e-2, 1.0440),
    (20.0,  9.164e-2, 1.0568, 9.611e-2, 0.9847),
    (25.0,  0.1571,   0.9991, 0.1533,   0.9491),
    (30.0,  0.2403,   0.9485, 0.2291,   0.9129),
    (40.0,  0.4431,   0.8673, 0.4274,   0.8421),
    (50.0,  0.6872,   0.8084, 0.6724,   0.7826),
    (60.0,  0.8606,   0.7656, 0.8515,   0.7486),
    (80.0,  1.2387,   0.6948, 1.2216,   0.6834),
    (100.0, 1.6378,   0.6382, 1.5819,   0.6296),
];

/// Interpolated `(k, α)` for one linear polarization sense. `k` interpolates
/// log-log, `α` linearly against log frequency.
fn rain_coefficients(f_ghz: f64, vertical: bool) -> (f64, f64) {
    let pick = |a: &(f64, f64, f64, f64, f64)| if vertical { (a.3, a.4) } else { (a.1, a.2) };
    let f = f_ghz.clamp(RAIN_ANCHORS[0].0, RAIN_ANCHORS[RAIN_ANCHORS.len() - 1].0);
    let i = RAIN_ANCHORS
        .partition_point(|a| a.0 <= f)
        .clamp(1, RAIN_ANCHORS.len() - 1)
        - 1;
    let (f0, (k0, a0)) = (RAIN_ANCHORS[i].0, pick(&RAIN_ANCHORS[i]));
    let (f1, (k1, a1)) = (RAIN_ANCHORS[i + 1].0, pick(&RAIN_ANCHORS[i + 1]));
    let t = (f.ln() - f0.ln()) / (f1.ln() - f0.ln());
    let k = (k0.ln() * (1.0 - t) + k1.ln() * t).exp();
    let alpha = a0 * (1.0 - t) + a1 * t;
    (k, alpha)
}

/// Rain specific attenuation `k·R^α` \[dB/km\], Rec. P.838.
fn gamma_rain(f_ghz: f64, rain_rate: f64, polarization: RainPolarization) -> f64 {
    if rain_rate <= 0.0 {
        return 0.0;
    }
    match polarization {
        RainPolarization::Horizontal => {
            let (k, a) = rain_coefficients(f_ghz, false);
            k * rain_rate.powf(a)
        }
        RainPolarization::Vertical => {
            let (k, a) = rain_coefficients(f_ghz, true);
            k * rain_rate.powf(a)
        }
        RainPolarization::Circular => {
            let (kh, ah) = rain_coefficients(f_ghz, false);
            let (kv, av) = rain_coefficients(f_ghz, true);
            let k = (kh + kv) / 2.0;
            let a = (kh * ah + kv * av) / (kh + kv);
            k * rain_rate.powf(a)
        }
    }
}

/// Cloud liquid-water specific attenuation \[dB/km\], Rec. P.840
/// double-Debye dielectric model.
fn gamma_cloud(f_ghz: f64, temperature_k: f64, water_density: f64) -> f64 {
    if water_density <= 0.0 {
        return 0.0;
    }
    let theta = 300.0 / temperature_k;
    let eps0 = 77.66 + 103.3 * (theta - 1.0);
    let eps1 = 0.0671 * eps0;
    let eps2 = 3.52;
    let fp = 20.20 - 146.0 * (theta - 1.0) + 316.0 * (theta - 1.0).powi(2);
    let fs = 39.8 * fp;
    let eps_im = f_ghz * (eps0 - eps1) / (fp * (1.0 + (f_ghz / fp).powi(2)))
        + f_ghz * (eps1 - eps2) / (fs * (1.0 + (f_ghz / fs).powi(2)));
    let eps_re = (eps0 - eps1) / (1.0 + (f_ghz / fp).powi(2))
        + (eps1 - eps2) / (1.0 + (f_ghz / fs).powi(2))
        + eps2;
    let eta = (2.0 + eps_re) / eps_im;
    let kl = 0.819 * f_ghz / (eps_im * (1.0 + eta * eta));
    kl * water_density
}

impl Attenuation for Itu {
    fn compute(&self, path: &SignalPath, env: &Environment) -> Ratio {
        let f_ghz = path.frequency.ghz();
        if f_ghz <= 0.0 || path.range <= 0.0 {
            return Ratio::ONE;
        }
        let ae = EARTH_MEAN_RADIUS * path.earth_radius_scale;
        let sin_el = path.elevation.radian().sin();
        let h0 = path.low_altitude();
        let steps = ((path.range / self.step).ceil() as usize).clamp(10, 4_000);
        let ds = path.range / steps as f64;

        let mut total_db = 0.0;
        for i in 0..steps {
            let s = (i as f64 + 0.5) * ds;
            // Ray height over the effective earth.
            let h = h0 + s * sin_el + s * s / (2.0 * ae);
            let pressure = env.pressure * (-h / PRESSURE_SCALE_HEIGHT).exp();
            let vapor = env.water_vapor_density * (-h / VAPOR_SCALE_HEIGHT).exp();
            let temperature = (env.temperature - LAPSE_RATE * h).max(TROPOPAUSE_TEMPERATURE);
            let mut gamma = gamma_gas(f_ghz, pressure, temperature, vapor);
            if h <= env.rain_upper_altitude {
                gamma += gamma_rain(f_ghz, env.rain_rate, self.rain_polarization);
            }
            if (env.cloud_altitudes.0..=env.cloud_altitudes.1).contains(&h) {
                gamma += gamma_cloud(f_ghz, temperature, env.cloud_water_density);
            }
            total_db += gamma * ds / 1_000.0;
        }
        Ratio::from_linear(10f64.powf(-total_db / 10.0).clamp(0.0, 1.0))
    }
}
