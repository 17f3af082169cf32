use empath_core::common::EARTH_MEAN_RADIUS;
use empath_core::environment::Environment;
use empath_core::model::{Propagation, SignalPath};
use num_complex::Complex64;

use crate::ModelError;

/// Polarization sense at the surface reflection.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SurfacePolarization {
    /// Horizontal linear.
    #[default]
    Horizontal,
    /// Vertical linear.
    Vertical,
}

/// Fast spherical-earth multipath.
///
/// Solves the specular-point cubic over the effective earth, reflects with
/// the polarization-dependent Fresnel coefficient for the surface dielectric,
/// and combines direct and surface rays into the pattern-propagation factor
/// F⁴. Surface constants default to the environment land cover; sea states
/// map to an RMS surface-height roughness.
#[derive(Clone, Copy, Debug, Default)]
pub struct TwoRay {
    polarization: SurfacePolarization,
    /// `(ε_r, σ [S/m])` override; `None` reads the land cover.
    surface: Option<(f64, f64)>,
    /// Soil moisture fraction blending dry soil toward saturated.
    soil_moisture: Option<f64>,
    /// RMS surface-height roughness \[m\] override.
    roughness: Option<f64>,
}

/// RMS wave height \[m\] by Douglas sea state 0 through 6.
const SEA_STATE_ROUGHNESS: [f64; 7] = [0.0, 0.03, 0.1, 0.25, 0.6, 1.0, 1.5];

/// Dry and saturated soil endpoints for the moisture blend.
const DRY_SOIL: (f64, f64) = (3.0, 1e-4);
const WET_SOIL: (f64, f64) = (30.0, 2e-2);

impl TwoRay {
    /// Horizontal polarization over the environment surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the polarization sense at the reflection.
    #[must_use]
    pub fn with_polarization(mut self, polarization: SurfacePolarization) -> Self {
        self.polarization = polarization;
        self
    }

    /// Overrides the surface dielectric constants.
    pub fn with_surface(mut self, permittivity: f64, conductivity: f64) -> Result<Self, ModelError> {
        if !(permittivity >= 1.0) {
            return Err(ModelError::OutOfRange {
                name: "surface permittivity",
                value: permittivity,
            });
        }
        if !(conductivity >= 0.0) {
            return Err(ModelError::OutOfRange {
                name: "surface conductivity [S/m]",
                value: conductivity,
            });
        }
        self.surface = Some((permittivity, conductivity));
        Ok(self)
    }

    /// Blends the surface between dry and saturated soil.
    pub fn with_soil_moisture(mut self, fraction: f64) -> Result<Self, ModelError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ModelError::OutOfRange {
                name: "soil moisture fraction",
                value: fraction,
            });
        }
        self.soil_moisture = Some(fraction);
        Ok(self)
    }

    /// Overrides the RMS surface-height roughness \[m\].
    pub fn with_roughness(mut self, sigma_h: f64) -> Result<Self, ModelError> {
        if !(sigma_h >= 0.0) {
            return Err(ModelError::OutOfRange {
                name: "surface roughness [m]",
                value: sigma_h,
            });
        }
        self.roughness = Some(sigma_h);
        Ok(self)
    }

    fn surface_constants(&self, env: &Environment) -> (f64, f64) {
        if let Some(surface) = self.surface {
            return surface;
        }
        if let Some(m) = self.soil_moisture {
            let eps = DRY_SOIL.0 + m * (WET_SOIL.0 - DRY_SOIL.0);
            // Conductivity blends on a log scale.
            let sigma = (DRY_SOIL.1.ln() + m * (WET_SOIL.1.ln() - DRY_SOIL.1.ln())).exp();
            return (eps, sigma);
        }
        env.land_cover.rf_ground()
    }

    fn roughness_sigma(&self, env: &Environment) -> f64 {
        self.roughness.unwrap_or_else(|| {
            if env.land_cover == empath_core::environment::LandCover::Water {
                SEA_STATE_ROUGHNESS[usize::from(env.sea_state).min(SEA_STATE_ROUGHNESS.len() - 1)]
            } else {
                0.0
            }
        })
    }
}

/// Ground range from the lower terminal to the specular point over an
/// effective earth of radius `ae`, via the classic cubic.
fn specular_ground_range(h1: f64, h2: f64, total: f64, ae: f64) -> f64 {
    let p = 2.0 / 3f64.sqrt() * (ae * (h1 + h2) + (total / 2.0).powi(2)).sqrt();
    let xi = (2.0 * ae * total * (h2 - h1) / p.powi(3)).clamp(-1.0, 1.0).asin();
    (total / 2.0 - p * (xi / 3.0).sin()).clamp(0.0, total)
}

/// Fresnel reflection coefficient at grazing angle `psi` for a complex
/// dielectric `eps_c`.
fn fresnel(psi: f64, eps_c: Complex64, polarization: SurfacePolarization) -> Complex64 {
    let sin_psi = psi.sin();
    let root = (eps_c - psi.cos().powi(2)).sqrt();
    match polarization {
        SurfacePolarization::Horizontal => (sin_psi - root) / (sin_psi + root),
        SurfacePolarization::Vertical => {
            (eps_c * sin_psi - root) / (eps_c * sin_psi + root)
        }
    }
}

impl Propagation for TwoRay {
    fn propagation_factor(&self, path: &SignalPath, env: &Environment) -> f64 {
        let lambda = path.frequency.wavelength();
        if !lambda.is_finite() || lambda <= 0.0 || path.range <= 0.0 {
            return 1.0;
        }
        let ae = EARTH_MEAN_RADIUS * path.earth_radius_scale;
        let h1 = path.low_altitude().max(0.1);
        let h2 = path.high_altitude().max(0.1);
        let total = path.ground_range.max(1.0);

        let g1 = specular_ground_range(h1, h2, total, ae);
        let g2 = total - g1;
        // Effective heights over the tangent plane at the specular point.
        let h1e = (h1 - g1 * g1 / (2.0 * ae)).max(1e-3);
        let h2e = (h2 - g2 * g2 / (2.0 * ae)).max(1e-3);
        let psi = (h1e / g1.max(1.0)).atan();

        let (eps_r, sigma) = self.surface_constants(env);
        let eps_c = Complex64::new(eps_r, -60.0 * lambda * sigma);
        let gamma = fresnel(psi, eps_c, self.polarization);

        // Specular scattering loss for a rough surface.
        let sigma_h = self.roughness_sigma(env);
        let rho_s = (-2.0 * (2.0 * std::f64::consts::PI * sigma_h * psi.sin() / lambda).powi(2))
            .exp();

        // Spherical-earth divergence of the reflected ray.
        let divergence =
            1.0 / (1.0 + 2.0 * g1 * g2 / (ae * total * psi.sin().max(1e-9))).sqrt();

        let delta_phase = 4.0 * std::f64::consts::PI * h1e * h2e / (lambda * path.range);
        let reflected = gamma * divergence * rho_s * Complex64::from_polar(1.0, -delta_phase);
        let f2 = (Complex64::new(1.0, 0.0) + reflected).norm_sqr();
        f2 * f2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attenuation::tests::level_path;

    const H: f64 = 10.0;
    const LAMBDA: f64 = 0.299_792_458;

    #[test]
    fn first_null_cancels_the_field() {
        // Destructive when the path difference is a full wavelength.
        let null_range = 2.0 * H * H / LAMBDA;
        let path = level_path(null_range, H, 1.0);
        let f4 = TwoRay::new().propagation_factor(&path, &Environment::default());
        assert!(f4 < 0.02, "f4 = {f4}");
    }

    #[test]
    fn first_lobe_approaches_the_coherent_peak() {
        let peak_range = 4.0 * H * H / LAMBDA;
        let path = level_path(peak_range, H, 1.0);
        let f4 = TwoRay::new().propagation_factor(&path, &Environment::default());
        assert!(f4 > 10.0, "f4 = {f4}");
    }

    #[test]
    fn vertical_reflects_less_at_low_grazing() {
        // At the horizontal-polarization null the weaker vertical
        // reflection leaves more residual field.
        let path = level_path(2.0 * H * H / LAMBDA, H, 1.0);
        let env = Environment::default();
        let h = TwoRay::new().propagation_factor(&path, &env);
        let v = TwoRay::new()
            .with_polarization(SurfacePolarization::Vertical)
            .propagation_factor(&path, &env);
        assert!(v > h);
    }

    #[test]
    fn rough_seas_wash_out_the_lobing() {
        let peak_range = 4.0 * H * H / LAMBDA;
        let path = level_path(peak_range, H, 1.0);
        let mut env = Environment::default();
        env.land_cover = empath_core::environment::LandCover::Water;
        env.sea_state = 0;
        let calm = TwoRay::new().propagation_factor(&path, &env);
        env.sea_state = 6;
        let rough = TwoRay::new().propagation_factor(&path, &env);
        assert!(rough < calm);
        assert!(rough > 0.0);
    }

    #[test]
    fn parameters_are_validated() {
        assert!(TwoRay::new().with_soil_moisture(1.5).is_err());
        assert!(TwoRay::new().with_surface(0.5, 1e-3).is_err());
        assert!(TwoRay::new().with_roughness(-0.1).is_err());
    }
}
