use empath_core::common::EARTH_MEAN_RADIUS;
use empath_core::environment::Environment;
use empath_core::model::{Propagation, SignalPath};

use crate::ModelError;

/// Norton surface-wave propagation over a smooth conducting earth.
///
/// Vertical polarization; the flat-earth surface-wave attenuation function
/// carries the path out to the curved-earth limit, beyond which the leading
/// residue-series term takes over as an exponential rolloff. Surface
/// constants default to the environment land cover; the surface refractivity
/// sets the effective earth curvature of the rolloff.
#[derive(Clone, Copy, Debug)]
pub struct GroundWave {
    /// `(ε_r, σ [S/m])` override; `None` reads the land cover.
    surface: Option<(f64, f64)>,
    /// Surface refractivity \[N-units\].
    refractivity: f64,
}

impl Default for GroundWave {
    fn default() -> Self {
        Self {
            surface: None,
            refractivity: 301.0,
        }
    }
}

impl GroundWave {
    /// Default model over the environment surface at standard refractivity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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

    /// Sets the surface refractivity \[N-units\].
    pub fn with_refractivity(mut self, ns: f64) -> Result<Self, ModelError> {
        if !(200.0..=450.0).contains(&ns) {
            return Err(ModelError::OutOfRange {
                name: "surface refractivity [N]",
                value: ns,
            });
        }
        self.refractivity = ns;
        Ok(self)
    }

    /// Effective-earth scale factor implied by the surface refractivity.
    fn earth_radius_scale(&self) -> f64 {
        1.0 / (1.0 - 0.046_65 * (0.005_577 * self.refractivity).exp())
    }
}

/// Norton's surface-wave attenuation function `A(p, b)`.
fn norton_attenuation(p: f64, b: f64) -> f64 {
    let a = (2.0 + 0.3 * p) / (2.0 + p + 0.6 * p * p)
        - (p / 2.0).sqrt() * (-0.625 * p).exp() * b.sin();
    a.max(0.0)
}

impl Propagation for GroundWave {
    fn propagation_factor(&self, path: &SignalPath, env: &Environment) -> f64 {
        let lambda = path.frequency.wavelength();
        if !lambda.is_finite() || lambda <= 0.0 || path.range <= 0.0 {
            return 1.0;
        }
        let (eps_r, sigma) = self.surface.unwrap_or_else(|| env.land_cover.rf_ground());
        let x = 60.0 * lambda * sigma;
        // Numerical distance and phase constant for vertical polarization.
        let b = ((eps_r + 1.0) / x).atan();
        let p = std::f64::consts::PI * path.range * b.cos()
            / (lambda * (eps_r * eps_r + x * x).sqrt());
        let mut amplitude = norton_attenuation(p, b);

        // Flat-earth validity limit; the first residue term decays the field
        // exponentially beyond it.
        let f_mhz = path.frequency.hz() / 1e6;
        let flat_limit = 80e3 / f_mhz.cbrt();
        if path.range > flat_limit {
            let ae = EARTH_MEAN_RADIUS * self.earth_radius_scale();
            let residue_scale = (lambda * ae * ae).cbrt();
            amplitude *= (-(path.range - flat_limit) / residue_scale).exp();
        }
        amplitude.powi(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attenuation::tests::level_path;

    // 1 MHz in the level-path helper's GHz argument.
    const MF: f64 = 1e-3;

    #[test]
    fn field_falls_with_numerical_distance() {
        let env = Environment::default();
        let model = GroundWave::new();
        let near = model.propagation_factor(&level_path(10_000.0, 0.0, MF), &env);
        let far = model.propagation_factor(&level_path(30_000.0, 0.0, MF), &env);
        assert!(far < near);
        assert!((0.0..=1.0).contains(&far));
    }

    #[test]
    fn sea_water_carries_the_surface_wave() {
        let model = GroundWave::new();
        let path = level_path(30_000.0, 0.0, MF);
        let mut env = Environment::default();
        let land = model.propagation_factor(&path, &env);
        env.land_cover = empath_core::environment::LandCover::Water;
        let sea = model.propagation_factor(&path, &env);
        assert!(sea > 0.9, "sea = {sea}");
        assert!(land < 1e-3, "land = {land}");
    }

    #[test]
    fn residue_rolloff_beyond_the_flat_earth_limit() {
        let model = GroundWave::new();
        let mut env = Environment::default();
        env.land_cover = empath_core::environment::LandCover::Water;
        let inside = model.propagation_factor(&level_path(75_000.0, 0.0, MF), &env);
        let beyond = model.propagation_factor(&level_path(150_000.0, 0.0, MF), &env);
        let ratio = beyond / inside;
        // The exponential rolloff outpaces the surface-wave spreading alone.
        let spreading_only = {
            let near = model.propagation_factor(&level_path(37_500.0, 0.0, MF), &env);
            let far = model.propagation_factor(&level_path(75_000.0, 0.0, MF), &env);
            far / near
        };
        assert!(ratio < spreading_only);
    }

    #[test]
    fn refractivity_is_bounded() {
        assert!(GroundWave::new().with_refractivity(100.0).is_err());
        assert!(GroundWave::new().with_refractivity(301.0).is_ok());
    }

    #[test]
    fn standard_refractivity_recovers_four_thirds_earth() {
        approx::assert_relative_eq!(
            GroundWave::new().earth_radius_scale(),
            4.0 / 3.0,
            max_relative = 0.01
        );
    }
}
