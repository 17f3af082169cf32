use std::sync::Arc;

use empath_core::environment::{sample_terrain_height, Environment, Terrain};
use empath_core::geometry::{effective_earth_radius, TERRAIN_PROFILE_STEP};
use empath_core::model::{Propagation, SignalPath};

use super::TwoRay;

/// Terrain-profile propagation.
///
/// Walks the profile between the endpoints at the fixed 3-arc-second step,
/// indexes each sample by its first-Fresnel-zone clearance, and applies
/// knife-edge diffraction over the dominant obstacle. Paths with full
/// Fresnel clearance fall through to the smooth-earth multipath kernel.
pub struct TerrainPropagation {
    terrain: Arc<dyn Terrain>,
    multipath: Option<TwoRay>,
}

impl std::fmt::Debug for TerrainPropagation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainPropagation")
            .field("multipath", &self.multipath)
            .finish_non_exhaustive()
    }
}

/// Fraction of the first Fresnel radius that counts as a clear path.
const CLEARANCE_FRACTION: f64 = 0.6;

impl TerrainPropagation {
    /// Diffraction only; clear paths get F⁴ = 1.
    #[must_use]
    pub fn new(terrain: Arc<dyn Terrain>) -> Self {
        Self {
            terrain,
            multipath: None,
        }
    }

    /// Runs the multipath kernel over clear sections instead of free space.
    #[must_use]
    pub fn with_multipath(mut self, kernel: TwoRay) -> Self {
        self.multipath = Some(kernel);
        self
    }

    /// Worst normalized Fresnel obstruction `ν` along the profile, positive
    /// when terrain pokes into the ray.
    fn dominant_obstruction(&self, path: &SignalPath) -> f64 {
        let total = path.ground_range;
        let lambda = path.frequency.wavelength();
        let re = 2.0 * effective_earth_radius(path.earth_radius_scale);
        let (a, b) = (path.low, path.high);
        let d_lat = b.lat - a.lat;
        let d_lon = (b.lon - a.lon).normalized();
        let n = (total / TERRAIN_PROFILE_STEP).ceil().max(2.0) as usize;
        let mut worst = f64::NEG_INFINITY;
        for i in 1..n {
            let t = i as f64 / n as f64;
            let d1 = t * total;
            let d2 = total - d1;
            let ray = a.alt + (b.alt - a.alt) * t - d1 * d2 / re;
            let ground =
                sample_terrain_height(self.terrain.as_ref(), a.lat + d_lat * t, (a.lon + d_lon * t).normalized());
            let obstruction = ground - ray;
            // Knife-edge Fresnel parameter at this sample.
            let nu = obstruction * (2.0 * (d1 + d2) / (lambda * d1 * d2)).sqrt();
            if nu > worst {
                worst = nu;
            }
        }
        worst
    }
}

/// Lee's approximation of the knife-edge diffraction loss \[dB\] for ν above
/// the shadow transition; below it the edge contributes nothing.
fn knife_edge_loss_db(nu: f64) -> f64 {
    if nu <= -0.78 {
        return 0.0;
    }
    6.9 + 20.0 * (((nu - 0.1).powi(2) + 1.0).sqrt() + nu - 0.1).log10()
}

impl Propagation for TerrainPropagation {
    fn propagation_factor(&self, path: &SignalPath, env: &Environment) -> f64 {
        let lambda = path.frequency.wavelength();
        if !lambda.is_finite() || lambda <= 0.0 || path.ground_range <= TERRAIN_PROFILE_STEP {
            return 1.0;
        }
        let nu = self.dominant_obstruction(path);
        // ν at 60% first-Fresnel clearance: -0.6·√2.
        let clear = -CLEARANCE_FRACTION * std::f64::consts::SQRT_2;
        if nu <= clear {
            return match &self.multipath {
                Some(kernel) => kernel.propagation_factor(path, env),
                None => 1.0,
            };
        }
        let loss_db = knife_edge_loss_db(nu);
        10f64.powf(-4.0 * loss_db / 20.0)
    }
}
