mod ground_wave;
mod terrain;
mod two_ray;

pub use ground_wave::GroundWave;
pub use terrain::TerrainPropagation;
pub use two_ray::{SurfacePolarization, TwoRay};

use empath_core::environment::Environment;
use empath_core::model::{Propagation, SignalPath};

/// Total cancellation: F⁴ is always zero.
///
/// Distinct from running with no propagation model at all, which leaves
/// F⁴ = 1.
#[derive(Clone, Copy, Debug, Default)]
pub struct Null;

impl Propagation for Null {
    fn propagation_factor(&self, _path: &SignalPath, _env: &Environment) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attenuation::tests::level_path;

    #[test]
    fn null_cancels_everything() {
        let path = level_path(10_000.0, 100.0, 3.0);
        approx::assert_abs_diff_eq!(
            Null.propagation_factor(&path, &Environment::default()),
            0.0
        );
    }
}
