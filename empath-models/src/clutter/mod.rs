mod surface;

pub use surface::SurfaceClutter;

use empath_core::common::Power;
use empath_core::environment::Environment;
use empath_core::model::{Clutter, ClutterContext};

/// Clutter-free surface: the echo is always zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct Null;

impl Clutter for Null {
    fn clutter_power(
        &self,
        _ctx: &ClutterContext,
        _env: &Environment,
        _processing_factor: f64,
    ) -> Power {
        Power::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clutter::surface::tests::context;

    #[test]
    fn null_is_silent() {
        let p = Null.clutter_power(&context(), &Environment::default(), 1.0);
        approx::assert_abs_diff_eq!(p.watts(), 0.0);
    }
}
