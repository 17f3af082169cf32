mod blake;
mod itu;
mod modtran;
mod simple;
mod table;

pub use blake::Blake;
pub use itu::{Itu, RainPolarization};
pub use modtran::{build_response_vector, compute_average_transmittance};
pub use simple::Simple;
pub use table::{TableAxis, Tabular};

use empath_core::common::Ratio;
use empath_core::environment::Environment;
use empath_core::model::{Attenuation, SignalPath};

/// No atmospheric loss at all: the factor is always unity.
#[derive(Clone, Copy, Debug, Default)]
pub struct Null;

impl Attenuation for Null {
    fn compute(&self, _path: &SignalPath, _env: &Environment) -> Ratio {
        Ratio::ONE
    }
}
