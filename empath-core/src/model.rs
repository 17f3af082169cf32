use crate::common::{Angle, Freq, Power, Ratio};
use crate::environment::Environment;
use crate::geometry::{line_of_sight, Geodetic};

/// One leg of an interaction's signal path.
///
/// Construction sorts the endpoints so the path always runs from the lower
/// endpoint to the higher one, which is the orientation the attenuation
/// models integrate along.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SignalPath {
    /// Operating frequency.
    pub frequency: Freq<f64>,
    /// Slant range \[m\].
    pub range: f64,
    /// Great-circle ground range \[m\].
    pub ground_range: f64,
    /// True elevation of the path from the low endpoint.
    pub elevation: Angle,
    /// Lower endpoint.
    pub low: Geodetic,
    /// Higher endpoint.
    pub high: Geodetic,
    /// Effective-earth-radius scale factor in force.
    pub earth_radius_scale: f64,
}

impl SignalPath {
    /// Builds the path between two endpoints at `frequency`.
    #[must_use]
    pub fn between(
        a: &Geodetic,
        b: &Geodetic,
        frequency: Freq<f64>,
        earth_radius_scale: f64,
    ) -> Self {
        let (low, high) = if a.alt <= b.alt { (*a, *b) } else { (*b, *a) };
        let (_, range) = line_of_sight(&low.to_wcs(), &high.to_wcs());
        let ground_range = low.ground_range_to(&high);
        let elevation = if range < 1e-9 {
            Angle::ZERO
        } else {
            // Height gain over slant range, clamped against rounding for the
            // near-vertical case.
            ((high.alt - low.alt) / range).clamp(-1.0, 1.0).asin() * crate::common::rad
        };
        Self {
            frequency,
            range,
            ground_range,
            elevation,
            low,
            high,
            earth_radius_scale,
        }
    }

    /// The low endpoint altitude \[m\] MSL.
    #[must_use]
    pub const fn low_altitude(&self) -> f64 {
        self.low.alt
    }

    /// The high endpoint altitude \[m\] MSL.
    #[must_use]
    pub const fn high_altitude(&self) -> f64 {
        self.high.alt
    }
}

/// Atmospheric attenuation along one path leg.
///
/// Implementations return the one-way power transmission factor in `[0, 1]`;
/// the two-way factor over the same path is the square. Models read the path
/// and environment only.
pub trait Attenuation: Send + Sync + core::fmt::Debug {
    /// One-way attenuation factor in `[0, 1]`.
    fn compute(&self, path: &SignalPath, env: &Environment) -> Ratio;

    /// Whether the model's reference input form accepts an inline
    /// `end_attenuation_model` terminator.
    fn accepts_inline_block_input(&self) -> bool {
        false
    }

    /// Emits a debug trace naming the concrete model.
    fn trace(&self)
    where
        Self: Sized,
    {
        tracing::debug!("attenuation model: {}", tynm::type_name::<Self>());
    }
}

/// Pattern-propagation factor F⁴ for one path leg.
///
/// The factor multiplies received power; it is dimensionless, non-negative,
/// and typically in `[0, 4²]` for two-ray multipath. The absence of a model
/// means F⁴ = 1; a model returning zero means total cancellation or masking
/// the model has absorbed.
pub trait Propagation: Send + Sync + core::fmt::Debug {
    /// F⁴ for the path.
    fn propagation_factor(&self, path: &SignalPath, env: &Environment) -> f64;

    /// Emits a debug trace naming the concrete model.
    fn trace(&self)
    where
        Self: Sized,
    {
        tracing::debug!("propagation model: {}", tynm::type_name::<Self>());
    }
}

/// Geometry and radar parameters a clutter model needs, assembled by the
/// sensor from the completed interaction.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ClutterContext {
    /// Operating frequency.
    pub frequency: Freq<f64>,
    /// Transmitted peak power.
    pub transmitted_power: Power,
    /// Transmit gain toward the clutter cell.
    pub transmit_gain: Ratio,
    /// Receive gain toward the clutter cell.
    pub receive_gain: Ratio,
    /// Pulse width \[s\].
    pub pulse_width: f64,
    /// Pulse repetition frequency \[Hz\].
    pub prf: f64,
    /// Azimuth half-power beamwidth.
    pub azimuth_beamwidth: Angle,
    /// Grazing angle at the clutter cell.
    pub grazing_angle: Angle,
    /// Slant range to the clutter cell \[m\].
    pub range: f64,
    /// Aggregate receive losses (linear, ≥ 1).
    pub receive_loss: Ratio,
}

/// Surface clutter power at the receiver.
pub trait Clutter: Send + Sync + core::fmt::Debug {
    /// Total clutter power for the interaction.
    ///
    /// `processing_factor` in `[0, 1]` represents the sensor's clutter
    /// suppression; analytic models multiply by it, table models treat it
    /// as already baked in.
    fn clutter_power(
        &self,
        ctx: &ClutterContext,
        env: &Environment,
        processing_factor: f64,
    ) -> Power;

    /// Emits a debug trace naming the concrete model.
    fn trace(&self)
    where
        Self: Sized,
    {
        tracing::debug!("clutter model: {}", tynm::type_name::<Self>());
    }
}
