use empath_core::common::{Power, SPEED_OF_LIGHT};
use empath_core::environment::{Environment, LandCover};
use empath_core::model::{Clutter, ClutterContext};

/// Constant-γ surface clutter.
///
/// Backscatter follows `σ⁰ = γ·sin ψ` with γ keyed by land cover, or by sea
/// state over water. The clutter cell is the range-gate footprint of the
/// azimuth beam; the echo runs through the radar equation against the cell's
/// total cross-section.
#[derive(Clone, Copy, Debug, Default)]
pub struct SurfaceClutter;

/// γ \[dB\] by surface. Sea values step with the Douglas sea state.
fn gamma_db(env: &Environment) -> f64 {
    match env.land_cover {
        LandCover::Water => (-35.0 + 3.0 * f64::from(env.sea_state.min(6))).min(-15.0),
        LandCover::Urban => -5.0,
        LandCover::ForestDeciduous | LandCover::ForestConiferous | LandCover::ForestMixed => -10.0,
        LandCover::WetlandForested | LandCover::WetlandNonforested => -12.0,
        LandCover::Agricultural
        | LandCover::RangelandHerbaceous
        | LandCover::RangelandShrub
        | LandCover::General => -15.0,
        LandCover::PerennialSnow => -15.0,
        LandCover::Tundra => -18.0,
        LandCover::Barren => -20.0,
    }
}

impl Clutter for SurfaceClutter {
    fn clutter_power(
        &self,
        ctx: &ClutterContext,
        env: &Environment,
        processing_factor: f64,
    ) -> Power {
        let grazing = ctx.grazing_angle.radian();
        let lambda = ctx.frequency.wavelength();
        if grazing <= 0.0 || !lambda.is_finite() || lambda <= 0.0 || ctx.range <= 0.0 {
            return Power::ZERO;
        }
        let sigma0 = 10f64.powf(gamma_db(env) / 10.0) * grazing.sin();
        // Range-gate footprint; the pulse cannot be longer than the PRI.
        let pulse = if ctx.prf > 0.0 {
            ctx.pulse_width.min(1.0 / ctx.prf)
        } else {
            ctx.pulse_width
        };
        let cell_area = ctx.range * ctx.azimuth_beamwidth.radian() * SPEED_OF_LIGHT * pulse
            / (2.0 * grazing.cos().max(1e-6));
        let sigma_c = sigma0 * cell_area;

        let numerator = ctx.transmitted_power
            * ctx.transmit_gain
            * ctx.receive_gain
            * (lambda * lambda * sigma_c);
        let denominator = (4.0 * std::f64::consts::PI).powi(3) * ctx.range.powi(4);
        numerator / denominator / ctx.receive_loss * processing_factor.clamp(0.0, 1.0)
    }
}
