//! End-to-end scenarios composing the physics models through the
//! interaction orchestrator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use empath::models::attenuation::Itu;
use empath::models::propagation::TwoRay;
use empath::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

struct FixedPlatform {
    location: Point3,
    version: AtomicU64,
    radar_signature: f64,
}

impl FixedPlatform {
    fn at(geodetic: Geodetic) -> Self {
        Self {
            location: geodetic.to_wcs(),
            version: AtomicU64::new(0),
            radar_signature: 1.0,
        }
    }
}

impl Platform for FixedPlatform {
    fn id(&self) -> PlatformId {
        PlatformId(1)
    }

    fn location_wcs(&self) -> Point3 {
        self.location
    }

    fn velocity_wcs(&self) -> Vector3 {
        Vector3::zeros()
    }

    fn orientation(&self) -> Orientation {
        Orientation::IDENTITY
    }

    fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn signature(
        &self,
        kind: empath::core::platform::SignatureKind,
        _frequency: Freq<f64>,
        _az: Angle,
        _el: Angle,
    ) -> f64 {
        match kind {
            empath::core::platform::SignatureKind::Radar => self.radar_signature,
            _ => 1.0,
        }
    }
}

const EARTH_MEAN_RADIUS: f64 = 6_371_000.0;

/// A position `east_m` metres east of `(0°, 0°)` along the equator.
fn equator_east(east_m: f64, alt: f64) -> Geodetic {
    Geodetic::new(Angle::ZERO, (east_m / EARTH_MEAN_RADIUS) * rad, alt)
}

fn antenna_at(geodetic: Geodetic) -> Arc<Antenna> {
    let platform = Arc::new(FixedPlatform::at(geodetic));
    Arc::new(Antenna::new(Arc::new(ArticulatedPart::new(
        platform,
        Vector3::zeros(),
    ))))
}

fn sensor_pair(antenna: &Arc<Antenna>, frequency: Freq<f64>, power: Power) -> (Xmtr, Rcvr) {
    let xmtr = Xmtr::new(
        XmtrFunction::Sensor,
        antenna.clone(),
        Arc::new(Uniform::isotropic()),
        frequency,
        power,
    );
    let rcvr = Rcvr::new(
        RcvrFunction::Sensor,
        antenna.clone(),
        Arc::new(Uniform::isotropic()),
        frequency,
        1.0 * MHz,
    );
    (xmtr, rcvr)
}

fn two_way_power(
    xmtr: &Xmtr,
    target: &dyn Platform,
    rcvr: &Rcvr,
    env: &Environment,
    attenuation: Option<&dyn Attenuation>,
    propagation: Option<&dyn Propagation>,
) -> (Interaction, Power) {
    let mut ix = Interaction::new(4.0 / 3.0);
    ix.begin_two_way(xmtr, target, rcvr);
    assert!(ix.passed(), "failed: {:?}", ix.failed());
    ix.set_transmitter_beam_position(xmtr);
    ix.set_receiver_beam_position(rcvr);
    let p = ix.compute_rf_two_way_power(xmtr, target, rcvr, env, attenuation, propagation);
    (ix, p)
}

#[test]
fn multipath_null_suppresses_the_radar_return() {
    // Both terminals and the target at 10 m over a smooth surface, with the
    // target at the range where the surface bounce arrives a full
    // wavelength behind the direct ray.
    let lambda = (1.0 * GHz).wavelength();
    let null_range = 2.0 * 10.0 * 10.0 / lambda;
    let antenna = antenna_at(equator_east(0.0, 10.0));
    let (xmtr, rcvr) = sensor_pair(&antenna, 1.0 * GHz, 100.0 * kW);
    let target = FixedPlatform::at(equator_east(null_range, 10.0));
    let env = Environment::default();

    let (_, free) = two_way_power(&xmtr, &target, &rcvr, &env, None, None);
    let two_ray = TwoRay::new();
    let (_, faded) = two_way_power(&xmtr, &target, &rcvr, &env, None, Some(&two_ray));

    assert!(free.watts() > 0.0);
    assert!(
        faded.watts() < 0.05 * free.watts(),
        "faded/free = {}",
        faded.watts() / free.watts()
    );
}

#[test]
fn multipath_lobe_boosts_the_radar_return() {
    // At twice the null range the rays add nearly in phase.
    let lambda = (1.0 * GHz).wavelength();
    let peak_range = 4.0 * 10.0 * 10.0 / lambda;
    let antenna = antenna_at(equator_east(0.0, 10.0));
    let (xmtr, rcvr) = sensor_pair(&antenna, 1.0 * GHz, 100.0 * kW);
    let target = FixedPlatform::at(equator_east(peak_range, 10.0));
    let env = Environment::default();

    let (_, free) = two_way_power(&xmtr, &target, &rcvr, &env, None, None);
    let two_ray = TwoRay::new();
    let (_, boosted) = two_way_power(&xmtr, &target, &rcvr, &env, None, Some(&two_ray));

    assert!(boosted.watts() > 5.0 * free.watts());
}

#[test]
fn attenuation_scales_the_one_way_budget() {
    // 10 km level path on the 22.235 GHz water-vapor line.
    let frequency = 22.235e9 * Hz;
    let a = antenna_at(equator_east(0.0, 1_000.0));
    let b = antenna_at(equator_east(10_000.0, 1_000.0));
    let (xmtr, _) = sensor_pair(&a, frequency, 10.0 * kW);
    let (_, rcvr) = sensor_pair(&b, frequency, 10.0 * kW);
    let env = Environment::default();

    let mut ix = Interaction::new(4.0 / 3.0);
    ix.begin_one_way_xr(&xmtr, &rcvr, true, true, true);
    assert!(ix.passed(), "failed: {:?}", ix.failed());
    ix.set_transmitter_beam_position(&xmtr);
    ix.set_receiver_beam_position(&rcvr);
    let free = ix.compute_rf_one_way_power(&xmtr, &rcvr, &env, None, None);

    let itu = Itu::new();
    let path = SignalPath::between(
        &equator_east(0.0, 1_000.0),
        &equator_east(10_000.0, 1_000.0),
        frequency,
        4.0 / 3.0,
    );
    let alpha = itu.compute(&path, &env);
    assert!(alpha.linear() > 0.0 && alpha.linear() < 1.0);
    // Gaseous absorption near the line runs a couple of dB over 10 km.
    let loss_db = -alpha.db();
    assert!((0.5..5.0).contains(&loss_db), "loss = {loss_db} dB");

    let mut ix = Interaction::new(4.0 / 3.0);
    ix.begin_one_way_xr(&xmtr, &rcvr, true, true, true);
    ix.set_transmitter_beam_position(&xmtr);
    ix.set_receiver_beam_position(&rcvr);
    let attenuated = ix.compute_rf_one_way_power(&xmtr, &rcvr, &env, Some(&itu), None);

    approx::assert_relative_eq!(
        attenuated.watts(),
        free.watts() * alpha.linear(),
        max_relative = 1e-9
    );
}

#[test]
fn two_way_attenuation_covers_both_legs() {
    let frequency = 22.235e9 * Hz;
    let antenna = antenna_at(equator_east(0.0, 1_000.0));
    let (xmtr, rcvr) = sensor_pair(&antenna, frequency, 100.0 * kW);
    let mut target = FixedPlatform::at(equator_east(10_000.0, 1_000.0));
    target.radar_signature = 5.0;
    let env = Environment::default();

    let (_, free) = two_way_power(&xmtr, &target, &rcvr, &env, None, None);
    let itu = Itu::new();
    let (_, attenuated) = two_way_power(&xmtr, &target, &rcvr, &env, Some(&itu), None);

    let path = SignalPath::between(
        &equator_east(0.0, 1_000.0),
        &equator_east(10_000.0, 1_000.0),
        frequency,
        4.0 / 3.0,
    );
    let alpha = itu.compute(&path, &env);
    // Monostatic, so the out and back legs carry the same factor.
    approx::assert_relative_eq!(
        attenuated.watts(),
        free.watts() * alpha.linear() * alpha.linear(),
        max_relative = 1e-9
    );
}

#[test]
fn bistatic_two_way_carries_a_factor_per_leg() {
    // Transmitter, target, and receiver at three different heights, so the
    // outbound and return legs see different multipath geometries.
    let frequency = 1.0 * GHz;
    let tx_site = equator_east(0.0, 10.0);
    let tgt_site = equator_east(3_000.0, 30.0);
    let rx_site = equator_east(8_000.0, 15.0);
    let tx_antenna = antenna_at(tx_site);
    let rx_antenna = antenna_at(rx_site);
    let (xmtr, _) = sensor_pair(&tx_antenna, frequency, 100.0 * kW);
    let (_, rcvr) = sensor_pair(&rx_antenna, frequency, 100.0 * kW);
    let target = FixedPlatform::at(tgt_site);
    let env = Environment::default();

    let (_, free) = two_way_power(&xmtr, &target, &rcvr, &env, None, None);
    let two_ray = TwoRay::new();
    let (ix, faded) = two_way_power(&xmtr, &target, &rcvr, &env, None, Some(&two_ray));

    let out = SignalPath::between(&tx_site, &tgt_site, frequency, 4.0 / 3.0);
    let back = SignalPath::between(&tgt_site, &rx_site, frequency, 4.0 / 3.0);
    let f4_out = two_ray.propagation_factor(&out, &env);
    let f4_back = two_ray.propagation_factor(&back, &env);
    assert!((f4_out - f4_back).abs() > 1e-6, "legs should differ");
    approx::assert_relative_eq!(
        ix.propagation_factor(),
        f4_out.sqrt() * f4_back.sqrt(),
        max_relative = 1e-9
    );
    approx::assert_relative_eq!(
        faded.watts(),
        free.watts() * f4_out.sqrt() * f4_back.sqrt(),
        max_relative = 1e-9
    );
}

#[test]
fn detection_pipeline_declares_the_near_target_only() {
    let antenna = antenna_at(equator_east(0.0, 1_000.0));
    let (xmtr, rcvr) = sensor_pair(&antenna, 3.0 * GHz, 100.0 * kW);
    let mut near = FixedPlatform::at(equator_east(1_000.0, 1_000.0));
    near.radar_signature = 5.0;
    let mut far = FixedPlatform::at(equator_east(60_000.0, 1_000.0));
    far.radar_signature = 5.0;
    let env = Environment::default();

    let detector = MarcumSwerling::new(SwerlingCase::Zero, 1, 1e-6).unwrap();
    let mut beam = SensorBeam::new(detector, 0.9).unwrap();
    let mut rng = StdRng::seed_from_u64(11);

    let (near_ix, _) = two_way_power(&xmtr, &near, &rcvr, &env, None, None);
    assert!(near_ix.snr().db() > beam.detection_threshold().db());
    for _ in 0..20 {
        assert!(beam.evaluate_detection(near_ix.snr(), &mut rng));
    }

    let (far_ix, _) = two_way_power(&xmtr, &far, &rcvr, &env, None, None);
    assert!(far_ix.snr().db() < beam.detection_threshold().db());
    for _ in 0..20 {
        assert!(!beam.evaluate_detection(far_ix.snr(), &mut rng));
    }
}

#[test]
fn registry_models_match_their_direct_counterparts() -> anyhow::Result<()> {
    let registry = ModelRegistry::with_defaults();
    let two_ray = registry.propagation("two_ray", "")?;
    let itu = registry.attenuation("itu", "")?;

    let lambda = (1.0 * GHz).wavelength();
    let null_range = 2.0 * 10.0 * 10.0 / lambda;
    let antenna = antenna_at(equator_east(0.0, 10.0));
    let (xmtr, rcvr) = sensor_pair(&antenna, 1.0 * GHz, 100.0 * kW);
    let target = FixedPlatform::at(equator_east(null_range, 10.0));
    let env = Environment::default();

    let (_, from_registry) =
        two_way_power(&xmtr, &target, &rcvr, &env, Some(&*itu), Some(&*two_ray));
    let direct_prop = TwoRay::new();
    let direct_atten = Itu::new();
    let (_, direct) = two_way_power(
        &xmtr,
        &target,
        &rcvr,
        &env,
        Some(&direct_atten),
        Some(&direct_prop),
    );
    approx::assert_relative_eq!(
        from_registry.watts(),
        direct.watts(),
        max_relative = 1e-12
    );
    Ok(())
}
