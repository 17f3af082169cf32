//! Sensor mode and beam policy.
//!
//! The orchestrator in `empath-core` computes an SNR; the policy here turns
//! it into a detection: a [`Detector`] draw against the sensor's random
//! stream, gated by M-of-N track establishment, with Gaussian measurement
//! errors whose sigmas shrink as `1/sqrt(2·N·SNR)`. The beam also carries
//! the frequency-agility set and its settling-delay bookkeeping, the PRF
//! selection, and the clutter model handle.

use std::sync::Arc;

use empath_core::common::{rad, Angle, Freq, Power, Ratio, SPEED_OF_LIGHT};
use empath_core::environment::Environment;
use empath_core::manager::{EmManager, XmtrId};
use empath_core::model::{Clutter, ClutterContext};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::detector::Detector;
use crate::error::SensorError;

/// Whether close-target discrimination compares true or measured states.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeltaBasis {
    /// Compare true target states.
    #[default]
    Truth,
    /// Compare states after measurement errors.
    Measured,
}

/// A target state as the sensor reports it.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Measurement {
    /// Apparent azimuth from the sensor.
    pub azimuth: Angle,
    /// Apparent elevation from the sensor.
    pub elevation: Angle,
    /// Slant range \[m\].
    pub range: f64,
    /// Range rate, closing positive \[m/s\].
    pub range_rate: f64,
}

/// A truth/measured pair for one detection attempt.
#[derive(Clone, Copy, Debug)]
pub struct TargetReport {
    /// The true state.
    pub truth: Measurement,
    /// The state after measurement errors.
    pub measured: Measurement,
}

/// M-of-N detection history over a sliding window.
#[derive(Clone, Debug)]
pub struct MOfN {
    required: usize,
    window: usize,
    history: std::collections::VecDeque<bool>,
}

impl MOfN {
    /// A window of `n` attempts requiring `m` hits.
    pub fn new(m: usize, n: usize) -> Result<Self, SensorError> {
        if m == 0 || m > n {
            return Err(SensorError::InvalidMOfN { m, n });
        }
        Ok(Self {
            required: m,
            window: n,
            history: std::collections::VecDeque::with_capacity(n),
        })
    }

    /// Records one attempt and reports whether the track is established.
    pub fn observe(&mut self, hit: bool) -> bool {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(hit);
        self.established()
    }

    /// Whether the current window holds at least M hits.
    #[must_use]
    pub fn established(&self) -> bool {
        self.history.iter().filter(|&&h| h).count() >= self.required
    }

    /// Clears the window.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// One beam of a sensor mode.
///
/// Built around a detector and the mode's required Pd; the detection
/// threshold handed to the receiver's signal-level gate is the SNR at which
/// the detector reaches that Pd, solved once here.
pub struct SensorBeam {
    detector: Detector,
    required_pd: f64,
    detection_threshold: Ratio,
    frequencies: Vec<Freq<f64>>,
    active_frequency: usize,
    /// `(settles at, index)` of a queued frequency change.
    pending_frequency: Option<(f64, usize)>,
    settling_delay: f64,
    prf_index: usize,
    clutter: Option<Arc<dyn Clutter>>,
    clutter_processing_factor: f64,
    establish: Option<MOfN>,
    /// Base range-rate sigma before the SNR scaling \[m/s\].
    range_rate_sigma: f64,
}

impl SensorBeam {
    /// Builds a beam, inverting the detector to its detection threshold.
    pub fn new(detector: impl Into<Detector>, required_pd: f64) -> Result<Self, SensorError> {
        let detector = detector.into();
        let detection_threshold = detector.snr_for(required_pd)?;
        Ok(Self {
            detector,
            required_pd,
            detection_threshold,
            frequencies: Vec::new(),
            active_frequency: 0,
            pending_frequency: None,
            settling_delay: 0.0,
            prf_index: 0,
            clutter: None,
            clutter_processing_factor: 1.0,
            establish: None,
            range_rate_sigma: 0.0,
        })
    }

    /// Sets the frequency-agility set and its settling delay.
    pub fn with_frequencies(
        mut self,
        frequencies: Vec<Freq<f64>>,
        settling_delay: f64,
    ) -> Result<Self, SensorError> {
        if frequencies.is_empty() {
            return Err(SensorError::EmptyFrequencySet);
        }
        if !(settling_delay >= 0.0 && settling_delay.is_finite()) {
            return Err(SensorError::InvalidSettlingDelay(settling_delay));
        }
        self.frequencies = frequencies;
        self.settling_delay = settling_delay;
        self.active_frequency = 0;
        self.pending_frequency = None;
        Ok(self)
    }

    /// Selects which PRF of the transmitter's schedule this beam uses.
    #[must_use]
    pub fn with_prf_index(mut self, index: usize) -> Self {
        self.prf_index = index;
        self
    }

    /// Attaches a clutter model and its signal-processing factor.
    #[must_use]
    pub fn with_clutter(mut self, model: Arc<dyn Clutter>, processing_factor: f64) -> Self {
        self.clutter = Some(model);
        self.clutter_processing_factor = processing_factor.clamp(0.0, 1.0);
        self
    }

    /// Requires M hits in the last N attempts before declaring a track.
    pub fn with_m_of_n(mut self, m: usize, n: usize) -> Result<Self, SensorError> {
        self.establish = Some(MOfN::new(m, n)?);
        Ok(self)
    }

    /// Sets the base range-rate measurement sigma \[m/s\].
    pub fn with_range_rate_sigma(mut self, sigma: f64) -> Result<Self, SensorError> {
        if !(sigma >= 0.0 && sigma.is_finite()) {
            return Err(SensorError::InvalidDelta {
                name: "range-rate sigma",
                value: sigma,
            });
        }
        self.range_rate_sigma = sigma;
        Ok(self)
    }

    /// The detector.
    #[must_use]
    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// The mode's required detection probability.
    #[must_use]
    pub const fn required_pd(&self) -> f64 {
        self.required_pd
    }

    /// SNR threshold matching the required Pd, for the signal-level gate.
    #[must_use]
    pub const fn detection_threshold(&self) -> Ratio {
        self.detection_threshold
    }

    /// The selected PRF index.
    #[must_use]
    pub const fn prf_index(&self) -> usize {
        self.prf_index
    }

    /// The frequency the beam currently radiates on, if agility is set.
    #[must_use]
    pub fn frequency(&self) -> Option<Freq<f64>> {
        self.frequencies.get(self.active_frequency).copied()
    }

    /// Commands a switch to agility-set entry `index`.
    ///
    /// The transmitter retune is scheduled on the manager's event queue for
    /// `now + settling delay` and the beam's bookkeeping follows at
    /// [`settle`]. Commanding again during the delay queues the newer
    /// request; whichever settles last wins. Returns the settling time.
    ///
    /// [`settle`]: Self::settle
    pub fn select_frequency(
        &mut self,
        index: usize,
        now: f64,
        manager: &EmManager,
        xmtr: XmtrId,
    ) -> Result<f64, SensorError> {
        let Some(&frequency) = self.frequencies.get(index) else {
            return Err(SensorError::FrequencyIndex {
                got: index,
                len: self.frequencies.len(),
            });
        };
        let at = now + self.settling_delay;
        manager.schedule_retune(xmtr, at, frequency);
        self.pending_frequency = Some((at, index));
        tracing::debug!(index, at, "frequency change queued");
        Ok(at)
    }

    /// Promotes a queued frequency change once its settling time passes.
    pub fn settle(&mut self, now: f64) {
        if let Some((at, index)) = self.pending_frequency {
            if now >= at {
                self.active_frequency = index;
                self.pending_frequency = None;
            }
        }
    }

    /// Clutter power for this beam's geometry, zero without a model.
    #[must_use]
    pub fn clutter_power(&self, context: &ClutterContext, env: &Environment) -> Power {
        self.clutter.as_ref().map_or(Power::ZERO, |model| {
            model.clutter_power(context, env, self.clutter_processing_factor)
        })
    }

    /// One detection attempt: a Pd draw from the sensor's random stream,
    /// then the M-of-N history when one is configured.
    pub fn evaluate_detection(&mut self, snr: Ratio, rng: &mut impl Rng) -> bool {
        let pd = self.detector.probability_of_detection(snr);
        let hit = pd > rng.random::<f64>();
        match &mut self.establish {
            Some(history) => history.observe(hit),
            None => hit,
        }
    }

    /// Applies Gaussian measurement errors to a true state.
    ///
    /// Angle sigmas are `beamwidth / sqrt(2·N·SNR)`, range is
    /// `c·pulse_width / (2·sqrt(2·N·SNR))`, and the configured range-rate
    /// sigma scales the same way. A non-positive SNR returns the truth
    /// unchanged; there is no detection to report it on.
    pub fn apply_measurement_errors(
        &self,
        truth: Measurement,
        azimuth_beamwidth: Angle,
        elevation_beamwidth: Angle,
        pulse_width: f64,
        snr: Ratio,
        rng: &mut impl Rng,
    ) -> Measurement {
        let x = snr.linear();
        if x <= 0.0 {
            return truth;
        }
        let scale = 1.0 / (2.0 * f64::from(self.detector.pulses()) * x).sqrt();
        Measurement {
            azimuth: jitter(
                truth.azimuth.radian(),
                azimuth_beamwidth.radian() * scale,
                rng,
            ) * rad,
            elevation: jitter(
                truth.elevation.radian(),
                elevation_beamwidth.radian() * scale,
                rng,
            ) * rad,
            range: jitter(truth.range, SPEED_OF_LIGHT * pulse_width / 2.0 * scale, rng),
            range_rate: jitter(truth.range_rate, self.range_rate_sigma * scale, rng),
        }
    }
}

fn jitter(value: f64, sigma: f64, rng: &mut impl Rng) -> f64 {
    if sigma <= 0.0 {
        return value;
    }
    match Normal::new(0.0, sigma) {
        Ok(normal) => value + normal.sample(rng),
        Err(_) => value,
    }
}

impl std::fmt::Debug for SensorBeam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorBeam")
            .field("detector", &self.detector)
            .field("required_pd", &self.required_pd)
            .field("detection_threshold", &self.detection_threshold)
            .field("frequencies", &self.frequencies)
            .field("active_frequency", &self.active_frequency)
            .field("prf_index", &self.prf_index)
            .finish_non_exhaustive()
    }
}

/// A sensor mode: its beams plus the close-target discrimination policy.
#[derive(Debug, Default)]
pub struct SensorMode {
    beams: Vec<SensorBeam>,
    delta_basis: DeltaBasis,
    azimuth_delta: Angle,
    elevation_delta: Angle,
    range_delta: f64,
}

impl SensorMode {
    /// An empty mode resolving everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects which states close-target discrimination compares.
    #[must_use]
    pub fn with_delta_basis(mut self, basis: DeltaBasis) -> Self {
        self.delta_basis = basis;
        self
    }

    /// Sets the discrimination deltas; targets closer than all three in
    /// azimuth, elevation, and range merge into one report.
    pub fn with_discrimination(
        mut self,
        azimuth: Angle,
        elevation: Angle,
        range: f64,
    ) -> Result<Self, SensorError> {
        for (name, value) in [
            ("azimuth delta", azimuth.radian()),
            ("elevation delta", elevation.radian()),
            ("range delta", range),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(SensorError::InvalidDelta { name, value });
            }
        }
        self.azimuth_delta = azimuth;
        self.elevation_delta = elevation;
        self.range_delta = range;
        Ok(self)
    }

    /// Appends a beam.
    pub fn add_beam(&mut self, beam: SensorBeam) {
        self.beams.push(beam);
    }

    /// The beams.
    #[must_use]
    pub fn beams(&self) -> &[SensorBeam] {
        &self.beams
    }

    /// Mutable access for per-step bookkeeping.
    pub fn beams_mut(&mut self) -> &mut [SensorBeam] {
        &mut self.beams
    }

    /// Whether two reports separate into distinct targets.
    #[must_use]
    pub fn resolves(&self, a: &TargetReport, b: &TargetReport) -> bool {
        let (a, b) = match self.delta_basis {
            DeltaBasis::Truth => (&a.truth, &b.truth),
            DeltaBasis::Measured => (&a.measured, &b.measured),
        };
        let d_az = (a.azimuth - b.azimuth).normalized().radian().abs();
        let d_el = (a.elevation - b.elevation).radian().abs();
        let d_range = (a.range - b.range).abs();
        d_az > self.azimuth_delta.radian()
            || d_el > self.elevation_delta.radian()
            || d_range > self.range_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{MarcumSwerling, PdCurve, SwerlingCase};
    use empath_core::common::{dB, deg, GHz, kW};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn curve_beam(required_pd: f64) -> SensorBeam {
        let curve = PdCurve::new(vec![(5.0, 0.1), (10.0, 0.5), (15.0, 0.9)]).unwrap();
        SensorBeam::new(curve, required_pd).unwrap()
    }

    #[test]
    fn curve_inversion_sets_the_detection_threshold() {
        let beam = curve_beam(0.9);
        approx::assert_abs_diff_eq!(beam.detection_threshold().db(), 15.0, epsilon = 1e-9);
        let beam = curve_beam(0.5);
        approx::assert_abs_diff_eq!(beam.detection_threshold().db(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn analytic_threshold_matches_the_required_pd() {
        let detector = MarcumSwerling::new(SwerlingCase::One, 4, 1e-6).unwrap();
        let beam = SensorBeam::new(detector, 0.8).unwrap();
        approx::assert_abs_diff_eq!(
            beam.detector()
                .probability_of_detection(beam.detection_threshold()),
            0.8,
            epsilon = 1e-9
        );
    }

    #[test]
    fn sure_detections_and_sure_misses() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut beam = curve_beam(0.9);
        // Above the curve top the draw cannot miss; below the bottom it
        // cannot hit (curve floor is 0.1 > 0, so use the analytic floor).
        for _ in 0..100 {
            assert!(beam.evaluate_detection(30.0 * dB, &mut rng));
        }
        let never = PdCurve::new(vec![(5.0, 0.0), (15.0, 0.9)]).unwrap();
        let mut beam = SensorBeam::new(never, 0.5).unwrap();
        for _ in 0..100 {
            assert!(!beam.evaluate_detection(0.0 * dB, &mut rng));
        }
    }

    #[test]
    fn m_of_n_gates_the_declaration() {
        let mut history = MOfN::new(2, 3).unwrap();
        assert!(!history.observe(true));
        assert!(history.observe(true));
        assert!(history.observe(false));
        // The first hit slides out of the window.
        assert!(!history.observe(false));
        history.reset();
        assert!(!history.established());
    }

    #[test]
    fn m_of_n_delays_a_sure_detection() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut beam = curve_beam(0.9).with_m_of_n(2, 3).unwrap();
        assert!(!beam.evaluate_detection(30.0 * dB, &mut rng));
        assert!(beam.evaluate_detection(30.0 * dB, &mut rng));
    }

    #[test]
    fn m_of_n_validation() {
        assert_eq!(
            MOfN::new(0, 3).unwrap_err(),
            SensorError::InvalidMOfN { m: 0, n: 3 }
        );
        assert!(MOfN::new(4, 3).is_err());
    }

    #[test]
    fn frequency_change_queues_and_applies_at_expiry() {
        let manager = EmManager::new();
        let id = manager.register_xmtr(crate::tests::sensor_xmtr(3.0 * GHz, 100.0 * kW));

        let mut beam = SensorBeam::new(
            MarcumSwerling::new(SwerlingCase::Zero, 1, 1e-6).unwrap(),
            0.5,
        )
        .unwrap()
        .with_frequencies(vec![3.0 * GHz, 3.2 * GHz, 3.4 * GHz], 0.5)
        .unwrap();

        let at = beam.select_frequency(1, 10.0, &manager, id).unwrap();
        approx::assert_abs_diff_eq!(at, 10.5);
        // Still settling: nothing changed yet.
        beam.settle(10.2);
        manager.dispatch_events(10.2);
        assert_eq!(beam.frequency(), Some(3.0 * GHz));
        assert_eq!(manager.view().xmtr(id).unwrap().frequency(), 3.0 * GHz);

        // A second command during the delay queues behind the first.
        beam.select_frequency(2, 10.3, &manager, id).unwrap();
        beam.settle(10.6);
        manager.dispatch_events(10.6);
        // The first retune fired at 10.5; the beam follows its newest command.
        assert_eq!(manager.view().xmtr(id).unwrap().frequency(), 3.2 * GHz);
        assert_eq!(beam.frequency(), Some(3.0 * GHz));

        beam.settle(10.8);
        manager.dispatch_events(10.8);
        assert_eq!(beam.frequency(), Some(3.4 * GHz));
        assert_eq!(manager.view().xmtr(id).unwrap().frequency(), 3.4 * GHz);
    }

    #[test]
    fn frequency_index_is_checked() {
        let manager = EmManager::new();
        let id = manager.register_xmtr(crate::tests::sensor_xmtr(3.0 * GHz, 100.0 * kW));
        let mut beam = curve_beam(0.5)
            .with_frequencies(vec![3.0 * GHz], 0.1)
            .unwrap();
        let err = beam.select_frequency(3, 0.0, &manager, id).unwrap_err();
        assert_eq!(err, SensorError::FrequencyIndex { got: 3, len: 1 });
    }

    #[test]
    fn measurement_sigmas_shrink_with_snr() {
        let beam = curve_beam(0.5);
        let truth = Measurement {
            azimuth: 10.0 * deg,
            elevation: 2.0 * deg,
            range: 50_000.0,
            range_rate: -100.0,
        };
        let spread = |snr: Ratio| {
            let mut rng = StdRng::seed_from_u64(11);
            let mut worst: f64 = 0.0;
            for _ in 0..200 {
                let m = beam.apply_measurement_errors(
                    truth,
                    3.0 * deg,
                    3.0 * deg,
                    1e-6,
                    snr,
                    &mut rng,
                );
                worst = worst.max((m.range - truth.range).abs());
            }
            worst
        };
        assert!(spread(40.0 * dB) < spread(10.0 * dB));
        // Theoretical sigma at 10 dB: c·τ/(2·sqrt(2·10)) ≈ 33.5 m; 200
        // draws stay within a handful of sigmas.
        assert!(spread(10.0 * dB) < 200.0);
        assert!(spread(10.0 * dB) > 1.0);
    }

    #[test]
    fn zero_snr_measures_the_truth() {
        let beam = curve_beam(0.5);
        let truth = Measurement {
            azimuth: 1.0 * deg,
            elevation: 0.5 * deg,
            range: 10_000.0,
            range_rate: 30.0,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let m = beam.apply_measurement_errors(truth, 3.0 * deg, 3.0 * deg, 1e-6, Ratio::ZERO, &mut rng);
        approx::assert_abs_diff_eq!(m.range, truth.range);
        approx::assert_abs_diff_eq!(m.azimuth.radian(), truth.azimuth.radian());
    }

    #[test]
    fn discrimination_follows_the_delta_basis() {
        let truth_apart = TargetReport {
            truth: Measurement {
                range: 10_000.0,
                ..Measurement::default()
            },
            measured: Measurement {
                range: 10_020.0,
                ..Measurement::default()
            },
        };
        let truth_close = TargetReport {
            truth: Measurement {
                range: 10_040.0,
                ..Measurement::default()
            },
            measured: Measurement {
                range: 10_200.0,
                ..Measurement::default()
            },
        };
        let mode = SensorMode::new()
            .with_discrimination(1.0 * deg, 1.0 * deg, 100.0)
            .unwrap();
        // Truth ranges differ by 40 m: unresolved.
        assert!(!mode.resolves(&truth_apart, &truth_close));
        let mode = mode.with_delta_basis(DeltaBasis::Measured);
        // Measured ranges differ by 180 m: resolved.
        assert!(mode.resolves(&truth_apart, &truth_close));
    }

    #[test]
    fn discrimination_deltas_are_validated() {
        assert!(SensorMode::new()
            .with_discrimination(-1.0 * deg, 1.0 * deg, 100.0)
            .is_err());
    }

    #[test]
    fn clutter_handle_feeds_the_noise_budget() {
        use empath_models::clutter::SurfaceClutter;
        let beam = curve_beam(0.5).with_clutter(Arc::new(SurfaceClutter), 0.5);
        let context = ClutterContext {
            frequency: 3.0 * GHz,
            transmitted_power: 100.0 * kW,
            transmit_gain: Ratio::from_linear(1000.0),
            receive_gain: Ratio::from_linear(1000.0),
            pulse_width: 1e-6,
            prf: 1000.0,
            azimuth_beamwidth: 2.0 * deg,
            grazing_angle: 1.0 * deg,
            range: 20_000.0,
            receive_loss: Ratio::ONE,
        };
        let env = Environment::default();
        let half = beam.clutter_power(&context, &env);
        assert!(half.watts() > 0.0);
        let bare = curve_beam(0.5);
        approx::assert_abs_diff_eq!(bare.clutter_power(&context, &env).watts(), 0.0);
    }
}
