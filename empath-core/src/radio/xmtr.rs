use std::sync::Arc;

use getset::{CopyGetters, Getters};

use crate::antenna::Antenna;
use crate::common::{Freq, Power, Ratio};
use crate::error::RadioError;
use crate::manager::RcvrId;
use crate::pattern::AntennaPattern;

use super::{PatternMap, Polarization};

/// What role a transmitter plays, which decides the receiver interactor
/// lists it lands on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum XmtrFunction {
    /// Communications emitter.
    Comm,
    /// Active sensor emitter.
    Sensor,
    /// Jammer or other interferer.
    Interferer,
}

/// Nominal transmit power with optional per-frequency overrides.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerSchedule {
    nominal: Power,
    overrides: Vec<(f64, Power)>,
}

impl PowerSchedule {
    /// A schedule with a single nominal power.
    #[must_use]
    pub const fn nominal(power: Power) -> Self {
        Self {
            nominal: power,
            overrides: Vec::new(),
        }
    }

    /// Adds an alternate-frequency override.
    #[must_use]
    pub fn with_override(mut self, frequency: Freq<f64>, power: Power) -> Self {
        self.overrides.push((frequency.hz(), power));
        self.overrides.sort_by(|a, b| a.0.total_cmp(&b.0));
        self
    }

    /// Power at `frequency`: the override keyed to it, else the nominal.
    #[must_use]
    pub fn power_at(&self, frequency: Freq<f64>) -> Power {
        let f = frequency.hz();
        self.overrides
            .iter()
            .find(|(knot, _)| (knot - f).abs() <= 1e-6 * knot.abs().max(1.0))
            .map_or(self.nominal, |(_, p)| *p)
    }
}

/// Pulse repetition frequencies: an indexed list plus the derived average.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrfSchedule {
    prfs: Vec<f64>,
}

impl PrfSchedule {
    /// A single-PRF schedule.
    #[must_use]
    pub fn single(prf: f64) -> Self {
        Self { prfs: vec![prf] }
    }

    /// A staggered schedule.
    #[must_use]
    pub const fn staggered(prfs: Vec<f64>) -> Self {
        Self { prfs }
    }

    /// Whether any PRF is configured (continuous wave otherwise).
    #[must_use]
    pub fn is_pulsed(&self) -> bool {
        !self.prfs.is_empty()
    }

    /// The indexed entry.
    pub fn get(&self, index: usize) -> Result<f64, RadioError> {
        self.prfs
            .get(index)
            .copied()
            .ok_or(RadioError::PrfIndexOutOfRange(index, self.prfs.len()))
    }

    /// Mean of the entries, zero when none are configured.
    #[must_use]
    pub fn average(&self) -> f64 {
        if self.prfs.is_empty() {
            0.0
        } else {
            self.prfs.iter().sum::<f64>() / self.prfs.len() as f64
        }
    }

    /// Largest configured PRF, zero when none.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.prfs.iter().copied().fold(0.0, f64::max)
    }
}

/// A transmitter: one antenna, per-polarization patterns, and the emission
/// parameters of the radar/comm power budget.
///
/// Runtime parameter changes go through the EM manager so change listeners
/// fire; the struct itself only exposes `&mut` setters.
#[derive(Getters, CopyGetters, Debug)]
pub struct Xmtr {
    /// Emitter role.
    #[getset(get_copy = "pub")]
    function: XmtrFunction,
    /// The antenna mount, possibly shared with a linked receiver.
    #[getset(get = "pub")]
    antenna: Arc<Antenna>,
    /// Per-polarization gain patterns.
    #[getset(get = "pub")]
    patterns: PatternMap,
    /// Transmit polarization.
    #[getset(get_copy = "pub")]
    polarization: Polarization,
    /// Carrier frequency.
    #[getset(get_copy = "pub")]
    frequency: Freq<f64>,
    /// Emission bandwidth.
    #[getset(get_copy = "pub")]
    bandwidth: Freq<f64>,
    /// Power schedule.
    #[getset(get = "pub")]
    power: PowerSchedule,
    /// Pulse width \[s\]; `None` for continuous wave.
    #[getset(get_copy = "pub")]
    pulse_width: Option<f64>,
    /// PRF schedule.
    #[getset(get = "pub")]
    prfs: PrfSchedule,
    /// Explicit duty cycle; derived from pulse width × average PRF when unset.
    explicit_duty_cycle: Option<f64>,
    /// Pulse-compression ratio (linear, ≥ 1).
    #[getset(get_copy = "pub")]
    pulse_compression_ratio: Ratio,
    /// Wall time the current transmission ends, for bursty comm.
    #[getset(get_copy = "pub")]
    transmission_end_time: Option<f64>,
    /// Monostatic partner, sharing this antenna.
    #[getset(get_copy = "pub")]
    linked_rcvr: Option<RcvrId>,
    allow_zero_frequency: bool,
}

impl Xmtr {
    /// Creates a continuous-wave transmitter with default polarization.
    #[must_use]
    pub fn new(
        function: XmtrFunction,
        antenna: Arc<Antenna>,
        pattern: Arc<dyn AntennaPattern>,
        frequency: Freq<f64>,
        power: Power,
    ) -> Self {
        Self {
            function,
            antenna,
            patterns: PatternMap::new(pattern),
            polarization: Polarization::Default,
            frequency,
            bandwidth: Freq::ZERO,
            power: PowerSchedule::nominal(power),
            pulse_width: None,
            prfs: PrfSchedule::default(),
            explicit_duty_cycle: None,
            pulse_compression_ratio: Ratio::ONE,
            transmission_end_time: None,
            linked_rcvr: None,
            allow_zero_frequency: false,
        }
    }

    /// Sets the transmit polarization.
    #[must_use]
    pub fn with_polarization(mut self, polarization: Polarization) -> Self {
        self.polarization = polarization;
        self
    }

    /// Sets the emission bandwidth.
    #[must_use]
    pub fn with_bandwidth(mut self, bandwidth: Freq<f64>) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    /// Sets pulse width and PRF schedule.
    #[must_use]
    pub fn with_pulse(mut self, pulse_width: f64, prfs: PrfSchedule) -> Self {
        self.pulse_width = Some(pulse_width);
        self.prfs = prfs;
        self
    }

    /// Sets an explicit duty cycle.
    #[must_use]
    pub fn with_duty_cycle(mut self, duty_cycle: f64) -> Self {
        self.explicit_duty_cycle = Some(duty_cycle);
        self
    }

    /// Sets the pulse-compression ratio.
    #[must_use]
    pub fn with_pulse_compression(mut self, ratio: Ratio) -> Self {
        self.pulse_compression_ratio = ratio;
        self
    }

    /// Replaces the power schedule.
    #[must_use]
    pub fn with_power_schedule(mut self, power: PowerSchedule) -> Self {
        self.power = power;
        self
    }

    /// Permits a zero carrier frequency (diagnostic patterns only).
    #[must_use]
    pub fn allowing_zero_frequency(mut self) -> Self {
        self.allow_zero_frequency = true;
        self
    }

    /// Keys an additional pattern to a polarization.
    #[must_use]
    pub fn with_pattern(
        mut self,
        polarization: Polarization,
        pattern: Arc<dyn AntennaPattern>,
    ) -> Self {
        self.patterns.insert(polarization, pattern);
        self
    }

    /// Checks the transmitter invariants.
    pub fn validate(&self) -> Result<(), RadioError> {
        if self.frequency.hz() < 0.0 || (self.frequency.hz() == 0.0 && !self.allow_zero_frequency)
        {
            return Err(RadioError::InvalidFrequency(self.frequency.hz()));
        }
        if self.power.nominal.watts() < 0.0 {
            return Err(RadioError::InvalidPower(self.power.nominal.watts()));
        }
        if let Some(d) = self.explicit_duty_cycle {
            if !(0.0..=1.0).contains(&d) {
                return Err(RadioError::InvalidDutyCycle(d));
            }
        }
        if let Some(pw) = self.pulse_width {
            let duty = pw * self.prfs.max();
            if duty > 1.0 + 1e-12 {
                return Err(RadioError::PulseWidthPrfConflict(duty));
            }
        }
        Ok(())
    }

    /// Duty cycle: explicit, else pulse width × average PRF, else 1 (CW).
    #[must_use]
    pub fn duty_cycle(&self) -> f64 {
        self.explicit_duty_cycle.unwrap_or_else(|| {
            self.pulse_width
                .map_or(1.0, |pw| (pw * self.prfs.average()).min(1.0))
        })
    }

    /// Pulse repetition interval of the indexed PRF \[s\].
    pub fn pri(&self, index: usize) -> Result<f64, RadioError> {
        Ok(1.0 / self.prfs.get(index)?)
    }

    /// Peak power at the current carrier.
    #[must_use]
    pub fn peak_power(&self) -> Power {
        self.power.power_at(self.frequency)
    }

    /// The pattern serving the current polarization.
    #[must_use]
    pub fn pattern(&self) -> &Arc<dyn AntennaPattern> {
        self.patterns.pattern(self.polarization)
    }

    /// Radiated power `P_t · G_t · L_ebs` for a looked-up gain and
    /// beam-steering loss.
    #[must_use]
    pub fn radiated_power(&self, gain: Ratio, steering_loss: Ratio) -> Power {
        self.peak_power() * gain * steering_loss
    }

    /// Matched-filter bandwidth implied by the (compressed) pulse \[Hz\].
    ///
    /// CW emissions fall back to the configured bandwidth.
    #[must_use]
    pub fn matched_bandwidth(&self) -> Freq<f64> {
        match self.pulse_width {
            Some(pw) if pw > 0.0 => {
                (self.pulse_compression_ratio.linear() / pw) * crate::common::Hz
            }
            _ => self.bandwidth,
        }
    }

    /// Retunes the carrier. Callers go through the manager so listeners fire.
    pub fn set_frequency(&mut self, frequency: Freq<f64>) {
        self.frequency = frequency;
    }

    /// Changes the nominal power.
    pub fn set_power(&mut self, power: Power) {
        self.power.nominal = power;
    }

    /// Changes the polarization.
    pub fn set_polarization(&mut self, polarization: Polarization) {
        self.polarization = polarization;
    }

    /// Schedules the end of the current transmission.
    pub fn set_transmission_end_time(&mut self, time: Option<f64>) {
        self.transmission_end_time = time;
    }

    /// Links the monostatic partner receiver.
    pub fn set_linked_rcvr(&mut self, rcvr: Option<RcvrId>) {
        self.linked_rcvr = rcvr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{deg, GHz, Hz, MHz, kW, W};
    use crate::geometry::{Geodetic, Vector3};
    use crate::pattern::Uniform;
    use crate::platform::tests::TestPlatform;
    use crate::platform::ArticulatedPart;

    fn antenna() -> Arc<Antenna> {
        let platform = Arc::new(TestPlatform::at(Geodetic::new(
            0.0 * deg,
            0.0 * deg,
            100.0,
        )));
        Arc::new(Antenna::new(Arc::new(ArticulatedPart::new(
            platform,
            Vector3::zeros(),
        ))))
    }

    fn xmtr() -> Xmtr {
        Xmtr::new(
            XmtrFunction::Sensor,
            antenna(),
            Arc::new(Uniform::isotropic()),
            3.0 * GHz,
            10.0 * kW,
        )
    }

    #[test]
    fn validates_pulse_and_duty() {
        assert!(xmtr().validate().is_ok());
        assert!(xmtr()
            .with_pulse(1e-3, PrfSchedule::single(2_000.0))
            .validate()
            .is_err());
        assert!(xmtr().with_duty_cycle(1.5).validate().is_err());
        assert!(Xmtr::new(
            XmtrFunction::Comm,
            antenna(),
            Arc::new(Uniform::isotropic()),
            Freq::ZERO,
            1.0 * W,
        )
        .validate()
        .is_err());
    }

    #[test]
    fn duty_cycle_derives_from_pulse() {
        let x = xmtr().with_pulse(1e-6, PrfSchedule::single(1_000.0));
        approx::assert_abs_diff_eq!(x.duty_cycle(), 1e-3, epsilon = 1e-15);
        approx::assert_abs_diff_eq!(x.pri(0).unwrap(), 1e-3, epsilon = 1e-15);
        assert!(x.pri(1).is_err());
    }

    #[test]
    fn power_schedule_overrides_by_frequency() {
        let x = xmtr().with_power_schedule(
            PowerSchedule::nominal(10.0 * kW).with_override(3.5 * GHz, 5.0 * kW),
        );
        approx::assert_abs_diff_eq!(x.peak_power().watts(), 10_000.0);
        let mut x = x;
        x.set_frequency(3.5 * GHz);
        approx::assert_abs_diff_eq!(x.peak_power().watts(), 5_000.0);
    }

    #[test]
    fn matched_bandwidth_from_compressed_pulse() {
        let x = xmtr()
            .with_pulse(10e-6, PrfSchedule::single(1_000.0))
            .with_pulse_compression(Ratio::from_linear(100.0));
        approx::assert_relative_eq!(
            x.matched_bandwidth().hz(),
            (10.0 * MHz).hz(),
            max_relative = 1e-12
        );
        let cw = xmtr().with_bandwidth(1e6 * Hz);
        approx::assert_abs_diff_eq!(cw.matched_bandwidth().hz(), 1e6);
    }

    #[test]
    fn radiated_power_applies_gain_and_steering() {
        let x = xmtr();
        let p = x.radiated_power(Ratio::from_linear(100.0), Ratio::from_linear(0.5));
        approx::assert_abs_diff_eq!(p.watts(), 500_000.0);
    }
}
