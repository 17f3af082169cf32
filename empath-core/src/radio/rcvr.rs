use std::sync::Arc;

use getset::{CopyGetters, Getters};

use crate::antenna::Antenna;
use crate::common::{
    Angle, Freq, Power, Ratio, BOLTZMANN_CONSTANT, REFERENCE_TEMPERATURE,
};
use crate::error::RadioError;
use crate::manager::XmtrId;
use crate::pattern::AntennaPattern;

use super::{PatternMap, Polarization, PolarizationTable};

/// What role a receiver plays.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RcvrFunction {
    /// Communications receiver.
    Comm,
    /// Active-sensor receiver.
    Sensor,
    /// Passive listener (ESM/RWR).
    PassiveSensor,
    /// Interference monitor.
    Interferer,
}

/// A receiver: one antenna, per-polarization patterns, and the noise and
/// loss budget of the receive chain.
#[derive(Getters, CopyGetters, Debug)]
pub struct Rcvr {
    /// Receiver role.
    #[getset(get_copy = "pub")]
    function: RcvrFunction,
    /// The antenna mount, possibly shared with a linked transmitter.
    #[getset(get = "pub")]
    antenna: Arc<Antenna>,
    /// Per-polarization gain patterns.
    #[getset(get = "pub")]
    patterns: PatternMap,
    /// Receive polarization.
    #[getset(get_copy = "pub")]
    polarization: Polarization,
    /// Tuned center frequency.
    #[getset(get_copy = "pub")]
    frequency: Freq<f64>,
    /// Instantaneous bandwidth.
    #[getset(get_copy = "pub")]
    bandwidth: Freq<f64>,
    /// Noise figure (linear, ≥ 1).
    #[getset(get_copy = "pub")]
    noise_figure: Ratio,
    /// Explicit noise power; derived as kT₀BF when unset.
    explicit_noise_power: Option<Power>,
    /// Antenna ohmic loss (linear, ≥ 1).
    #[getset(get_copy = "pub")]
    antenna_ohmic_loss: Ratio,
    /// Receive-line loss (linear, ≥ 1).
    #[getset(get_copy = "pub")]
    receive_line_loss: Ratio,
    /// Detection threshold (linear SNR).
    #[getset(get_copy = "pub")]
    detection_threshold: Ratio,
    /// Transmit×receive polarization coupling.
    #[getset(get = "pub")]
    polarization_table: PolarizationTable,
    /// Monostatic partner, sharing this antenna.
    #[getset(get_copy = "pub")]
    linked_xmtr: Option<XmtrId>,
}

impl Rcvr {
    /// Creates a receiver with default polarization, unity noise figure and
    /// losses, and a 0 dB detection threshold.
    #[must_use]
    pub fn new(
        function: RcvrFunction,
        antenna: Arc<Antenna>,
        pattern: Arc<dyn AntennaPattern>,
        frequency: Freq<f64>,
        bandwidth: Freq<f64>,
    ) -> Self {
        Self {
            function,
            antenna,
            patterns: PatternMap::new(pattern),
            polarization: Polarization::Default,
            frequency,
            bandwidth,
            noise_figure: Ratio::ONE,
            explicit_noise_power: None,
            antenna_ohmic_loss: Ratio::ONE,
            receive_line_loss: Ratio::ONE,
            detection_threshold: Ratio::ONE,
            polarization_table: PolarizationTable::new(),
            linked_xmtr: None,
        }
    }

    /// Sets the receive polarization.
    #[must_use]
    pub fn with_polarization(mut self, polarization: Polarization) -> Self {
        self.polarization = polarization;
        self
    }

    /// Sets the noise figure.
    #[must_use]
    pub fn with_noise_figure(mut self, noise_figure: Ratio) -> Self {
        self.noise_figure = noise_figure;
        self
    }

    /// Sets an explicit noise power, overriding the kT₀BF derivation.
    #[must_use]
    pub fn with_noise_power(mut self, noise_power: Power) -> Self {
        self.explicit_noise_power = Some(noise_power);
        self
    }

    /// Sets the antenna ohmic and receive-line losses.
    #[must_use]
    pub fn with_losses(mut self, antenna_ohmic: Ratio, receive_line: Ratio) -> Self {
        self.antenna_ohmic_loss = antenna_ohmic;
        self.receive_line_loss = receive_line;
        self
    }

    /// Sets the detection threshold.
    #[must_use]
    pub fn with_detection_threshold(mut self, threshold: Ratio) -> Self {
        self.detection_threshold = threshold;
        self
    }

    /// Replaces the polarization coupling table.
    #[must_use]
    pub fn with_polarization_table(mut self, table: PolarizationTable) -> Self {
        self.polarization_table = table;
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

    /// Checks the receiver invariants.
    pub fn validate(&self) -> Result<(), RadioError> {
        if self.frequency.hz() <= 0.0 {
            return Err(RadioError::InvalidFrequency(self.frequency.hz()));
        }
        if self.bandwidth.hz() <= 0.0 {
            return Err(RadioError::InvalidBandwidth(self.bandwidth.hz()));
        }
        if self.noise_figure.linear() < 1.0 {
            return Err(RadioError::InvalidNoiseFigure(self.noise_figure.linear()));
        }
        for (name, loss) in [
            ("antenna ohmic loss", self.antenna_ohmic_loss),
            ("receive line loss", self.receive_line_loss),
        ] {
            if loss.linear() < 1.0 {
                return Err(RadioError::InvalidLoss {
                    name,
                    value: loss.linear(),
                });
            }
        }
        Ok(())
    }

    /// Aggregate receive loss: antenna ohmic × receive line.
    #[must_use]
    pub fn receive_loss(&self) -> Ratio {
        self.antenna_ohmic_loss * self.receive_line_loss
    }

    /// The pattern serving the current polarization.
    #[must_use]
    pub fn pattern(&self) -> &Arc<dyn AntennaPattern> {
        self.patterns.pattern(self.polarization)
    }

    /// Receiver noise power at a level beam.
    #[must_use]
    pub fn noise_power(&self) -> Power {
        self.noise_power_at(Angle::ZERO)
    }

    /// Receiver noise power with the beam at `elevation`.
    ///
    /// Explicit noise wins. Otherwise `N = k·B·(T_ant(el) + (F−1)·T₀)`,
    /// where the antenna temperature falls off from T₀ at the horizon
    /// toward the cold-sky floor at zenith. At zero elevation this is
    /// exactly kT₀BF.
    #[must_use]
    pub fn noise_power_at(&self, elevation: Angle) -> Power {
        if let Some(n) = self.explicit_noise_power {
            return n;
        }
        let t_ant = antenna_temperature(elevation);
        let t_sys = t_ant + (self.noise_figure.linear() - 1.0) * REFERENCE_TEMPERATURE;
        Power::from_watts(BOLTZMANN_CONSTANT * t_sys * self.bandwidth.hz())
    }

    /// Received power from flux density `S` at the antenna:
    /// `S · (λ²/4π) · G_r · L_ebs · X_pol / L_rcv`, with λ from the tuned
    /// frequency.
    #[must_use]
    pub fn received_power(
        &self,
        flux_density: f64,
        gain: Ratio,
        steering_loss: Ratio,
        transmit_polarization: Polarization,
    ) -> Power {
        let wavelength = self.frequency.wavelength();
        let aperture = wavelength * wavelength / (4.0 * std::f64::consts::PI);
        let x_pol = self
            .polarization_table
            .factor(transmit_polarization, self.polarization);
        Power::from_watts(flux_density * aperture)
            * gain
            * steering_loss
            * x_pol
            / self.receive_loss()
    }

    /// Fraction of a signal's power this receiver passes, from passband
    /// overlap: zero for disjoint passbands, `min(BW_sig, BW_rcv)/BW_sig`
    /// when centered, shrinking with frequency offset.
    #[must_use]
    pub fn bandwidth_overlap(&self, signal_frequency: Freq<f64>, signal_bandwidth: Freq<f64>) -> f64 {
        let sig_bw = signal_bandwidth.hz().max(1e-9);
        let sig_lo = signal_frequency.hz() - sig_bw / 2.0;
        let sig_hi = signal_frequency.hz() + sig_bw / 2.0;
        let rcv_lo = self.frequency.hz() - self.bandwidth.hz() / 2.0;
        let rcv_hi = self.frequency.hz() + self.bandwidth.hz() / 2.0;
        let overlap = sig_hi.min(rcv_hi) - sig_lo.max(rcv_lo);
        (overlap / sig_bw).clamp(0.0, 1.0)
    }

    /// Links the monostatic partner transmitter.
    pub fn set_linked_xmtr(&mut self, xmtr: Option<XmtrId>) {
        self.linked_xmtr = xmtr;
    }

    /// Retunes the receiver center frequency.
    pub fn set_frequency(&mut self, frequency: Freq<f64>) {
        self.frequency = frequency;
    }

    /// Changes the detection threshold.
    pub fn set_detection_threshold(&mut self, threshold: Ratio) {
        self.detection_threshold = threshold;
    }
}

/// Sky-noise antenna temperature \[K\]: T₀ at and below the horizon,
/// decaying toward a cold-sky floor as the beam rises.
fn antenna_temperature(elevation: Angle) -> f64 {
    const COLD_SKY: f64 = 30.0;
    let el = elevation.radian();
    if el <= 0.0 {
        REFERENCE_TEMPERATURE
    } else {
        COLD_SKY + (REFERENCE_TEMPERATURE - COLD_SKY) * (-el / 0.15).exp()
    }
}
