mod data;
mod status;

pub use data::{BeamData, LocationData, RelativeData};
pub use status::{InteractionStatus, EXTENSION_BASE};

use getset::CopyGetters;

use crate::common::{Angle, Power, Ratio};
use crate::environment::Environment;
use crate::geometry::{
    azimuth_elevation_of, horizon_masked, line_of_sight, terrain_masked, Point3, UnitQuaternion,
    Vector3, TERRAIN_PROFILE_STEP,
};
use crate::model::{Attenuation, Propagation, SignalPath};
use crate::platform::{Platform, SignatureKind};
use crate::radio::{Rcvr, Xmtr};

/// Where an interaction attempt stands in its lifecycle.
///
/// The record is printable in any state; early states simply carry less.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InteractionState {
    /// Freshly created or reset.
    #[default]
    Uninitialized,
    /// An entry point resolved the geometry and ran its gates.
    GeometryKnown,
    /// At least one beam has been pointed.
    BeamsSet,
    /// The power budget is computed.
    PowerValid,
}

/// One transmitter-target-receiver interaction attempt.
///
/// A value object: entry points resolve geometry and run the cheap gates in
/// a fixed order, the caller points beams and computes power, then the
/// signal-level and terrain gates run last. Every gate records itself in
/// `checked` and failures in `failed`; the attempt short-circuits on the
/// first failure with the remaining geometry backfilled for observers.
#[derive(CopyGetters, Debug)]
pub struct Interaction {
    /// Lifecycle state.
    #[getset(get_copy = "pub")]
    state: InteractionState,
    /// Gates that ran.
    #[getset(get_copy = "pub")]
    checked: InteractionStatus,
    /// Gates that rejected the attempt.
    #[getset(get_copy = "pub")]
    failed: InteractionStatus,
    /// Effective-earth-radius scale factor for refraction and horizon.
    #[getset(get_copy = "pub")]
    earth_radius_scale: f64,
    /// Obscuration multiplier in `[0, 1]`, applied to the power budget.
    #[getset(get_copy = "pub")]
    masking_factor: f64,
    /// Whether Doppler ignores the sensing platform's own motion.
    #[getset(get_copy = "pub")]
    filter_ownship: bool,

    /// Transmitter antenna position.
    #[getset(get_copy = "pub")]
    xmtr_location: LocationData,
    /// Receiver antenna position.
    #[getset(get_copy = "pub")]
    rcvr_location: LocationData,
    /// Target position.
    #[getset(get_copy = "pub")]
    tgt_location: LocationData,
    /// Reflection point of an over-the-horizon attempt.
    #[getset(get_copy = "pub")]
    reflection: Option<LocationData>,

    /// Transmitter line of sight to the target.
    #[getset(get_copy = "pub")]
    xmtr_to_tgt: Option<RelativeData>,
    /// Receiver line of sight to the target.
    #[getset(get_copy = "pub")]
    rcvr_to_tgt: Option<RelativeData>,
    /// Transmitter line of sight to the receiver (one-way pairs).
    #[getset(get_copy = "pub")]
    xmtr_to_rcvr: Option<RelativeData>,
    /// Receiver line of sight to the transmitter (one-way pairs).
    #[getset(get_copy = "pub")]
    rcvr_to_xmtr: Option<RelativeData>,

    /// Pointed transmit beam.
    #[getset(get_copy = "pub")]
    xmtr_beam: Option<BeamData>,
    /// Pointed receive beam.
    #[getset(get_copy = "pub")]
    rcvr_beam: Option<BeamData>,

    /// Radiated power, gain and steering loss included.
    #[getset(get_copy = "pub")]
    transmitted_power: Power,
    /// Power density at the target (or receiver, one-way) \[W/m²\].
    #[getset(get_copy = "pub")]
    power_density: f64,
    /// Power at the receiver output.
    #[getset(get_copy = "pub")]
    received_power: Power,
    /// Receiver noise power for this beam elevation.
    #[getset(get_copy = "pub")]
    noise_power: Power,
    /// Surface clutter power competing with the signal.
    #[getset(get_copy = "pub")]
    clutter_power: Power,
    /// Accumulated interference power in the receiver passband.
    #[getset(get_copy = "pub")]
    interference_power: Power,
    /// Accumulated interference effect weight.
    #[getset(get_copy = "pub")]
    interference_factor: f64,
    /// Pattern-propagation factor over the path: F⁴ for one-way, the
    /// per-leg product `√F₁⁴·√F₂⁴` for two-way.
    #[getset(get_copy = "pub")]
    propagation_factor: f64,
    /// Atmospheric transmission factor over the full path, in `[0, 1]`.
    #[getset(get_copy = "pub")]
    absorption: Ratio,
    /// Target radar cross section used \[m²\].
    #[getset(get_copy = "pub")]
    radar_signature: f64,
    /// Target-body azimuth the signature was evaluated at.
    #[getset(get_copy = "pub")]
    signature_azimuth: Angle,
    /// Target-body elevation the signature was evaluated at.
    #[getset(get_copy = "pub")]
    signature_elevation: Angle,
    /// Pixels on target, for optical collaborators.
    #[getset(get_copy = "pub")]
    pixel_count: f64,
    /// Doppler shift at the receiver \[Hz\], closing positive.
    #[getset(get_copy = "pub")]
    doppler: f64,
}

impl Interaction {
    /// A fresh attempt under the given refraction scale factor.
    #[must_use]
    pub fn new(earth_radius_scale: f64) -> Self {
        Self {
            state: InteractionState::Uninitialized,
            checked: InteractionStatus::empty(),
            failed: InteractionStatus::empty(),
            earth_radius_scale,
            masking_factor: 1.0,
            filter_ownship: false,
            xmtr_location: LocationData::invalid(),
            rcvr_location: LocationData::invalid(),
            tgt_location: LocationData::invalid(),
            reflection: None,
            xmtr_to_tgt: None,
            rcvr_to_tgt: None,
            xmtr_to_rcvr: None,
            rcvr_to_xmtr: None,
            xmtr_beam: None,
            rcvr_beam: None,
            transmitted_power: Power::ZERO,
            power_density: 0.0,
            received_power: Power::ZERO,
            noise_power: Power::ZERO,
            clutter_power: Power::ZERO,
            interference_power: Power::ZERO,
            interference_factor: 0.0,
            propagation_factor: 1.0,
            absorption: Ratio::ONE,
            radar_signature: 0.0,
            signature_azimuth: Angle::ZERO,
            signature_elevation: Angle::ZERO,
            pixel_count: 0.0,
            doppler: 0.0,
        }
    }

    /// Whether every gate that ran passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failed.is_empty()
    }

    /// Signal-to-interference ratio: `P_r / (N + C + I)`.
    #[must_use]
    pub fn snr(&self) -> Ratio {
        let denom = self.noise_power + self.clutter_power + self.interference_power;
        if denom.watts() <= 0.0 {
            return Ratio::ZERO;
        }
        self.received_power / denom
    }

    /// Sets the obscuration multiplier checked by the masking gate.
    pub fn set_masking_factor(&mut self, factor: f64) {
        self.masking_factor = factor.clamp(0.0, 1.0);
    }

    /// Sets whether Doppler ignores ownship motion.
    pub fn set_filter_ownship(&mut self, filter: bool) {
        self.filter_ownship = filter;
    }

    /// Stores the clutter power the sensor computed for this attempt.
    pub fn set_clutter_power(&mut self, power: Power) {
        self.clutter_power = power;
    }

    /// Stores the pixels-on-target count.
    pub fn set_pixel_count(&mut self, count: f64) {
        self.pixel_count = count;
    }

    /// Accumulates one interferer's contribution, weighted by its passband
    /// overlap and effect factor.
    pub fn add_interference(&mut self, power: Power, bandwidth_overlap: f64, effect_factor: f64) {
        let weight = bandwidth_overlap * effect_factor;
        self.interference_power += power * weight;
        self.interference_factor += weight;
    }

    fn reset(&mut self) {
        let k = self.earth_radius_scale;
        let masking = self.masking_factor;
        let filter = self.filter_ownship;
        *self = Self::new(k);
        self.masking_factor = masking;
        self.filter_ownship = filter;
    }

    fn gate(&mut self, bit: InteractionStatus, pass: bool) -> bool {
        self.checked.insert(bit);
        if !pass {
            self.failed.insert(bit);
        }
        pass
    }

    /// Receiver-only geometry toward a target: receiver range, altitude and
    /// angle gates, then the receiver horizon and masking-factor gates.
    pub fn begin_one_way(&mut self, rcvr: &Rcvr, target: &dyn Platform) -> InteractionStatus {
        self.reset();
        self.rcvr_location = LocationData::from_wcs(rcvr.antenna().location_wcs());
        self.tgt_location = LocationData::from_wcs(target.location_wcs());
        self.state = InteractionState::GeometryKnown;

        if !self.rcvr_gates_toward_target(rcvr) {
            return self.checked;
        }
        let masked = horizon_masked(
            &self.rcvr_location.geodetic,
            &self.tgt_location.geodetic,
            self.earth_radius_scale,
        );
        if !self.gate(InteractionStatus::RCVR_HORIZON_MASKING, !masked) {
            return self.checked;
        }
        self.gate(InteractionStatus::MASKING_FACTOR, self.masking_factor > 0.0);
        self.checked
    }

    /// Direct transmitter-to-receiver geometry (comms, ESM, interference).
    ///
    /// The booleans select which endpoint limit gates run; the horizon gates
    /// always run.
    pub fn begin_one_way_xr(
        &mut self,
        xmtr: &Xmtr,
        rcvr: &Rcvr,
        check_xmtr_limits: bool,
        check_rcvr_limits: bool,
        check_masking: bool,
    ) -> InteractionStatus {
        self.reset();
        self.xmtr_location = LocationData::from_wcs(xmtr.antenna().location_wcs());
        self.rcvr_location = LocationData::from_wcs(rcvr.antenna().location_wcs());
        let k = self.earth_radius_scale;
        let rel_rx = rcvr
            .antenna()
            .relative_state_of(&self.xmtr_location.wcs, k);
        let rel_xr = xmtr
            .antenna()
            .relative_state_of(&self.rcvr_location.wcs, k);
        self.rcvr_to_xmtr = Some(rel_rx);
        self.xmtr_to_rcvr = Some(rel_xr);
        self.state = InteractionState::GeometryKnown;

        if check_rcvr_limits {
            let alt = self.xmtr_location.geodetic.alt;
            if !self.endpoint_gates(
                rcvr.antenna(),
                &rel_rx,
                alt,
                InteractionStatus::RCVR_RANGE_LIMITS,
                InteractionStatus::RCVR_ALTITUDE_LIMITS,
                InteractionStatus::RCVR_ANGLE_LIMITS,
            ) {
                return self.checked;
            }
        }
        if check_xmtr_limits {
            let alt = self.rcvr_location.geodetic.alt;
            if !self.endpoint_gates(
                xmtr.antenna(),
                &rel_xr,
                alt,
                InteractionStatus::XMTR_RANGE_LIMITS,
                InteractionStatus::XMTR_ALTITUDE_LIMITS,
                InteractionStatus::XMTR_ANGLE_LIMITS,
            ) {
                return self.checked;
            }
        }
        let masked = horizon_masked(&self.rcvr_location.geodetic, &self.xmtr_location.geodetic, k);
        if !self.gate(InteractionStatus::RCVR_HORIZON_MASKING, !masked) {
            return self.checked;
        }
        if check_masking {
            self.gate(InteractionStatus::MASKING_FACTOR, self.masking_factor > 0.0);
        }
        self.checked
    }

    /// Full two-way geometry: receiver gates, transmitter gates, both
    /// horizons, then the masking factor, short-circuiting in that order.
    pub fn begin_two_way(
        &mut self,
        xmtr: &Xmtr,
        target: &dyn Platform,
        rcvr: &Rcvr,
    ) -> InteractionStatus {
        self.reset();
        self.xmtr_location = LocationData::from_wcs(xmtr.antenna().location_wcs());
        self.rcvr_location = LocationData::from_wcs(rcvr.antenna().location_wcs());
        self.tgt_location = LocationData::from_wcs(target.location_wcs());
        self.state = InteractionState::GeometryKnown;

        if !self.rcvr_gates_toward_target(rcvr) {
            return self.abandon(Some(xmtr));
        }
        let rel_x = xmtr
            .antenna()
            .relative_state_of(&self.tgt_location.wcs, self.earth_radius_scale);
        self.xmtr_to_tgt = Some(rel_x);
        let alt = self.tgt_location.geodetic.alt;
        if !self.endpoint_gates(
            xmtr.antenna(),
            &rel_x,
            alt,
            InteractionStatus::XMTR_RANGE_LIMITS,
            InteractionStatus::XMTR_ALTITUDE_LIMITS,
            InteractionStatus::XMTR_ANGLE_LIMITS,
        ) {
            return self.checked;
        }
        let k = self.earth_radius_scale;
        let rcvr_masked =
            horizon_masked(&self.rcvr_location.geodetic, &self.tgt_location.geodetic, k);
        if !self.gate(InteractionStatus::RCVR_HORIZON_MASKING, !rcvr_masked) {
            return self.checked;
        }
        let xmtr_masked =
            horizon_masked(&self.xmtr_location.geodetic, &self.tgt_location.geodetic, k);
        if !self.gate(InteractionStatus::XMTR_HORIZON_MASKING, !xmtr_masked) {
            return self.checked;
        }
        self.gate(InteractionStatus::MASKING_FACTOR, self.masking_factor > 0.0);
        self.checked
    }

    /// Two-way geometry through a given reflection point.
    ///
    /// Pointing is toward the reflection, ranges are leg sums, and the
    /// horizon gates check each leg against the reflection point instead of
    /// the direct path.
    pub fn begin_two_way_oth(
        &mut self,
        xmtr: &Xmtr,
        target: &dyn Platform,
        rcvr: &Rcvr,
        reflection_wcs: Point3,
    ) -> InteractionStatus {
        self.reset();
        self.xmtr_location = LocationData::from_wcs(xmtr.antenna().location_wcs());
        self.rcvr_location = LocationData::from_wcs(rcvr.antenna().location_wcs());
        self.tgt_location = LocationData::from_wcs(target.location_wcs());
        let refl = LocationData::from_wcs(reflection_wcs);
        self.reflection = Some(refl);
        self.state = InteractionState::GeometryKnown;

        let k = self.earth_radius_scale;
        let (_, refl_to_tgt) = line_of_sight(&refl.wcs, &self.tgt_location.wcs);
        let mut rel_r = rcvr.antenna().relative_state_of(&refl.wcs, k);
        rel_r.range += refl_to_tgt;
        self.rcvr_to_tgt = Some(rel_r);
        let alt = self.tgt_location.geodetic.alt;
        if !self.endpoint_gates(
            rcvr.antenna(),
            &rel_r,
            alt,
            InteractionStatus::RCVR_RANGE_LIMITS,
            InteractionStatus::RCVR_ALTITUDE_LIMITS,
            InteractionStatus::RCVR_ANGLE_LIMITS,
        ) {
            return self.abandon(Some(xmtr));
        }
        let mut rel_x = xmtr.antenna().relative_state_of(&refl.wcs, k);
        rel_x.range += refl_to_tgt;
        self.xmtr_to_tgt = Some(rel_x);
        if !self.endpoint_gates(
            xmtr.antenna(),
            &rel_x,
            alt,
            InteractionStatus::XMTR_RANGE_LIMITS,
            InteractionStatus::XMTR_ALTITUDE_LIMITS,
            InteractionStatus::XMTR_ANGLE_LIMITS,
        ) {
            return self.checked;
        }
        let rcvr_masked = horizon_masked(&self.rcvr_location.geodetic, &refl.geodetic, k)
            || horizon_masked(&refl.geodetic, &self.tgt_location.geodetic, k);
        if !self.gate(InteractionStatus::RCVR_HORIZON_MASKING, !rcvr_masked) {
            return self.checked;
        }
        let xmtr_masked = horizon_masked(&self.xmtr_location.geodetic, &refl.geodetic, k)
            || horizon_masked(&refl.geodetic, &self.tgt_location.geodetic, k);
        if !self.gate(InteractionStatus::XMTR_HORIZON_MASKING, !xmtr_masked) {
            return self.checked;
        }
        self.gate(InteractionStatus::MASKING_FACTOR, self.masking_factor > 0.0);
        self.checked
    }

    /// Geometry with no gates at all, for diagnostics and plotting paths.
    pub fn begin_generic(
        &mut self,
        xmtr: &Xmtr,
        target: &dyn Platform,
        rcvr: &Rcvr,
    ) -> InteractionStatus {
        self.reset();
        self.xmtr_location = LocationData::from_wcs(xmtr.antenna().location_wcs());
        self.rcvr_location = LocationData::from_wcs(rcvr.antenna().location_wcs());
        self.tgt_location = LocationData::from_wcs(target.location_wcs());
        let k = self.earth_radius_scale;
        self.rcvr_to_tgt = Some(rcvr.antenna().relative_state_of(&self.tgt_location.wcs, k));
        self.xmtr_to_tgt = Some(xmtr.antenna().relative_state_of(&self.tgt_location.wcs, k));
        self.state = InteractionState::GeometryKnown;
        self.checked
    }

    fn rcvr_gates_toward_target(&mut self, rcvr: &Rcvr) -> bool {
        let rel = rcvr
            .antenna()
            .relative_state_of(&self.tgt_location.wcs, self.earth_radius_scale);
        self.rcvr_to_tgt = Some(rel);
        let alt = self.tgt_location.geodetic.alt;
        self.endpoint_gates(
            rcvr.antenna(),
            &rel,
            alt,
            InteractionStatus::RCVR_RANGE_LIMITS,
            InteractionStatus::RCVR_ALTITUDE_LIMITS,
            InteractionStatus::RCVR_ANGLE_LIMITS,
        )
    }

    fn endpoint_gates(
        &mut self,
        antenna: &crate::antenna::Antenna,
        rel: &RelativeData,
        target_alt: f64,
        range_bit: InteractionStatus,
        alt_bit: InteractionStatus,
        angle_bit: InteractionStatus,
    ) -> bool {
        if !self.gate(range_bit, antenna.check_range(rel.range)) {
            return false;
        }
        if !self.gate(alt_bit, antenna.check_altitude(target_alt)) {
            return false;
        }
        self.gate(
            angle_bit,
            antenna.check_angle_limits(rel.apparent_azimuth, rel.apparent_elevation),
        )
    }

    fn abandon(&mut self, xmtr: Option<&Xmtr>) -> InteractionStatus {
        self.compute_undefined_geometry(xmtr, None);
        tracing::trace!(failed = ?self.failed, "interaction rejected");
        self.checked
    }

    /// Backfills any relative data an early gate failure skipped so that
    /// observers can print a complete record.
    pub fn compute_undefined_geometry(&mut self, xmtr: Option<&Xmtr>, rcvr: Option<&Rcvr>) {
        if !self.tgt_location.valid {
            return;
        }
        let k = self.earth_radius_scale;
        if let Some(xmtr) = xmtr {
            if self.xmtr_to_tgt.is_none() {
                self.xmtr_to_tgt =
                    Some(xmtr.antenna().relative_state_of(&self.tgt_location.wcs, k));
            }
        }
        if let Some(rcvr) = rcvr {
            if self.rcvr_to_tgt.is_none() {
                self.rcvr_to_tgt =
                    Some(rcvr.antenna().relative_state_of(&self.tgt_location.wcs, k));
            }
        }
    }

    /// Points the transmit beam at the resolved far endpoint and records
    /// the effective gain.
    ///
    /// # Panics
    /// When no entry point has resolved the transmitter geometry.
    pub fn set_transmitter_beam_position(&mut self, xmtr: &Xmtr) {
        let rel = self
            .xmtr_to_tgt
            .or(self.xmtr_to_rcvr)
            .expect("transmitter geometry not resolved");
        self.xmtr_beam = Some(point_beam(
            xmtr.antenna(),
            xmtr.pattern().as_ref(),
            xmtr.frequency(),
            &rel,
        ));
        self.state = InteractionState::BeamsSet;
    }

    /// Points the receive beam at the resolved far endpoint and records the
    /// effective gain.
    ///
    /// # Panics
    /// When no entry point has resolved the receiver geometry.
    pub fn set_receiver_beam_position(&mut self, rcvr: &Rcvr) {
        let rel = self
            .rcvr_to_tgt
            .or(self.rcvr_to_xmtr)
            .expect("receiver geometry not resolved");
        self.rcvr_beam = Some(point_beam(
            rcvr.antenna(),
            rcvr.pattern().as_ref(),
            rcvr.frequency(),
            &rel,
        ));
        self.state = InteractionState::BeamsSet;
    }

    /// One-way power budget from the transmitter to the receiver.
    ///
    /// `P_r = P_t·G_t·α·M/(4πR²) · (λ²/4π)·G_r·X_pol/L_rcv · F² · B_ovl`,
    /// with F² the one-way share of the model's F⁴.
    ///
    /// # Panics
    /// When beams are not set.
    pub fn compute_rf_one_way_power(
        &mut self,
        xmtr: &Xmtr,
        rcvr: &Rcvr,
        env: &Environment,
        attenuation: Option<&dyn Attenuation>,
        propagation: Option<&dyn Propagation>,
    ) -> Power {
        let rel = self
            .rcvr_to_xmtr
            .expect("one-way geometry not resolved");
        let tx_beam = self.xmtr_beam.expect("transmitter beam not set");
        let rx_beam = self.rcvr_beam.expect("receiver beam not set");
        let range = rel.range.max(1e-6);

        self.transmitted_power = xmtr.radiated_power(tx_beam.gain, Ratio::ONE);
        let path = SignalPath::between(
            &self.xmtr_location.geodetic,
            &self.rcvr_location.geodetic,
            xmtr.frequency(),
            self.earth_radius_scale,
        );
        self.absorption = attenuation.map_or(Ratio::ONE, |m| m.compute(&path, env));
        self.propagation_factor = propagation.map_or(1.0, |m| m.propagation_factor(&path, env));

        let spreading = 4.0 * std::f64::consts::PI * range * range;
        self.power_density = self.transmitted_power.watts() * self.absorption.linear()
            / spreading
            * self.masking_factor;
        let overlap = rcvr.bandwidth_overlap(xmtr.frequency(), xmtr.matched_bandwidth());
        self.received_power = rcvr.received_power(
            self.power_density,
            rx_beam.gain,
            Ratio::ONE,
            xmtr.polarization(),
        ) * self.propagation_factor.sqrt()
            * overlap;
        self.noise_power = rcvr.noise_power_at(rel.apparent_elevation);
        self.doppler = self.one_way_doppler(xmtr, rcvr, &rel);
        self.state = InteractionState::PowerValid;
        self.received_power
    }

    /// Two-way power budget off the target's radar signature.
    ///
    /// `P_r = P_t·G_t·α₁·M/(4πR₁²) · σ·α₂/(4πR₂²) · (λ²/4π)·G_r·X_pol/L_rcv
    /// · √F₁⁴·√F₂⁴ · B_ovl`, one pattern-propagation factor per leg.
    ///
    /// # Panics
    /// When beams are not set.
    pub fn compute_rf_two_way_power(
        &mut self,
        xmtr: &Xmtr,
        target: &dyn Platform,
        rcvr: &Rcvr,
        env: &Environment,
        attenuation: Option<&dyn Attenuation>,
        propagation: Option<&dyn Propagation>,
    ) -> Power {
        let rel_x = self.xmtr_to_tgt.expect("transmitter geometry not resolved");
        let rel_r = self.rcvr_to_tgt.expect("receiver geometry not resolved");
        let tx_beam = self.xmtr_beam.expect("transmitter beam not set");
        let rx_beam = self.rcvr_beam.expect("receiver beam not set");
        let r1 = rel_x.range.max(1e-6);
        let r2 = rel_r.range.max(1e-6);

        let (sig_az, sig_el) = self.signature_aspect(target, &self.xmtr_location.wcs);
        self.signature_azimuth = sig_az;
        self.signature_elevation = sig_el;
        self.radar_signature =
            target.signature(SignatureKind::Radar, xmtr.frequency(), sig_az, sig_el);

        self.transmitted_power = xmtr.radiated_power(tx_beam.gain, Ratio::ONE);
        let out = SignalPath::between(
            &self.xmtr_location.geodetic,
            &self.tgt_location.geodetic,
            xmtr.frequency(),
            self.earth_radius_scale,
        );
        let back = SignalPath::between(
            &self.tgt_location.geodetic,
            &self.rcvr_location.geodetic,
            xmtr.frequency(),
            self.earth_radius_scale,
        );
        let alpha_out = attenuation.map_or(Ratio::ONE, |m| m.compute(&out, env));
        let alpha_back = attenuation.map_or(Ratio::ONE, |m| m.compute(&back, env));
        self.absorption = alpha_out * alpha_back;
        // Each leg contributes √F⁴ of its own path; a monostatic geometry
        // recovers the familiar F⁴.
        let f4_out = propagation.map_or(1.0, |m| m.propagation_factor(&out, env));
        let f4_back = propagation.map_or(1.0, |m| m.propagation_factor(&back, env));
        self.propagation_factor = f4_out.sqrt() * f4_back.sqrt();

        let four_pi = 4.0 * std::f64::consts::PI;
        self.power_density = self.transmitted_power.watts() * alpha_out.linear()
            / (four_pi * r1 * r1)
            * self.masking_factor;
        let reflected_density =
            self.power_density * self.radar_signature * alpha_back.linear() / (four_pi * r2 * r2);
        let overlap = rcvr.bandwidth_overlap(xmtr.frequency(), xmtr.matched_bandwidth());
        self.received_power = rcvr.received_power(
            reflected_density,
            rx_beam.gain,
            Ratio::ONE,
            xmtr.polarization(),
        ) * self.propagation_factor
            * overlap;
        self.noise_power = rcvr.noise_power_at(rel_r.apparent_elevation);
        self.doppler = self.two_way_doppler(xmtr, target, rcvr, &rel_x, &rel_r);
        self.state = InteractionState::PowerValid;
        self.received_power
    }

    /// The signal-level gate: SNR against the receiver detection threshold.
    ///
    /// # Panics
    /// When the power budget has not been computed.
    pub fn check_signal_level(&mut self, rcvr: &Rcvr) -> bool {
        assert_eq!(
            self.state,
            InteractionState::PowerValid,
            "signal level checked before the power budget"
        );
        self.gate(
            InteractionStatus::SIGNAL_LEVEL,
            self.snr().linear() >= rcvr.detection_threshold().linear(),
        )
    }

    /// The terrain gates, run last: receiver leg then transmitter leg, each
    /// against its own platform's terrain handle. A missing handle passes.
    pub fn check_terrain(&mut self, xmtr: Option<&Xmtr>, rcvr: Option<&Rcvr>) -> bool {
        let k = self.earth_radius_scale;
        if let Some(rcvr) = rcvr {
            let far = if self.tgt_location.valid {
                self.tgt_location.geodetic
            } else {
                self.xmtr_location.geodetic
            };
            let masked = rcvr
                .antenna()
                .part()
                .platform()
                .terrain()
                .is_some_and(|t| {
                    terrain_masked(t, &self.rcvr_location.geodetic, &far, k, TERRAIN_PROFILE_STEP)
                });
            if !self.gate(InteractionStatus::RCVR_TERRAIN_MASKING, !masked) {
                return false;
            }
        }
        if let Some(xmtr) = xmtr {
            let far = if self.tgt_location.valid {
                self.tgt_location.geodetic
            } else {
                self.rcvr_location.geodetic
            };
            let masked = xmtr
                .antenna()
                .part()
                .platform()
                .terrain()
                .is_some_and(|t| {
                    terrain_masked(t, &self.xmtr_location.geodetic, &far, k, TERRAIN_PROFILE_STEP)
                });
            if !self.gate(InteractionStatus::XMTR_TERRAIN_MASKING, !masked) {
                return false;
            }
        }
        true
    }

    /// Target aspect angles in the target body frame toward `observer`.
    fn signature_aspect(&self, target: &dyn Platform, observer: &Point3) -> (Angle, Angle) {
        let (unit, range) = line_of_sight(&self.tgt_location.wcs, observer);
        if range < 1e-9 {
            return (Angle::ZERO, Angle::ZERO);
        }
        let ned = self.tgt_location.geodetic.wcs_to_ned() * unit.into_inner();
        let body = target.orientation().quaternion().inverse() * ned;
        azimuth_elevation_of(&body)
    }

    fn one_way_doppler(&self, xmtr: &Xmtr, rcvr: &Rcvr, rel: &RelativeData) -> f64 {
        let wavelength = xmtr.frequency().wavelength();
        if !wavelength.is_finite() || wavelength <= 0.0 {
            return 0.0;
        }
        let v_x = xmtr.antenna().part().platform().velocity_wcs();
        let v_r = if self.filter_ownship {
            Vector3::zeros()
        } else {
            rcvr.antenna().part().platform().velocity_wcs()
        };
        // rel points from the receiver toward the transmitter, so the range
        // rate is (v_x - v_r)·û; negate for closing-positive.
        let closing = -(v_x - v_r).dot(&rel.true_unit.into_inner());
        closing / wavelength
    }

    fn two_way_doppler(
        &self,
        xmtr: &Xmtr,
        target: &dyn Platform,
        rcvr: &Rcvr,
        rel_x: &RelativeData,
        rel_r: &RelativeData,
    ) -> f64 {
        let wavelength = xmtr.frequency().wavelength();
        if !wavelength.is_finite() || wavelength <= 0.0 {
            return 0.0;
        }
        let v_tgt = target.velocity_wcs();
        let (v_x, v_r) = if self.filter_ownship {
            (Vector3::zeros(), Vector3::zeros())
        } else {
            (
                xmtr.antenna().part().platform().velocity_wcs(),
                rcvr.antenna().part().platform().velocity_wcs(),
            )
        };
        // Leg range rates, opening positive; negate for closing-positive.
        let out = (v_tgt - v_x).dot(&rel_x.true_unit.into_inner());
        let back = (v_tgt - v_r).dot(&rel_r.true_unit.into_inner());
        -(out + back) / wavelength
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new(crate::common::DEFAULT_EARTH_RADIUS_SCALE)
    }
}

/// Points an antenna's beam along a resolved line of sight and looks up the
/// effective gain there.
fn point_beam(
    antenna: &crate::antenna::Antenna,
    pattern: &dyn crate::pattern::AntennaPattern,
    frequency: crate::common::Freq<f64>,
    rel: &RelativeData,
) -> BeamData {
    let pointing = antenna.beam_pointing(rel.apparent_azimuth, rel.apparent_elevation);
    let az_off = (rel.apparent_azimuth - pointing.azimuth).normalized();
    let el_off = rel.apparent_elevation - pointing.elevation;
    let gain = pattern.gain(
        frequency,
        az_off,
        el_off,
        pointing.ebs_azimuth,
        pointing.ebs_elevation,
    ) * antenna.steering_loss(&pointing);
    let beam_to_sscs =
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), pointing.azimuth.radian())
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), pointing.elevation.radian());
    BeamData {
        azimuth: pointing.azimuth,
        elevation: pointing.elevation,
        gain,
        ebs_azimuth: pointing.ebs_azimuth,
        ebs_elevation: pointing.ebs_elevation,
        wcs_to_beam: beam_to_sscs.inverse() * antenna.wcs_to_sscs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::antenna::{Antenna, ElectronicSteering, FieldOfView, ScanMode, SteeringMode};
    use crate::common::{deg, rad, Freq, GHz, kW};
    use crate::geometry::Geodetic;
    use crate::pattern::Uniform;
    use crate::platform::tests::TestPlatform;
    use crate::platform::ArticulatedPart;
    use crate::radio::{Rcvr, RcvrFunction, Xmtr, XmtrFunction};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn platform_at(lat_deg: f64, lon_deg: f64, alt: f64) -> Arc<TestPlatform> {
        Arc::new(TestPlatform::at(Geodetic::new(
            lat_deg * deg,
            lon_deg * deg,
            alt,
        )))
    }

    fn antenna_on(platform: Arc<TestPlatform>) -> Arc<Antenna> {
        Arc::new(Antenna::new(Arc::new(ArticulatedPart::new(
            platform,
            Vector3::zeros(),
        ))))
    }

    fn sensor_pair(antenna: &Arc<Antenna>) -> (Xmtr, Rcvr) {
        let xmtr = Xmtr::new(
            XmtrFunction::Sensor,
            antenna.clone(),
            Arc::new(Uniform::isotropic()),
            1.0 * GHz,
            10.0 * kW,
        );
        let rcvr = Rcvr::new(
            RcvrFunction::Sensor,
            antenna.clone(),
            Arc::new(Uniform::isotropic()),
            1.0 * GHz,
            1e6 * crate::common::Hz,
        );
        (xmtr, rcvr)
    }

    // Roughly 10 km of ground range at the equator.
    const TENTH_DEG_EAST: f64 = 0.09;

    #[test]
    fn one_way_matches_free_space() {
        let antenna = antenna_on(platform_at(0.0, 0.0, 1_000.0));
        let (xmtr, _) = sensor_pair(&antenna);
        let far = antenna_on(platform_at(0.0, TENTH_DEG_EAST, 1_000.0));
        let (_, rcvr) = sensor_pair(&far);

        let mut ix = Interaction::new(4.0 / 3.0);
        ix.begin_one_way_xr(&xmtr, &rcvr, true, true, true);
        assert!(ix.passed(), "failed: {:?}", ix.failed());
        ix.set_transmitter_beam_position(&xmtr);
        ix.set_receiver_beam_position(&rcvr);
        let p = ix.compute_rf_one_way_power(&xmtr, &rcvr, &Environment::default(), None, None);

        let range = ix.rcvr_to_xmtr().unwrap().range;
        let lambda = (1.0 * GHz).wavelength();
        let expect = 10_000.0 * (lambda / (4.0 * std::f64::consts::PI * range)).powi(2);
        approx::assert_relative_eq!(p.watts(), expect, max_relative = 1e-9);
        assert!(ix.snr().linear() > 0.0);
    }

    #[test]
    fn two_way_matches_the_radar_equation() {
        let antenna = antenna_on(platform_at(0.0, 0.0, 1_000.0));
        let (xmtr, rcvr) = sensor_pair(&antenna);
        let mut target = TestPlatform::at(Geodetic::new(0.0 * deg, TENTH_DEG_EAST * deg, 1_000.0));
        target.radar_signature = 5.0;
        let target = Arc::new(target);

        let mut ix = Interaction::new(4.0 / 3.0);
        ix.begin_two_way(&xmtr, target.as_ref(), &rcvr);
        assert!(ix.passed(), "failed: {:?}", ix.failed());
        ix.set_transmitter_beam_position(&xmtr);
        ix.set_receiver_beam_position(&rcvr);
        let p = ix.compute_rf_two_way_power(
            &xmtr,
            target.as_ref(),
            &rcvr,
            &Environment::default(),
            None,
            None,
        );

        let r = ix.rcvr_to_tgt().unwrap().range;
        let lambda = (1.0 * GHz).wavelength();
        let expect = 10_000.0 * lambda * lambda * 5.0
            / ((4.0 * std::f64::consts::PI).powi(3) * r.powi(4));
        approx::assert_relative_eq!(p.watts(), expect, max_relative = 1e-9);
        approx::assert_abs_diff_eq!(ix.radar_signature(), 5.0);
    }

    #[test]
    fn reciprocity() {
        let a = antenna_on(platform_at(0.0, 0.0, 2_000.0));
        let b = antenna_on(platform_at(0.02, TENTH_DEG_EAST, 500.0));
        let (xa, ra) = sensor_pair(&a);
        let (xb, rb) = sensor_pair(&b);
        let env = Environment::default();

        let mut fwd = Interaction::new(4.0 / 3.0);
        fwd.begin_one_way_xr(&xa, &rb, true, true, true);
        fwd.set_transmitter_beam_position(&xa);
        fwd.set_receiver_beam_position(&rb);
        let p_fwd = fwd.compute_rf_one_way_power(&xa, &rb, &env, None, None);

        let mut rev = Interaction::new(4.0 / 3.0);
        rev.begin_one_way_xr(&xb, &ra, true, true, true);
        rev.set_transmitter_beam_position(&xb);
        rev.set_receiver_beam_position(&ra);
        let p_rev = rev.compute_rf_one_way_power(&xb, &ra, &env, None, None);

        approx::assert_relative_eq!(p_fwd.watts(), p_rev.watts(), max_relative = 1e-6);
    }

    #[test]
    fn fov_gate_fails_without_touching_the_pattern() {
        let platform = platform_at(0.0, 0.0, 1_000.0);
        let part = Arc::new(ArticulatedPart::new(platform.clone(), Vector3::zeros()));
        // Nose-on FOV; the target sits due east at azimuth 90°.
        let antenna = Arc::new(Antenna::new(part).with_field_of_view(
            FieldOfView::Rectangular {
                azimuth: (-10.0 * deg, 10.0 * deg),
                elevation: (-10.0 * deg, 10.0 * deg),
            },
        ));
        let spy = Arc::new(crate::pattern::tests::SpyPattern::default());
        let rcvr = Rcvr::new(
            RcvrFunction::Sensor,
            antenna.clone(),
            spy.clone(),
            1.0 * GHz,
            1e6 * crate::common::Hz,
        );
        let xmtr = Xmtr::new(
            XmtrFunction::Sensor,
            antenna,
            spy.clone(),
            1.0 * GHz,
            10.0 * kW,
        );
        let target = TestPlatform::at(Geodetic::new(0.0 * deg, TENTH_DEG_EAST * deg, 1_000.0));

        let mut ix = Interaction::new(4.0 / 3.0);
        ix.begin_two_way(&xmtr, &target, &rcvr);
        assert_eq!(ix.failed(), InteractionStatus::RCVR_ANGLE_LIMITS);
        assert!(ix.checked().contains(InteractionStatus::RCVR_RANGE_LIMITS));
        assert_eq!(spy.calls.load(Ordering::Relaxed), 0);
        // The transmitter leg was still backfilled for observers.
        assert!(ix.xmtr_to_tgt().is_some());
    }

    #[test]
    fn low_endpoints_at_50km_are_horizon_masked() {
        let a = antenna_on(platform_at(0.0, 0.0, 10.0));
        let (xmtr, rcvr) = sensor_pair(&a);
        let d_lon = 50_000.0 / crate::common::EARTH_MEAN_RADIUS;
        let target = TestPlatform::at(Geodetic::new(0.0 * deg, d_lon * rad, 10.0));

        let mut ix = Interaction::new(4.0 / 3.0);
        ix.begin_two_way(&xmtr, &target, &rcvr);
        assert_eq!(ix.failed(), InteractionStatus::RCVR_HORIZON_MASKING);
    }

    #[test]
    fn failed_is_always_a_subset_of_checked() {
        let a = antenna_on(platform_at(0.0, 0.0, 10.0));
        let (xmtr, rcvr) = sensor_pair(&a);
        for lon in [0.01, 0.1, 0.5, 2.0] {
            let target = TestPlatform::at(Geodetic::new(0.0 * deg, lon * deg, 10.0));
            let mut ix = Interaction::new(4.0 / 3.0);
            ix.begin_two_way(&xmtr, &target, &rcvr);
            assert!(ix.checked().contains(ix.failed()));
        }
    }

    #[test]
    fn zero_masking_factor_fails_the_masking_gate() {
        let a = antenna_on(platform_at(0.0, 0.0, 1_000.0));
        let (xmtr, rcvr) = sensor_pair(&a);
        let target = TestPlatform::at(Geodetic::new(0.0 * deg, 0.01 * deg, 1_000.0));
        let mut ix = Interaction::new(4.0 / 3.0);
        ix.set_masking_factor(0.0);
        ix.begin_two_way(&xmtr, &target, &rcvr);
        assert_eq!(ix.failed(), InteractionStatus::MASKING_FACTOR);
    }

    #[test]
    fn steering_clip_zeroes_the_received_power() {
        let platform = platform_at(0.0, 0.0, 1_000.0);
        let part = Arc::new(ArticulatedPart::new(platform, Vector3::zeros()));
        // Fixed mount, electronically steered; the target at 90° azimuth is
        // far outside the cosine steering cone.
        let antenna = Arc::new(
            Antenna::new(part)
                .with_scan_mode(ScanMode::Fixed)
                .with_steering(ElectronicSteering::new(SteeringMode::Both)),
        );
        let (xmtr, rcvr) = sensor_pair(&antenna);
        let far = antenna_on(platform_at(0.0, TENTH_DEG_EAST, 1_000.0));
        let (_, rcvr_far) = sensor_pair(&far);
        let _ = rcvr;

        let mut ix = Interaction::new(4.0 / 3.0);
        ix.begin_one_way_xr(&xmtr, &rcvr_far, false, false, false);
        ix.set_transmitter_beam_position(&xmtr);
        ix.set_receiver_beam_position(&rcvr_far);
        let p = ix.compute_rf_one_way_power(&xmtr, &rcvr_far, &Environment::default(), None, None);
        approx::assert_abs_diff_eq!(p.watts(), 0.0);
    }

    #[test]
    fn closing_target_has_positive_doppler() {
        let antenna = antenna_on(platform_at(0.0, 0.0, 1_000.0));
        let (xmtr, rcvr) = sensor_pair(&antenna);
        let mut target = TestPlatform::at(Geodetic::new(0.0 * deg, TENTH_DEG_EAST * deg, 1_000.0));
        // Due west in WCS at the equator prime meridian is -y: toward the sensor.
        target.velocity = Vector3::new(0.0, -100.0, 0.0);
        let target = Arc::new(target);

        let mut ix = Interaction::new(4.0 / 3.0);
        ix.begin_two_way(&xmtr, target.as_ref(), &rcvr);
        ix.set_transmitter_beam_position(&xmtr);
        ix.set_receiver_beam_position(&rcvr);
        ix.compute_rf_two_way_power(
            &xmtr,
            target.as_ref(),
            &rcvr,
            &Environment::default(),
            None,
            None,
        );
        let lambda = (1.0 * GHz).wavelength();
        approx::assert_relative_eq!(ix.doppler(), 2.0 * 100.0 / lambda, max_relative = 1e-3);
    }

    #[test]
    fn interference_raises_the_denominator() {
        let mut ix = Interaction::new(4.0 / 3.0);
        ix.received_power = Power::from_watts(1e-10);
        ix.noise_power = Power::from_watts(1e-12);
        let clean = ix.snr().linear();
        ix.add_interference(Power::from_watts(1e-11), 0.5, 1.0);
        assert!(ix.snr().linear() < clean);
        approx::assert_abs_diff_eq!(ix.interference_power().watts(), 5e-12);
    }

    #[test]
    fn signal_level_gate_uses_the_detection_threshold() {
        let antenna = antenna_on(platform_at(0.0, 0.0, 1_000.0));
        let (xmtr, _) = sensor_pair(&antenna);
        let far = antenna_on(platform_at(0.0, TENTH_DEG_EAST, 1_000.0));
        let rcvr = Rcvr::new(
            RcvrFunction::Sensor,
            far.clone(),
            Arc::new(Uniform::isotropic()),
            1.0 * GHz,
            1e6 * crate::common::Hz,
        )
        .with_detection_threshold(Ratio::from_linear(1e30));

        let mut ix = Interaction::new(4.0 / 3.0);
        ix.begin_one_way_xr(&xmtr, &rcvr, true, true, true);
        ix.set_transmitter_beam_position(&xmtr);
        ix.set_receiver_beam_position(&rcvr);
        ix.compute_rf_one_way_power(&xmtr, &rcvr, &Environment::default(), None, None);
        assert!(!ix.check_signal_level(&rcvr));
        assert!(ix.failed().contains(InteractionStatus::SIGNAL_LEVEL));
    }

    #[test]
    fn zero_frequency_transmitter_produces_no_doppler() {
        let antenna = antenna_on(platform_at(0.0, 0.0, 1_000.0));
        let xmtr = Xmtr::new(
            XmtrFunction::Sensor,
            antenna.clone(),
            Arc::new(Uniform::isotropic()),
            Freq::ZERO,
            10.0 * kW,
        )
        .allowing_zero_frequency();
        let (_, rcvr) = sensor_pair(&antenna);
        let target = TestPlatform::at(Geodetic::new(0.0 * deg, 0.01 * deg, 1_000.0));
        let mut ix = Interaction::new(4.0 / 3.0);
        ix.begin_two_way(&xmtr, &target, &rcvr);
        ix.set_transmitter_beam_position(&xmtr);
        ix.set_receiver_beam_position(&rcvr);
        ix.compute_rf_two_way_power(&xmtr, &target, &rcvr, &Environment::default(), None, None);
        approx::assert_abs_diff_eq!(ix.doppler(), 0.0);
    }
}
