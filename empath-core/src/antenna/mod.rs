mod fov;
mod steering;

pub use fov::FieldOfView;
pub use steering::{ElectronicSteering, SteeringMode};

use std::sync::{Arc, Mutex};

use crate::common::{rad, Angle, Ratio};
use crate::error::AntennaError;
use crate::geometry::{
    apparent_elevation, azimuth_elevation_of, direction_from_azimuth_elevation, line_of_sight,
    Geodetic, Orientation, Point3, UnitQuaternion, Vector3,
};
use crate::interaction::RelativeData;
use crate::platform::ArticulatedPart;

/// Which axes the antenna scans mechanically.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanMode {
    /// Fixed boresight.
    #[default]
    Fixed,
    /// Azimuth only.
    Azimuth,
    /// Elevation only.
    Elevation,
    /// Both axes.
    Both,
}

impl ScanMode {
    const fn scans_azimuth(self) -> bool {
        matches!(self, Self::Azimuth | Self::Both)
    }

    const fn scans_elevation(self) -> bool {
        matches!(self, Self::Elevation | Self::Both)
    }
}

/// Which attitude components the scan frame removes.
///
/// A pitch-stabilized scanner keeps its scan plane level as the platform
/// pitches; a fully stabilized one ignores pitch and roll both.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanStabilization {
    /// Scan frame follows the part attitude.
    #[default]
    None,
    /// Pitch removed.
    Pitch,
    /// Roll removed.
    Roll,
    /// Pitch and roll removed.
    Both,
}

/// Mechanical and electronic beam pointing toward a target.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BeamPointing {
    /// Mechanical azimuth in the stabilized scan frame.
    pub azimuth: Angle,
    /// Mechanical elevation in the stabilized scan frame.
    pub elevation: Angle,
    /// Electronic steering offset in azimuth.
    pub ebs_azimuth: Angle,
    /// Electronic steering offset in elevation.
    pub ebs_elevation: Angle,
}

/// WCS frames derived from the host part state, cached until it moves.
#[derive(Clone, Copy, Debug)]
struct FrameCache {
    platform_version: u64,
    part_version: u64,
    location: Point3,
    geodetic: Geodetic,
    wcs_to_ned: UnitQuaternion,
    wcs_to_acs: UnitQuaternion,
    wcs_to_sscs: UnitQuaternion,
}

/// Physical antenna mount on an articulated part.
///
/// Owns the offset, tilt, scan and stabilization modes, scan limits,
/// electronic steering, field of view, and range/altitude gates. Derived
/// WCS transforms are cached and recomputed whenever the platform or part
/// version changes.
pub struct Antenna {
    part: Arc<ArticulatedPart>,
    offset: Vector3,
    tilt: Angle,
    scan_mode: ScanMode,
    stabilization: ScanStabilization,
    azimuth_scan_limits: (Angle, Angle),
    elevation_scan_limits: (Angle, Angle),
    steering: ElectronicSteering,
    field_of_view: FieldOfView,
    range_limits: (f64, f64),
    altitude_limits: (f64, f64),
    frames: Mutex<Option<FrameCache>>,
}

impl Antenna {
    /// Creates a boresight-fixed antenna at the part origin with default
    /// gates: full field of view, unbounded range and altitude.
    #[must_use]
    pub fn new(part: Arc<ArticulatedPart>) -> Self {
        Self {
            part,
            offset: Vector3::zeros(),
            tilt: Angle::ZERO,
            scan_mode: ScanMode::Fixed,
            stabilization: ScanStabilization::None,
            azimuth_scan_limits: (-Angle::PI, Angle::PI),
            elevation_scan_limits: (-Angle::HALF_PI, Angle::HALF_PI),
            steering: ElectronicSteering::default(),
            field_of_view: FieldOfView::full(),
            range_limits: (0.0, f64::INFINITY),
            altitude_limits: (f64::NEG_INFINITY, f64::INFINITY),
            frames: Mutex::new(None),
        }
    }

    /// Sets the phase-center offset in the part frame \[m\].
    #[must_use]
    pub fn with_offset(mut self, offset: Vector3) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the fixed tilt about the part y-axis.
    #[must_use]
    pub fn with_tilt(mut self, tilt: Angle) -> Self {
        self.tilt = tilt;
        self
    }

    /// Sets the scan mode.
    #[must_use]
    pub fn with_scan_mode(mut self, mode: ScanMode) -> Self {
        self.scan_mode = mode;
        self
    }

    /// Sets the scan stabilization.
    #[must_use]
    pub fn with_stabilization(mut self, stabilization: ScanStabilization) -> Self {
        self.stabilization = stabilization;
        self
    }

    /// Sets the azimuth scan limits. A pair with `min > max` spans the ±π wrap.
    #[must_use]
    pub fn with_azimuth_scan_limits(mut self, min: Angle, max: Angle) -> Self {
        self.azimuth_scan_limits = (min.normalized(), max.normalized());
        self
    }

    /// Sets the elevation scan limits.
    #[must_use]
    pub fn with_elevation_scan_limits(mut self, min: Angle, max: Angle) -> Self {
        self.elevation_scan_limits = (min, max);
        self
    }

    /// Sets the electronic beam steering.
    #[must_use]
    pub fn with_steering(mut self, steering: ElectronicSteering) -> Self {
        self.steering = steering;
        self
    }

    /// Sets the field of view.
    #[must_use]
    pub fn with_field_of_view(mut self, fov: FieldOfView) -> Self {
        self.field_of_view = fov;
        self
    }

    /// Sets the range gate \[m\].
    #[must_use]
    pub fn with_range_limits(mut self, min: f64, max: f64) -> Self {
        self.range_limits = (min, max);
        self
    }

    /// Sets the target-altitude gate \[m\] MSL.
    #[must_use]
    pub fn with_altitude_limits(mut self, min: f64, max: f64) -> Self {
        self.altitude_limits = (min, max);
        self
    }

    /// Checks the mount invariants.
    pub fn validate(&self) -> Result<(), AntennaError> {
        if self.range_limits.0 > self.range_limits.1 {
            return Err(AntennaError::ReversedLimits {
                name: "range",
                min: self.range_limits.0,
                max: self.range_limits.1,
            });
        }
        if self.altitude_limits.0 > self.altitude_limits.1 {
            return Err(AntennaError::ReversedLimits {
                name: "altitude",
                min: self.altitude_limits.0,
                max: self.altitude_limits.1,
            });
        }
        let (el_min, el_max) = self.elevation_scan_limits;
        for el in [el_min, el_max] {
            if el.radian().abs() > std::f64::consts::FRAC_PI_2 + 1e-12 {
                return Err(AntennaError::ElevationLimitOutOfRange(el.radian()));
            }
        }
        if el_min.radian() > el_max.radian() {
            return Err(AntennaError::ReversedLimits {
                name: "elevation scan",
                min: el_min.radian(),
                max: el_max.radian(),
            });
        }
        if !self.field_of_view.is_full()
            && !self.scan_limits_are_default()
            && !self
                .field_of_view
                .contains_box(self.azimuth_scan_limits, self.elevation_scan_limits)
        {
            return Err(AntennaError::FieldOfViewExcludesScanVolume);
        }
        Ok(())
    }

    fn scan_limits_are_default(&self) -> bool {
        self.azimuth_scan_limits.1.radian() - self.azimuth_scan_limits.0.radian()
            >= std::f64::consts::TAU - 1e-12
            && self.elevation_scan_limits.1.radian() - self.elevation_scan_limits.0.radian()
                >= std::f64::consts::PI - 1e-12
    }

    /// The host part.
    #[must_use]
    pub fn part(&self) -> &Arc<ArticulatedPart> {
        &self.part
    }

    /// The electronic steering configuration.
    #[must_use]
    pub const fn steering(&self) -> &ElectronicSteering {
        &self.steering
    }

    /// The field of view.
    #[must_use]
    pub const fn field_of_view(&self) -> &FieldOfView {
        &self.field_of_view
    }

    fn frames(&self) -> FrameCache {
        let platform = self.part.platform();
        let platform_version = platform.version();
        let part_version = self.part.version();
        let mut guard = self
            .frames
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(cache) = *guard {
            if cache.platform_version == platform_version && cache.part_version == part_version {
                return cache;
            }
        }
        let cache = self.compute_frames(platform_version, part_version);
        *guard = Some(cache);
        cache
    }

    fn compute_frames(&self, platform_version: u64, part_version: u64) -> FrameCache {
        let platform = self.part.platform();
        let platform_wcs = platform.location_wcs();
        let geodetic_platform = Geodetic::from_wcs(&platform_wcs);
        let wcs_to_ned = geodetic_platform.wcs_to_ned();
        let attitude = platform.orientation();
        let cue = self.part.cue();

        let body_to_ned = attitude.quaternion();
        let part_to_body = cue.quaternion();
        let acs_to_part =
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.tilt.radian());
        let wcs_to_acs =
            (body_to_ned * part_to_body * acs_to_part).inverse() * wcs_to_ned;

        let stabilized = match self.stabilization {
            ScanStabilization::None => attitude,
            ScanStabilization::Pitch => Orientation::new(attitude.yaw, Angle::ZERO, attitude.roll),
            ScanStabilization::Roll => Orientation::new(attitude.yaw, attitude.pitch, Angle::ZERO),
            ScanStabilization::Both => Orientation::new(attitude.yaw, Angle::ZERO, Angle::ZERO),
        };
        let wcs_to_sscs =
            (stabilized.quaternion() * part_to_body * acs_to_part).inverse() * wcs_to_ned;

        let offset_body = part_to_body * self.offset + self.part.location();
        let location = platform_wcs + wcs_to_ned.inverse() * (body_to_ned * offset_body);
        let geodetic = Geodetic::from_wcs(&location);

        FrameCache {
            platform_version,
            part_version,
            location,
            geodetic,
            wcs_to_ned,
            wcs_to_acs,
            wcs_to_sscs,
        }
    }

    /// WCS location of the antenna phase center \[m\].
    #[must_use]
    pub fn location_wcs(&self) -> Point3 {
        self.frames().location
    }

    /// Geodetic location of the antenna phase center.
    #[must_use]
    pub fn geodetic(&self) -> Geodetic {
        self.frames().geodetic
    }

    /// Rotation taking WCS components to antenna (face) components.
    #[must_use]
    pub fn wcs_to_acs(&self) -> UnitQuaternion {
        self.frames().wcs_to_acs
    }

    /// Rotation taking WCS components to local NED components.
    #[must_use]
    pub fn wcs_to_ned(&self) -> UnitQuaternion {
        self.frames().wcs_to_ned
    }

    /// Rotation taking WCS components to stabilized-scan components.
    #[must_use]
    pub fn wcs_to_sscs(&self) -> UnitQuaternion {
        self.frames().wcs_to_sscs
    }

    /// Line-of-sight state toward a WCS target: range, true az/el in the
    /// stabilized scan frame, and apparent az/el under refraction with the
    /// given effective-earth-radius scale.
    #[must_use]
    pub fn relative_state_of(&self, target: &Point3, earth_radius_scale: f64) -> RelativeData {
        let frames = self.frames();
        let (true_unit, range) = line_of_sight(&frames.location, target);
        let los_sscs = frames.wcs_to_sscs * true_unit.into_inner();
        let (true_azimuth, true_elevation) = azimuth_elevation_of(&los_sscs);

        let target_geodetic = Geodetic::from_wcs(target);
        let ground_range = frames.geodetic.ground_range_to(&target_geodetic);
        let apparent_el = apparent_elevation(true_elevation, ground_range, earth_radius_scale);
        let apparent_dir = direction_from_azimuth_elevation(true_azimuth, apparent_el);
        let apparent_unit = crate::geometry::UnitVector3::new_normalize(
            frames.wcs_to_sscs.inverse() * apparent_dir.into_inner(),
        );

        RelativeData {
            range,
            true_azimuth,
            true_elevation,
            true_unit,
            apparent_azimuth: true_azimuth,
            apparent_elevation: apparent_el,
            apparent_unit,
        }
    }

    /// Whether `range` \[m\] passes the range gate.
    #[must_use]
    pub fn check_range(&self, range: f64) -> bool {
        range >= self.range_limits.0 && range <= self.range_limits.1
    }

    /// Whether a target altitude \[m\] MSL passes the altitude gate.
    #[must_use]
    pub fn check_altitude(&self, altitude: f64) -> bool {
        altitude >= self.altitude_limits.0 && altitude <= self.altitude_limits.1
    }

    /// Whether apparent `(az, el)` passes the field of view and the scan
    /// limits of the scanned axes.
    #[must_use]
    pub fn check_angle_limits(&self, az: Angle, el: Angle) -> bool {
        if !self.field_of_view.contains(az, el) {
            return false;
        }
        if self.scan_mode.scans_azimuth() && !azimuth_within(az, self.azimuth_scan_limits) {
            return false;
        }
        if self.scan_mode.scans_elevation()
            && !(el.radian() >= self.elevation_scan_limits.0.radian()
                && el.radian() <= self.elevation_scan_limits.1.radian())
        {
            return false;
        }
        true
    }

    /// Beam pointing toward apparent `(az, el)`: the scanned axes slew
    /// within their limits and electronically steered axes absorb the
    /// residual offset. Axes with neither stay at boresight and the target
    /// offset shows up as plain off-axis angle at gain lookup.
    #[must_use]
    pub fn beam_pointing(&self, az: Angle, el: Angle) -> BeamPointing {
        let mech_az = if self.scan_mode.scans_azimuth() {
            clamp_azimuth(az, self.azimuth_scan_limits)
        } else {
            Angle::ZERO
        };
        let mech_el = if self.scan_mode.scans_elevation() {
            el.radian().clamp(
                self.elevation_scan_limits.0.radian(),
                self.elevation_scan_limits.1.radian(),
            ) * rad
        } else {
            Angle::ZERO
        };
        let ebs_az = if self.steering.mode().steers_azimuth() {
            (az - mech_az).normalized()
        } else {
            Angle::ZERO
        };
        let ebs_el = if self.steering.mode().steers_elevation() {
            el - mech_el
        } else {
            Angle::ZERO
        };
        BeamPointing {
            azimuth: mech_az,
            elevation: mech_el,
            ebs_azimuth: ebs_az,
            ebs_elevation: ebs_el,
        }
    }

    /// Electronic steering loss for a pointing.
    #[must_use]
    pub fn steering_loss(&self, pointing: &BeamPointing) -> Ratio {
        self.steering
            .loss(pointing.ebs_azimuth, pointing.ebs_elevation)
    }
}

impl core::fmt::Debug for Antenna {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Antenna")
            .field("part", &self.part)
            .field("offset", &self.offset)
            .field("tilt", &self.tilt)
            .field("scan_mode", &self.scan_mode)
            .field("stabilization", &self.stabilization)
            .field("field_of_view", &self.field_of_view)
            .finish_non_exhaustive()
    }
}

fn azimuth_within(az: Angle, (min, max): (Angle, Angle)) -> bool {
    let az = az.normalized().radian();
    let (min, max) = (min.radian(), max.radian());
    if min <= max {
        az >= min && az <= max
    } else {
        az >= min || az <= max
    }
}

fn clamp_azimuth(az: Angle, limits: (Angle, Angle)) -> Angle {
    if azimuth_within(az, limits) {
        return az.normalized();
    }
    // Snap to whichever limit is angularly closer.
    let d_min = (az - limits.0).normalized().abs();
    let d_max = (az - limits.1).normalized().abs();
    if d_min.radian() <= d_max.radian() {
        limits.0
    } else {
        limits.1
    }
}
