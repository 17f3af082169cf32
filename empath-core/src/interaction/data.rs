use crate::common::{Angle, Ratio};
use crate::geometry::{Geodetic, Point3, UnitQuaternion, UnitVector3};

/// A resolved endpoint position, geodetic and WCS together.
///
/// `valid` is false for endpoints an entry point never resolved (a one-way
/// attempt has no transmitter); observers print the record either way.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LocationData {
    /// Geodetic position.
    pub geodetic: Geodetic,
    /// Earth-centred WCS position \[m\].
    pub wcs: Point3,
    /// Whether this endpoint was resolved.
    pub valid: bool,
}

impl LocationData {
    /// A resolved location from its WCS position.
    #[must_use]
    pub fn from_wcs(wcs: Point3) -> Self {
        Self {
            geodetic: Geodetic::from_wcs(&wcs),
            wcs,
            valid: true,
        }
    }

    /// The unresolved placeholder.
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            geodetic: Geodetic::new(Angle::ZERO, Angle::ZERO, 0.0),
            wcs: Point3::origin(),
            valid: false,
        }
    }
}

/// Line-of-sight state from one endpoint toward another, in the observer's
/// stabilized scan frame.
///
/// The true pair is straight-line geometry; the apparent pair includes the
/// effective-earth-radius refraction correction and is what the pointing and
/// angle gates consume.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RelativeData {
    /// Slant range \[m\].
    pub range: f64,
    /// Straight-line azimuth.
    pub true_azimuth: Angle,
    /// Straight-line elevation.
    pub true_elevation: Angle,
    /// Straight-line WCS unit vector toward the far endpoint.
    pub true_unit: UnitVector3,
    /// Refracted azimuth (equals the true azimuth).
    pub apparent_azimuth: Angle,
    /// Refracted elevation.
    pub apparent_elevation: Angle,
    /// Refracted WCS unit vector.
    pub apparent_unit: UnitVector3,
}

/// One pointed beam: where it went and what gain it brought to bear.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BeamData {
    /// Mechanical beam azimuth in the stabilized scan frame.
    pub azimuth: Angle,
    /// Mechanical beam elevation.
    pub elevation: Angle,
    /// Effective linear gain toward the far endpoint, electronic steering
    /// loss included.
    pub gain: Ratio,
    /// Electronic steering offset in azimuth.
    pub ebs_azimuth: Angle,
    /// Electronic steering offset in elevation.
    pub ebs_elevation: Angle,
    /// Rotation taking WCS components to beam components.
    pub wcs_to_beam: UnitQuaternion,
}
