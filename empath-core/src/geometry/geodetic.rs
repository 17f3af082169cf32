use crate::common::{
    rad, Angle, EARTH_ECCENTRICITY_SQ, EARTH_MEAN_RADIUS, EARTH_SEMI_MAJOR_AXIS,
    EARTH_SEMI_MINOR_AXIS,
};

use super::{Point3, UnitQuaternion, Vector3};

/// Geodetic position on the WGS-84 ellipsoid.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geodetic {
    /// Geodetic latitude.
    pub lat: Angle,
    /// Longitude, east positive.
    pub lon: Angle,
    /// Altitude above the ellipsoid in \[m\].
    pub alt: f64,
}

impl Geodetic {
    /// Creates a new [`Geodetic`].
    #[must_use]
    pub const fn new(lat: Angle, lon: Angle, alt: f64) -> Self {
        Self { lat, lon, alt }
    }

    /// Converts to an earth-centred WCS point in \[m\].
    #[must_use]
    pub fn to_wcs(&self) -> Point3 {
        let (sin_lat, cos_lat) = self.lat.radian().sin_cos();
        let (sin_lon, cos_lon) = self.lon.radian().sin_cos();
        let n = EARTH_SEMI_MAJOR_AXIS / (1.0 - EARTH_ECCENTRICITY_SQ * sin_lat * sin_lat).sqrt();
        Point3::new(
            (n + self.alt) * cos_lat * cos_lon,
            (n + self.alt) * cos_lat * sin_lon,
            (n * (1.0 - EARTH_ECCENTRICITY_SQ) + self.alt) * sin_lat,
        )
    }

    /// Converts an earth-centred WCS point to geodetic coordinates.
    ///
    /// Iterates the latitude/altitude pair; converges to sub-millimetre for
    /// any point from the earth's surface out to space.
    #[must_use]
    pub fn from_wcs(p: &Point3) -> Self {
        let rho = p.x.hypot(p.y);
        let lon = f64::atan2(p.y, p.x);
        if rho < 1e-6 {
            // On the polar axis the longitude is arbitrary.
            return Self {
                lat: if p.z >= 0.0 { Angle::HALF_PI } else { -Angle::HALF_PI },
                lon: Angle::ZERO,
                alt: p.z.abs() - EARTH_SEMI_MINOR_AXIS,
            };
        }
        let mut lat = f64::atan2(p.z, rho * (1.0 - EARTH_ECCENTRICITY_SQ));
        let mut alt = 0.0;
        for _ in 0..5 {
            let sin_lat = lat.sin();
            let n = EARTH_SEMI_MAJOR_AXIS
                / (1.0 - EARTH_ECCENTRICITY_SQ * sin_lat * sin_lat).sqrt();
            alt = rho / lat.cos() - n;
            lat = f64::atan2(p.z, rho * (1.0 - EARTH_ECCENTRICITY_SQ * n / (n + alt)));
        }
        Self {
            lat: lat * rad,
            lon: lon * rad,
            alt,
        }
    }

    /// Rotation taking WCS vector components to local north-east-down components.
    #[must_use]
    pub fn wcs_to_ned(&self) -> UnitQuaternion {
        let (sin_lat, cos_lat) = self.lat.radian().sin_cos();
        let (sin_lon, cos_lon) = self.lon.radian().sin_cos();
        let m = nalgebra::Matrix3::new(
            -sin_lat * cos_lon,
            -sin_lat * sin_lon,
            cos_lat,
            -sin_lon,
            cos_lon,
            0.0,
            -cos_lat * cos_lon,
            -cos_lat * sin_lon,
            -sin_lat,
        );
        UnitQuaternion::from_rotation_matrix(&nalgebra::Rotation3::from_matrix_unchecked(m))
    }

    /// Great-circle ground range to another position in \[m\], on the mean sphere.
    #[must_use]
    pub fn ground_range_to(&self, other: &Self) -> f64 {
        let d_lat = other.lat.radian() - self.lat.radian();
        let d_lon = other.lon.radian() - self.lon.radian();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.radian().cos() * other.lat.radian().cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_MEAN_RADIUS * a.sqrt().clamp(-1.0, 1.0).asin()
    }
}

/// Unit LOS vector and slant range from `from` to `to`, both WCS.
///
/// Co-located points are degenerate; the caller gets a zero range and an
/// arbitrary (but valid) unit vector.
#[must_use]
pub fn line_of_sight(from: &Point3, to: &Point3) -> (super::UnitVector3, f64) {
    let d = to - from;
    let range = d.norm();
    if range < 1e-9 {
        (super::UnitVector3::new_unchecked(Vector3::x()), 0.0)
    } else {
        (super::UnitVector3::new_unchecked(d / range), range)
    }
}
