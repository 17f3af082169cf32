mod geodetic;
mod masking;
mod orientation;

mod math {
    /// a complex number
    pub type Complex = nalgebra::Complex<f64>;
    /// 3-dimensional column vector.
    pub type Vector3 = nalgebra::Vector3<f64>;
    /// 3-dimensional unit vector.
    pub type UnitVector3 = nalgebra::UnitVector3<f64>;
    /// 3-dimensional point.
    pub type Point3 = nalgebra::Point3<f64>;
    /// A quaternion.
    pub type Quaternion = nalgebra::Quaternion<f64>;
    /// A unit quaternion.
    pub type UnitQuaternion = nalgebra::UnitQuaternion<f64>;
    /// A 3-dimensional translation.
    pub type Translation3 = nalgebra::Translation3<f64>;
    /// A 3-dimensional isometry.
    pub type Isometry3 = nalgebra::Isometry3<f64>;
}

pub use math::*;

pub use geodetic::*;
pub use masking::*;
pub use orientation::*;

use crate::common::Angle;

/// Azimuth and elevation of a direction vector expressed in a forward/right/down
/// frame: azimuth in `(-π, π]` positive toward +y, elevation positive away from +z.
#[must_use]
pub fn azimuth_elevation_of(v: &Vector3) -> (Angle, Angle) {
    use crate::common::rad;
    let az = f64::atan2(v.y, v.x);
    let el = f64::atan2(-v.z, v.x.hypot(v.y));
    (az * rad, el * rad)
}

/// Unit direction for an azimuth/elevation pair in a forward/right/down frame.
#[must_use]
pub fn direction_from_azimuth_elevation(az: Angle, el: Angle) -> UnitVector3 {
    let (sin_az, cos_az) = az.radian().sin_cos();
    let (sin_el, cos_el) = el.radian().sin_cos();
    UnitVector3::new_normalize(Vector3::new(cos_el * cos_az, cos_el * sin_az, -sin_el))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::deg;

    #[rstest::rstest]
    #[case(0.0, 0.0, Vector3::new(1.0, 0.0, 0.0))]
    #[case(90.0, 0.0, Vector3::new(0.0, 1.0, 0.0))]
    #[case(0.0, 90.0, Vector3::new(0.0, 0.0, -1.0))]
    #[case(-90.0, 0.0, Vector3::new(0.0, -2.0, 0.0))]
    #[case(45.0, 0.0, Vector3::new(1.0, 1.0, 0.0))]
    #[case(0.0, -45.0, Vector3::new(1.0, 0.0, 1.0))]
    fn azel(#[case] az_deg: f64, #[case] el_deg: f64, #[case] v: Vector3) {
        let (az, el) = azimuth_elevation_of(&v);
        approx::assert_abs_diff_eq!(az_deg, az.degree(), epsilon = 1e-12);
        approx::assert_abs_diff_eq!(el_deg, el.degree(), epsilon = 1e-12);
    }

    #[test]
    fn azel_round_trip() {
        let u = direction_from_azimuth_elevation(30.0 * deg, -10.0 * deg);
        let (az, el) = azimuth_elevation_of(&u);
        approx::assert_abs_diff_eq!(az.degree(), 30.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(el.degree(), -10.0, epsilon = 1e-12);
    }
}
