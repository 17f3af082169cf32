use crate::common::Angle;

use super::{UnitQuaternion, Vector3};

/// Yaw/pitch/roll attitude, intrinsic Z-Y'-X'' in a north-east-down parent frame.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Orientation {
    /// Rotation about the parent z (down) axis, clockwise from above.
    pub yaw: Angle,
    /// Rotation about the intermediate y axis, nose-up positive.
    pub pitch: Angle,
    /// Rotation about the body x axis, right-wing-down positive.
    pub roll: Angle,
}

impl Orientation {
    /// The level, unrotated attitude.
    pub const IDENTITY: Self = Self {
        yaw: Angle::ZERO,
        pitch: Angle::ZERO,
        roll: Angle::ZERO,
    };

    /// Creates a new [`Orientation`].
    #[must_use]
    pub const fn new(yaw: Angle, pitch: Angle, roll: Angle) -> Self {
        Self { yaw, pitch, roll }
    }

    /// Rotation taking body-frame components to parent-frame components.
    #[must_use]
    pub fn quaternion(&self) -> UnitQuaternion {
        (*self).into()
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Orientation> for UnitQuaternion {
    fn from(o: Orientation) -> Self {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), o.yaw.radian())
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), o.pitch.radian())
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), o.roll.radian())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::deg;

    macro_rules! assert_approx_eq_vec3 {
        ($a:expr, $b:expr) => {
            approx::assert_abs_diff_eq!($a.x, $b.x, epsilon = 1e-12);
            approx::assert_abs_diff_eq!($a.y, $b.y, epsilon = 1e-12);
            approx::assert_abs_diff_eq!($a.z, $b.z, epsilon = 1e-12);
        };
    }

    #[test]
    fn yaw_turns_nose_east() {
        let q = Orientation::new(90.0 * deg, Angle::ZERO, Angle::ZERO).quaternion();
        let nose = q * Vector3::x();
        assert_approx_eq_vec3!(Vector3::y(), nose);
    }

    #[test]
    fn pitch_raises_nose() {
        let q = Orientation::new(Angle::ZERO, 90.0 * deg, Angle::ZERO).quaternion();
        let nose = q * Vector3::x();
        assert_approx_eq_vec3!(-Vector3::z(), nose);
    }

    #[test]
    fn roll_drops_right_wing() {
        let q = Orientation::new(Angle::ZERO, Angle::ZERO, 90.0 * deg).quaternion();
        let wing = q * Vector3::y();
        assert_approx_eq_vec3!(Vector3::z(), wing);
    }

    #[test]
    fn identity() {
        assert_eq!(
            UnitQuaternion::identity(),
            Orientation::IDENTITY.quaternion()
        );
    }
}
