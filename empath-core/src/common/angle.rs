/// \[°\]
#[allow(non_camel_case_types)]
pub struct deg;

/// \[rad\]
#[allow(non_camel_case_types)]
pub struct rad;

use derive_more::Debug;

/// Angle
#[repr(C)]
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug)]
#[debug("{}rad", radian)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Angle {
    radian: f64,
}

impl Angle {
    /// An angle of zero
    pub const ZERO: Self = Self { radian: 0.0 };

    /// An angle of π/2
    pub const HALF_PI: Self = Self {
        radian: std::f64::consts::FRAC_PI_2,
    };

    /// An angle of π
    pub const PI: Self = Self {
        radian: std::f64::consts::PI,
    };

    /// Returns the angle in radian
    #[must_use]
    pub const fn radian(self) -> f64 {
        self.radian
    }

    /// Returns the angle in degree
    #[must_use]
    pub const fn degree(self) -> f64 {
        self.radian.to_degrees()
    }

    /// Returns the equivalent angle wrapped into `(-π, π]`.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut r = self.radian % std::f64::consts::TAU;
        if r <= -std::f64::consts::PI {
            r += std::f64::consts::TAU;
        } else if r > std::f64::consts::PI {
            r -= std::f64::consts::TAU;
        }
        Self { radian: r }
    }

    /// Returns the absolute value of the angle.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self {
            radian: self.radian.abs(),
        }
    }
}

impl std::ops::Mul<deg> for f64 {
    type Output = Angle;

    fn mul(self, _rhs: deg) -> Self::Output {
        Self::Output {
            radian: self.to_radians(),
        }
    }
}

impl std::ops::Mul<rad> for f64 {
    type Output = Angle;

    fn mul(self, _rhs: rad) -> Self::Output {
        Self::Output { radian: self }
    }
}

impl Default for Angle {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::ops::Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            radian: self.radian + rhs.radian,
        }
    }
}

impl std::ops::Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            radian: self.radian - rhs.radian,
        }
    }
}

impl std::ops::Neg for Angle {
    type Output = Angle;

    fn neg(self) -> Self::Output {
        Self {
            radian: -self.radian,
        }
    }
}

impl std::ops::Mul<f64> for Angle {
    type Output = Angle;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            radian: self.radian * rhs,
        }
    }
}

impl std::ops::Div<f64> for Angle {
    type Output = Angle;

    fn div(self, rhs: f64) -> Self::Output {
        Self {
            radian: self.radian / rhs,
        }
    }
}
