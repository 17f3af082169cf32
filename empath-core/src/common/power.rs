use derive_more::Debug;

/// \[W\]
pub struct W;

/// \[kW\]
#[allow(non_camel_case_types)]
pub struct kW;

/// \[MW\]
pub struct MW;

/// \[dBW\]
#[allow(non_camel_case_types)]
pub struct dBW;

/// \[dBm\]
#[allow(non_camel_case_types)]
pub struct dBm;

/// \[dB\] (power decibels)
#[allow(non_camel_case_types)]
pub struct dB;

/// Signal power
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug)]
#[debug("{}W", watts)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Power {
    watts: f64,
}

impl Power {
    /// A power of zero
    pub const ZERO: Self = Self { watts: 0.0 };

    /// Creates a power from a value in \[W\].
    #[must_use]
    pub const fn from_watts(watts: f64) -> Self {
        Self { watts }
    }

    /// Returns the power in \[W\].
    #[must_use]
    pub const fn watts(self) -> f64 {
        self.watts
    }

    /// Returns the power in \[dBW\].
    #[must_use]
    pub fn dbw(self) -> f64 {
        10.0 * self.watts.log10()
    }

    /// Returns the power in \[dBm\].
    #[must_use]
    pub fn dbm(self) -> f64 {
        self.dbw() + 30.0
    }
}

/// Dimensionless power ratio, stored linear.
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug)]
#[debug("{}x", linear)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ratio {
    linear: f64,
}

impl Ratio {
    /// A ratio of zero
    pub const ZERO: Self = Self { linear: 0.0 };

    /// A ratio of unity (0 dB)
    pub const ONE: Self = Self { linear: 1.0 };

    /// Creates a ratio from a linear value.
    #[must_use]
    pub const fn from_linear(linear: f64) -> Self {
        Self { linear }
    }

    /// Returns the linear value of the ratio.
    #[must_use]
    pub const fn linear(self) -> f64 {
        self.linear
    }

    /// Returns the ratio in \[dB\].
    #[must_use]
    pub fn db(self) -> f64 {
        10.0 * self.linear.log10()
    }
}

impl std::ops::Mul<W> for f64 {
    type Output = Power;

    fn mul(self, _rhs: W) -> Self::Output {
        Self::Output { watts: self }
    }
}

impl std::ops::Mul<kW> for f64 {
    type Output = Power;

    fn mul(self, _rhs: kW) -> Self::Output {
        Self::Output { watts: self * 1e3 }
    }
}

impl std::ops::Mul<MW> for f64 {
    type Output = Power;

    fn mul(self, _rhs: MW) -> Self::Output {
        Self::Output { watts: self * 1e6 }
    }
}

impl std::ops::Mul<dBW> for f64 {
    type Output = Power;

    fn mul(self, _rhs: dBW) -> Self::Output {
        Self::Output {
            watts: 10f64.powf(self / 10.0),
        }
    }
}

impl std::ops::Mul<dBm> for f64 {
    type Output = Power;

    fn mul(self, _rhs: dBm) -> Self::Output {
        Self::Output {
            watts: 10f64.powf((self - 30.0) / 10.0),
        }
    }
}

impl std::ops::Mul<dB> for f64 {
    type Output = Ratio;

    fn mul(self, _rhs: dB) -> Self::Output {
        Self::Output {
            linear: 10f64.powf(self / 10.0),
        }
    }
}

impl std::ops::Add for Power {
    type Output = Power;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            watts: self.watts + rhs.watts,
        }
    }
}

impl std::ops::AddAssign for Power {
    fn add_assign(&mut self, rhs: Self) {
        self.watts += rhs.watts;
    }
}

impl std::ops::Mul<f64> for Power {
    type Output = Power;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            watts: self.watts * rhs,
        }
    }
}

impl std::ops::Div<f64> for Power {
    type Output = Power;

    fn div(self, rhs: f64) -> Self::Output {
        Self {
            watts: self.watts / rhs,
        }
    }
}

impl std::ops::Mul<Ratio> for Power {
    type Output = Power;

    fn mul(self, rhs: Ratio) -> Self::Output {
        Self {
            watts: self.watts * rhs.linear,
        }
    }
}

impl std::ops::Div<Ratio> for Power {
    type Output = Power;

    fn div(self, rhs: Ratio) -> Self::Output {
        Self {
            watts: self.watts / rhs.linear,
        }
    }
}

impl std::ops::Div for Power {
    type Output = Ratio;

    fn div(self, rhs: Self) -> Self::Output {
        Ratio {
            linear: self.watts / rhs.watts,
        }
    }
}

impl std::ops::Mul for Ratio {
    type Output = Ratio;

    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            linear: self.linear * rhs.linear,
        }
    }
}

impl std::ops::Div for Ratio {
    type Output = Ratio;

    fn div(self, rhs: Self) -> Self::Output {
        Self {
            linear: self.linear / rhs.linear,
        }
    }
}

impl std::ops::Mul<f64> for Ratio {
    type Output = Ratio;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            linear: self.linear * rhs,
        }
    }
}

impl std::ops::Div<f64> for Ratio {
    type Output = Ratio;

    fn div(self, rhs: f64) -> Self::Output {
        Self {
            linear: self.linear / rhs,
        }
    }
}
