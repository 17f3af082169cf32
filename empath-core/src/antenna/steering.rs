use crate::common::{Angle, Ratio};
use crate::error::AntennaError;

/// Which axes the array steers electronically.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SteeringMode {
    /// No electronic steering.
    #[default]
    None,
    /// Azimuth only.
    Azimuth,
    /// Elevation only.
    Elevation,
    /// Both axes.
    Both,
}

impl SteeringMode {
    /// Whether the azimuth axis steers.
    #[must_use]
    pub const fn steers_azimuth(self) -> bool {
        matches!(self, Self::Azimuth | Self::Both)
    }

    /// Whether the elevation axis steers.
    #[must_use]
    pub const fn steers_elevation(self) -> bool {
        matches!(self, Self::Elevation | Self::Both)
    }
}

/// Electronic beam steering limits and loss model.
///
/// Steering off broadside costs gain as `cos^n` of the steering angle per
/// axis. A steering angle whose cosine falls below the configured limit is
/// outside the steering cone and the loss is zero.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElectronicSteering {
    mode: SteeringMode,
    azimuth_cosine_limit: f64,
    elevation_cosine_limit: f64,
    azimuth_loss_exponent: f64,
    elevation_loss_exponent: f64,
}

impl ElectronicSteering {
    /// Default steering cone, ±60° per axis.
    pub const DEFAULT_COSINE_LIMIT: f64 = 0.5;

    /// Default scan-loss exponent.
    pub const DEFAULT_LOSS_EXPONENT: f64 = 1.5;

    /// Creates steering for `mode` with the default cone and exponents.
    #[must_use]
    pub const fn new(mode: SteeringMode) -> Self {
        Self {
            mode,
            azimuth_cosine_limit: Self::DEFAULT_COSINE_LIMIT,
            elevation_cosine_limit: Self::DEFAULT_COSINE_LIMIT,
            azimuth_loss_exponent: Self::DEFAULT_LOSS_EXPONENT,
            elevation_loss_exponent: Self::DEFAULT_LOSS_EXPONENT,
        }
    }

    /// Sets the per-axis cosine steering limits.
    pub fn with_cosine_limits(mut self, azimuth: f64, elevation: f64) -> Result<Self, AntennaError> {
        for limit in [azimuth, elevation] {
            if limit <= 0.0 || limit > 1.0 {
                return Err(AntennaError::InvalidSteeringLimit(limit));
            }
        }
        self.azimuth_cosine_limit = azimuth;
        self.elevation_cosine_limit = elevation;
        Ok(self)
    }

    /// Sets the per-axis scan-loss exponents.
    #[must_use]
    pub const fn with_loss_exponents(mut self, azimuth: f64, elevation: f64) -> Self {
        self.azimuth_loss_exponent = azimuth;
        self.elevation_loss_exponent = elevation;
        self
    }

    /// The steering mode.
    #[must_use]
    pub const fn mode(&self) -> SteeringMode {
        self.mode
    }

    /// Steering loss `cos^n_az(ebs_az) · cos^n_el(ebs_el)`, zero outside the
    /// steering cone. Axes that do not steer contribute unity.
    #[must_use]
    pub fn loss(&self, ebs_az: Angle, ebs_el: Angle) -> Ratio {
        let mut loss = 1.0;
        if self.mode.steers_azimuth() {
            let c = ebs_az.radian().cos();
            if c < self.azimuth_cosine_limit {
                return Ratio::ZERO;
            }
            loss *= c.powf(self.azimuth_loss_exponent);
        }
        if self.mode.steers_elevation() {
            let c = ebs_el.radian().cos();
            if c < self.elevation_cosine_limit {
                return Ratio::ZERO;
            }
            loss *= c.powf(self.elevation_loss_exponent);
        }
        Ratio::from_linear(loss)
    }
}

impl Default for ElectronicSteering {
    fn default() -> Self {
        Self::new(SteeringMode::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::deg;

    #[test]
    fn no_steering_is_lossless() {
        let s = ElectronicSteering::default();
        approx::assert_abs_diff_eq!(s.loss(80.0 * deg, 80.0 * deg).linear(), 1.0);
    }

    #[test]
    fn broadside_is_lossless() {
        let s = ElectronicSteering::new(SteeringMode::Both);
        approx::assert_abs_diff_eq!(s.loss(Angle::ZERO, Angle::ZERO).linear(), 1.0);
    }

    #[test]
    fn cosine_exponent_loss() {
        let s = ElectronicSteering::new(SteeringMode::Azimuth).with_loss_exponents(1.5, 1.5);
        let expect = 45.0_f64.to_radians().cos().powf(1.5);
        approx::assert_abs_diff_eq!(
            s.loss(45.0 * deg, Angle::ZERO).linear(),
            expect,
            epsilon = 1e-12
        );
        // Elevation axis does not steer, so its angle is ignored.
        approx::assert_abs_diff_eq!(
            s.loss(45.0 * deg, 80.0 * deg).linear(),
            expect,
            epsilon = 1e-12
        );
    }

    #[test]
    fn outside_the_cone_is_zero() {
        let s = ElectronicSteering::new(SteeringMode::Both);
        assert_eq!(s.loss(70.0 * deg, Angle::ZERO).linear(), 0.0);
        assert_eq!(s.loss(Angle::ZERO, -70.0 * deg).linear(), 0.0);
    }

    #[test]
    fn rejects_bad_limits() {
        assert_eq!(
            ElectronicSteering::new(SteeringMode::Both)
                .with_cosine_limits(0.0, 0.5)
                .unwrap_err(),
            AntennaError::InvalidSteeringLimit(0.0)
        );
        assert!(ElectronicSteering::new(SteeringMode::Both)
            .with_cosine_limits(0.5, 1.5)
            .is_err());
    }
}
