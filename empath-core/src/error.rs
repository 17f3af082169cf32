use thiserror::Error;

/// Antenna-pattern configuration error.
#[derive(Error, Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum PatternError {
    /// Beamwidth out of range.
    #[error("Beamwidth ({0} rad) is out of range")]
    InvalidBeamwidth(f64),
    /// Peak gain out of range.
    #[error("Peak gain ({0}) must be positive")]
    InvalidPeakGain(f64),
    /// A tabular axis is not strictly increasing.
    #[error("Table axis `{0}` is not strictly increasing")]
    NonMonotonicAxis(&'static str),
    /// A table has no entries.
    #[error("Table `{0}` has no entries")]
    EmptyTable(&'static str),
    /// Aperture dimension out of range.
    #[error("Aperture dimension ({0} m) must be positive")]
    InvalidAperture(f64),
}

/// Antenna mount configuration error.
#[derive(Error, Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum AntennaError {
    /// A min/max pair is reversed.
    #[error("{name} limits are reversed ({min} > {max})")]
    ReversedLimits {
        /// Which limit pair.
        name: &'static str,
        /// Configured minimum.
        min: f64,
        /// Configured maximum.
        max: f64,
    },
    /// Elevation limit outside [-π/2, π/2].
    #[error("Elevation limit ({0} rad) must be within [-π/2, π/2]")]
    ElevationLimitOutOfRange(f64),
    /// The field of view does not contain the scan volume.
    #[error("Field of view must contain the scan limits when both are set")]
    FieldOfViewExcludesScanVolume,
    /// EBS cosine steering limit outside (0, 1].
    #[error("Cosine steering limit ({0}) must be in (0, 1]")]
    InvalidSteeringLimit(f64),
}

/// Transmitter/receiver configuration error.
#[derive(Error, Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum RadioError {
    /// Frequency must be positive.
    #[error("Frequency ({0} Hz) must be positive")]
    InvalidFrequency(f64),
    /// Bandwidth must be positive.
    #[error("Bandwidth ({0} Hz) must be positive")]
    InvalidBandwidth(f64),
    /// Duty cycle outside [0, 1].
    #[error("Duty cycle ({0}) must be in [0, 1]")]
    InvalidDutyCycle(f64),
    /// Pulse width and PRF describe an over-unity duty factor.
    #[error("pulse_width × PRF ({0}) must not exceed 1")]
    PulseWidthPrfConflict(f64),
    /// Power must be non-negative.
    #[error("Power ({0} W) must be non-negative")]
    InvalidPower(f64),
    /// Noise figure must be at least unity.
    #[error("Noise figure ({0}) must be ≥ 1")]
    InvalidNoiseFigure(f64),
    /// A loss factor must be at least unity.
    #[error("{name} ({value}) must be ≥ 1")]
    InvalidLoss {
        /// Which loss.
        name: &'static str,
        /// Configured linear value.
        value: f64,
    },
    /// PRF entry index out of range.
    #[error("PRF index {0} is out of range (have {1} entries)")]
    PrfIndexOutOfRange(usize, usize),
}

/// An interface for error handling in empath-core.
#[derive(Error, Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum EmError {
    /// Antenna pattern error
    #[error("{0}")]
    Pattern(#[from] PatternError),
    /// Antenna mount error
    #[error("{0}")]
    Antenna(#[from] AntennaError),
    /// Transmitter/receiver error
    #[error("{0}")]
    Radio(#[from] RadioError),
    /// A referenced transmitter or receiver is not registered.
    #[error("Not registered with the manager: {0}")]
    NotRegistered(&'static str),
    /// Unknown token in a textual configuration stream.
    #[error("Unknown input `{token}` at line {line}")]
    UnknownInput {
        /// Offending token.
        token: String,
        /// 1-based line number.
        line: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            EmError::from(RadioError::InvalidBandwidth(0.0)).to_string(),
            "Bandwidth (0 Hz) must be positive"
        );
        assert_eq!(
            AntennaError::ReversedLimits {
                name: "range",
                min: 2.0,
                max: 1.0
            }
            .to_string(),
            "range limits are reversed (2 > 1)"
        );
    }
}
