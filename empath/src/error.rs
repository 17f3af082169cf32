use thiserror::Error;

/// Detector configuration problems, raised at construction.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DetectorError {
    /// The integrated pulse count must be at least one.
    #[error("pulse count must be at least 1, got {0}")]
    InvalidPulseCount(u32),
    /// A probability argument fell outside the open interval (0, 1).
    #[error("{name} must lie in (0, 1), got {value}")]
    InvalidProbability {
        /// Which probability was rejected.
        name: &'static str,
        /// The offending value.
        value: f64,
    },
    /// A Pd curve needs at least two points.
    #[error("Pd curve needs at least 2 points, got {0}")]
    CurveTooShort(usize),
    /// Pd curve abscissas must strictly increase and Pd must not decrease.
    #[error("Pd curve is not monotonic at point {0}")]
    CurveNotMonotonic(usize),
    /// The requested Pd is outside what the detector can reach.
    #[error("required Pd {0} is outside the detector's reachable range")]
    UnreachablePd(f64),
}

/// Sensor mode and beam configuration problems.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SensorError {
    /// The frequency-agility set cannot be empty.
    #[error("frequency-agility set is empty")]
    EmptyFrequencySet,
    /// A frequency index pointed past the agility set.
    #[error("frequency index {got} out of range for a set of {len}")]
    FrequencyIndex {
        /// The requested index.
        got: usize,
        /// Entries in the set.
        len: usize,
    },
    /// The settling delay must be non-negative and finite.
    #[error("settling delay must be a non-negative time, got {0}")]
    InvalidSettlingDelay(f64),
    /// M-of-N needs 1 <= M <= N.
    #[error("M-of-N needs 1 <= M <= N, got {m} of {n}")]
    InvalidMOfN {
        /// Detections required.
        m: usize,
        /// Window length.
        n: usize,
    },
    /// A discrimination delta must be non-negative.
    #[error("{name} must be non-negative, got {value}")]
    InvalidDelta {
        /// Which delta was rejected.
        name: &'static str,
        /// The offending value.
        value: f64,
    },
    /// The beam's detector rejected its configuration.
    #[error(transparent)]
    Detector(#[from] DetectorError),
}

/// Antenna-pattern plot problems: command parsing and file output.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PlotError {
    /// A command the parser does not know.
    #[error("unknown plot command `{token}` on line {line}")]
    UnknownCommand {
        /// The offending token.
        token: String,
        /// One-based input line.
        line: usize,
    },
    /// A command was missing a required argument.
    #[error("plot command `{command}` on line {line} is missing an argument")]
    MissingArgument {
        /// The command.
        command: String,
        /// One-based input line.
        line: usize,
    },
    /// A numeric argument failed to parse.
    #[error("bad number `{token}` on line {line}")]
    BadNumber {
        /// The offending token.
        token: String,
        /// One-based input line.
        line: usize,
    },
    /// A step or limit that must be strictly positive was not.
    #[error("{name} must be strictly positive, got {value}")]
    InvalidStep {
        /// Which quantity was rejected.
        name: &'static str,
        /// The offending value.
        value: f64,
    },
    /// A sweep range ran backwards.
    #[error("{name} range runs backwards")]
    ReversedRange {
        /// Which axis was rejected.
        name: &'static str,
    },
    /// The steering configuration was rejected.
    #[error(transparent)]
    Antenna(#[from] empath_core::error::AntennaError),
    /// Writing an output file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
