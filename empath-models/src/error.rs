use thiserror::Error;

/// Model configuration error, raised at load time; the models themselves
/// never fail once built.
#[derive(Error, Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum ModelError {
    /// The table axes cannot locate a point on a signal path.
    #[error("Attenuation table needs a slant_range axis or (altitude, ground_range) axes")]
    UnderspecifiedGeometry,
    /// No altitude axis to anchor the path vertically.
    #[error("Attenuation table needs an altitude axis when elevation_angle is absent")]
    MissingAltitudeAxis,
    /// An axis is not strictly increasing.
    #[error("Table axis `{0}` is not strictly increasing")]
    NonMonotonicAxis(&'static str),
    /// The value block does not match the axis grid.
    #[error("Table has {got} values but the axis grid holds {want}")]
    ValueCountMismatch {
        /// Values supplied.
        got: usize,
        /// Grid size implied by the axes.
        want: usize,
    },
    /// A table or axis has no entries.
    #[error("Table `{0}` has no entries")]
    EmptyTable(&'static str),
    /// A numeric field failed to parse.
    #[error("Bad number `{token}` at line {line}")]
    BadNumber {
        /// Offending token.
        token: String,
        /// 1-based line number.
        line: usize,
    },
    /// An unrecognized keyword in a model block.
    #[error("Unknown input `{token}` at line {line}")]
    UnknownInput {
        /// Offending token.
        token: String,
        /// 1-based line number.
        line: usize,
    },
    /// A parameter outside its physical range.
    #[error("{name} ({value}) is out of range")]
    OutOfRange {
        /// Which parameter.
        name: &'static str,
        /// Configured value.
        value: f64,
    },
    /// No factory registered under the requested name.
    #[error("No {family} model named `{name}`")]
    UnknownModel {
        /// Model family (attenuation, propagation, clutter).
        family: &'static str,
        /// Requested name.
        name: String,
    },
}
