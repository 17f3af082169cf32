use empath_core::common::Ratio;
use empath_core::environment::Environment;
use empath_core::model::{Attenuation, SignalPath};
use itertools::Itertools;
use smallvec::SmallVec;

use crate::ModelError;

/// Independent variable a tabular attenuation axis can key on.
///
/// Units in the reference file form: frequency in \[Hz\], altitudes and
/// ranges in \[m\], elevation in \[deg\].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableAxis {
    /// Operating frequency \[Hz\].
    Frequency,
    /// Low-endpoint altitude \[m\] MSL.
    Altitude,
    /// Path elevation \[deg\].
    ElevationAngle,
    /// Slant range \[m\].
    SlantRange,
    /// Low-endpoint altitude \[m\] MSL.
    Altitude1,
    /// High-endpoint altitude \[m\] MSL.
    Altitude2,
    /// Great-circle ground range \[m\].
    GroundRange,
}

impl TableAxis {
    /// Keyword in the reference file form.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Frequency => "frequency",
            Self::Altitude => "altitude",
            Self::ElevationAngle => "elevation_angle",
            Self::SlantRange => "slant_range",
            Self::Altitude1 => "altitude_1",
            Self::Altitude2 => "altitude_2",
            Self::GroundRange => "ground_range",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "frequency" => Self::Frequency,
            "altitude" => Self::Altitude,
            "elevation_angle" => Self::ElevationAngle,
            "slant_range" => Self::SlantRange,
            "altitude_1" => Self::Altitude1,
            "altitude_2" => Self::Altitude2,
            "ground_range" => Self::GroundRange,
            _ => return None,
        })
    }

    /// Reads the axis value off a signal path.
    fn sample(self, path: &SignalPath) -> f64 {
        match self {
            Self::Frequency => path.frequency.hz(),
            Self::Altitude | Self::Altitude1 => path.low_altitude(),
            Self::ElevationAngle => path.elevation.degree(),
            Self::SlantRange => path.range,
            Self::Altitude2 => path.high_altitude(),
            Self::GroundRange => path.ground_range,
        }
    }

    const fn is_altitude(self) -> bool {
        matches!(self, Self::Altitude | Self::Altitude1 | Self::Altitude2)
    }
}

/// Externally supplied attenuation table in \[dB\], multilinear in up to
/// seven axes, clamped at the table edges.
#[derive(Clone, Debug)]
pub struct Tabular {
    axes: Vec<(TableAxis, Vec<f64>)>,
    /// Row-major, last axis fastest.
    values: Vec<f64>,
    two_way: bool,
    adjustment_factor: f64,
}

impl Tabular {
    /// Builds a table, validating axis sanity and value count.
    pub fn new(
        axes: Vec<(TableAxis, Vec<f64>)>,
        values: Vec<f64>,
    ) -> Result<Self, ModelError> {
        if axes.is_empty() {
            return Err(ModelError::EmptyTable("attenuation"));
        }
        for (axis, breaks) in &axes {
            if breaks.is_empty() {
                return Err(ModelError::EmptyTable(axis.name()));
            }
            if breaks.iter().tuple_windows().any(|(a, b)| b <= a) {
                return Err(ModelError::NonMonotonicAxis(axis.name()));
            }
        }
        let has = |want: TableAxis| axes.iter().any(|(a, _)| *a == want);
        let locatable = has(TableAxis::SlantRange)
            || (axes.iter().any(|(a, _)| a.is_altitude()) && has(TableAxis::GroundRange));
        if !locatable {
            return Err(ModelError::UnderspecifiedGeometry);
        }
        if !has(TableAxis::ElevationAngle) && !axes.iter().any(|(a, _)| a.is_altitude()) {
            return Err(ModelError::MissingAltitudeAxis);
        }
        let want: usize = axes.iter().map(|(_, b)| b.len()).product();
        if values.len() != want {
            return Err(ModelError::ValueCountMismatch {
                got: values.len(),
                want,
            });
        }
        Ok(Self {
            axes,
            values,
            two_way: false,
            adjustment_factor: 1.0,
        })
    }

    /// Marks the stored values as two-way attenuation.
    #[must_use]
    pub fn two_way(mut self) -> Self {
        self.two_way = true;
        self
    }

    /// Scales every interpolated dB value.
    pub fn with_adjustment_factor(mut self, factor: f64) -> Result<Self, ModelError> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(ModelError::OutOfRange {
                name: "adjustment_factor",
                value: factor,
            });
        }
        self.adjustment_factor = factor;
        Ok(self)
    }

    /// Parses the reference file form.
    ///
    /// Keywords: `independent_variable <name> <count>` followed by the
    /// breakpoints, `two_way_attenuation`, `adjustment_factor <k>`, `values`
    /// followed by the full row-major block, and an optional
    /// `end_attenuation_model` terminator.
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let tokens: Vec<(usize, &str)> = input
            .lines()
            .enumerate()
            .flat_map(|(i, l)| {
                l.split('#').next().unwrap_or("")
                    .split_whitespace()
                    .map(move |t| (i + 1, t))
            })
            .collect();
        let number = |&(line, token): &(usize, &str)| -> Result<f64, ModelError> {
            token.parse().map_err(|_| ModelError::BadNumber {
                token: token.to_owned(),
                line,
            })
        };

        let mut axes = Vec::new();
        let mut values = None;
        let mut two_way = false;
        let mut adjustment = 1.0;
        let mut cursor = tokens.iter();
        while let Some(&(line, keyword)) = cursor.next() {
            match keyword {
                "independent_variable" => {
                    let &(line, name) = cursor.next().ok_or(ModelError::UnknownInput {
                        token: "independent_variable".to_owned(),
                        line,
                    })?;
                    let axis = TableAxis::from_name(name).ok_or_else(|| {
                        ModelError::UnknownInput {
                            token: name.to_owned(),
                            line,
                        }
                    })?;
                    let count = cursor
                        .next()
                        .map(|t| number(t).map(|n| n as usize))
                        .transpose()?
                        .unwrap_or(0);
                    let breaks = (&mut cursor)
                        .take(count)
                        .map(|t| number(t))
                        .collect::<Result<Vec<_>, _>>()?;
                    if breaks.len() != count {
                        return Err(ModelError::ValueCountMismatch {
                            got: breaks.len(),
                            want: count,
                        });
                    }
                    axes.push((axis, breaks));
                }
                "two_way_attenuation" => two_way = true,
                "adjustment_factor" => {
                    adjustment = cursor
                        .next()
                        .map(|t| number(t))
                        .transpose()?
                        .ok_or(ModelError::OutOfRange {
                            name: "adjustment_factor",
                            value: f64::NAN,
                        })?;
                }
                "values" => {
                    let want: usize = axes.iter().map(|(_, b)| b.len()).product();
                    let block = (&mut cursor)
                        .take(want)
                        .map(|t| number(t))
                        .collect::<Result<Vec<_>, _>>()?;
                    if block.len() != want {
                        return Err(ModelError::ValueCountMismatch {
                            got: block.len(),
                            want,
                        });
                    }
                    values = Some(block);
                }
                "end_attenuation_model" => break,
                other => {
                    return Err(ModelError::UnknownInput {
                        token: other.to_owned(),
                        line,
                    })
                }
            }
        }

        let mut table = Self::new(axes, values.ok_or(ModelError::EmptyTable("values"))?)?;
        if two_way {
            table = table.two_way();
        }
        table.with_adjustment_factor(adjustment)
    }

    /// Multilinear interpolation of the stored dB value at `point`, one
    /// coordinate per axis, clamped at the edges.
    fn interpolate(&self, point: &[f64]) -> f64 {
        // Bracketing cell index and fraction per axis.
        let cells: SmallVec<[(usize, f64); 7]> = self
            .axes
            .iter()
            .zip(point)
            .map(|((_, breaks), &x)| {
                if breaks.len() == 1 || x <= breaks[0] {
                    (0, 0.0)
                } else if x >= breaks[breaks.len() - 1] {
                    (breaks.len().saturating_sub(2), 1.0)
                } else {
                    let i = breaks.partition_point(|&b| b <= x) - 1;
                    (i, (x - breaks[i]) / (breaks[i + 1] - breaks[i]))
                }
            })
            .collect();
        let mut strides: SmallVec<[usize; 7]> = SmallVec::with_capacity(self.axes.len());
        let mut stride = 1;
        for (_, breaks) in self.axes.iter().rev() {
            strides.push(stride);
            stride *= breaks.len();
        }
        strides.reverse();

        // Accumulate over the 2^n cell corners.
        let n = self.axes.len();
        let mut acc = 0.0;
        for corner in 0..(1usize << n) {
            let mut weight = 1.0;
            let mut index = 0;
            for (axis, (&(i, t), &stride)) in cells.iter().zip(&strides).enumerate() {
                let hi = (corner >> axis) & 1 == 1;
                let len = self.axes[axis].1.len();
                let j = if hi { (i + 1).min(len - 1) } else { i };
                weight *= if hi { t } else { 1.0 - t };
                index += j * stride;
            }
            if weight > 0.0 {
                acc += weight * self.values[index];
            }
        }
        acc
    }
}

impl Attenuation for Tabular {
    fn compute(&self, path: &SignalPath, _env: &Environment) -> Ratio {
        let point: SmallVec<[f64; 7]> =
            self.axes.iter().map(|(a, _)| a.sample(path)).collect();
        let mut db = self.interpolate(&point) * self.adjustment_factor;
        if self.two_way {
            db /= 2.0;
        }
        Ratio::from_linear(10f64.powf(-db / 10.0).clamp(0.0, 1.0))
    }

    fn accepts_inline_block_input(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attenuation::tests::level_path;

    fn range_table() -> Tabular {
        Tabular::new(
            vec![
                (TableAxis::Altitude, vec![0.0, 10_000.0]),
                (TableAxis::SlantRange, vec![0.0, 100_000.0]),
            ],
            vec![0.0, 10.0, 0.0, 2.0],
        )
        .unwrap()
    }

    #[test]
    fn bilinear_lookup() {
        // 100 m up, 50 km out: roughly half the sea-level 10 dB column.
        let a = range_table().compute(&level_path(50_000.0, 100.0, 3.0), &Environment::default());
        let expect_db = -(0.5 * 10.0 * (1.0 - 100.0 / 10_000.0) + 0.5 * 2.0 * (100.0 / 10_000.0));
        approx::assert_abs_diff_eq!(a.db(), expect_db, epsilon = 1e-2);
    }

    #[test]
    fn clamps_beyond_the_edges() {
        let t = range_table();
        let env = Environment::default();
        let far = t.compute(&level_path(500_000.0, 0.0, 3.0), &env);
        let edge = t.compute(&level_path(100_000.0, 0.0, 3.0), &env);
        approx::assert_abs_diff_eq!(far.db(), edge.db(), epsilon = 1e-2);
    }

    #[test]
    fn two_way_halves_the_decibels() {
        let one_way = range_table();
        let two_way = range_table().two_way();
        let path = level_path(100_000.0, 0.0, 3.0);
        let env = Environment::default();
        approx::assert_abs_diff_eq!(
            two_way.compute(&path, &env).db(),
            one_way.compute(&path, &env).db() / 2.0,
            epsilon = 1e-3
        );
    }

    #[test]
    fn validation_rejects_unlocatable_axes() {
        let err = Tabular::new(
            vec![(TableAxis::Frequency, vec![1e9, 10e9])],
            vec![0.0, 1.0],
        )
        .unwrap_err();
        assert_eq!(err, ModelError::UnderspecifiedGeometry);

        let err = Tabular::new(
            vec![(TableAxis::SlantRange, vec![0.0, 1e5])],
            vec![0.0, 1.0],
        )
        .unwrap_err();
        assert_eq!(err, ModelError::MissingAltitudeAxis);

        let err = Tabular::new(
            vec![
                (TableAxis::Altitude, vec![0.0, 1.0, 0.5]),
                (TableAxis::SlantRange, vec![0.0, 1e5]),
            ],
            vec![0.0; 6],
        )
        .unwrap_err();
        assert_eq!(err, ModelError::NonMonotonicAxis("altitude"));
    }

    #[test]
    fn parses_the_reference_form() {
        let text = "\
            independent_variable altitude 2\n\
            0.0 10000.0\n\
            independent_variable slant_range 2\n\
            0.0 100000.0\n\
            adjustment_factor 2.0\n\
            values\n\
            0.0 10.0\n\
            0.0 2.0\n\
            end_attenuation_model\n";
        let table = Tabular::parse(text).unwrap();
        let path = level_path(100_000.0, 0.0, 3.0);
        // Sea level at full range: 10 dB scaled by the adjustment factor.
        approx::assert_abs_diff_eq!(
            table.compute(&path, &Environment::default()).db(),
            -20.0,
            epsilon = 1e-2
        );
        assert!(table.accepts_inline_block_input());
    }

    #[test]
    fn parse_reports_the_offending_line() {
        let text = "independent_variable altitude 2\n0.0 bogus\n";
        match Tabular::parse(text).unwrap_err() {
            ModelError::BadNumber { token, line } => {
                assert_eq!(token, "bogus");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
