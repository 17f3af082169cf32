use crate::common::Ratio;

/// Antenna polarization.
///
/// `Default` stands in for "whatever the antenna natively radiates" and
/// couples fully to every receive polarization; it canonicalizes to
/// horizontal where a physical row or column is needed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Polarization {
    /// Unspecified; matched to anything.
    #[default]
    Default,
    /// Linear horizontal.
    Horizontal,
    /// Linear vertical.
    Vertical,
    /// Left-hand circular.
    LeftCircular,
    /// Right-hand circular.
    RightCircular,
}

impl Polarization {
    /// Index into the 4×4 cross-product table.
    const fn index(self) -> usize {
        match self {
            Self::Default | Self::Horizontal => 0,
            Self::Vertical => 1,
            Self::LeftCircular => 2,
            Self::RightCircular => 3,
        }
    }

    /// Whether the polarization is linear.
    #[must_use]
    pub const fn is_linear(self) -> bool {
        matches!(self, Self::Default | Self::Horizontal | Self::Vertical)
    }
}

/// 4×4 transmit×receive polarization coupling factors.
///
/// Rows are transmit polarization, columns receive. The physical default:
/// co-polarized couples fully, orthogonal linear and opposite circular are
/// rejected, and linear against circular loses half the power.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolarizationTable {
    factors: [[f64; 4]; 4],
}

impl PolarizationTable {
    /// Creates the physical default table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            //        H    V    LC   RC
            factors: [
                [1.0, 0.0, 0.5, 0.5], // H
                [0.0, 1.0, 0.5, 0.5], // V
                [0.5, 0.5, 1.0, 0.0], // LC
                [0.5, 0.5, 0.0, 1.0], // RC
            ],
        }
    }

    /// Coupling factor from a transmit to a receive polarization.
    ///
    /// A `Default` on either side couples fully.
    #[must_use]
    pub fn factor(&self, transmit: Polarization, receive: Polarization) -> Ratio {
        if transmit == Polarization::Default || receive == Polarization::Default {
            return Ratio::ONE;
        }
        Ratio::from_linear(self.factors[transmit.index()][receive.index()])
    }

    /// Overrides one entry; the factor clamps into `[0, 1]`.
    pub fn set(&mut self, transmit: Polarization, receive: Polarization, factor: f64) {
        self.factors[transmit.index()][receive.index()] = factor.clamp(0.0, 1.0);
    }
}

impl Default for PolarizationTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case(1.0, Polarization::Horizontal, Polarization::Horizontal)]
    #[case(0.0, Polarization::Horizontal, Polarization::Vertical)]
    #[case(0.5, Polarization::Vertical, Polarization::LeftCircular)]
    #[case(0.0, Polarization::LeftCircular, Polarization::RightCircular)]
    #[case(1.0, Polarization::Default, Polarization::RightCircular)]
    fn default_table(#[case] expect: f64, #[case] tx: Polarization, #[case] rx: Polarization) {
        approx::assert_abs_diff_eq!(PolarizationTable::new().factor(tx, rx).linear(), expect);
    }

    #[test]
    fn override_clamps() {
        let mut t = PolarizationTable::new();
        t.set(Polarization::Horizontal, Polarization::Vertical, 1.7);
        approx::assert_abs_diff_eq!(
            t.factor(Polarization::Horizontal, Polarization::Vertical)
                .linear(),
            1.0
        );
    }
}
