use crate::common::Angle;

/// Angular field of view of an antenna, evaluated on apparent azimuth and
/// elevation in the stabilized scan frame.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldOfView {
    /// Azimuth/elevation box. An azimuth pair with `min > max` spans the
    /// ±π wrap.
    Rectangular {
        /// Azimuth bounds `(min, max)`.
        azimuth: (Angle, Angle),
        /// Elevation bounds `(min, max)`.
        elevation: (Angle, Angle),
    },
    /// Closed polygon of `(azimuth, elevation)` vertices, even-odd rule.
    Polygonal {
        /// Polygon vertices in order.
        vertices: Vec<(Angle, Angle)>,
    },
}

impl FieldOfView {
    /// The default 360°×180° field of view.
    #[must_use]
    pub fn full() -> Self {
        Self::Rectangular {
            azimuth: (-Angle::PI, Angle::PI),
            elevation: (-Angle::HALF_PI, Angle::HALF_PI),
        }
    }

    /// Whether this is the unrestricted default.
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(
            self,
            Self::Rectangular {
                azimuth: (az_min, az_max),
                elevation: (el_min, el_max),
            } if az_max.radian() - az_min.radian() >= std::f64::consts::TAU - 1e-12
                && el_max.radian() - el_min.radian() >= std::f64::consts::PI - 1e-12
        )
    }

    /// Whether `(az, el)` lies inside the field of view.
    #[must_use]
    pub fn contains(&self, az: Angle, el: Angle) -> bool {
        match self {
            Self::Rectangular { azimuth, elevation } => {
                azimuth_in(az, *azimuth)
                    && el.radian() >= elevation.0.radian()
                    && el.radian() <= elevation.1.radian()
            }
            Self::Polygonal { vertices } => {
                point_in_polygon(az.radian(), el.radian(), vertices)
            }
        }
    }

    /// Whether the field of view contains the whole az/el scan box.
    ///
    /// Polygonal fields test the box corners and center, which is exact for
    /// convex polygons.
    #[must_use]
    pub fn contains_box(&self, azimuth: (Angle, Angle), elevation: (Angle, Angle)) -> bool {
        let az_mid = (azimuth.0 + azimuth.1) / 2.0;
        let el_mid = (elevation.0 + elevation.1) / 2.0;
        [
            (azimuth.0, elevation.0),
            (azimuth.0, elevation.1),
            (azimuth.1, elevation.0),
            (azimuth.1, elevation.1),
            (az_mid, el_mid),
        ]
        .into_iter()
        .all(|(az, el)| self.contains(az, el))
    }
}

impl Default for FieldOfView {
    fn default() -> Self {
        Self::full()
    }
}

fn azimuth_in(az: Angle, (min, max): (Angle, Angle)) -> bool {
    let az = az.normalized().radian();
    let (min, max) = (min.radian(), max.radian());
    if min <= max {
        az >= min && az <= max
    } else {
        // The box spans the ±π wrap.
        az >= min || az <= max
    }
}

fn point_in_polygon(x: f64, y: f64, vertices: &[(Angle, Angle)]) -> bool {
    let mut inside = false;
    let n = vertices.len();
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (vertices[i].0.radian(), vertices[i].1.radian());
        let (xj, yj) = (vertices[j].0.radian(), vertices[j].1.radian());
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::deg;

    #[test]
    fn full_contains_everything() {
        let fov = FieldOfView::full();
        assert!(fov.is_full());
        assert!(fov.contains(179.0 * deg, -89.0 * deg));
        assert!(fov.contains(-180.0 * deg + 0.001 * deg, 90.0 * deg));
    }

    #[rstest::rstest]
    #[case(true, 0.0, 0.0)]
    #[case(true, 29.0, 9.0)]
    #[case(false, 31.0, 0.0)]
    #[case(false, 0.0, 11.0)]
    fn rectangular(#[case] inside: bool, #[case] az: f64, #[case] el: f64) {
        let fov = FieldOfView::Rectangular {
            azimuth: (-30.0 * deg, 30.0 * deg),
            elevation: (-10.0 * deg, 10.0 * deg),
        };
        assert!(!fov.is_full());
        assert_eq!(inside, fov.contains(az * deg, el * deg));
    }

    #[test]
    fn rectangular_wraps_across_pi() {
        let fov = FieldOfView::Rectangular {
            azimuth: (170.0 * deg, -170.0 * deg),
            elevation: (-90.0 * deg, 90.0 * deg),
        };
        assert!(fov.contains(175.0 * deg, 0.0 * deg));
        assert!(fov.contains(-175.0 * deg, 0.0 * deg));
        assert!(!fov.contains(0.0 * deg, 0.0 * deg));
    }

    #[test]
    fn polygon_diamond() {
        let fov = FieldOfView::Polygonal {
            vertices: vec![
                (0.0 * deg, 20.0 * deg),
                (30.0 * deg, 0.0 * deg),
                (0.0 * deg, -20.0 * deg),
                (-30.0 * deg, 0.0 * deg),
            ],
        };
        assert!(fov.contains(0.0 * deg, 0.0 * deg));
        assert!(fov.contains(10.0 * deg, 5.0 * deg));
        assert!(!fov.contains(25.0 * deg, 15.0 * deg));
    }

    #[test]
    fn box_containment() {
        let fov = FieldOfView::Rectangular {
            azimuth: (-60.0 * deg, 60.0 * deg),
            elevation: (-30.0 * deg, 30.0 * deg),
        };
        assert!(fov.contains_box((-45.0 * deg, 45.0 * deg), (-20.0 * deg, 20.0 * deg)));
        assert!(!fov.contains_box((-45.0 * deg, 75.0 * deg), (-20.0 * deg, 20.0 * deg)));
    }
}
