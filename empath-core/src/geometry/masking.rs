use crate::common::{rad, Angle, EARTH_MEAN_RADIUS};
use crate::environment::Terrain;

use super::Geodetic;

/// Ground-range increment of a terrain profile, fixed at 3 arc-seconds of a
/// mean-radius great circle (≈ 92.6 m, one level-1 DTED post).
pub const TERRAIN_PROFILE_STEP: f64 = std::f64::consts::PI * EARTH_MEAN_RADIUS / (180.0 * 1200.0);

/// Effective earth radius in \[m\] for a refraction scale factor `k`.
#[must_use]
pub fn effective_earth_radius(k: f64) -> f64 {
    k * EARTH_MEAN_RADIUS
}

/// Elevation angle of the refracted ray, given the true elevation and the
/// ground range in \[m\].
///
/// The correction decays as the earth-radius scale grows, so an infinite
/// scale recovers the true angle. Azimuth is unaffected.
#[must_use]
pub fn apparent_elevation(true_el: Angle, ground_range: f64, earth_radius_scale: f64) -> Angle {
    if !earth_radius_scale.is_finite() || earth_radius_scale <= 0.0 {
        return true_el;
    }
    true_el + (ground_range / (2.0 * effective_earth_radius(earth_radius_scale))) * rad
}

/// Distance in \[m\] to the smooth-earth horizon from an altitude `alt_msl`.
#[must_use]
pub fn horizon_range(alt_msl: f64, earth_radius_scale: f64) -> f64 {
    (2.0 * effective_earth_radius(earth_radius_scale) * alt_msl.max(0.0)).sqrt()
}

/// Whether the segment between two positions dips below the smooth earth
/// inflated by the refraction scale factor.
#[must_use]
pub fn horizon_masked(a: &Geodetic, b: &Geodetic, earth_radius_scale: f64) -> bool {
    let ground_range = a.ground_range_to(b);
    ground_range > horizon_range(a.alt, earth_radius_scale) + horizon_range(b.alt, earth_radius_scale)
}

/// Whether terrain blocks the refracted ray between two positions.
///
/// Walks the path at `spacing` metres, comparing the effective-earth ray
/// height against the terrain handle. Missing terrain data is flat earth at
/// MSL for that sample.
#[must_use]
pub fn terrain_masked(
    terrain: &dyn Terrain,
    a: &Geodetic,
    b: &Geodetic,
    earth_radius_scale: f64,
    spacing: f64,
) -> bool {
    let total = a.ground_range_to(b);
    if total <= spacing {
        return false;
    }
    let re = 2.0 * effective_earth_radius(earth_radius_scale);
    let d_lat = b.lat - a.lat;
    let d_lon = (b.lon - a.lon).normalized();
    let n = (total / spacing).ceil() as usize;
    (1..n).any(|i| {
        let t = i as f64 / n as f64;
        let d1 = t * total;
        let d2 = total - d1;
        let ray = a.alt + (b.alt - a.alt) * t - d1 * d2 / re;
        let lat = a.lat + d_lat * t;
        let lon = (a.lon + d_lon * t).normalized();
        ray < crate::environment::sample_terrain_height(terrain, lat, lon)
    })
}
