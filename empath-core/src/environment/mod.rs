use std::sync::Once;

use crate::common::Angle;

/// External terrain elevation source.
///
/// `None` means no data at the query point; callers fall back to mean sea
/// level for that sample.
pub trait Terrain: Send + Sync {
    /// Terrain height above MSL in \[m\] at a geodetic location.
    fn height_msl(&self, lat: Angle, lon: Angle) -> Option<f64>;
}

static MISSING_TERRAIN_WARNING: Once = Once::new();

/// Samples the terrain handle, falling back to MSL where data is missing.
///
/// The fallback is reported once per process.
#[must_use]
pub fn sample_terrain_height(terrain: &dyn Terrain, lat: Angle, lon: Angle) -> f64 {
    terrain.height_msl(lat, lon).unwrap_or_else(|| {
        MISSING_TERRAIN_WARNING.call_once(|| {
            tracing::warn!(
                lat_deg = lat.degree(),
                lon_deg = lon.degree(),
                "no terrain data; treating as mean sea level"
            );
        });
        0.0
    })
}

/// Spatial domain a platform operates in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpatialDomain {
    /// On the ground.
    #[default]
    Land,
    /// Airborne.
    Air,
    /// On the water surface.
    Surface,
    /// Below the water surface.
    Subsurface,
    /// Orbital.
    Space,
}

/// Gross terrain relief classification.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LandForm {
    /// Flat to gently undulating.
    #[default]
    Level,
    /// Rolling hills.
    Rolling,
    /// Pronounced hills.
    Hilly,
    /// Mountainous relief.
    Mountainous,
}

/// Surface cover classification, following the USGS land-use categories.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LandCover {
    /// Unspecified mixed cover.
    #[default]
    General,
    /// Built-up area.
    Urban,
    /// Cropland.
    Agricultural,
    /// Grassland.
    RangelandHerbaceous,
    /// Shrub and brush rangeland.
    RangelandShrub,
    /// Deciduous forest.
    ForestDeciduous,
    /// Coniferous forest.
    ForestConiferous,
    /// Mixed forest.
    ForestMixed,
    /// Open water.
    Water,
    /// Forested wetland.
    WetlandForested,
    /// Non-forested wetland.
    WetlandNonforested,
    /// Exposed rock, sand, or soil.
    Barren,
    /// Tundra.
    Tundra,
    /// Permanent snow or ice.
    PerennialSnow,
}

impl LandCover {
    /// RF ground constants `(relative permittivity, conductivity [S/m])`.
    #[must_use]
    pub const fn rf_ground(self) -> (f64, f64) {
        match self {
            Self::General => (15.0, 1e-3),
            Self::Urban => (3.0, 1e-4),
            Self::Agricultural => (25.0, 1e-2),
            Self::RangelandHerbaceous => (15.0, 1e-3),
            Self::RangelandShrub => (13.0, 1e-3),
            Self::ForestDeciduous | Self::ForestConiferous | Self::ForestMixed => (13.0, 3e-3),
            Self::Water => (70.0, 5.0),
            Self::WetlandForested => (25.0, 2e-2),
            Self::WetlandNonforested => (30.0, 2e-2),
            Self::Barren => (3.0, 1e-4),
            Self::Tundra => (5.0, 1e-4),
            Self::PerennialSnow => (3.2, 1e-5),
        }
    }

    /// Acoustic ground constants `(flow resistivity [kPa·s/m²], inverse depth [1/m])`
    /// for the acoustic-sensor collaborators.
    #[must_use]
    pub const fn acoustic_ground(self) -> (f64, f64) {
        match self {
            Self::General => (200.0, 0.0),
            Self::Urban => (20_000.0, 0.0),
            Self::Agricultural => (600.0, 0.0),
            Self::RangelandHerbaceous => (250.0, 0.0),
            Self::RangelandShrub => (300.0, 0.0),
            Self::ForestDeciduous | Self::ForestConiferous | Self::ForestMixed => (50.0, 10.0),
            Self::Water => (1_000_000.0, 0.0),
            Self::WetlandForested => (75.0, 15.0),
            Self::WetlandNonforested => (100.0, 15.0),
            Self::Barren => (3_000.0, 0.0),
            Self::Tundra => (150.0, 5.0),
            Self::PerennialSnow => (25.0, 30.0),
        }
    }
}

/// Simulation-wide environmental state read by the physics models.
#[non_exhaustive]
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Environment {
    /// Surface cover classification.
    pub land_cover: LandCover,
    /// Gross relief classification.
    pub land_form: LandForm,
    /// Douglas sea state, 0 (calm) through 6.
    pub sea_state: u8,
    /// Wind speed at the surface in \[m/s\].
    pub wind_speed: f64,
    /// Direction the wind blows from.
    pub wind_direction: Angle,
    /// Surface air temperature in \[K\].
    pub temperature: f64,
    /// Surface pressure in \[hPa\].
    pub pressure: f64,
    /// Surface water-vapor density in \[g/m³\].
    pub water_vapor_density: f64,
    /// Rain rate in \[mm/h\]; zero disables the rain term.
    pub rain_rate: f64,
    /// Upper altitude of the rain layer in \[m\] MSL.
    pub rain_upper_altitude: f64,
    /// Cloud liquid-water density in \[g/m³\]; zero disables the cloud term.
    pub cloud_water_density: f64,
    /// Cloud layer bounds in \[m\] MSL.
    pub cloud_altitudes: (f64, f64),
}

impl Environment {
    /// Creates the mean standard environment: 15 °C, 1013.25 hPa, 7.5 g/m³
    /// water vapor, no rain or cloud, calm sea over general land cover.
    #[must_use]
    pub fn new() -> Self {
        Self {
            land_cover: LandCover::General,
            land_form: LandForm::Level,
            sea_state: 0,
            wind_speed: 0.0,
            wind_direction: Angle::ZERO,
            temperature: 288.15,
            pressure: 1013.25,
            water_vapor_density: 7.5,
            rain_rate: 0.0,
            rain_upper_altitude: 3_000.0,
            cloud_water_density: 0.0,
            cloud_altitudes: (1_000.0, 2_000.0),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_standard_atmosphere() {
        let env = Environment::default();
        approx::assert_abs_diff_eq!(env.temperature, 288.15);
        approx::assert_abs_diff_eq!(env.pressure, 1013.25);
        approx::assert_abs_diff_eq!(env.water_vapor_density, 7.5);
        assert_eq!(env.land_cover, LandCover::General);
    }

    #[test]
    fn water_is_conductive() {
        let (eps, sigma) = LandCover::Water.rf_ground();
        assert!(eps > 50.0);
        assert!(sigma > 1.0);
        let (_, sigma_dry) = LandCover::Barren.rf_ground();
        assert!(sigma_dry < 1e-3);
    }

    struct NoData;

    impl Terrain for NoData {
        fn height_msl(&self, _lat: Angle, _lon: Angle) -> Option<f64> {
            None
        }
    }

    #[test]
    fn missing_terrain_is_msl() {
        approx::assert_abs_diff_eq!(
            sample_terrain_height(&NoData, Angle::ZERO, Angle::ZERO),
            0.0
        );
    }
}
