mod angle;
mod freq;
mod power;

pub use angle::*;
pub use freq::*;
pub use power::*;

/// Speed of light in vacuum in \[m/s\].
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Boltzmann constant in \[J/K\].
pub const BOLTZMANN_CONSTANT: f64 = 1.380_649e-23;

/// Reference noise temperature in \[K\].
pub const REFERENCE_TEMPERATURE: f64 = 290.0;

/// WGS-84 equatorial radius in \[m\].
pub const EARTH_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

/// WGS-84 polar radius in \[m\].
pub const EARTH_SEMI_MINOR_AXIS: f64 = 6_356_752.314_245;

/// First eccentricity squared of the WGS-84 ellipsoid.
pub const EARTH_ECCENTRICITY_SQ: f64 = 6.694_379_990_141_317e-3;

/// Mean earth radius in \[m\], used by the effective-earth refraction model.
pub const EARTH_MEAN_RADIUS: f64 = 6_371_000.0;

/// Default effective-earth radius scale factor for standard refraction.
pub const DEFAULT_EARTH_RADIUS_SCALE: f64 = 4.0 / 3.0;
