use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use derive_more::Display;

use crate::common::{Angle, Freq};
use crate::environment::{SpatialDomain, Terrain};
use crate::geometry::{Orientation, Point3, Vector3};

/// Host-assigned platform identity, used in interaction events.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display)]
#[display("platform#{}", _0)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlatformId(pub u64);

/// Which named signature of a platform to evaluate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignatureKind {
    /// Radar cross section in \[m²\].
    Radar,
    /// Infrared radiant intensity.
    Infrared,
    /// Optical cross section.
    Optical,
}

/// The kinematic state and signatures of a simulation entity.
///
/// Implemented by the host; the engine only reads. `version` must increase
/// whenever location or orientation changes so that antenna frame caches can
/// tell stale from fresh.
pub trait Platform: Send + Sync {
    /// Host identity for events and logs.
    fn id(&self) -> PlatformId;

    /// Current location, earth-centred WCS \[m\].
    fn location_wcs(&self) -> Point3;

    /// Current velocity, WCS \[m/s\].
    fn velocity_wcs(&self) -> Vector3;

    /// Current attitude relative to local NED.
    fn orientation(&self) -> Orientation;

    /// Monotonically increasing state counter.
    fn version(&self) -> u64;

    /// Terrain handle, if the platform's scenario carries one.
    fn terrain(&self) -> Option<&dyn Terrain> {
        None
    }

    /// Spatial domain tag.
    fn spatial_domain(&self) -> SpatialDomain {
        SpatialDomain::Land
    }

    /// Team tag.
    fn side(&self) -> &str {
        ""
    }

    /// Evaluates a named signature toward the given aspect.
    ///
    /// `az`/`el` are in the platform body frame. The default is a unit
    /// signature, which for radar means σ = 1 m².
    fn signature(&self, kind: SignatureKind, frequency: Freq<f64>, az: Angle, el: Angle) -> f64 {
        let _ = (kind, frequency, az, el);
        1.0
    }
}

/// A platform-attached frame with its own pointing cue.
///
/// Every antenna mounts on one part. Re-cueing bumps the part version, which
/// invalidates dependent antenna frame caches.
pub struct ArticulatedPart {
    platform: Arc<dyn Platform>,
    location: Vector3,
    cue: Mutex<Orientation>,
    version: AtomicU64,
}

impl ArticulatedPart {
    /// Creates a part at `location` (platform body frame, \[m\]) with a level cue.
    #[must_use]
    pub fn new(platform: Arc<dyn Platform>, location: Vector3) -> Self {
        Self {
            platform,
            location,
            cue: Mutex::new(Orientation::IDENTITY),
            version: AtomicU64::new(0),
        }
    }

    /// The host platform.
    #[must_use]
    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    /// Part origin in the platform body frame \[m\].
    #[must_use]
    pub const fn location(&self) -> Vector3 {
        self.location
    }

    /// Current pointing cue.
    #[must_use]
    pub fn cue(&self) -> Orientation {
        *self.cue.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Commands a new pointing cue.
    pub fn set_cue(&self, cue: Orientation) {
        *self.cue.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = cue;
        self.version.fetch_add(1, Ordering::Release);
    }

    /// Part state counter, advanced on every re-cue.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

impl core::fmt::Debug for ArticulatedPart {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArticulatedPart")
            .field("platform", &self.platform.id())
            .field("location", &self.location)
            .field("cue", &self.cue())
            .finish()
    }
}
