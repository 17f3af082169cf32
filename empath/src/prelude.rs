pub use crate::{
    detector::{Detector, MarcumSwerling, PdCurve, SwerlingCase},
    error::{DetectorError, PlotError, SensorError},
    plot::{PatternPlot, PlotAxes, PlotCommands},
    sensor::{DeltaBasis, MOfN, Measurement, SensorBeam, SensorMode, TargetReport},
};

pub use empath_core::{
    antenna::{Antenna, ElectronicSteering, FieldOfView, ScanMode, SteeringMode},
    common::{
        dB, dBW, dBm, deg, kHz, kW, rad, Angle, Freq, GHz, Hz, MHz, Power, Ratio, MW, W,
        SPEED_OF_LIGHT,
    },
    environment::{Environment, LandCover, LandForm, Terrain},
    error::EmError,
    geometry::{Geodetic, Orientation, Point3, Vector3},
    interaction::{Interaction, InteractionStatus},
    manager::{EmManager, EmObserver, RcvrId, XmtrId},
    model::{Attenuation, Clutter, ClutterContext, Propagation, SignalPath},
    pattern::{
        AntennaPattern, Aperture, CosecantSquared, Gaussian, Sinc, SteeredArray, Tabular, Uniform,
    },
    platform::{ArticulatedPart, Platform, PlatformId},
    radio::{PatternMap, Polarization, Rcvr, RcvrFunction, Xmtr, XmtrFunction},
};

pub use empath_models::ModelRegistry;
