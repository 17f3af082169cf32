use std::collections::HashMap;
use std::sync::Arc;

use empath_core::common::Ratio;
use empath_core::model::{Attenuation, Clutter, Propagation};

use crate::attenuation;
use crate::clutter;
use crate::propagation::{self, SurfacePolarization};
use crate::ModelError;

type Factory<T> = Arc<dyn Fn(&str) -> Result<Arc<T>, ModelError> + Send + Sync>;

/// String-keyed factories for the three model families.
///
/// Scenario text names a model and hands its configuration block to the
/// factory; the registry is open, so collaborating crates register their own
/// models next to the built-ins.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    attenuation: HashMap<String, Factory<dyn Attenuation>>,
    propagation: HashMap<String, Factory<dyn Propagation>>,
    clutter: HashMap<String, Factory<dyn Clutter>>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("attenuation", &self.attenuation.keys())
            .field("propagation", &self.propagation.keys())
            .field("clutter", &self.clutter.keys())
            .finish()
    }
}

fn number_token(token: Option<&str>, name: &'static str) -> Result<f64, ModelError> {
    let token = token.ok_or(ModelError::OutOfRange {
        name,
        value: f64::NAN,
    })?;
    token.parse().map_err(|_| ModelError::BadNumber {
        token: token.to_owned(),
        line: 1,
    })
}

impl ModelRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in model.
    ///
    /// Attenuation: `null`, `simple` (`constant <factor>` or
    /// `per_meter <dB/m>`), `blake`, `itu` (optional rain polarization
    /// `horizontal|vertical|circular`), `tabular` (inline table block).
    /// Propagation: `null`, `two_ray` (optional `horizontal|vertical`),
    /// `ground_wave`. Clutter: `null`, `surface`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_attenuation("null", |_| Ok(Arc::new(attenuation::Null)));
        registry.register_attenuation("simple", |config| {
            let mut tokens = config.split_whitespace();
            match tokens.next() {
                Some("constant") => {
                    let factor = number_token(tokens.next(), "constant attenuation factor")?;
                    Ok(Arc::new(attenuation::Simple::constant(Ratio::from_linear(factor))?))
                }
                Some("per_meter") => {
                    let rate = number_token(tokens.next(), "specific attenuation [dB/m]")?;
                    Ok(Arc::new(attenuation::Simple::per_meter(rate)?))
                }
                other => Err(ModelError::UnknownInput {
                    token: other.unwrap_or("").to_owned(),
                    line: 1,
                }),
            }
        });
        registry.register_attenuation("blake", |_| Ok(Arc::new(attenuation::Blake)));
        registry.register_attenuation("itu", |config| {
            let model = match config.split_whitespace().next() {
                None => attenuation::Itu::new(),
                Some("horizontal") => attenuation::Itu::new()
                    .with_rain_polarization(attenuation::RainPolarization::Horizontal),
                Some("vertical") => attenuation::Itu::new()
                    .with_rain_polarization(attenuation::RainPolarization::Vertical),
                Some("circular") => attenuation::Itu::new()
                    .with_rain_polarization(attenuation::RainPolarization::Circular),
                Some(other) => {
                    return Err(ModelError::UnknownInput {
                        token: other.to_owned(),
                        line: 1,
                    })
                }
            };
            Ok(Arc::new(model))
        });
        registry
            .register_attenuation("tabular", |config| Ok(Arc::new(attenuation::Tabular::parse(config)?)));

        registry.register_propagation("null", |_| Ok(Arc::new(propagation::Null)));
        registry.register_propagation("two_ray", |config| {
            let model = match config.split_whitespace().next() {
                None | Some("horizontal") => propagation::TwoRay::new(),
                Some("vertical") => {
                    propagation::TwoRay::new().with_polarization(SurfacePolarization::Vertical)
                }
                Some(other) => {
                    return Err(ModelError::UnknownInput {
                        token: other.to_owned(),
                        line: 1,
                    })
                }
            };
            Ok(Arc::new(model))
        });
        registry.register_propagation("ground_wave", |_| Ok(Arc::new(propagation::GroundWave::new())));

        registry.register_clutter("null", |_| Ok(Arc::new(clutter::Null)));
        registry.register_clutter("surface", |_| Ok(Arc::new(clutter::SurfaceClutter)));
        registry
    }

    /// Registers or replaces an attenuation factory.
    pub fn register_attenuation<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> Result<Arc<dyn Attenuation>, ModelError> + Send + Sync + 'static,
    {
        self.attenuation.insert(name.into(), Arc::new(factory));
    }

    /// Registers or replaces a propagation factory.
    pub fn register_propagation<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> Result<Arc<dyn Propagation>, ModelError> + Send + Sync + 'static,
    {
        self.propagation.insert(name.into(), Arc::new(factory));
    }

    /// Registers or replaces a clutter factory.
    pub fn register_clutter<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> Result<Arc<dyn Clutter>, ModelError> + Send + Sync + 'static,
    {
        self.clutter.insert(name.into(), Arc::new(factory));
    }

    /// Builds an attenuation model from its name and configuration block.
    pub fn attenuation(&self, name: &str, config: &str) -> Result<Arc<dyn Attenuation>, ModelError> {
        let factory = self.attenuation.get(name).ok_or_else(|| ModelError::UnknownModel {
            family: "attenuation",
            name: name.to_owned(),
        })?;
        tracing::debug!(name, "building attenuation model");
        factory(config)
    }

    /// Builds a propagation model from its name and configuration block.
    pub fn propagation(&self, name: &str, config: &str) -> Result<Arc<dyn Propagation>, ModelError> {
        let factory = self.propagation.get(name).ok_or_else(|| ModelError::UnknownModel {
            family: "propagation",
            name: name.to_owned(),
        })?;
        tracing::debug!(name, "building propagation model");
        factory(config)
    }

    /// Builds a clutter model from its name and configuration block.
    pub fn clutter(&self, name: &str, config: &str) -> Result<Arc<dyn Clutter>, ModelError> {
        let factory = self.clutter.get(name).ok_or_else(|| ModelError::UnknownModel {
            family: "clutter",
            name: name.to_owned(),
        })?;
        tracing::debug!(name, "building clutter model");
        factory(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attenuation::tests::level_path;
    use empath_core::environment::Environment;

    #[test]
    fn defaults_cover_every_family() {
        let registry = ModelRegistry::with_defaults();
        assert!(registry.attenuation("null", "").is_ok());
        assert!(registry.attenuation("blake", "").is_ok());
        assert!(registry.attenuation("itu", "vertical").is_ok());
        assert!(registry.propagation("two_ray", "").is_ok());
        assert!(registry.propagation("ground_wave", "").is_ok());
        assert!(registry.clutter("surface", "").is_ok());
    }

    #[test]
    fn unknown_names_are_reported_with_the_family() {
        let registry = ModelRegistry::with_defaults();
        match registry.propagation("warp", "").unwrap_err() {
            ModelError::UnknownModel { family, name } => {
                assert_eq!(family, "propagation");
                assert_eq!(name, "warp");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn simple_factory_parses_its_argument() {
        let registry = ModelRegistry::with_defaults();
        let model = registry.attenuation("simple", "constant 0.5").unwrap();
        let factor = model.compute(&level_path(10_000.0, 100.0, 3.0), &Environment::default());
        approx::assert_abs_diff_eq!(factor.linear(), 0.5);
        assert!(registry.attenuation("simple", "constant 2.0").is_err());
        assert!(registry.attenuation("simple", "sideways 1.0").is_err());
    }

    #[test]
    fn tabular_factory_takes_the_inline_block() {
        let registry = ModelRegistry::with_defaults();
        let text = "\
            independent_variable altitude 2\n\
            0.0 10000.0\n\
            independent_variable slant_range 2\n\
            0.0 100000.0\n\
            values\n\
            0.0 3.0 0.0 3.0\n\
            end_attenuation_model\n";
        let model = registry.attenuation("tabular", text).unwrap();
        assert!(model.accepts_inline_block_input());
    }

    #[test]
    fn open_registration_overrides_builtins() {
        let mut registry = ModelRegistry::with_defaults();
        registry.register_attenuation("blake", |_| {
            Ok(Arc::new(attenuation::Simple::Constant(Ratio::from_linear(0.1))))
        });
        let model = registry.attenuation("blake", "").unwrap();
        let factor = model.compute(&level_path(1_000.0, 100.0, 3.0), &Environment::default());
        approx::assert_abs_diff_eq!(factor.linear(), 0.1);
    }
}
