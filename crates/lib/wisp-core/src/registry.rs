//! Resolution of model identifiers to implementations.
//!
//! Every model family has its own factory table keyed by `(scope, name)`. A bare name such as
//! `"udg"` resolves in the [`DEFAULT_SCOPE`], a qualified name such as `"flooding:relay"`
//! resolves in the named project scope. Names are matched case-insensitively. Nothing falls
//! back to another scope: an unknown identifier is a [`SimError::ModelNotFound`].

use std::fmt;

use hashbrown::HashMap;
use serde::Deserialize;
use typed_builder::TypedBuilder;

use crate::error::{SimError, SimResult};
use crate::models::{
    ConnectivityModel, DistributionModel, InterferenceModel, MessageTransmissionModel,
    MobilityModel, NodeModels, ReliabilityModel,
};

pub const DEFAULT_SCOPE: &str = "default";

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Mobility,
    Connectivity,
    Interference,
    Reliability,
    MessageTransmission,
    Distribution,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Mobility => write!(f, "mobility"),
            ModelKind::Connectivity => write!(f, "connectivity"),
            ModelKind::Interference => write!(f, "interference"),
            ModelKind::Reliability => write!(f, "reliability"),
            ModelKind::MessageTransmission => write!(f, "message transmission"),
            ModelKind::Distribution => write!(f, "distribution"),
        }
    }
}

/// A parsed model identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelIdentifier {
    pub scope: String,
    pub name: String,
}

impl ModelIdentifier {
    pub fn parse(identifier: &str) -> SimResult<Self> {
        let (scope, name) = match identifier.split_once(':') {
            Some((scope, name)) => (scope.trim(), name.trim()),
            None => (DEFAULT_SCOPE, identifier.trim()),
        };
        if scope.is_empty() || name.is_empty() || name.contains(':') {
            return Err(SimError::config(
                "model",
                format!("'{}' is not a valid model identifier", identifier),
            ));
        }
        Ok(Self {
            scope: scope.to_lowercase(),
            name: name.to_lowercase(),
        })
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.name)
    }
}

/// Declared bounds of one numeric model parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: Option<f64>,
}

impl ParamSpec {
    pub const fn required(name: &'static str, min: f64, max: f64) -> Self {
        Self {
            name,
            min,
            max,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name,
            min,
            max,
            default: Some(default),
        }
    }
}

/// Identifier and numeric parameters of a model as they appear in the configuration.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, TypedBuilder)]
#[serde(deny_unknown_fields)]
pub struct ModelSettings {
    #[builder(setter(into))]
    pub model: String,
    #[serde(default)]
    #[builder(default)]
    pub params: HashMap<String, f64>,
}

impl ModelSettings {
    pub fn named(model: &str) -> Self {
        Self {
            model: model.to_owned(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: f64) -> Self {
        self.params.insert(name.to_owned(), value);
        self
    }

    /// Reads a parameter and checks it against its declared bounds.
    pub fn value(&self, spec: &ParamSpec) -> SimResult<f64> {
        let field = format!("{}.params.{}", self.model, spec.name);
        let value = match (self.params.get(spec.name), spec.default) {
            (Some(value), _) => *value,
            (None, Some(default)) => default,
            (None, None) => return Err(SimError::config(field, "required parameter is missing")),
        };
        if !(spec.min..=spec.max).contains(&value) {
            return Err(SimError::OutOfBounds {
                field,
                value,
                min: spec.min,
                max: spec.max,
            });
        }
        Ok(value)
    }

    /// Optional seed parameter shared by the randomised models.
    pub fn seed(&self) -> u64 {
        self.params.get("seed").map(|seed| *seed as u64).unwrap_or(0)
    }
}

/// Model settings for the four per-node model families.
#[derive(Deserialize, Debug, Clone, PartialEq, TypedBuilder)]
#[serde(deny_unknown_fields)]
pub struct NodeModelSettings {
    pub mobility: ModelSettings,
    pub connectivity: ModelSettings,
    pub interference: ModelSettings,
    pub reliability: ModelSettings,
}

pub type Factory<T> = Box<dyn Fn(&ModelSettings) -> SimResult<Box<T>> + Send + Sync>;

struct FactoryTable<T: ?Sized> {
    kind: ModelKind,
    factories: HashMap<ModelIdentifier, Factory<T>>,
}

impl<T: ?Sized> FactoryTable<T> {
    fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            factories: HashMap::new(),
        }
    }

    fn register(&mut self, identifier: &str, factory: Factory<T>) -> SimResult<()> {
        let identifier = ModelIdentifier::parse(identifier)?;
        self.factories.insert(identifier, factory);
        Ok(())
    }

    fn build(&self, settings: &ModelSettings) -> SimResult<Box<T>> {
        let identifier = ModelIdentifier::parse(&settings.model)?;
        match self.factories.get(&identifier) {
            Some(factory) => factory(settings),
            None => Err(SimError::ModelNotFound {
                kind: self.kind,
                identifier: identifier.to_string(),
            }),
        }
    }

    fn contains(&self, identifier: &str) -> bool {
        ModelIdentifier::parse(identifier)
            .map(|identifier| self.factories.contains_key(&identifier))
            .unwrap_or(false)
    }

    fn identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> =
            self.factories.keys().map(|key| key.to_string()).collect();
        identifiers.sort();
        identifiers
    }
}

/// Maps `(kind, identifier)` to a constructor. Passed explicitly to whoever builds a
/// simulation, there is no process-wide instance.
pub struct ModelRegistry {
    mobility: FactoryTable<dyn MobilityModel>,
    connectivity: FactoryTable<dyn ConnectivityModel>,
    interference: FactoryTable<dyn InterferenceModel>,
    reliability: FactoryTable<dyn ReliabilityModel>,
    transmission: FactoryTable<dyn MessageTransmissionModel>,
    distribution: FactoryTable<dyn DistributionModel>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            mobility: FactoryTable::new(ModelKind::Mobility),
            connectivity: FactoryTable::new(ModelKind::Connectivity),
            interference: FactoryTable::new(ModelKind::Interference),
            reliability: FactoryTable::new(ModelKind::Reliability),
            transmission: FactoryTable::new(ModelKind::MessageTransmission),
            distribution: FactoryTable::new(ModelKind::Distribution),
        }
    }

    pub fn register_mobility<F>(&mut self, identifier: &str, factory: F) -> SimResult<()>
    where
        F: Fn(&ModelSettings) -> SimResult<Box<dyn MobilityModel>> + Send + Sync + 'static,
    {
        self.mobility.register(identifier, Box::new(factory))
    }

    pub fn register_connectivity<F>(&mut self, identifier: &str, factory: F) -> SimResult<()>
    where
        F: Fn(&ModelSettings) -> SimResult<Box<dyn ConnectivityModel>> + Send + Sync + 'static,
    {
        self.connectivity.register(identifier, Box::new(factory))
    }

    pub fn register_interference<F>(&mut self, identifier: &str, factory: F) -> SimResult<()>
    where
        F: Fn(&ModelSettings) -> SimResult<Box<dyn InterferenceModel>> + Send + Sync + 'static,
    {
        self.interference.register(identifier, Box::new(factory))
    }

    pub fn register_reliability<F>(&mut self, identifier: &str, factory: F) -> SimResult<()>
    where
        F: Fn(&ModelSettings) -> SimResult<Box<dyn ReliabilityModel>> + Send + Sync + 'static,
    {
        self.reliability.register(identifier, Box::new(factory))
    }

    pub fn register_transmission<F>(&mut self, identifier: &str, factory: F) -> SimResult<()>
    where
        F: Fn(&ModelSettings) -> SimResult<Box<dyn MessageTransmissionModel>>
            + Send
            + Sync
            + 'static,
    {
        self.transmission.register(identifier, Box::new(factory))
    }

    pub fn register_distribution<F>(&mut self, identifier: &str, factory: F) -> SimResult<()>
    where
        F: Fn(&ModelSettings) -> SimResult<Box<dyn DistributionModel>> + Send + Sync + 'static,
    {
        self.distribution.register(identifier, Box::new(factory))
    }

    pub fn mobility(&self, settings: &ModelSettings) -> SimResult<Box<dyn MobilityModel>> {
        self.mobility.build(settings)
    }

    pub fn connectivity(&self, settings: &ModelSettings) -> SimResult<Box<dyn ConnectivityModel>> {
        self.connectivity.build(settings)
    }

    pub fn interference(&self, settings: &ModelSettings) -> SimResult<Box<dyn InterferenceModel>> {
        self.interference.build(settings)
    }

    pub fn reliability(&self, settings: &ModelSettings) -> SimResult<Box<dyn ReliabilityModel>> {
        self.reliability.build(settings)
    }

    pub fn transmission(
        &self,
        settings: &ModelSettings,
    ) -> SimResult<Box<dyn MessageTransmissionModel>> {
        self.transmission.build(settings)
    }

    pub fn distribution(&self, settings: &ModelSettings) -> SimResult<Box<dyn DistributionModel>> {
        self.distribution.build(settings)
    }

    pub fn node_models(&self, settings: &NodeModelSettings) -> SimResult<NodeModels> {
        Ok(NodeModels {
            mobility: self.mobility(&settings.mobility)?,
            connectivity: self.connectivity(&settings.connectivity)?,
            interference: self.interference(&settings.interference)?,
            reliability: self.reliability(&settings.reliability)?,
        })
    }

    pub fn contains(&self, kind: ModelKind, identifier: &str) -> bool {
        match kind {
            ModelKind::Mobility => self.mobility.contains(identifier),
            ModelKind::Connectivity => self.connectivity.contains(identifier),
            ModelKind::Interference => self.interference.contains(identifier),
            ModelKind::Reliability => self.reliability.contains(identifier),
            ModelKind::MessageTransmission => self.transmission.contains(identifier),
            ModelKind::Distribution => self.distribution.contains(identifier),
        }
    }

    /// All registered identifiers of a kind in `scope:name` form, sorted.
    pub fn identifiers(&self, kind: ModelKind) -> Vec<String> {
        match kind {
            ModelKind::Mobility => self.mobility.identifiers(),
            ModelKind::Connectivity => self.connectivity.identifiers(),
            ModelKind::Interference => self.interference.identifiers(),
            ModelKind::Reliability => self.reliability.identifiers(),
            ModelKind::MessageTransmission => self.transmission.identifiers(),
            ModelKind::Distribution => self.distribution.identifiers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_resolve_in_default_scope() {
        let identifier = ModelIdentifier::parse("UDG").unwrap();
        assert_eq!(identifier.scope, DEFAULT_SCOPE);
        assert_eq!(identifier.name, "udg");
        let scoped = ModelIdentifier::parse("flooding:Relay").unwrap();
        assert_eq!(scoped.to_string(), "flooding:relay");
        assert!(ModelIdentifier::parse(":udg").is_err());
        assert!(ModelIdentifier::parse("a:b:c").is_err());
    }

    #[test]
    fn parameter_bounds_are_enforced() {
        let spec = ParamSpec::required("radius", 0.0, 100.0);
        let settings = ModelSettings::named("udg").with_param("radius", 150.0);
        assert!(matches!(
            settings.value(&spec),
            Err(SimError::OutOfBounds { value, .. }) if value == 150.0
        ));
        let missing = ModelSettings::named("udg");
        assert_eq!(
            missing.value(&spec),
            Err(SimError::config("udg.params.radius", "required parameter is missing"))
        );
        let optional = ParamSpec::optional("radius", 0.0, 100.0, 10.0);
        assert_eq!(missing.value(&optional), Ok(10.0));
    }
}
