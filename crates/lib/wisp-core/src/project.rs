use serde::Deserialize;
use typed_builder::TypedBuilder;

use crate::collection::CollectionKind;
use crate::error::{SimError, SimResult};
use crate::position::Dimensions;
use crate::registry::ModelSettings;

fn enabled() -> bool {
    true
}

/// Everything the kernel needs to know about a project: the simulated area, which parts of
/// the round are enabled and the message transmission model shared by all nodes.
#[derive(Deserialize, Debug, Clone, PartialEq, TypedBuilder)]
#[serde(deny_unknown_fields)]
pub struct Project {
    #[builder(setter(into))]
    pub name: String,
    #[serde(default)]
    #[builder(default)]
    pub dimensions: Dimensions,
    #[serde(default = "enabled")]
    #[builder(default = true)]
    pub connectivity_enabled: bool,
    #[serde(default)]
    #[builder(default)]
    pub interference_enabled: bool,
    #[serde(default = "enabled")]
    #[builder(default = true)]
    pub mobility_enabled: bool,
    #[serde(default)]
    #[builder(default)]
    pub nack_enabled: bool,
    #[serde(default = "enabled")]
    #[builder(default = true)]
    pub additive_interference: bool,
    /// Upper bound of any connection distance. Unset or zero disables the spatial index and
    /// every node becomes a candidate neighbor of every other node.
    #[serde(default)]
    #[builder(default)]
    pub max_connection_radius: Option<f64>,
    #[serde(default)]
    #[builder(default)]
    pub asynchronous: bool,
    #[serde(default)]
    #[builder(default)]
    pub collection: CollectionKind,
    #[serde(default)]
    #[builder(default)]
    pub packet_header_size: usize,
    #[serde(default)]
    #[builder(default)]
    pub keep_round_statistics: bool,
    pub message_transmission: ModelSettings,
}

impl Project {
    /// Checks what the schema cannot express. Fails with the path of the first offending field.
    pub fn validate(&self) -> SimResult<()> {
        if self.name.trim().is_empty() {
            return Err(SimError::config("project.name", "must not be empty"));
        }
        let dims = &self.dimensions;
        for (field, range) in [
            ("project.dimensions.dim_x", dims.dim_x),
            ("project.dimensions.dim_y", dims.dim_y),
            ("project.dimensions.dim_z", dims.dim_z),
        ] {
            if !range.iter().all(|bound| bound.is_finite()) {
                return Err(SimError::config(field, "bounds must be finite"));
            }
            if range[0] > range[1] {
                return Err(SimError::config(
                    field,
                    format!("minimum {} is larger than maximum {}", range[0], range[1]),
                ));
            }
        }
        if let Some(radius) = self.max_connection_radius {
            if !(radius.is_finite() && radius >= 0.0) {
                return Err(SimError::config(
                    "project.max_connection_radius",
                    format!("{} is not a non-negative distance", radius),
                ));
            }
        }
        if self.message_transmission.model.trim().is_empty() {
            return Err(SimError::config(
                "project.message_transmission.model",
                "must name a model",
            ));
        }
        Ok(())
    }

    /// The radius used to prune connectivity candidates, if any.
    pub fn connection_radius(&self) -> Option<f64> {
        self.max_connection_radius.filter(|radius| *radius > 0.0)
    }
}
