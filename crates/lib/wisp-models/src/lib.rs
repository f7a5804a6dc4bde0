#![forbid(unsafe_code)]
#![allow(clippy::upper_case_acronyms)]

use wisp_core::error::SimResult;
use wisp_core::registry::ModelRegistry;

pub mod connectivity;
pub mod dist;
pub mod distribution;
pub mod interference;
pub mod mobility;
pub mod params;
pub mod reliability;
pub mod transmission;

use connectivity::{StaticUDG, QUDG, UDG};
use distribution::{Circle, Grid2D, Random};
use interference::{NoInterference, SINR};
use mobility::{NoMobility, RandomWayPoint};
use reliability::{LossyDelivery, ReliableDelivery};
use transmission::{ConstantTime, RandomTime};

/// Registers the bundled models under their lower case names in the default scope.
pub fn register_defaults(registry: &mut ModelRegistry) -> SimResult<()> {
    registry.register_mobility("nomobility", |s| Ok(Box::new(NoMobility::from_settings(s)?)))?;
    registry.register_mobility("randomwaypoint", |s| {
        Ok(Box::new(RandomWayPoint::from_settings(s)?))
    })?;

    registry.register_connectivity("udg", |s| Ok(Box::new(UDG::from_settings(s)?)))?;
    registry.register_connectivity("qudg", |s| Ok(Box::new(QUDG::from_settings(s)?)))?;
    registry.register_connectivity("staticudg", |s| Ok(Box::new(StaticUDG::from_settings(s)?)))?;

    registry.register_interference("nointerference", |s| {
        Ok(Box::new(NoInterference::from_settings(s)?))
    })?;
    registry.register_interference("sinr", |s| Ok(Box::new(SINR::from_settings(s)?)))?;

    registry.register_reliability("reliabledelivery", |s| {
        Ok(Box::new(ReliableDelivery::from_settings(s)?))
    })?;
    registry.register_reliability("lossydelivery", |s| {
        Ok(Box::new(LossyDelivery::from_settings(s)?))
    })?;

    registry.register_transmission("constanttime", |s| {
        Ok(Box::new(ConstantTime::from_settings(s)?))
    })?;
    registry.register_transmission("randomtime", |s| Ok(Box::new(RandomTime::from_settings(s)?)))?;

    registry.register_distribution("random", |s| Ok(Box::new(Random::from_settings(s)?)))?;
    registry.register_distribution("grid2d", |s| Ok(Box::new(Grid2D::from_settings(s)?)))?;
    registry.register_distribution("circle", |s| Ok(Box::new(Circle::from_settings(s)?)))?;
    Ok(())
}

/// A registry holding only the bundled models.
pub fn default_registry() -> SimResult<ModelRegistry> {
    let mut registry = ModelRegistry::new();
    register_defaults(&mut registry)?;
    Ok(registry)
}
