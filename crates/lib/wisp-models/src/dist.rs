use rand_distr::{Distribution, Exp, Gamma, LogNormal, Normal, Uniform};
use rand_pcg::Pcg64Mcg;
use serde::Deserialize;
use typed_builder::TypedBuilder;

use wisp_core::error::{SimError, SimResult};
use wisp_core::node::NodeId;
use wisp_core::registry::ModelSettings;

#[derive(Debug, Clone, Copy)]
pub enum DistType {
    Constant(f64),
    Uniform(Uniform<f64>),
    Normal(Normal<f64>),
    LogNormal(LogNormal<f64>),
    Exponential(Exp<f64>),
    Gamma(Gamma<f64>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, TypedBuilder)]
#[serde(deny_unknown_fields)]
pub struct DistParams {
    #[builder(setter(into))]
    pub dist_name: String,
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub value: Option<f64>,
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub mean: Option<f64>,
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub std_dev: Option<f64>,
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub scale: Option<f64>,
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub shape: Option<f64>,
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub rate: Option<f64>,
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub min: Option<f64>,
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub max: Option<f64>,
}

impl DistParams {
    pub fn constant(value: f64) -> Self {
        Self::builder().dist_name("constant").value(value).build()
    }

    /// Reads a distribution from flat model parameters sharing a prefix. `speed = 2` is a
    /// constant, `speed_min`/`speed_max` a uniform range, `speed_mean`/`speed_std_dev` a normal
    /// distribution, `speed_rate` an exponential one and `speed_shape`/`speed_scale` a gamma
    /// distribution. Returns `None` if no parameter carries the prefix.
    pub fn from_settings(settings: &ModelSettings, prefix: &str) -> SimResult<Option<Self>> {
        let get = |suffix: &str| settings.params.get(&format!("{}_{}", prefix, suffix)).copied();
        let params = if let Some(value) = settings.params.get(prefix) {
            Self::constant(*value)
        } else if get("min").is_some() || get("max").is_some() {
            Self {
                dist_name: "uniform".to_string(),
                min: get("min"),
                max: get("max"),
                ..Default::default()
            }
        } else if get("mean").is_some() {
            Self {
                dist_name: "normal".to_string(),
                mean: get("mean"),
                std_dev: get("std_dev"),
                ..Default::default()
            }
        } else if get("rate").is_some() {
            Self {
                dist_name: "exponential".to_string(),
                rate: get("rate"),
                ..Default::default()
            }
        } else if get("shape").is_some() {
            Self {
                dist_name: "gamma".to_string(),
                shape: get("shape"),
                scale: get("scale"),
                ..Default::default()
            }
        } else {
            return Ok(None);
        };
        Ok(Some(params))
    }
}

impl DistType {
    pub fn new(params: &DistParams) -> SimResult<Self> {
        match params.dist_name.to_lowercase().as_str() {
            "constant" => Ok(Self::Constant(required(params, "value", params.value)?)),
            "uniform" => Self::build_uniform(params),
            "normal" => Self::build_normal(params),
            "lognormal" => Self::build_log_normal(params),
            "exponential" => Self::build_exponential(params),
            "gamma" => Self::build_gamma(params),
            _ => Err(SimError::config(
                "dist_name",
                format!(
                    "unknown distribution '{}', supported values are \
                     constant, uniform, normal, lognormal, exponential, gamma",
                    params.dist_name
                ),
            )),
        }
    }

    fn build_uniform(params: &DistParams) -> SimResult<Self> {
        let min = required(params, "min", params.min)?;
        let max = required(params, "max", params.max)?;
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(SimError::config(
                "uniform.min",
                format!("[{}, {}] is not a valid range", min, max),
            ));
        }
        Ok(Self::Uniform(Uniform::new_inclusive(min, max)))
    }

    fn build_normal(params: &DistParams) -> SimResult<Self> {
        let mean = required(params, "mean", params.mean)?;
        let std_dev = required(params, "std_dev", params.std_dev)?;
        Normal::new(mean, std_dev)
            .map(Self::Normal)
            .map_err(|e| SimError::config("normal.std_dev", e.to_string()))
    }

    fn build_log_normal(params: &DistParams) -> SimResult<Self> {
        let mean = required(params, "mean", params.mean)?;
        let std_dev = required(params, "std_dev", params.std_dev)?;
        LogNormal::new(mean, std_dev)
            .map(Self::LogNormal)
            .map_err(|e| SimError::config("lognormal.std_dev", e.to_string()))
    }

    fn build_exponential(params: &DistParams) -> SimResult<Self> {
        let rate = required(params, "rate", params.rate)?;
        Exp::new(rate)
            .map(Self::Exponential)
            .map_err(|e| SimError::config("exponential.rate", e.to_string()))
    }

    fn build_gamma(params: &DistParams) -> SimResult<Self> {
        let shape = required(params, "shape", params.shape)?;
        let scale = required(params, "scale", params.scale)?;
        Gamma::new(shape, scale)
            .map(Self::Gamma)
            .map_err(|e| SimError::config("gamma.shape", e.to_string()))
    }
}

fn required(params: &DistParams, field: &str, value: Option<f64>) -> SimResult<f64> {
    value.ok_or_else(|| {
        SimError::config(
            format!("{}.{}", params.dist_name, field),
            "required parameter is missing",
        )
    })
}

/// A random stream for one seed. Models that are instantiated once per node pass the node id
/// as `stream`, so nodes sharing a configuration still draw different numbers.
pub fn seeded_rng(seed: u64, stream: u64) -> Pcg64Mcg {
    Pcg64Mcg::new(((seed as u128) << 64) | stream as u128)
}

pub fn node_stream(node: NodeId) -> u64 {
    node.as_u64()
}

#[derive(Debug, Clone)]
pub struct RngSampler {
    pub dist: DistType,
    pub rng: Pcg64Mcg,
}

impl RngSampler {
    pub fn new(params: &DistParams, seed: u64) -> SimResult<Self> {
        Ok(Self::with_rng(DistType::new(params)?, seeded_rng(seed, 0)))
    }

    pub fn with_rng(dist: DistType, rng: Pcg64Mcg) -> Self {
        Self { dist, rng }
    }

    pub fn sample(&mut self) -> f64 {
        match self.dist {
            DistType::Constant(value) => value,
            DistType::Uniform(ref mut dist) => dist.sample(&mut self.rng),
            DistType::Normal(ref mut dist) => dist.sample(&mut self.rng),
            DistType::LogNormal(ref mut dist) => dist.sample(&mut self.rng),
            DistType::Exponential(ref mut dist) => dist.sample(&mut self.rng),
            DistType::Gamma(ref mut dist) => dist.sample(&mut self.rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_parameters_select_the_distribution() {
        let settings = ModelSettings::named("randomwaypoint")
            .with_param("speed_min", 1.0)
            .with_param("speed_max", 3.0)
            .with_param("wait", 2.0);
        let speed = DistParams::from_settings(&settings, "speed").unwrap().unwrap();
        assert_eq!(speed.dist_name, "uniform");
        let wait = DistParams::from_settings(&settings, "wait").unwrap().unwrap();
        assert_eq!(wait, DistParams::constant(2.0));
        assert!(DistParams::from_settings(&settings, "pause").unwrap().is_none());

        let mut sampler = RngSampler::new(&speed, 7).unwrap();
        for _ in 0..100 {
            let value = sampler.sample();
            assert!((1.0..=3.0).contains(&value));
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let params = DistParams::builder()
            .dist_name("normal")
            .mean(0.0)
            .std_dev(1.0)
            .build();
        let mut a = RngSampler::new(&params, 3).unwrap();
        let mut b = RngSampler::new(&params, 3).unwrap();
        assert_eq!(a.sample(), b.sample());
    }

    #[test]
    fn invalid_parameters_are_config_errors() {
        let params = DistParams::builder().dist_name("uniform").min(1.0).build();
        assert!(matches!(
            DistType::new(&params),
            Err(SimError::Config { field, .. }) if field == "uniform.max"
        ));
        let params = DistParams::builder().dist_name("weibull").build();
        assert!(DistType::new(&params).is_err());
    }
}
