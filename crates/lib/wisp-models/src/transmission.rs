use rand_distr::{Distribution, Uniform};
use rand_pcg::Pcg64Mcg;

use wisp_core::error::{SimError, SimResult};
use wisp_core::message::Message;
use wisp_core::models::{MessageTransmissionModel, NodeView};
use wisp_core::registry::{ModelSettings, ParamSpec};

use crate::dist::seeded_rng;
use crate::params::check_params;

/// Every message takes the same time.
#[derive(Debug, Clone, Copy)]
pub struct ConstantTime {
    pub time: f64,
}

impl ConstantTime {
    pub const PARAMS: &'static [ParamSpec] = &[ParamSpec::optional("time", 0.0, f64::MAX, 1.0)];

    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, Self::PARAMS, &[])?;
        Ok(Self {
            time: settings.value(&Self::PARAMS[0])?,
        })
    }
}

impl MessageTransmissionModel for ConstantTime {
    fn time_to_reach(
        &mut self,
        _from: NodeView,
        _to: NodeView,
        _message: &dyn Message,
    ) -> SimResult<f64> {
        Ok(self.time)
    }
}

/// Draws the transmission time uniformly from `[min, max]`.
#[derive(Debug, Clone)]
pub struct RandomTime {
    range: Uniform<f64>,
    rng: Pcg64Mcg,
}

impl RandomTime {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::required("min", 0.0, f64::MAX),
        ParamSpec::required("max", 0.0, f64::MAX),
    ];

    pub fn new(min: f64, max: f64, seed: u64) -> SimResult<Self> {
        if min > max {
            return Err(SimError::config(
                "randomtime.params.min",
                format!("{} is larger than max {}", min, max),
            ));
        }
        Ok(Self {
            range: Uniform::new_inclusive(min, max),
            rng: seeded_rng(seed, 0),
        })
    }

    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, Self::PARAMS, &[])?;
        Self::new(
            settings.value(&Self::PARAMS[0])?,
            settings.value(&Self::PARAMS[1])?,
            settings.seed(),
        )
    }
}

impl MessageTransmissionModel for RandomTime {
    fn time_to_reach(
        &mut self,
        _from: NodeView,
        _to: NodeView,
        _message: &dyn Message,
    ) -> SimResult<f64> {
        Ok(self.range.sample(&mut self.rng))
    }
}
