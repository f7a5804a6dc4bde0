use hashbrown::HashMap;
use rand_distr::{Distribution, Standard};
use rand_pcg::Pcg64Mcg;

use wisp_core::error::SimResult;
use wisp_core::models::ReliabilityModel;
use wisp_core::node::NodeId;
use wisp_core::packet::Packet;
use wisp_core::registry::{ModelSettings, ParamSpec};

use crate::dist::{node_stream, seeded_rng};
use crate::params::check_params;

#[derive(Debug, Default, Clone, Copy)]
pub struct ReliableDelivery;

impl ReliableDelivery {
    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, &[], &[])?;
        Ok(Self)
    }
}

impl ReliabilityModel for ReliableDelivery {
    fn reaches_destination(&mut self, _packet: &Packet) -> SimResult<bool> {
        Ok(true)
    }
}

/// Loses every packet with probability `drop_rate`, independently of everything else.
#[derive(Debug, Clone)]
pub struct LossyDelivery {
    pub drop_rate: f64,
    seed: u64,
    streams: HashMap<NodeId, Pcg64Mcg>,
}

impl LossyDelivery {
    pub const PARAMS: &'static [ParamSpec] = &[ParamSpec::required("drop_rate", 0.0, 1.0)];

    pub fn new(drop_rate: f64, seed: u64) -> Self {
        Self {
            drop_rate,
            seed,
            streams: HashMap::new(),
        }
    }

    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, Self::PARAMS, &[])?;
        Ok(Self::new(settings.value(&Self::PARAMS[0])?, settings.seed()))
    }
}

impl ReliabilityModel for LossyDelivery {
    fn reaches_destination(&mut self, packet: &Packet) -> SimResult<bool> {
        let seed = self.seed;
        let rng = self
            .streams
            .entry(packet.origin())
            .or_insert_with(|| seeded_rng(seed, node_stream(packet.origin())));
        let draw: f64 = Standard.sample(rng);
        Ok(draw >= self.drop_rate)
    }
}

#[cfg(test)]
mod tests {
    use wisp_core::message::SizedMessage;
    use wisp_core::packet::PacketId;

    use super::*;

    fn packet() -> Packet {
        Packet::builder()
            .id(PacketId::from(0u64))
            .message(Box::new(SizedMessage(1)))
            .origin(NodeId::from(1))
            .destination(NodeId::from(2))
            .build()
    }

    #[test]
    fn drop_rate_extremes() {
        let mut never = LossyDelivery::new(0.0, 1);
        let mut always = LossyDelivery::new(1.0, 1);
        for _ in 0..50 {
            assert!(never.reaches_destination(&packet()).unwrap());
            assert!(!always.reaches_destination(&packet()).unwrap());
        }
    }

    #[test]
    fn drop_rate_is_roughly_met() {
        let mut model = LossyDelivery::new(0.3, 5);
        let lost = (0..10_000)
            .filter(|_| !model.reaches_destination(&packet()).unwrap())
            .count();
        assert!((2_500..3_500).contains(&lost));
    }
}
