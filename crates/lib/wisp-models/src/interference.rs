use wisp_core::air::AirView;
use wisp_core::error::SimResult;
use wisp_core::models::InterferenceModel;
use wisp_core::packet::Packet;
use wisp_core::registry::{ModelSettings, ParamSpec};

use crate::params::check_params;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterference;

impl NoInterference {
    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, &[], &[])?;
        Ok(Self)
    }
}

impl InterferenceModel for NoInterference {
    fn is_disturbed(&self, _packet: &Packet, _air: &AirView) -> SimResult<bool> {
        Ok(false)
    }
}

/// Signal to interference plus noise ratio.
///
/// The signal of a packet is its intensity divided by `distance^alpha`. Every other active
/// transmission adds its own attenuated intensity to the noise, transmissions of the packet's
/// origin excepted. The packet is disturbed if its signal is below `beta` times the sum, or if
/// the receiver is transmitting itself.
#[derive(Debug, Clone, Copy)]
pub struct SINR {
    pub alpha: f64,
    pub beta: f64,
    pub noise: f64,
}

impl Default for SINR {
    fn default() -> Self {
        Self {
            alpha: 2.0,
            beta: 0.7,
            noise: 0.0,
        }
    }
}

impl SINR {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::optional("alpha", 0.0, 10.0, 2.0),
        ParamSpec::optional("beta", 0.0, f64::MAX, 0.7),
        ParamSpec::optional("noise", 0.0, f64::MAX, 0.0),
    ];

    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, Self::PARAMS, &[])?;
        Ok(Self {
            alpha: settings.value(&Self::PARAMS[0])?,
            beta: settings.value(&Self::PARAMS[1])?,
            noise: settings.value(&Self::PARAMS[2])?,
        })
    }

    fn attenuation(&self, distance: f64) -> f64 {
        distance.max(f64::EPSILON).powf(self.alpha)
    }
}

impl InterferenceModel for SINR {
    fn is_disturbed(&self, packet: &Packet, air: &AirView) -> SimResult<bool> {
        let receiver = air.position_of(&packet.destination())?;
        let sender = air.position_of(&packet.origin())?;
        let signal = packet.intensity / self.attenuation(sender.euclidean_distance(receiver)?);

        let mut noise = self.noise;
        for other in air.active_packets() {
            if other.id() == packet.id() || other.origin() == packet.origin() {
                continue;
            }
            if other.origin() == packet.destination() {
                return Ok(true);
            }
            let Ok(position) = air.position_of(&other.origin()) else {
                continue;
            };
            noise += other.intensity / self.attenuation(position.euclidean_distance(receiver)?);
        }
        Ok(signal < self.beta * noise)
    }
}
