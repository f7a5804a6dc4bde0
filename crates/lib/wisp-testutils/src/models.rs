use std::sync::{Arc, Mutex};

use wisp_core::air::AirView;
use wisp_core::error::{SimError, SimResult};
use wisp_core::hashbrown::HashSet;
use wisp_core::message::Message;
use wisp_core::models::{
    ConnectivityModel, InterferenceModel, MessageTransmissionModel, MobilityModel, NodeModels,
    NodeView, ReliabilityModel,
};
use wisp_core::node::NodeId;
use wisp_core::packet::Packet;
use wisp_core::position::{Dimensions, Position};
use wisp_core::time::SimTime;

#[derive(Debug, Default, Clone, Copy)]
pub struct Stationary;

impl MobilityModel for Stationary {
    fn next_position(
        &mut self,
        node: NodeView,
        _dims: &Dimensions,
        _now: SimTime,
    ) -> SimResult<Position> {
        node.position.copy()
    }
}

/// Moves the node by a fixed offset along x every round.
#[derive(Debug, Clone, Copy)]
pub struct Drift(pub f64);

impl MobilityModel for Drift {
    fn next_position(
        &mut self,
        node: NodeView,
        _dims: &Dimensions,
        _now: SimTime,
    ) -> SimResult<Position> {
        let point = node.position.point()?;
        Ok(Position::at(point.x + self.0, point.y, point.z))
    }
}

/// Fails once the given round is reached.
#[derive(Debug, Clone, Copy)]
pub struct BrokenMobility {
    pub fails_in: u64,
}

impl MobilityModel for BrokenMobility {
    fn next_position(
        &mut self,
        node: NodeView,
        _dims: &Dimensions,
        now: SimTime,
    ) -> SimResult<Position> {
        if now.as_round() >= self.fails_in {
            return Err(SimError::config("mobility", "broken on purpose"));
        }
        node.position.copy()
    }
}

/// Connects nodes that are at most `radius` apart.
#[derive(Debug, Clone, Copy)]
pub struct WithinRadius(pub f64);

impl ConnectivityModel for WithinRadius {
    fn is_connected(&mut self, from: NodeView, to: NodeView) -> SimResult<bool> {
        Ok(from.position.euclidean_distance(to.position)? <= self.0)
    }
}

/// A directed link table shared by the connectivity models of all nodes, so a test can add
/// and cut single edges between rounds.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    links: Arc<Mutex<HashSet<(NodeId, NodeId)>>>,
}

impl LinkTable {
    pub fn connect(&self, from: u64, to: u64) {
        if let Ok(mut links) = self.links.lock() {
            links.insert((NodeId::from(from), NodeId::from(to)));
        }
    }

    pub fn disconnect(&self, from: u64, to: u64) {
        if let Ok(mut links) = self.links.lock() {
            links.remove(&(NodeId::from(from), NodeId::from(to)));
        }
    }

    pub fn model(&self) -> Box<dyn ConnectivityModel> {
        Box::new(self.clone())
    }
}

impl ConnectivityModel for LinkTable {
    fn is_connected(&mut self, from: NodeView, to: NodeView) -> SimResult<bool> {
        let links = self
            .links
            .lock()
            .map_err(|_| SimError::config("links", "poisoned"))?;
        Ok(links.contains(&(from.id, to.id)))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Quiet;

impl InterferenceModel for Quiet {
    fn is_disturbed(&self, _packet: &Packet, _air: &AirView) -> SimResult<bool> {
        Ok(false)
    }
}

/// Disturbs a packet once more than `limit` packets are active in the air.
#[derive(Debug, Clone, Copy)]
pub struct Crowded {
    pub limit: usize,
}

impl InterferenceModel for Crowded {
    fn is_disturbed(&self, _packet: &Packet, air: &AirView) -> SimResult<bool> {
        Ok(air.active_packets().count() > self.limit)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Reliable;

impl ReliabilityModel for Reliable {
    fn reaches_destination(&mut self, _packet: &Packet) -> SimResult<bool> {
        Ok(true)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Unreliable;

impl ReliabilityModel for Unreliable {
    fn reaches_destination(&mut self, _packet: &Packet) -> SimResult<bool> {
        Ok(false)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub f64);

impl MessageTransmissionModel for FixedDelay {
    fn time_to_reach(
        &mut self,
        _from: NodeView,
        _to: NodeView,
        _message: &dyn Message,
    ) -> SimResult<f64> {
        Ok(self.0)
    }
}

/// Stationary nodes that never lose packets and connect through the given model.
pub fn static_models(connectivity: Box<dyn ConnectivityModel>) -> NodeModels {
    NodeModels {
        mobility: Box::new(Stationary),
        connectivity,
        interference: Box::new(Quiet),
        reliability: Box::new(Reliable),
    }
}
