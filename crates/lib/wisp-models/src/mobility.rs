use log::trace;
use rand_distr::{Distribution, Uniform};
use rand_pcg::Pcg64Mcg;

use wisp_core::error::SimResult;
use wisp_core::models::{MobilityModel, NodeView};
use wisp_core::position::{Dimensions, Point3, Position};
use wisp_core::registry::ModelSettings;
use wisp_core::time::SimTime;

use crate::dist::{node_stream, seeded_rng, DistParams, DistType, RngSampler};
use crate::params::check_params;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoMobility;

impl NoMobility {
    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, &[], &[])?;
        Ok(Self)
    }
}

impl MobilityModel for NoMobility {
    fn next_position(
        &mut self,
        node: NodeView,
        _dims: &Dimensions,
        _now: SimTime,
    ) -> SimResult<Position> {
        node.position.copy()
    }
}

#[derive(Debug, Clone)]
struct Walk {
    speed: RngSampler,
    wait: RngSampler,
    rng: Pcg64Mcg,
    destination: Option<Point3>,
    velocity: f64,
    waiting: u64,
}

impl Walk {
    fn pick_destination(&mut self, dims: &Dimensions) -> Point3 {
        Point3::new(
            uniform_in(dims.dim_x, &mut self.rng),
            uniform_in(dims.dim_y, &mut self.rng),
            uniform_in(dims.dim_z, &mut self.rng),
        )
    }
}

pub(crate) fn uniform_in(range: [f64; 2], rng: &mut Pcg64Mcg) -> f64 {
    Uniform::new_inclusive(range[0], range[1]).sample(rng)
}

/// Moves towards a uniformly drawn destination with a drawn speed (distance per round), waits
/// there for a drawn number of rounds and starts over.
#[derive(Debug, Clone)]
pub struct RandomWayPoint {
    seed: u64,
    speed: DistType,
    wait: DistType,
    walk: Option<Walk>,
}

impl RandomWayPoint {
    pub fn new(speed: DistType, wait: DistType, seed: u64) -> Self {
        Self {
            seed,
            speed,
            wait,
            walk: None,
        }
    }

    /// `speed` and `wait` accept the prefixed distribution parameters of
    /// [`DistParams::from_settings`]. They default to one unit per round and no waiting.
    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, &[], &["speed", "wait"])?;
        let speed = DistParams::from_settings(settings, "speed")?
            .unwrap_or_else(|| DistParams::constant(1.0));
        let wait = DistParams::from_settings(settings, "wait")?
            .unwrap_or_else(|| DistParams::constant(0.0));
        Ok(Self::new(
            DistType::new(&speed)?,
            DistType::new(&wait)?,
            settings.seed(),
        ))
    }
}

impl MobilityModel for RandomWayPoint {
    fn next_position(
        &mut self,
        node: NodeView,
        dims: &Dimensions,
        _now: SimTime,
    ) -> SimResult<Position> {
        let here = node.position.point()?;
        let (seed, speed, wait) = (self.seed, self.speed, self.wait);
        let walk = self.walk.get_or_insert_with(|| {
            let stream = node_stream(node.id).wrapping_mul(3);
            Walk {
                speed: RngSampler::with_rng(speed, seeded_rng(seed, stream)),
                wait: RngSampler::with_rng(wait, seeded_rng(seed, stream.wrapping_add(1))),
                rng: seeded_rng(seed, stream.wrapping_add(2)),
                destination: None,
                velocity: 0.0,
                waiting: 0,
            }
        });

        if walk.waiting > 0 {
            walk.waiting -= 1;
            return Ok(Position::from(here));
        }
        let destination = match walk.destination {
            Some(destination) => destination,
            None => {
                let destination = walk.pick_destination(dims);
                walk.destination = Some(destination);
                walk.velocity = walk.speed.sample().max(0.0);
                trace!("Node {} heads to {} at {}", node.id, destination, walk.velocity);
                destination
            }
        };

        let remaining = here.distance(&destination);
        if remaining <= walk.velocity {
            walk.destination = None;
            walk.waiting = walk.wait.sample().max(0.0).round() as u64;
            return Ok(Position::from(destination));
        }
        let step = walk.velocity / remaining;
        Ok(Position::at(
            here.x + (destination.x - here.x) * step,
            here.y + (destination.y - here.y) * step,
            here.z + (destination.z - here.z) * step,
        ))
    }
}

#[cfg(test)]
mod tests {
    use wisp_core::node::NodeId;

    use super::*;

    fn dims() -> Dimensions {
        Dimensions::builder()
            .dim_x([0.0, 50.0])
            .dim_y([0.0, 50.0])
            .build()
    }

    #[test]
    fn waypoint_moves_at_constant_speed_within_the_area() {
        let settings = ModelSettings::named("randomwaypoint").with_param("speed", 2.0);
        let mut model = RandomWayPoint::from_settings(&settings).unwrap();
        let mut position = Position::at(25.0, 25.0, 0.0);
        for round in 1..200u64 {
            let view = NodeView::new(NodeId::from(4), &position);
            let next = model
                .next_position(view, &dims(), SimTime::from(round))
                .unwrap();
            let step = position.euclidean_distance(&next).unwrap();
            assert!(step <= 2.0 + 1e-9);
            assert!(dims().contains(&next.point().unwrap()));
            position = next;
        }
    }

    #[test]
    fn waypoint_waits_after_arrival() {
        let settings = ModelSettings::named("randomwaypoint")
            .with_param("speed", 1000.0)
            .with_param("wait", 2.0);
        let mut model = RandomWayPoint::from_settings(&settings).unwrap();
        let start = Position::at(1.0, 1.0, 0.0);
        let view = NodeView::new(NodeId::from(1), &start);
        let arrived = model.next_position(view, &dims(), SimTime::from(1u64)).unwrap();
        for round in 2..4u64 {
            let view = NodeView::new(NodeId::from(1), &arrived);
            let next = model.next_position(view, &dims(), SimTime::from(round)).unwrap();
            assert!(next.equals(&arrived).unwrap());
        }
    }
}
