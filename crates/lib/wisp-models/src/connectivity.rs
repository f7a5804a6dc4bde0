use hashbrown::HashMap;
use rand_distr::{Distribution, Standard};
use rand_pcg::Pcg64Mcg;

use wisp_core::error::{SimError, SimResult};
use wisp_core::models::{ConnectivityModel, NodeView};
use wisp_core::node::NodeId;
use wisp_core::registry::{ModelSettings, ParamSpec};

use crate::dist::{node_stream, seeded_rng};
use crate::params::check_params;

/// Unit disk graph: connected if at most `radius` apart.
#[derive(Debug, Clone, Copy)]
pub struct UDG {
    pub radius: f64,
}

impl UDG {
    pub const PARAMS: &'static [ParamSpec] = &[ParamSpec::required("radius", 0.0, f64::MAX)];

    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, Self::PARAMS, &[])?;
        Ok(Self {
            radius: settings.value(&Self::PARAMS[0])?,
        })
    }
}

impl ConnectivityModel for UDG {
    fn is_connected(&mut self, from: NodeView, to: NodeView) -> SimResult<bool> {
        Ok(from.position.squared_distance(to.position)? <= self.radius * self.radius)
    }
}

/// Quasi unit disk graph. Always connected below `r_min`, never above `r_max`. In between a
/// link exists with `probability`; the draw is kept while the pair stays in that band.
#[derive(Debug, Clone)]
pub struct QUDG {
    pub r_min: f64,
    pub r_max: f64,
    pub probability: f64,
    seed: u64,
    rng: Option<Pcg64Mcg>,
    decisions: HashMap<NodeId, bool>,
}

impl QUDG {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::required("r_min", 0.0, f64::MAX),
        ParamSpec::required("r_max", 0.0, f64::MAX),
        ParamSpec::optional("probability", 0.0, 1.0, 0.5),
    ];

    pub fn new(r_min: f64, r_max: f64, probability: f64, seed: u64) -> SimResult<Self> {
        if r_min > r_max {
            return Err(SimError::config(
                "qudg.params.r_min",
                format!("{} is larger than r_max {}", r_min, r_max),
            ));
        }
        Ok(Self {
            r_min,
            r_max,
            probability,
            seed,
            rng: None,
            decisions: HashMap::new(),
        })
    }

    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, Self::PARAMS, &[])?;
        Self::new(
            settings.value(&Self::PARAMS[0])?,
            settings.value(&Self::PARAMS[1])?,
            settings.value(&Self::PARAMS[2])?,
            settings.seed(),
        )
    }
}

impl ConnectivityModel for QUDG {
    fn is_connected(&mut self, from: NodeView, to: NodeView) -> SimResult<bool> {
        let distance = from.position.euclidean_distance(to.position)?;
        if distance <= self.r_min {
            self.decisions.remove(&to.id);
            return Ok(true);
        }
        if distance > self.r_max {
            self.decisions.remove(&to.id);
            return Ok(false);
        }
        if let Some(decision) = self.decisions.get(&to.id) {
            return Ok(*decision);
        }
        let seed = self.seed;
        let rng = self
            .rng
            .get_or_insert_with(|| seeded_rng(seed, node_stream(from.id)));
        let draw: f64 = Standard.sample(rng);
        let decision = draw < self.probability;
        self.decisions.insert(to.id, decision);
        Ok(decision)
    }
}

/// A unit disk graph that decides once per pair and never changes its mind.
#[derive(Debug, Clone)]
pub struct StaticUDG {
    pub radius: f64,
    decisions: HashMap<NodeId, bool>,
}

impl StaticUDG {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            decisions: HashMap::new(),
        }
    }

    pub fn from_settings(settings: &ModelSettings) -> SimResult<Self> {
        check_params(settings, UDG::PARAMS, &[])?;
        Ok(Self::new(settings.value(&UDG::PARAMS[0])?))
    }
}

impl ConnectivityModel for StaticUDG {
    fn is_connected(&mut self, from: NodeView, to: NodeView) -> SimResult<bool> {
        if let Some(decision) = self.decisions.get(&to.id) {
            return Ok(*decision);
        }
        let decision = from.position.euclidean_distance(to.position)? <= self.radius;
        self.decisions.insert(to.id, decision);
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use wisp_core::position::Position;

    use super::*;

    fn pair(distance: f64) -> (Position, Position) {
        (Position::at(0.0, 0.0, 0.0), Position::at(distance, 0.0, 0.0))
    }

    #[test]
    fn udg_includes_the_boundary() {
        let mut udg = UDG { radius: 5.0 };
        let (a, b) = pair(5.0);
        let from = NodeView::new(NodeId::from(1), &a);
        let to = NodeView::new(NodeId::from(2), &b);
        assert!(udg.is_connected(from, to).unwrap());
        let (a, b) = pair(5.01);
        let to = NodeView::new(NodeId::from(2), &b);
        assert!(!udg.is_connected(NodeView::new(NodeId::from(1), &a), to).unwrap());
    }

    #[test]
    fn qudg_keeps_its_draw_inside_the_band() {
        let mut qudg = QUDG::new(2.0, 8.0, 0.5, 9).unwrap();
        let origin = Position::at(0.0, 0.0, 0.0);
        let from = NodeView::new(NodeId::from(1), &origin);
        let near = Position::at(1.0, 0.0, 0.0);
        let far = Position::at(9.0, 0.0, 0.0);
        assert!(qudg.is_connected(from, NodeView::new(NodeId::from(2), &near)).unwrap());
        assert!(!qudg.is_connected(from, NodeView::new(NodeId::from(2), &far)).unwrap());

        let band = Position::at(5.0, 0.0, 0.0);
        let first = qudg
            .is_connected(from, NodeView::new(NodeId::from(3), &band))
            .unwrap();
        for _ in 0..10 {
            let again = qudg
                .is_connected(from, NodeView::new(NodeId::from(3), &band))
                .unwrap();
            assert_eq!(again, first);
        }
        assert!(QUDG::new(5.0, 1.0, 0.5, 0).is_err());
    }

    #[test]
    fn static_udg_never_changes_its_mind() {
        let mut model = StaticUDG::new(3.0);
        let (a, b) = pair(1.0);
        let from = NodeView::new(NodeId::from(1), &a);
        assert!(model.is_connected(from, NodeView::new(NodeId::from(2), &b)).unwrap());
        let moved = Position::at(50.0, 0.0, 0.0);
        assert!(model.is_connected(from, NodeView::new(NodeId::from(2), &moved)).unwrap());
    }
}
