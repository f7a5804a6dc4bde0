//! Spatial indexes used to shrink the candidate set of the connectivity scan.
//!
//! Both strategies answer `possible_neighbors` with a superset of the nodes within the
//! configured radius: false positives are allowed, false negatives are not.

use serde::Deserialize;

use crate::node::NodeId;
use crate::position::Point3;

pub use grid::PlaneCollection;
pub use kdtree::{KdTree, SpatialCollection};

mod grid;
mod kdtree;

pub trait NodeCollection {
    fn insert(&mut self, node: NodeId, point: Point3);
    fn remove(&mut self, node: &NodeId) -> bool;

    /// Moves a node. Unknown nodes are inserted.
    fn reposition(&mut self, node: NodeId, point: Point3) {
        self.remove(&node);
        self.insert(node, point);
    }

    /// Nodes that may lie within the radius of `node`, without `node` itself, sorted by id.
    fn possible_neighbors(&self, node: &NodeId) -> Vec<NodeId>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Uniform hash grid on the x/y plane. The z coordinate is ignored.
    #[default]
    Plane,
    /// Three-dimensional k-d tree.
    Spatial,
}

/// The collection selected for a simulation.
#[derive(Debug, Clone)]
pub enum NodeIndex {
    Plane(PlaneCollection),
    Spatial(SpatialCollection),
}

impl NodeIndex {
    /// A zero radius means the index is not consulted; it still tracks the nodes.
    pub fn new(kind: CollectionKind, radius: f64) -> Self {
        let radius = if radius > 0.0 { radius } else { 1.0 };
        match kind {
            CollectionKind::Plane => NodeIndex::Plane(PlaneCollection::new(radius)),
            CollectionKind::Spatial => NodeIndex::Spatial(SpatialCollection::new(radius)),
        }
    }
}

impl NodeCollection for NodeIndex {
    fn insert(&mut self, node: NodeId, point: Point3) {
        match self {
            NodeIndex::Plane(plane) => plane.insert(node, point),
            NodeIndex::Spatial(spatial) => spatial.insert(node, point),
        }
    }

    fn remove(&mut self, node: &NodeId) -> bool {
        match self {
            NodeIndex::Plane(plane) => plane.remove(node),
            NodeIndex::Spatial(spatial) => spatial.remove(node),
        }
    }

    fn reposition(&mut self, node: NodeId, point: Point3) {
        match self {
            NodeIndex::Plane(plane) => plane.reposition(node, point),
            NodeIndex::Spatial(spatial) => spatial.reposition(node, point),
        }
    }

    fn possible_neighbors(&self, node: &NodeId) -> Vec<NodeId> {
        match self {
            NodeIndex::Plane(plane) => plane.possible_neighbors(node),
            NodeIndex::Spatial(spatial) => spatial.possible_neighbors(node),
        }
    }

    fn len(&self) -> usize {
        match self {
            NodeIndex::Plane(plane) => plane.len(),
            NodeIndex::Spatial(spatial) => spatial.len(),
        }
    }
}
