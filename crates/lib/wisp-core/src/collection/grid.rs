use hashbrown::HashMap;
use indexmap::IndexSet;
use itertools::iproduct;

use crate::collection::NodeCollection;
use crate::node::NodeId;
use crate::position::Point3;

type CellId = (i64, i64);

/// Spatial hash over the x/y plane with square cells as wide as the connection radius, so
/// every node within the radius lies in the 3x3 block of cells around a node.
#[derive(Debug, Clone)]
pub struct PlaneCollection {
    cell_size: f64,
    cell2node: HashMap<CellId, IndexSet<NodeId>>,
    node2cell: HashMap<NodeId, CellId>,
}

impl PlaneCollection {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cell2node: HashMap::new(),
            node2cell: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cell_of(&self, node: &NodeId) -> Option<&CellId> {
        self.node2cell.get(node)
    }

    #[inline]
    fn cell_id(&self, point: &Point3) -> CellId {
        let cell_x = (point.x / self.cell_size).floor() as i64;
        let cell_y = (point.y / self.cell_size).floor() as i64;
        (cell_x, cell_y)
    }
}

impl NodeCollection for PlaneCollection {
    fn insert(&mut self, node: NodeId, point: Point3) {
        let cell_id = self.cell_id(&point);
        if let Some(old_cell) = self.node2cell.insert(node, cell_id) {
            if old_cell == cell_id {
                return;
            }
            if let Some(nodes) = self.cell2node.get_mut(&old_cell) {
                nodes.shift_remove(&node);
            }
        }
        self.cell2node.entry(cell_id).or_default().insert(node);
    }

    fn remove(&mut self, node: &NodeId) -> bool {
        let Some(cell_id) = self.node2cell.remove(node) else {
            return false;
        };
        if let Some(nodes) = self.cell2node.get_mut(&cell_id) {
            nodes.shift_remove(node);
            if nodes.is_empty() {
                self.cell2node.remove(&cell_id);
            }
        }
        true
    }

    fn reposition(&mut self, node: NodeId, point: Point3) {
        self.insert(node, point);
    }

    fn possible_neighbors(&self, node: &NodeId) -> Vec<NodeId> {
        let Some((cell_x, cell_y)) = self.node2cell.get(node).copied() else {
            return Vec::new();
        };
        let mut neighbors: Vec<NodeId> = iproduct!(-1..=1, -1..=1)
            .filter_map(|(dx, dy)| self.cell2node.get(&(cell_x + dx, cell_y + dy)))
            .flat_map(|nodes| nodes.iter().copied())
            .filter(|other| other != node)
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    fn len(&self) -> usize {
        self.node2cell.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_come_from_the_surrounding_cells() {
        let mut grid = PlaneCollection::new(10.0);
        grid.insert(NodeId::from(1), Point3::new(5.0, 5.0, 0.0));
        grid.insert(NodeId::from(2), Point3::new(14.0, 5.0, 0.0));
        grid.insert(NodeId::from(3), Point3::new(-4.0, -4.0, 0.0));
        grid.insert(NodeId::from(4), Point3::new(35.0, 5.0, 0.0));
        assert_eq!(
            grid.possible_neighbors(&NodeId::from(1)),
            vec![NodeId::from(2), NodeId::from(3)]
        );

        grid.reposition(NodeId::from(4), Point3::new(6.0, 6.0, 99.0));
        assert_eq!(grid.cell_of(&NodeId::from(4)), Some(&(0, 0)));
        assert_eq!(grid.possible_neighbors(&NodeId::from(1)).len(), 3);

        assert!(grid.remove(&NodeId::from(2)));
        assert!(!grid.remove(&NodeId::from(2)));
        assert_eq!(grid.len(), 3);
    }
}
