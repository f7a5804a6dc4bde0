use hashbrown::HashMap;

use crate::collection::NodeCollection;
use crate::node::NodeId;
use crate::position::Point3;

const AXES: usize = 3;

pub type Range3 = [[f64; 2]; AXES];

#[derive(Debug, Clone)]
struct KdNode {
    id: NodeId,
    point: Point3,
    axis: usize,
    left: Option<Box<KdNode>>,
    right: Option<Box<KdNode>>,
}

impl KdNode {
    fn new(id: NodeId, point: Point3, axis: usize) -> Self {
        Self {
            id,
            point,
            axis,
            left: None,
            right: None,
        }
    }

    fn split(&self) -> f64 {
        self.point.axis(self.axis)
    }
}

/// Unbalanced three-dimensional k-d tree. Points smaller than a node on its split axis go
/// left, everything else goes right. There is no rebalancing.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    root: Option<Box<KdNode>>,
    len: usize,
}

impl KdTree {
    pub fn insert(&mut self, id: NodeId, point: Point3) {
        insert_into(&mut self.root, id, point, 0);
        self.len += 1;
    }

    /// Removes the entry of `id` stored at `point`.
    pub fn remove(&mut self, id: NodeId, point: &Point3) -> bool {
        let removed = remove_from(&mut self.root, id, point);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Ids of all points inside the closed box `[[min_x, max_x], [min_y, max_y], [min_z, max_z]]`.
    pub fn filter(&self, range: &Range3) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<&KdNode> = self.root.as_deref().into_iter().collect();
        while let Some(node) = stack.pop() {
            if (0..AXES).all(|axis| {
                let value = node.point.axis(axis);
                range[axis][0] <= value && value <= range[axis][1]
            }) {
                found.push(node.id);
            }
            let [min, max] = range[node.axis];
            let split = node.split();
            if min < split {
                stack.extend(node.left.as_deref());
            }
            if max >= split {
                stack.extend(node.right.as_deref());
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn insert_into(slot: &mut Option<Box<KdNode>>, id: NodeId, point: Point3, axis: usize) {
    match slot {
        None => *slot = Some(Box::new(KdNode::new(id, point, axis))),
        Some(node) => {
            let next_axis = (node.axis + 1) % AXES;
            if point.axis(node.axis) < node.split() {
                insert_into(&mut node.left, id, point, next_axis);
            } else {
                insert_into(&mut node.right, id, point, next_axis);
            }
        }
    }
}

fn remove_from(slot: &mut Option<Box<KdNode>>, id: NodeId, point: &Point3) -> bool {
    let Some(node) = slot else {
        return false;
    };
    if node.id != id {
        return if point.axis(node.axis) < node.split() {
            remove_from(&mut node.left, id, point)
        } else {
            remove_from(&mut node.right, id, point)
        };
    }

    let axis = node.axis;
    if let Some(right) = node.right.as_deref() {
        let (min_id, min_point) = find_min(right, axis);
        node.id = min_id;
        node.point = min_point;
        remove_from(&mut node.right, min_id, &min_point);
    } else if let Some(left) = node.left.as_deref() {
        // The minimum of the left subtree takes this place and the left subtree becomes the
        // right one, which keeps every point at or above the new split.
        let (min_id, min_point) = find_min(left, axis);
        node.id = min_id;
        node.point = min_point;
        node.right = node.left.take();
        remove_from(&mut node.right, min_id, &min_point);
    } else {
        *slot = None;
    }
    true
}

/// The point with the smallest coordinate along `axis` in the subtree.
fn find_min(node: &KdNode, axis: usize) -> (NodeId, Point3) {
    let mut best = (node.id, node.point);
    let children = if node.axis == axis {
        [node.left.as_deref(), None]
    } else {
        [node.left.as_deref(), node.right.as_deref()]
    };
    for child in children.into_iter().flatten() {
        let candidate = find_min(child, axis);
        if candidate.1.axis(axis) < best.1.axis(axis) {
            best = candidate;
        }
    }
    best
}

/// [`KdTree`] indexed by node id, answering neighbor queries with a cube around the node.
#[derive(Debug, Clone)]
pub struct SpatialCollection {
    radius: f64,
    tree: KdTree,
    points: HashMap<NodeId, Point3>,
}

impl SpatialCollection {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            tree: KdTree::default(),
            points: HashMap::new(),
        }
    }

    pub fn tree(&self) -> &KdTree {
        &self.tree
    }
}

impl NodeCollection for SpatialCollection {
    fn insert(&mut self, node: NodeId, point: Point3) {
        if let Some(old) = self.points.insert(node, point) {
            self.tree.remove(node, &old);
        }
        self.tree.insert(node, point);
    }

    fn remove(&mut self, node: &NodeId) -> bool {
        match self.points.remove(node) {
            Some(point) => self.tree.remove(*node, &point),
            None => false,
        }
    }

    fn possible_neighbors(&self, node: &NodeId) -> Vec<NodeId> {
        let Some(point) = self.points.get(node) else {
            return Vec::new();
        };
        let range = [
            [point.x - self.radius, point.x + self.radius],
            [point.y - self.radius, point.y + self.radius],
            [point.z - self.radius, point.z + self.radius],
        ];
        let mut neighbors: Vec<NodeId> = self
            .tree
            .filter(&range)
            .into_iter()
            .filter(|other| other != node)
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_of(points: &[(u64, f64, f64, f64)]) -> KdTree {
        let mut tree = KdTree::default();
        for (id, x, y, z) in points {
            tree.insert(NodeId::from(*id), Point3::new(*x, *y, *z));
        }
        tree
    }

    #[test]
    fn filter_returns_points_inside_the_box() {
        let tree = tree_of(&[
            (0, 5.0, 5.0, 0.0),
            (1, 2.0, 8.0, 0.0),
            (2, 9.0, 1.0, 0.0),
            (3, 4.0, 4.0, 3.0),
            (4, 5.0, 2.0, 0.0),
        ]);
        let mut found = tree.filter(&[[3.0, 6.0], [1.5, 5.0], [0.0, 0.0]]);
        found.sort_unstable();
        assert_eq!(found, vec![NodeId::from(0), NodeId::from(4)]);
        assert_eq!(tree.filter(&[[0.0, 10.0], [0.0, 10.0], [0.0, 10.0]]).len(), 5);
    }

    #[test]
    fn removal_keeps_the_remaining_points_reachable() {
        let points = [
            (0, 5.0, 5.0, 0.0),
            (1, 2.0, 8.0, 0.0),
            (2, 9.0, 1.0, 0.0),
            (3, 5.0, 4.0, 0.0),
            (4, 7.0, 2.0, 0.0),
            (5, 1.0, 1.0, 0.0),
            (6, 5.0, 9.0, 0.0),
        ];
        let mut tree = tree_of(&points);
        assert!(tree.remove(NodeId::from(0), &Point3::new(5.0, 5.0, 0.0)));
        assert!(tree.remove(NodeId::from(1), &Point3::new(2.0, 8.0, 0.0)));
        assert!(!tree.remove(NodeId::from(1), &Point3::new(2.0, 8.0, 0.0)));
        assert_eq!(tree.len(), 5);

        let everything = [[-100.0, 100.0], [-100.0, 100.0], [-100.0, 100.0]];
        let mut found = tree.filter(&everything);
        found.sort_unstable();
        assert_eq!(found, [2, 3, 4, 5, 6].map(NodeId::from).to_vec());
        for (id, x, y, z) in points.iter().skip(2) {
            assert!(tree.remove(NodeId::from(*id), &Point3::new(*x, *y, *z)));
        }
        assert!(tree.is_empty());
    }
}
