//! Node-to-vehicle assignments manipulated by the search.

use serde::{Deserialize, Serialize};

use crate::models::PickupDelivery;

/// A partial or complete assignment of nodes to vehicle routes.
///
/// Routes hold physical nodes in visit order, without the depot sentinels.
/// Nodes not on any route are listed in `unassigned`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// One node sequence per vehicle.
    pub routes: Vec<Vec<usize>>,
    /// Nodes not served by any vehicle.
    pub unassigned: Vec<usize>,
}

impl Assignment {
    /// Empty routes for `num_vehicles` with every node in `nodes` unassigned.
    pub fn empty(num_vehicles: usize, nodes: impl IntoIterator<Item = usize>) -> Self {
        Self {
            routes: vec![Vec::new(); num_vehicles],
            unassigned: nodes.into_iter().collect(),
        }
    }

    /// Returns `true` if some route serves `node`.
    pub fn is_routed(&self, node: usize) -> bool {
        self.routes.iter().any(|r| r.contains(&node))
    }

    /// Removes `node` from the unassigned list.
    pub fn mark_routed(&mut self, node: usize) {
        self.unassigned.retain(|&n| n != node);
    }

    /// Vehicle and position of `node`, if routed.
    pub fn locate(&self, node: usize) -> Option<(usize, usize)> {
        self.routes
            .iter()
            .enumerate()
            .find_map(|(v, r)| r.iter().position(|&n| n == node).map(|p| (v, p)))
    }

    /// Number of routed nodes.
    pub fn num_routed(&self) -> usize {
        self.routes.iter().map(Vec::len).sum()
    }
}

/// The smallest unit the constructive strategies insert: a lone node, or a
/// coupled pickup-delivery pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// A node without a partner.
    Single(usize),
    /// A pickup and its delivery, inserted together.
    Pair(PickupDelivery),
}

impl Request {
    /// Nodes of the request, pickup first for pairs.
    pub fn nodes(&self) -> Vec<usize> {
        match *self {
            Self::Single(n) => vec![n],
            Self::Pair(p) => vec![p.pickup, p.delivery],
        }
    }

    /// Lowest node number of the request.
    pub fn key(&self) -> usize {
        match *self {
            Self::Single(n) => n,
            Self::Pair(p) => p.pickup.min(p.delivery),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_assignment() {
        let a = Assignment::empty(3, 1..5);
        assert_eq!(a.routes.len(), 3);
        assert_eq!(a.unassigned, vec![1, 2, 3, 4]);
        assert_eq!(a.num_routed(), 0);
    }

    #[test]
    fn test_locate_and_mark() {
        let mut a = Assignment::empty(2, 1..4);
        a.routes[1].push(2);
        a.mark_routed(2);
        assert_eq!(a.locate(2), Some((1, 0)));
        assert!(a.is_routed(2));
        assert!(!a.is_routed(3));
        assert_eq!(a.unassigned, vec![1, 3]);
    }

    #[test]
    fn test_request_nodes() {
        let pair = Request::Pair(PickupDelivery::new(7, 3));
        assert_eq!(pair.nodes(), vec![7, 3]);
        assert_eq!(pair.key(), 3);
        assert_eq!(Request::Single(4).nodes(), vec![4]);
    }
}
