//! Route and visit types.

use serde::{Deserialize, Serialize};

/// A single stop within a route.
///
/// Tracks the node and route index along with the realized cumulative value of
/// every registered dimension at this stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Physical node visited.
    pub node: usize,
    /// Route index of this stop (start and end sentinels are distinct indices).
    pub index: usize,
    /// Cumulative value per dimension, in dimension registration order.
    pub cumuls: Vec<i64>,
}

/// The ordered stops of one vehicle, from its start sentinel to its end sentinel.
///
/// A route whose only stops are the two sentinels is unused.
///
/// # Examples
///
/// ```
/// use u_vrp::models::{Route, Visit};
///
/// let mut route = Route::new(0);
/// route.push_visit(Visit { node: 0, index: 0, cumuls: vec![0] });
/// route.push_visit(Visit { node: 2, index: 2, cumuls: vec![7] });
/// route.push_visit(Visit { node: 0, index: 4, cumuls: vec![12] });
/// assert_eq!(route.len(), 1);
/// assert_eq!(route.customer_nodes(), vec![2]);
/// assert_eq!(route.end_cumul(0), Some(12));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    vehicle_id: usize,
    visits: Vec<Visit>,
    cost: i64,
}

impl Route {
    /// Creates a route without stops for the given vehicle.
    pub fn new(vehicle_id: usize) -> Self {
        Self {
            vehicle_id,
            visits: Vec::new(),
            cost: 0,
        }
    }

    /// Appends a stop to the end of this route.
    pub fn push_visit(&mut self, visit: Visit) {
        self.visits.push(visit);
    }

    /// Returns the vehicle assigned to this route.
    pub fn vehicle_id(&self) -> usize {
        self.vehicle_id
    }

    /// Returns all stops, sentinels included.
    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    /// Returns the number of customer visits (sentinels excluded).
    pub fn len(&self) -> usize {
        self.visits.len().saturating_sub(2)
    }

    /// Returns `true` if this route serves no customer.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every node on the route, start and end depot included.
    pub fn nodes(&self) -> Vec<usize> {
        self.visits.iter().map(|v| v.node).collect()
    }

    /// Returns the served nodes in visit order, without the sentinels.
    pub fn customer_nodes(&self) -> Vec<usize> {
        let inner = self.len();
        self.visits.iter().skip(1).take(inner).map(|v| v.node).collect()
    }

    /// Cumulative value of dimension `dimension` at the end sentinel.
    pub fn end_cumul(&self, dimension: usize) -> Option<i64> {
        self.visits.last().and_then(|v| v.cumuls.get(dimension).copied())
    }

    /// Sum of arc costs along the route.
    pub fn cost(&self) -> i64 {
        self.cost
    }

    /// Sets the arc cost (used by the evaluator).
    pub fn set_cost(&mut self, cost: i64) {
        self.cost = cost;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(node: usize, index: usize, load: i64) -> Visit {
        Visit {
            node,
            index,
            cumuls: vec![load],
        }
    }

    #[test]
    fn test_route_empty() {
        let r = Route::new(0);
        assert!(r.is_empty());
        assert_eq!(r.len(), 0);
        assert_eq!(r.vehicle_id(), 0);
        assert_eq!(r.cost(), 0);
        assert_eq!(r.end_cumul(0), None);
    }

    #[test]
    fn test_route_sentinels_only() {
        let mut r = Route::new(1);
        r.push_visit(visit(0, 3, 0));
        r.push_visit(visit(0, 5, 0));
        assert!(r.is_empty());
        assert_eq!(r.nodes(), vec![0, 0]);
        assert!(r.customer_nodes().is_empty());
    }

    #[test]
    fn test_route_push_visit() {
        let mut r = Route::new(1);
        r.push_visit(visit(0, 3, 0));
        r.push_visit(visit(5, 5, 20));
        r.push_visit(visit(2, 2, 35));
        r.push_visit(visit(0, 6, 40));
        r.set_cost(17);
        assert_eq!(r.len(), 2);
        assert_eq!(r.customer_nodes(), vec![5, 2]);
        assert_eq!(r.end_cumul(0), Some(40));
        assert_eq!(r.cost(), 17);
    }
}
