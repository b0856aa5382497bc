//! Solution, statistics and violation types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Route;

/// A type of constraint violation found while evaluating a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// A cumulative value would exceed the vehicle's capacity on a dimension.
    CapacityExceeded {
        /// Vehicle of the route.
        vehicle: usize,
        /// Dimension name.
        dimension: String,
        /// Route index where the capacity is first exceeded.
        index: usize,
        /// Smallest reachable cumulative value at that index.
        cumul: i64,
        /// Vehicle capacity on that dimension.
        capacity: i64,
    },
    /// No cumulative value satisfies the node range and slack bounds.
    CumulRangeViolated {
        /// Vehicle of the route.
        vehicle: usize,
        /// Dimension name.
        dimension: String,
        /// Route index where the bounds become empty.
        index: usize,
    },
    /// A pickup or delivery node is served without its partner on the same route.
    PairSplit {
        /// Pickup node.
        pickup: usize,
        /// Delivery node.
        delivery: usize,
    },
    /// The delivery precedes the pickup in route order or cumulative value.
    PairOrder {
        /// Pickup node.
        pickup: usize,
        /// Delivery node.
        delivery: usize,
    },
    /// A mandatory node is not served by any vehicle.
    Unperformed {
        /// Node left out.
        node: usize,
    },
}

/// A constraint violation in a route or solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

/// Counters describing how a solution was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStatistics {
    /// First-solution strategy actually run (after resolving `AUTOMATIC`).
    pub first_solution_strategy: String,
    /// Metaheuristic actually run (after resolving `AUTOMATIC`).
    pub metaheuristic: String,
    /// Objective of the first solution, before local search.
    pub first_solution_cost: i64,
    /// Local-search steps taken.
    pub steps: u64,
    /// Steps that produced a new best solution.
    pub improvements: u64,
    /// Wall time of the whole solve.
    pub elapsed: Duration,
    /// Set when the time limit cut local search short.
    pub time_limit_reached: bool,
    /// Set when the caller cancelled the search.
    pub cancelled: bool,
}

/// The routes produced by one solve.
///
/// Holds one route per vehicle (unused vehicles have an empty route), the
/// nodes left unperformed, and the objective value.
///
/// # Examples
///
/// ```
/// use u_vrp::models::{Route, Solution};
///
/// let mut sol = Solution::new(vec!["Distance".to_string()]);
/// sol.add_route(Route::new(0));
/// assert_eq!(sol.num_routes(), 1);
/// assert_eq!(sol.num_unperformed(), 0);
/// assert_eq!(sol.dimension_position("Distance"), Some(0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    routes: Vec<Route>,
    unperformed: Vec<usize>,
    objective: i64,
    dimension_names: Vec<String>,
    statistics: SearchStatistics,
}

impl Solution {
    /// Creates a solution without routes over the named dimensions.
    pub fn new(dimension_names: Vec<String>) -> Self {
        Self {
            routes: Vec::new(),
            unperformed: Vec::new(),
            objective: 0,
            dimension_names,
            statistics: SearchStatistics::default(),
        }
    }

    /// Adds a route to this solution.
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Marks a node as unperformed.
    pub fn add_unperformed(&mut self, node: usize) {
        self.unperformed.push(node);
    }

    /// Returns the routes, one per vehicle.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns the route of `vehicle`.
    pub fn route(&self, vehicle: usize) -> Option<&Route> {
        self.routes.get(vehicle)
    }

    /// Returns the number of routes (one per vehicle).
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Returns the number of vehicles that serve at least one node.
    pub fn num_used_vehicles(&self) -> usize {
        self.routes.iter().filter(|r| !r.is_empty()).count()
    }

    /// Returns the nodes left unperformed.
    pub fn unperformed(&self) -> &[usize] {
        &self.unperformed
    }

    /// Returns the number of unperformed nodes.
    pub fn num_unperformed(&self) -> usize {
        self.unperformed.len()
    }

    /// Objective value: arc costs plus span costs, fixed costs and drop penalties.
    pub fn objective(&self) -> i64 {
        self.objective
    }

    /// Sets the objective value.
    pub fn set_objective(&mut self, objective: i64) {
        self.objective = objective;
    }

    /// Sum of arc costs across all routes.
    pub fn total_cost(&self) -> i64 {
        self.routes.iter().map(|r| r.cost()).sum()
    }

    /// Total number of nodes served across all routes.
    pub fn num_served(&self) -> usize {
        self.routes.iter().map(|r| r.len()).sum()
    }

    /// Names of the dimensions whose cumuls are recorded in each visit.
    pub fn dimension_names(&self) -> &[String] {
        &self.dimension_names
    }

    /// Position of a dimension in each visit's `cumuls`.
    pub fn dimension_position(&self, name: &str) -> Option<usize> {
        self.dimension_names.iter().position(|n| n == name)
    }

    /// Vehicle serving `node`, if any.
    pub fn vehicle_of(&self, node: usize) -> Option<usize> {
        self.routes
            .iter()
            .find(|r| r.customer_nodes().contains(&node))
            .map(|r| r.vehicle_id())
    }

    /// Search counters.
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// Replaces the search counters.
    pub fn set_statistics(&mut self, statistics: SearchStatistics) {
        self.statistics = statistics;
    }
}
