//! First-solution strategy selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RoutingError;

/// Constructive heuristic used to build the first solution.
///
/// Names follow the usual routing-engine spelling and parse case-sensitively.
///
/// # Examples
///
/// ```
/// use u_vrp::constructive::FirstSolutionStrategy;
///
/// let s: FirstSolutionStrategy = "SAVINGS".parse().unwrap();
/// assert_eq!(s, FirstSolutionStrategy::Savings);
/// assert_eq!(s.name(), "SAVINGS");
/// assert!("savings".parse::<FirstSolutionStrategy>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FirstSolutionStrategy {
    /// Picks a strategy from the shape of the problem.
    #[default]
    Automatic,
    /// Extends each route with the cheapest arc from its last node.
    PathCheapestArc,
    /// Extends each route with the arc that uses most of a dimension's capacity.
    PathMostConstrainedArc,
    /// Extends each route with the arc ranked best by the registered evaluator.
    EvaluatorStrategy,
    /// Clarke-Wright savings.
    Savings,
    /// Angular sweep around the depot.
    Sweep,
    /// Christofides tour split across vehicles.
    Christofides,
    /// Leaves every node unperformed.
    AllUnperformed,
    /// Cheapest insertion priced on the full objective.
    BestInsertion,
    /// Cheapest insertion over all routes at once.
    ParallelCheapestInsertion,
    /// Cheapest insertion filling one route at a time.
    SequentialCheapestInsertion,
    /// Inserts nodes in order, each at its cheapest position.
    LocalCheapestInsertion,
    /// Inserts nodes in order, each where the objective grows least.
    LocalCheapestCostInsertion,
    /// Repeatedly appends the globally cheapest arc out of any route end.
    GlobalCheapestArc,
    /// Appends each node, in order, behind the route end it is cheapest to reach from.
    LocalCheapestArc,
    /// Extends each route with the lowest-numbered feasible node.
    FirstUnboundMinValue,
}

impl FirstSolutionStrategy {
    /// Every strategy, in lookup-table order.
    pub const ALL: [Self; 16] = [
        Self::Automatic,
        Self::PathCheapestArc,
        Self::PathMostConstrainedArc,
        Self::EvaluatorStrategy,
        Self::Savings,
        Self::Sweep,
        Self::Christofides,
        Self::AllUnperformed,
        Self::BestInsertion,
        Self::ParallelCheapestInsertion,
        Self::SequentialCheapestInsertion,
        Self::LocalCheapestInsertion,
        Self::LocalCheapestCostInsertion,
        Self::GlobalCheapestArc,
        Self::LocalCheapestArc,
        Self::FirstUnboundMinValue,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Automatic => "AUTOMATIC",
            Self::PathCheapestArc => "PATH_CHEAPEST_ARC",
            Self::PathMostConstrainedArc => "PATH_MOST_CONSTRAINED_ARC",
            Self::EvaluatorStrategy => "EVALUATOR_STRATEGY",
            Self::Savings => "SAVINGS",
            Self::Sweep => "SWEEP",
            Self::Christofides => "CHRISTOFIDES",
            Self::AllUnperformed => "ALL_UNPERFORMED",
            Self::BestInsertion => "BEST_INSERTION",
            Self::ParallelCheapestInsertion => "PARALLEL_CHEAPEST_INSERTION",
            Self::SequentialCheapestInsertion => "SEQUENTIAL_CHEAPEST_INSERTION",
            Self::LocalCheapestInsertion => "LOCAL_CHEAPEST_INSERTION",
            Self::LocalCheapestCostInsertion => "LOCAL_CHEAPEST_COST_INSERTION",
            Self::GlobalCheapestArc => "GLOBAL_CHEAPEST_ARC",
            Self::LocalCheapestArc => "LOCAL_CHEAPEST_ARC",
            Self::FirstUnboundMinValue => "FIRST_UNBOUND_MIN_VALUE",
        }
    }

    /// Replaces `Automatic` with a concrete strategy.
    ///
    /// Pickup-delivery problems need pairs inserted as units, so they get
    /// parallel cheapest insertion; everything else gets path cheapest arc.
    pub fn resolve(self, has_pairs: bool) -> Self {
        match self {
            Self::Automatic if has_pairs => Self::ParallelCheapestInsertion,
            Self::Automatic => Self::PathCheapestArc,
            other => other,
        }
    }
}

impl FromStr for FirstSolutionStrategy {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| RoutingError::config(format!("unknown first solution strategy `{s}`")))
    }
}

impl fmt::Display for FirstSolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
