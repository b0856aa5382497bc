//! Constructive heuristics for building first solutions.
//!
//! - [`FirstSolutionStrategy`] — closed set of strategies, selected by name
//! - path and arc heuristics — extend routes one arc at a time
//! - Clarke-Wright savings (1964), O(n² log n)
//! - polar-angle sweep (Gillett & Miller, 1974), O(n log n)
//! - Christofides tour (1976) split across vehicles
//! - cheapest insertion in parallel, sequential and local variants
//!
//! Strategies that route single nodes leave pickup-delivery pairs and any
//! node they could not place to a final cheapest-insertion pass.

mod arc;
mod christofides;
mod clarke_wright;
mod insertion;
mod strategy;
mod sweep;

pub use strategy::FirstSolutionStrategy;

use tracing::warn;

use crate::error::{Result, RoutingError};
use crate::evaluation::{Assignment, RouteEvaluator};
use arc::PathRanking;
use insertion::Pricing;

impl FirstSolutionStrategy {
    /// Extends `assignment` into a first solution.
    ///
    /// `Automatic` is resolved first. Every strategy except `AllUnperformed`
    /// finishes with a cheapest-insertion pass over whatever is still
    /// unassigned. The result may still leave nodes unassigned or be
    /// infeasible; the caller decides what that means.
    ///
    /// # Errors
    ///
    /// `EvaluatorStrategy` without a registered first-solution evaluator is a
    /// [`RoutingError::Configuration`].
    pub fn build(self, evaluator: &RouteEvaluator<'_>, assignment: Assignment) -> Result<Assignment> {
        let has_pairs = evaluator
            .constraints()
            .pairing()
            .is_some_and(|p| !p.pairs.is_empty());
        let built = match self.resolve(has_pairs) {
            Self::AllUnperformed => return Ok(assignment),
            Self::Automatic | Self::PathCheapestArc => {
                arc::extend_paths(evaluator, assignment, PathRanking::CheapestArc)
            }
            Self::PathMostConstrainedArc => {
                arc::extend_paths(evaluator, assignment, PathRanking::MostConstrained)
            }
            Self::EvaluatorStrategy => {
                let handle = evaluator.constraints().first_solution_evaluator().ok_or_else(|| {
                    RoutingError::config("EVALUATOR_STRATEGY requires a first solution evaluator")
                })?;
                arc::extend_paths(evaluator, assignment, PathRanking::Evaluator(handle))
            }
            Self::FirstUnboundMinValue => {
                arc::extend_paths(evaluator, assignment, PathRanking::MinValue)
            }
            Self::GlobalCheapestArc => arc::global_cheapest_arc(evaluator, assignment),
            Self::LocalCheapestArc => arc::local_cheapest_arc(evaluator, assignment),
            Self::Savings => clarke_wright::clarke_wright_savings(evaluator, assignment),
            Self::Sweep => match sweep::sweep(evaluator, assignment.clone()) {
                Some(swept) => swept,
                None => {
                    warn!(
                        event = "strategy_fallback",
                        requested = "SWEEP",
                        used = "PATH_CHEAPEST_ARC",
                        "model has no coordinates"
                    );
                    arc::extend_paths(evaluator, assignment, PathRanking::CheapestArc)
                }
            },
            Self::Christofides => christofides::christofides(evaluator, assignment),
            Self::BestInsertion => {
                insertion::parallel_cheapest_insertion(evaluator, assignment, Pricing::Objective)
            }
            Self::ParallelCheapestInsertion => {
                insertion::parallel_cheapest_insertion(evaluator, assignment, Pricing::Arc)
            }
            Self::SequentialCheapestInsertion => {
                insertion::sequential_cheapest_insertion(evaluator, assignment)
            }
            Self::LocalCheapestInsertion => {
                insertion::local_cheapest_insertion(evaluator, assignment, Pricing::Arc)
            }
            Self::LocalCheapestCostInsertion => {
                insertion::local_cheapest_insertion(evaluator, assignment, Pricing::Objective)
            }
        };
        Ok(insertion::local_cheapest_insertion(evaluator, built, Pricing::Arc))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::constraints::{ConstraintGraph, MatrixTransit};
    use crate::distance::DistanceMatrix;
    use crate::models::{IndexManager, PickupDelivery, RoutingModel};

    pub(crate) struct Fixture {
        pub model: Arc<RoutingModel>,
        pub manager: Arc<IndexManager>,
        pub graph: ConstraintGraph,
    }

    impl Fixture {
        pub fn evaluator(&self) -> RouteEvaluator<'_> {
            RouteEvaluator::new(&self.model, &self.manager, &self.graph)
        }
    }

    fn with_distance(model: RoutingModel, cap: i64, pairs: &[PickupDelivery]) -> Fixture {
        let model = Arc::new(model);
        let manager = Arc::new(IndexManager::new(&model).expect("valid"));
        let mut graph = ConstraintGraph::new(model.num_vehicles());
        let h = graph.register_transit_callback(MatrixTransit::new(model.clone(), manager.clone()));
        graph.set_arc_cost_evaluator_of_all_vehicles(h).expect("binary");
        graph.add_dimension(h, 0, cap, true, "Distance").expect("new");
        if !pairs.is_empty() {
            graph
                .add_pickup_and_delivery_constraint(pairs, "Distance")
                .expect("known");
        }
        Fixture {
            model,
            manager,
            graph,
        }
    }

    /// Depot at the origin; nodes 1, 2 east, 3, 4 north and 5, 6 west,
    /// at distances 10 and 20.
    pub(crate) fn fixture(vehicles: usize, cap: i64, pairs: &[PickupDelivery]) -> Fixture {
        let xs = [0.0, 10.0, 20.0, 0.0, 0.0, -10.0, -20.0];
        let ys = [0.0, 0.0, 0.0, 10.0, 20.0, 0.0, 0.0];
        let mut model = RoutingModel::from_coordinates(&xs, &ys, vehicles, 0).expect("valid");
        model.set_pickup_deliveries(pairs.to_vec());
        with_distance(model, cap, pairs)
    }

    /// Four nodes given only as a matrix.
    pub(crate) fn matrix_fixture() -> Fixture {
        let matrix = DistanceMatrix::from_rows(&[
            vec![0.0, 5.0, 7.0, 4.0],
            vec![5.0, 0.0, 3.0, 6.0],
            vec![7.0, 3.0, 0.0, 5.0],
            vec![4.0, 6.0, 5.0, 0.0],
        ])
        .expect("valid");
        let model = RoutingModel::new(matrix, 1, 0).expect("valid");
        with_distance(model, 1000, &[])
    }

    #[test]
    fn test_every_strategy_routes_all() {
        let fx = fixture(3, 1000, &[PickupDelivery::new(4, 1)]);
        let ev = fx.evaluator();
        for strategy in FirstSolutionStrategy::ALL {
            if matches!(
                strategy,
                FirstSolutionStrategy::AllUnperformed | FirstSolutionStrategy::EvaluatorStrategy
            ) {
                continue;
            }
            let a = strategy
                .build(&ev, Assignment::empty(3, ev.customers()))
                .expect("configured");
            assert!(a.unassigned.is_empty(), "{strategy} left {:?}", a.unassigned);
            assert!(ev.evaluate(&a).is_some(), "{strategy} built an infeasible route");
            let (vp, pp) = a.locate(4).expect("pickup routed");
            let (vd, pd) = a.locate(1).expect("delivery routed");
            assert_eq!(vp, vd, "{strategy}");
            assert!(pp < pd, "{strategy}");
        }
    }

    #[test]
    fn test_all_unperformed_keeps_everything_out() {
        let fx = fixture(2, 1000, &[]);
        let ev = fx.evaluator();
        let a = FirstSolutionStrategy::AllUnperformed
            .build(&ev, Assignment::empty(2, ev.customers()))
            .expect("configured");
        assert_eq!(a.num_routed(), 0);
        assert_eq!(a.unassigned.len(), 6);
    }

    #[test]
    fn test_evaluator_strategy_needs_evaluator() {
        let mut fx = fixture(1, 1000, &[]);
        let err = FirstSolutionStrategy::EvaluatorStrategy
            .build(&fx.evaluator(), Assignment::empty(1, 1..7))
            .unwrap_err();
        assert!(matches!(err, RoutingError::Configuration(_)));

        // Prefer high node numbers.
        let h = fx
            .graph
            .register_transit_callback(|_: usize, to: usize| -(to as i64));
        fx.graph.set_first_solution_evaluator(h).expect("binary");
        let ev = fx.evaluator();
        let a = FirstSolutionStrategy::EvaluatorStrategy
            .build(&ev, Assignment::empty(1, ev.customers()))
            .expect("configured");
        assert_eq!(a.routes[0], vec![6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_sweep_falls_back_without_coordinates() {
        let fx = matrix_fixture();
        let ev = fx.evaluator();
        let swept = FirstSolutionStrategy::Sweep
            .build(&ev, Assignment::empty(1, ev.customers()))
            .expect("configured");
        let path = FirstSolutionStrategy::PathCheapestArc
            .build(&ev, Assignment::empty(1, ev.customers()))
            .expect("configured");
        assert_eq!(swept, path);
        assert_eq!(path.routes[0], vec![3, 2, 1]);
    }

    #[test]
    fn test_infeasible_nodes_stay_unassigned() {
        // 20 out and 20 back exceeds a cap of 30 for nodes 2, 4 and 6.
        let fx = fixture(6, 30, &[]);
        let ev = fx.evaluator();
        let a = FirstSolutionStrategy::Automatic
            .build(&ev, Assignment::empty(6, ev.customers()))
            .expect("configured");
        let mut left = a.unassigned.clone();
        left.sort_unstable();
        assert_eq!(left, vec![2, 4, 6]);
    }
}
