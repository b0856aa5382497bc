//! Two-phase solve over a fully configured problem.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use super::{SearchParameters, Termination};
use crate::constraints::ConstraintGraph;
use crate::error::{Result, RoutingError};
use crate::evaluation::{Assignment, RouteEvaluator};
use crate::local_search::SearchState;
use crate::models::{IndexManager, RoutingModel, SearchStatistics, Solution};

/// An immutable, ready-to-solve problem.
///
/// Each call to [`solve`](Self::solve) is independent: no state survives
/// between calls, so identical parameters and seed give identical results
/// for the deterministic metaheuristics.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_vrp::constraints::{ConstraintGraph, MatrixTransit};
/// use u_vrp::models::{IndexManager, RoutingModel};
/// use u_vrp::search::{SearchParameters, SearchSession};
///
/// let xs = [0.0, 3.0, 3.0, 0.0];
/// let ys = [0.0, 0.0, 4.0, 4.0];
/// let model = Arc::new(RoutingModel::from_coordinates(&xs, &ys, 1, 0).unwrap());
/// let manager = Arc::new(IndexManager::new(&model).unwrap());
/// let mut graph = ConstraintGraph::new(1);
/// let distance = graph.register_transit_callback(MatrixTransit::new(model.clone(), manager.clone()));
/// graph.set_arc_cost_evaluator_of_all_vehicles(distance).unwrap();
///
/// let session = SearchSession::new(model, manager, graph, SearchParameters::default()).unwrap();
/// let solution = session.solve().unwrap();
/// assert_eq!(solution.objective(), 14);
/// assert_eq!(solution.num_served(), 3);
/// ```
#[derive(Debug)]
pub struct SearchSession {
    model: Arc<RoutingModel>,
    manager: Arc<IndexManager>,
    constraints: ConstraintGraph,
    parameters: SearchParameters,
}

impl SearchSession {
    /// Bundles a configured problem.
    ///
    /// # Errors
    ///
    /// [`RoutingError::Configuration`] if the parts disagree on the fleet
    /// size or the parameters are out of range.
    pub fn new(
        model: Arc<RoutingModel>,
        manager: Arc<IndexManager>,
        constraints: ConstraintGraph,
        parameters: SearchParameters,
    ) -> Result<Self> {
        if manager.num_vehicles() != model.num_vehicles()
            || constraints.num_vehicles() != model.num_vehicles()
            || manager.num_nodes() != model.num_nodes()
        {
            return Err(RoutingError::config(
                "index manager and constraints were built for a different model",
            ));
        }
        parameters.validate()?;
        Ok(Self {
            model,
            manager,
            constraints,
            parameters,
        })
    }

    pub fn model(&self) -> &RoutingModel {
        &self.model
    }

    pub fn manager(&self) -> &IndexManager {
        &self.manager
    }

    pub fn constraints(&self) -> &ConstraintGraph {
        &self.constraints
    }

    pub fn parameters(&self) -> &SearchParameters {
        &self.parameters
    }

    /// Builds a first solution and improves it until the budget runs out.
    ///
    /// # Errors
    ///
    /// [`RoutingError::Infeasible`] when the first solution leaves a
    /// mandatory node unserved or breaks a hard constraint.
    /// [`RoutingError::Configuration`] when the selected strategy lacks what
    /// it needs.
    pub fn solve(&self) -> Result<Solution> {
        self.run(None)
    }

    /// Like [`solve`](Self::solve), but stops improving once `cancel` is set
    /// and returns the best solution found so far.
    pub fn solve_with_cancel(&self, cancel: &AtomicBool) -> Result<Solution> {
        self.run(Some(cancel))
    }

    fn run(&self, cancel: Option<&AtomicBool>) -> Result<Solution> {
        let solve_start = Instant::now();
        let params = &self.parameters;
        let evaluator = RouteEvaluator::new(&self.model, &self.manager, &self.constraints);
        let has_pairs = self
            .constraints
            .pairing()
            .is_some_and(|p| !p.pairs.is_empty());
        let strategy = params.first_solution_strategy.resolve(has_pairs);
        let metaheuristic = params.local_search_metaheuristic.resolve();

        info!(
            event = "solve_start",
            nodes = self.model.num_nodes(),
            vehicles = self.model.num_vehicles(),
            dimensions = self.constraints.dimensions().len(),
            pairs = self.constraints.pairing().map_or(0, |p| p.pairs.len()),
            strategy = strategy.name(),
            metaheuristic = metaheuristic.name(),
        );

        // Phase 1
        let phase_start = Instant::now();
        info!(
            event = "phase_start",
            phase = "construction",
            phase_index = 0,
            strategy = strategy.name(),
        );
        let built = strategy.build(
            &evaluator,
            Assignment::empty(self.model.num_vehicles(), evaluator.customers()),
        )?;
        let missing = evaluator.missing_mandatory(&built);
        let seed = if missing.is_empty() {
            SearchState::new(&evaluator, built)
        } else {
            None
        };
        let Some(seed) = seed else {
            warn!(
                event = "infeasible",
                strategy = strategy.name(),
                unassigned = missing.len(),
                "first solution violates hard constraints"
            );
            return Err(RoutingError::Infeasible);
        };
        let first_cost = seed.cost();
        info!(
            event = "phase_end",
            phase = "construction",
            phase_index = 0,
            duration_ms = phase_start.elapsed().as_millis() as u64,
            routed = seed.assignment().num_routed(),
            dropped = seed.assignment().unassigned.len(),
            cost = first_cost,
        );

        // Phase 2
        let mut termination = Termination::new(params.time_limit())
            .with_step_limit(params.step_limit)
            .with_unimproved_step_limit(params.unimproved_step_limit);
        if let Some(flag) = cancel {
            termination = termination.with_cancel(flag);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(params.random_seed);
        let mut improver = metaheuristic.create(params);
        info!(
            event = "phase_start",
            phase = "local_search",
            phase_index = 1,
            metaheuristic = improver.name(),
        );
        let best = improver.improve(&evaluator, seed, &mut termination, &mut rng);
        let duration = termination.elapsed();
        let steps_per_sec = if duration.as_millis() > 0 {
            termination.steps() * 1000 / duration.as_millis() as u64
        } else {
            0
        };
        info!(
            event = "phase_end",
            phase = "local_search",
            phase_index = 1,
            duration_ms = duration.as_millis() as u64,
            steps = termination.steps(),
            improvements = termination.improvements(),
            speed = steps_per_sec,
            cost = best.cost(),
        );
        debug_assert!(best.cost() <= first_cost);

        let time_limit_reached = termination.time_limit_reached();
        if time_limit_reached {
            warn!(
                event = "time_limit_reached",
                cost = best.cost(),
                "time limit expired; returning the best solution found so far"
            );
        }
        let cancelled = termination.cancelled();
        if cancelled {
            debug!(event = "cancelled", steps = termination.steps());
        }

        let mut solution = evaluator.build_solution(best.assignment());
        solution.set_statistics(SearchStatistics {
            first_solution_strategy: strategy.name().to_string(),
            metaheuristic: improver.name().to_string(),
            first_solution_cost: first_cost,
            steps: termination.steps(),
            improvements: termination.improvements(),
            elapsed: solve_start.elapsed(),
            time_limit_reached,
            cancelled,
        });
        info!(
            event = "solve_end",
            duration_ms = solve_start.elapsed().as_millis() as u64,
            objective = solution.objective(),
            vehicles_used = solution.num_used_vehicles(),
            unperformed = solution.num_unperformed(),
        );
        Ok(solution)
    }
}
