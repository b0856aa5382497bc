//! Staged configuration façade.
//!
//! [`RoutingBuilder`] accepts configuration calls in the order a routing
//! model is normally put together and rejects calls made before their
//! prerequisite stage with [`RoutingError::Sequence`]:
//!
//! ```text
//! Unconfigured -> ModelLoaded -> IndexSpaceBuilt -> ConstraintsRegistered
//!              -> ParametersSet -> Solving -> Solved | Infeasible
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::{SearchParameters, SearchSession};
use crate::constraints::{
    CallbackHandle, ConstraintGraph, DemandTransit, MatrixTransit, TransitCallback,
    UnaryTransitCallback,
};
use crate::constructive::FirstSolutionStrategy;
use crate::distance::DistanceMatrix;
use crate::error::{Result, RoutingError};
use crate::metaheuristic::LocalSearchMetaheuristic;
use crate::models::{IndexManager, PickupDelivery, RoutingModel, Solution};

/// Configuration stage of a [`RoutingBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Unconfigured,
    ModelLoaded,
    IndexSpaceBuilt,
    ConstraintsRegistered,
    ParametersSet,
    Solving,
    Solved,
    Infeasible,
}

use Stage::*;

/// Step-by-step routing configuration ending in a solve.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_vrp::search::{RoutingBuilder, Stage};
///
/// let matrix = vec![
///     vec![0.0, 4.0, 6.0],
///     vec![4.0, 0.0, 3.0],
///     vec![6.0, 3.0, 0.0],
/// ];
/// let mut b = RoutingBuilder::new();
/// assert!(b.create_index_manager().is_err());
///
/// b.init_model(&matrix, 1, 0).unwrap();
/// b.create_index_manager().unwrap();
/// let distance = b.register_transit_callback().unwrap();
/// b.set_arc_cost_evaluator_of_all_vehicles(distance).unwrap();
/// b.add_dimension(distance, 0, 100, true, "Distance").unwrap();
/// b.create_default_search_parameters().unwrap();
/// b.set_first_solution_strategy("PATH_CHEAPEST_ARC").unwrap();
/// b.set_time_limit(Duration::from_secs(1)).unwrap();
///
/// let solution = b.solve().unwrap();
/// assert_eq!(b.stage(), Stage::Solved);
/// assert_eq!(solution.objective(), 13);
/// ```
#[derive(Debug)]
pub struct RoutingBuilder {
    stage: Stage,
    model: Option<Arc<RoutingModel>>,
    manager: Option<Arc<IndexManager>>,
    graph: Option<ConstraintGraph>,
    parameters: Option<SearchParameters>,
}

impl Default for RoutingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingBuilder {
    pub fn new() -> Self {
        Self {
            stage: Unconfigured,
            model: None,
            manager: None,
            graph: None,
            parameters: None,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn require(&self, operation: &'static str, allowed: &[Stage]) -> Result<()> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(RoutingError::Sequence {
                operation,
                stage: self.stage,
            })
        }
    }

    fn sequence(&self, operation: &'static str) -> RoutingError {
        RoutingError::Sequence {
            operation,
            stage: self.stage,
        }
    }

    fn load(&mut self, model: RoutingModel) {
        self.model = Some(Arc::new(model));
        self.manager = None;
        self.graph = None;
        self.parameters = None;
        self.stage = ModelLoaded;
    }

    fn model_mut(&mut self, operation: &'static str) -> Result<&mut RoutingModel> {
        self.require(operation, &[ModelLoaded])?;
        let stage = self.stage;
        self.model
            .as_mut()
            .map(Arc::make_mut)
            .ok_or(RoutingError::Sequence { operation, stage })
    }

    fn graph_mut(&mut self, operation: &'static str) -> Result<&mut ConstraintGraph> {
        self.require(operation, &[IndexSpaceBuilt, ConstraintsRegistered])?;
        let stage = self.stage;
        self.graph
            .as_mut()
            .ok_or(RoutingError::Sequence { operation, stage })
    }

    fn parameters_mut(&mut self, operation: &'static str) -> Result<&mut SearchParameters> {
        self.require(operation, &[ParametersSet, Solved, Infeasible])?;
        self.stage = ParametersSet;
        let stage = self.stage;
        self.parameters
            .as_mut()
            .ok_or(RoutingError::Sequence { operation, stage })
    }

    /// Sets the base problem from a distance matrix.
    ///
    /// Allowed before the index space is built; replaces any earlier model.
    pub fn init_model(&mut self, matrix: &[Vec<f64>], num_vehicles: usize, depot: usize) -> Result<()> {
        self.require("init_model", &[Unconfigured, ModelLoaded])?;
        let matrix = DistanceMatrix::from_rows(matrix)?;
        self.load(RoutingModel::new(matrix, num_vehicles, depot)?);
        Ok(())
    }

    /// Sets the base problem from point coordinates, with Euclidean distances.
    pub fn init_model_from_coordinates(
        &mut self,
        xs: &[f64],
        ys: &[f64],
        num_vehicles: usize,
        depot: usize,
    ) -> Result<()> {
        self.require("init_model_from_coordinates", &[Unconfigured, ModelLoaded])?;
        self.load(RoutingModel::from_coordinates(xs, ys, num_vehicles, depot)?);
        Ok(())
    }

    pub fn add_vehicle_capacities(&mut self, capacities: Vec<i64>) -> Result<()> {
        self.model_mut("add_vehicle_capacities")?
            .set_vehicle_capacities(capacities);
        Ok(())
    }

    pub fn add_pickup_deliveries(&mut self, pairs: &[(usize, usize)]) -> Result<()> {
        let model = self.model_mut("add_pickup_deliveries")?;
        for &(pickup, delivery) in pairs {
            model.add_pickup_delivery(pickup, delivery);
        }
        Ok(())
    }

    /// Makes `node` optional at the given drop penalty.
    pub fn add_disjunction(&mut self, node: usize, penalty: i64) -> Result<()> {
        self.model_mut("add_disjunction")?.add_disjunction(node, penalty);
        Ok(())
    }

    /// Validates the model and builds the index space.
    pub fn create_index_manager(&mut self) -> Result<()> {
        self.require("create_index_manager", &[ModelLoaded])?;
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| self.sequence("create_index_manager"))?;
        let manager = IndexManager::new(model)?;
        info!(
            event = "index_space_built",
            nodes = manager.num_nodes(),
            vehicles = manager.num_vehicles(),
            indices = manager.num_indices(),
        );
        self.graph = Some(ConstraintGraph::new(model.num_vehicles()));
        self.manager = Some(Arc::new(manager));
        self.stage = IndexSpaceBuilt;
        Ok(())
    }

    pub fn model(&self) -> Option<&RoutingModel> {
        self.model.as_deref()
    }

    pub fn manager(&self) -> Option<&IndexManager> {
        self.manager.as_deref()
    }

    /// Registers the distance-matrix arc callback.
    pub fn register_transit_callback(&mut self) -> Result<CallbackHandle> {
        let operation = "register_transit_callback";
        self.require(operation, &[IndexSpaceBuilt, ConstraintsRegistered])?;
        let (model, manager) = match (&self.model, &self.manager) {
            (Some(m), Some(i)) => (m.clone(), i.clone()),
            _ => return Err(self.sequence(operation)),
        };
        Ok(self
            .graph_mut(operation)?
            .register_transit_callback(MatrixTransit::new(model, manager)))
    }

    /// Registers a per-node demand callback; `demands` is indexed by node.
    pub fn register_demand_callback(&mut self, demands: Vec<i64>) -> Result<CallbackHandle> {
        let operation = "register_demand_callback";
        self.require(operation, &[IndexSpaceBuilt, ConstraintsRegistered])?;
        let manager = self
            .manager
            .clone()
            .ok_or_else(|| self.sequence(operation))?;
        let demand = DemandTransit::new(demands, manager)?;
        Ok(self.graph_mut(operation)?.register_unary_transit_callback(demand))
    }

    /// Registers a custom arc callback over route indices.
    pub fn register_callback<C: TransitCallback + 'static>(&mut self, callback: C) -> Result<CallbackHandle> {
        Ok(self
            .graph_mut("register_callback")?
            .register_transit_callback(callback))
    }

    /// Registers a custom departure callback over route indices.
    pub fn register_unary_callback<C: UnaryTransitCallback + 'static>(
        &mut self,
        callback: C,
    ) -> Result<CallbackHandle> {
        Ok(self
            .graph_mut("register_unary_callback")?
            .register_unary_transit_callback(callback))
    }

    pub fn set_arc_cost_evaluator_of_all_vehicles(&mut self, handle: CallbackHandle) -> Result<()> {
        self.graph_mut("set_arc_cost_evaluator_of_all_vehicles")?
            .set_arc_cost_evaluator_of_all_vehicles(handle)?;
        self.stage = ConstraintsRegistered;
        Ok(())
    }

    pub fn add_dimension(
        &mut self,
        handle: CallbackHandle,
        slack_max: i64,
        capacity: i64,
        fix_start_cumul_to_zero: bool,
        name: &str,
    ) -> Result<()> {
        self.graph_mut("add_dimension")?
            .add_dimension(handle, slack_max, capacity, fix_start_cumul_to_zero, name)?;
        self.stage = ConstraintsRegistered;
        Ok(())
    }

    /// Adds a dimension bounded by the capacities given to
    /// [`add_vehicle_capacities`](Self::add_vehicle_capacities), or by
    /// `capacities` when that is not empty.
    pub fn add_dimension_with_vehicle_capacity(
        &mut self,
        handle: CallbackHandle,
        slack_max: i64,
        capacities: Vec<i64>,
        fix_start_cumul_to_zero: bool,
        name: &str,
    ) -> Result<()> {
        let operation = "add_dimension_with_vehicle_capacity";
        let capacities = if capacities.is_empty() {
            self.model
                .as_ref()
                .and_then(|m| m.vehicle_capacities())
                .map(<[i64]>::to_vec)
                .ok_or_else(|| RoutingError::config("no vehicle capacities configured"))?
        } else {
            capacities
        };
        self.graph_mut(operation)?.add_dimension_with_vehicle_capacity(
            handle,
            slack_max,
            capacities,
            fix_start_cumul_to_zero,
            name,
        )?;
        self.stage = ConstraintsRegistered;
        Ok(())
    }

    pub fn set_global_span_cost_coefficient(&mut self, dimension: &str, coefficient: i64) -> Result<()> {
        self.require("set_global_span_cost_coefficient", &[ConstraintsRegistered])?;
        self.graph_mut("set_global_span_cost_coefficient")?
            .set_global_span_cost_coefficient(dimension, coefficient)
    }

    /// Couples every pickup-delivery pair of the model on `dimension`.
    pub fn add_pickup_and_delivery_constraint(&mut self, dimension: &str) -> Result<()> {
        let operation = "add_pickup_and_delivery_constraint";
        self.require(operation, &[ConstraintsRegistered])?;
        let pairs: Vec<PickupDelivery> = self
            .model
            .as_ref()
            .map(|m| m.pickup_deliveries().to_vec())
            .unwrap_or_default();
        self.graph_mut(operation)?
            .add_pickup_and_delivery_constraint(&pairs, dimension)
    }

    /// Direct access to the constraint graph for the less common settings.
    pub fn constraints_mut(&mut self) -> Result<&mut ConstraintGraph> {
        self.graph_mut("constraints_mut")
    }

    /// Starts from default parameters.
    pub fn create_default_search_parameters(&mut self) -> Result<()> {
        self.require(
            "create_default_search_parameters",
            &[ConstraintsRegistered, ParametersSet, Solved, Infeasible],
        )?;
        self.parameters = Some(SearchParameters::default());
        self.stage = ParametersSet;
        Ok(())
    }

    /// Replaces the parameters wholesale.
    pub fn set_search_parameters(&mut self, parameters: SearchParameters) -> Result<()> {
        self.require(
            "set_search_parameters",
            &[ConstraintsRegistered, ParametersSet, Solved, Infeasible],
        )?;
        parameters.validate()?;
        self.parameters = Some(parameters);
        self.stage = ParametersSet;
        Ok(())
    }

    pub fn search_parameters(&self) -> Option<&SearchParameters> {
        self.parameters.as_ref()
    }

    /// Selects Phase 1 by name.
    ///
    /// An unknown name keeps the current strategy and logs a warning, or
    /// fails when strict names are enabled.
    pub fn set_first_solution_strategy(&mut self, name: &str) -> Result<()> {
        let params = self.parameters_mut("set_first_solution_strategy")?;
        match name.parse::<FirstSolutionStrategy>() {
            Ok(strategy) => params.first_solution_strategy = strategy,
            Err(err) if params.strict_names => return Err(err),
            Err(_) => warn!(
                event = "unknown_name",
                setting = "first_solution_strategy",
                name,
                kept = params.first_solution_strategy.name(),
            ),
        }
        Ok(())
    }

    /// Selects Phase 2 by name, with the same leniency rule as
    /// [`set_first_solution_strategy`](Self::set_first_solution_strategy).
    pub fn set_local_search_metaheuristic(&mut self, name: &str) -> Result<()> {
        let params = self.parameters_mut("set_local_search_metaheuristic")?;
        match name.parse::<LocalSearchMetaheuristic>() {
            Ok(m) => params.local_search_metaheuristic = m,
            Err(err) if params.strict_names => return Err(err),
            Err(_) => warn!(
                event = "unknown_name",
                setting = "local_search_metaheuristic",
                name,
                kept = params.local_search_metaheuristic.name(),
            ),
        }
        Ok(())
    }

    pub fn set_time_limit(&mut self, limit: Duration) -> Result<()> {
        self.parameters_mut("set_time_limit")?.time_limit = Some(limit.as_secs_f64());
        Ok(())
    }

    pub fn set_strict_names(&mut self, strict: bool) -> Result<()> {
        self.parameters_mut("set_strict_names")?.strict_names = strict;
        Ok(())
    }

    /// Freezes the configuration into a session without solving.
    pub fn build_session(&self) -> Result<SearchSession> {
        self.require("build_session", &[ParametersSet, Solved, Infeasible])?;
        match (&self.model, &self.manager, &self.graph, &self.parameters) {
            (Some(model), Some(manager), Some(graph), Some(params)) => SearchSession::new(
                model.clone(),
                manager.clone(),
                graph.clone(),
                params.clone(),
            ),
            _ => Err(self.sequence("build_session")),
        }
    }

    /// Runs both phases. Each call produces a fresh solution.
    ///
    /// # Errors
    ///
    /// [`RoutingError::Infeasible`] moves the builder to [`Stage::Infeasible`];
    /// parameters can still be changed and the solve retried.
    pub fn solve(&mut self) -> Result<Solution> {
        let session = self.build_session().map_err(|err| match err {
            RoutingError::Sequence { .. } => self.sequence("solve"),
            other => other,
        })?;
        self.stage = Solving;
        match session.solve() {
            Ok(solution) => {
                self.stage = Solved;
                Ok(solution)
            }
            Err(err) => {
                self.stage = if err.is_infeasible() { Infeasible } else { ParametersSet };
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> RoutingBuilder {
        let mut b = RoutingBuilder::new();
        b.init_model_from_coordinates(&[0.0, 10.0, 10.0, 0.0], &[0.0, 0.0, 10.0, 10.0], 2, 0)
            .expect("valid");
        b
    }

    fn configured() -> RoutingBuilder {
        let mut b = square();
        b.create_index_manager().expect("valid");
        let h = b.register_transit_callback().expect("stage");
        b.set_arc_cost_evaluator_of_all_vehicles(h).expect("binary");
        b.add_dimension(h, 0, 1000, true, "Distance").expect("new");
        b.create_default_search_parameters().expect("stage");
        b
    }

    #[test]
    fn test_out_of_order_calls() {
        let mut b = RoutingBuilder::new();
        let err = b.register_transit_callback().unwrap_err();
        assert!(matches!(
            err,
            RoutingError::Sequence {
                operation: "register_transit_callback",
                stage: Stage::Unconfigured
            }
        ));

        let mut b = square();
        assert!(b.set_first_solution_strategy("SAVINGS").is_err());
        assert!(matches!(b.solve().unwrap_err(), RoutingError::Sequence { operation: "solve", .. }));
        b.create_index_manager().expect("valid");
        assert!(b.add_vehicle_capacities(vec![1, 1]).is_err());
        assert!(b.create_default_search_parameters().is_err());
    }

    #[test]
    fn test_lenient_unknown_name_keeps_previous() {
        let mut b = configured();
        b.set_first_solution_strategy("SAVINGS").expect("known");
        b.set_first_solution_strategy("FASTEST_POSSIBLE").expect("lenient");
        assert_eq!(
            b.search_parameters().map(|p| p.first_solution_strategy),
            Some(FirstSolutionStrategy::Savings)
        );
        b.set_local_search_metaheuristic("ANNEAL").expect("lenient");
        assert_eq!(
            b.search_parameters().map(|p| p.local_search_metaheuristic),
            Some(LocalSearchMetaheuristic::Automatic)
        );
    }

    #[test]
    fn test_strict_unknown_name_fails() {
        let mut b = configured();
        b.set_strict_names(true).expect("stage");
        let err = b.set_local_search_metaheuristic("ANNEAL").unwrap_err();
        assert!(matches!(err, RoutingError::Configuration(_)));
        assert!(b.set_local_search_metaheuristic("TABU_SEARCH").is_ok());
    }

    #[test]
    fn test_solve_and_resolve() {
        let mut b = configured();
        let first = b.solve().expect("feasible");
        assert_eq!(b.stage(), Stage::Solved);
        assert_eq!(first.num_served(), 3);
        b.set_local_search_metaheuristic("GENERIC_TABU_SEARCH").expect("known");
        assert_eq!(b.stage(), Stage::ParametersSet);
        let second = b.solve().expect("feasible");
        assert!(second.objective() <= second.statistics().first_solution_cost);
    }

    #[test]
    fn test_infeasible_stage() {
        let mut b = square();
        b.add_vehicle_capacities(vec![1, 1]).expect("stage");
        b.create_index_manager().expect("valid");
        let demand = b.register_demand_callback(vec![0, 2, 2, 2]).expect("sized");
        b.add_dimension_with_vehicle_capacity(demand, 0, Vec::new(), true, "Load")
            .expect("capacities");
        b.create_default_search_parameters().expect("stage");
        assert!(b.solve().unwrap_err().is_infeasible());
        assert_eq!(b.stage(), Stage::Infeasible);
    }

    #[test]
    fn test_capacity_length_checked_at_index_space() {
        let mut b = square();
        b.add_vehicle_capacities(vec![5]).expect("stage");
        let err = b.create_index_manager().unwrap_err();
        assert!(matches!(err, RoutingError::Configuration(_)));
        assert_eq!(b.stage(), Stage::ModelLoaded);
    }

    #[test]
    fn test_pickup_delivery_through_builder() {
        let mut b = RoutingBuilder::new();
        b.init_model_from_coordinates(
            &[0.0, 10.0, 20.0, 30.0, -10.0],
            &[0.0, 0.0, 0.0, 0.0, 0.0],
            2,
            0,
        )
        .expect("valid");
        b.add_pickup_deliveries(&[(3, 1)]).expect("stage");
        b.create_index_manager().expect("valid");
        let h = b.register_transit_callback().expect("stage");
        b.set_arc_cost_evaluator_of_all_vehicles(h).expect("binary");
        b.add_dimension(h, 0, 3000, true, "Distance").expect("new");
        b.add_pickup_and_delivery_constraint("Distance").expect("known");
        b.create_default_search_parameters().expect("stage");
        let solution = b.solve().expect("feasible");
        let v = solution.vehicle_of(3).expect("served");
        assert_eq!(solution.vehicle_of(1), Some(v));
        let nodes = solution.route(v).expect("route").customer_nodes();
        let p = nodes.iter().position(|&n| n == 3).expect("pickup");
        let d = nodes.iter().position(|&n| n == 1).expect("delivery");
        assert!(p < d);
    }
}
