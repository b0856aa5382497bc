//! Registry of transit callbacks, dimensions and pairing constraints.

use std::sync::Arc;

use tracing::debug;

use super::callback::Transit;
use super::{CallbackHandle, Capacity, Dimension, TransitCallback, UnaryTransitCallback};
use crate::error::{Result, RoutingError};
use crate::models::PickupDelivery;

/// Pickup-delivery pairs enforced on a dimension.
#[derive(Debug, Clone)]
pub struct PairingConstraint {
    /// Dimension on which `cumul(pickup) <= cumul(delivery)` must hold.
    pub dimension: usize,
    /// Coupled nodes.
    pub pairs: Vec<PickupDelivery>,
}

/// Everything the search checks and prices besides the raw model data.
///
/// Callbacks are stored as owned trait objects and evaluated on demand; no
/// transit table is ever precomputed.
///
/// # Examples
///
/// ```
/// use u_vrp::constraints::ConstraintGraph;
///
/// let mut graph = ConstraintGraph::new(2);
/// let distance = graph.register_transit_callback(|from: usize, to: usize| (from as i64 - to as i64).abs());
/// graph.set_arc_cost_evaluator_of_all_vehicles(distance).unwrap();
/// graph.add_dimension(distance, 0, 3000, true, "Distance").unwrap();
/// graph.set_global_span_cost_coefficient("Distance", 100).unwrap();
/// assert!(graph.add_dimension(distance, 0, 10, true, "Distance").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ConstraintGraph {
    num_vehicles: usize,
    callbacks: Vec<Transit>,
    dimensions: Vec<Dimension>,
    arc_cost_evaluators: Vec<Option<CallbackHandle>>,
    fixed_costs: Vec<i64>,
    pairing: Option<PairingConstraint>,
    first_solution_evaluator: Option<CallbackHandle>,
}

impl ConstraintGraph {
    /// Creates an empty graph for a fleet of `num_vehicles`.
    pub fn new(num_vehicles: usize) -> Self {
        Self {
            num_vehicles,
            callbacks: Vec::new(),
            dimensions: Vec::new(),
            arc_cost_evaluators: vec![None; num_vehicles],
            fixed_costs: vec![0; num_vehicles],
            pairing: None,
            first_solution_evaluator: None,
        }
    }

    /// Registers an arc callback over route indices.
    pub fn register_transit_callback<C>(&mut self, callback: C) -> CallbackHandle
    where
        C: TransitCallback + 'static,
    {
        self.callbacks.push(Transit::Binary(Arc::new(callback)));
        CallbackHandle(self.callbacks.len() - 1)
    }

    /// Registers a callback depending only on the index being left.
    pub fn register_unary_transit_callback<C>(&mut self, callback: C) -> CallbackHandle
    where
        C: UnaryTransitCallback + 'static,
    {
        self.callbacks.push(Transit::Unary(Arc::new(callback)));
        CallbackHandle(self.callbacks.len() - 1)
    }

    fn check_handle(&self, handle: CallbackHandle) -> Result<&Transit> {
        self.callbacks
            .get(handle.0)
            .ok_or(RoutingError::UnknownCallback(handle.0))
    }

    fn check_arc_evaluator(&self, handle: CallbackHandle) -> Result<()> {
        if self.check_handle(handle)?.is_unary() {
            return Err(RoutingError::CallbackArity(handle.0));
        }
        Ok(())
    }

    /// Uses `handle` as the arc cost of every vehicle.
    pub fn set_arc_cost_evaluator_of_all_vehicles(&mut self, handle: CallbackHandle) -> Result<()> {
        self.check_arc_evaluator(handle)?;
        self.arc_cost_evaluators.fill(Some(handle));
        Ok(())
    }

    /// Overrides the arc cost of a single vehicle.
    pub fn set_arc_cost_evaluator_of_vehicle(
        &mut self,
        handle: CallbackHandle,
        vehicle: usize,
    ) -> Result<()> {
        self.check_arc_evaluator(handle)?;
        let slot = self.arc_cost_evaluators.get_mut(vehicle).ok_or_else(|| {
            RoutingError::config(format!("vehicle {vehicle} does not exist"))
        })?;
        *slot = Some(handle);
        Ok(())
    }

    /// Cost added for every vehicle that serves at least one node.
    pub fn set_fixed_cost_of_all_vehicles(&mut self, cost: i64) -> Result<()> {
        if cost < 0 {
            return Err(RoutingError::config("fixed vehicle cost must be non-negative"));
        }
        self.fixed_costs.fill(cost);
        Ok(())
    }

    /// Arc evaluator used by `EVALUATOR_STRATEGY`.
    pub fn set_first_solution_evaluator(&mut self, handle: CallbackHandle) -> Result<()> {
        self.check_arc_evaluator(handle)?;
        self.first_solution_evaluator = Some(handle);
        Ok(())
    }

    /// Registers a dimension with one capacity shared by all vehicles.
    pub fn add_dimension(
        &mut self,
        handle: CallbackHandle,
        slack_max: i64,
        capacity: i64,
        fix_start_cumul_to_zero: bool,
        name: &str,
    ) -> Result<()> {
        self.push_dimension(
            handle,
            slack_max,
            Capacity::Uniform(capacity),
            fix_start_cumul_to_zero,
            name,
        )
    }

    /// Registers a dimension with one capacity per vehicle.
    pub fn add_dimension_with_vehicle_capacity(
        &mut self,
        handle: CallbackHandle,
        slack_max: i64,
        capacities: Vec<i64>,
        fix_start_cumul_to_zero: bool,
        name: &str,
    ) -> Result<()> {
        if capacities.len() != self.num_vehicles {
            return Err(RoutingError::config(format!(
                "dimension `{name}` has {} capacities for {} vehicles",
                capacities.len(),
                self.num_vehicles
            )));
        }
        self.push_dimension(
            handle,
            slack_max,
            Capacity::PerVehicle(capacities),
            fix_start_cumul_to_zero,
            name,
        )
    }

    fn push_dimension(
        &mut self,
        handle: CallbackHandle,
        slack_max: i64,
        capacity: Capacity,
        fix_start_cumul_to_zero: bool,
        name: &str,
    ) -> Result<()> {
        self.check_handle(handle)?;
        if self.dimension(name).is_some() {
            return Err(RoutingError::DuplicateDimension(name.to_string()));
        }
        if slack_max < 0 {
            return Err(RoutingError::config(format!(
                "dimension `{name}` has a negative slack"
            )));
        }
        let negative = match &capacity {
            Capacity::Uniform(c) => *c < 0,
            Capacity::PerVehicle(caps) => caps.iter().any(|&c| c < 0),
        };
        if negative {
            return Err(RoutingError::config(format!(
                "dimension `{name}` has a negative capacity"
            )));
        }
        debug!(dimension = name, slack_max, "dimension registered");
        self.dimensions.push(Dimension::new(
            name.to_string(),
            handle,
            slack_max,
            capacity,
            fix_start_cumul_to_zero,
        ));
        Ok(())
    }

    /// Sets the global span cost coefficient of a dimension.
    pub fn set_global_span_cost_coefficient(&mut self, name: &str, coefficient: i64) -> Result<()> {
        if coefficient < 0 {
            return Err(RoutingError::config("span cost coefficient must be non-negative"));
        }
        self.dimension_mut(name)?
            .set_global_span_cost_coefficient(coefficient);
        Ok(())
    }

    /// Sets the per-route span cost coefficient of a dimension for every vehicle.
    pub fn set_span_cost_coefficient_for_all_vehicles(
        &mut self,
        name: &str,
        coefficient: i64,
    ) -> Result<()> {
        if coefficient < 0 {
            return Err(RoutingError::config("span cost coefficient must be non-negative"));
        }
        self.dimension_mut(name)?.set_span_cost_coefficient(coefficient);
        Ok(())
    }

    /// Restricts the cumul of dimension `name` at route index `index`.
    pub fn set_cumul_range(&mut self, name: &str, index: usize, min: i64, max: i64) -> Result<()> {
        if min > max {
            return Err(RoutingError::config(format!(
                "empty cumul range [{min}, {max}] on dimension `{name}`"
            )));
        }
        self.dimension_mut(name)?.set_cumul_range(index, min, max);
        Ok(())
    }

    /// Couples every pair on one vehicle, pickup first, with
    /// `cumul(pickup) <= cumul(delivery)` on dimension `name`.
    pub fn add_pickup_and_delivery_constraint(
        &mut self,
        pairs: &[PickupDelivery],
        name: &str,
    ) -> Result<()> {
        let dimension = self
            .dimension_position(name)
            .ok_or_else(|| RoutingError::UnknownDimension(name.to_string()))?;
        debug!(dimension = name, pairs = pairs.len(), "pickup and delivery coupled");
        self.pairing = Some(PairingConstraint {
            dimension,
            pairs: pairs.to_vec(),
        });
        Ok(())
    }

    /// Number of vehicles.
    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    /// Number of registered callbacks.
    pub fn num_callbacks(&self) -> usize {
        self.callbacks.len()
    }

    /// Evaluates a registered callback on the arc `from -> to`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` was not issued by this graph.
    pub fn evaluate(&self, handle: CallbackHandle, from: usize, to: usize) -> i64 {
        self.callbacks[handle.0].evaluate(from, to)
    }

    /// Arc cost of `from -> to` for `vehicle`; zero when no evaluator is set.
    pub fn arc_cost(&self, vehicle: usize, from: usize, to: usize) -> i64 {
        self.arc_cost_evaluators[vehicle].map_or(0, |h| self.evaluate(h, from, to))
    }

    /// Returns `true` once some vehicle has an arc cost evaluator.
    pub fn has_arc_costs(&self) -> bool {
        self.arc_cost_evaluators.iter().any(Option::is_some)
    }

    /// Fixed cost of `vehicle`.
    pub fn fixed_cost(&self, vehicle: usize) -> i64 {
        self.fixed_costs[vehicle]
    }

    /// Evaluator for `EVALUATOR_STRATEGY`.
    pub fn first_solution_evaluator(&self) -> Option<CallbackHandle> {
        self.first_solution_evaluator
    }

    /// Registered dimensions, in registration order.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Dimension by name.
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name() == name)
    }

    /// Registration position of a dimension.
    pub fn dimension_position(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d.name() == name)
    }

    fn dimension_mut(&mut self, name: &str) -> Result<&mut Dimension> {
        self.dimensions
            .iter_mut()
            .find(|d| d.name() == name)
            .ok_or_else(|| RoutingError::UnknownDimension(name.to_string()))
    }

    /// Active pickup-delivery coupling, if any.
    pub fn pairing(&self) -> Option<&PairingConstraint> {
        self.pairing.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> (ConstraintGraph, CallbackHandle, CallbackHandle) {
        let mut g = ConstraintGraph::new(2);
        let arc = g.register_transit_callback(|from: usize, to: usize| (from * 10 + to) as i64);
        let demand = g.register_unary_transit_callback(|from: usize| from as i64);
        (g, arc, demand)
    }

    #[test]
    fn test_arc_cost_defaults_to_zero() {
        let (mut g, arc, _) = graph();
        assert!(!g.has_arc_costs());
        assert_eq!(g.arc_cost(0, 1, 2), 0);
        g.set_arc_cost_evaluator_of_all_vehicles(arc).expect("binary");
        assert_eq!(g.arc_cost(1, 1, 2), 12);
    }

    #[test]
    fn test_vehicle_override() {
        let (mut g, arc, _) = graph();
        let doubled = g.register_transit_callback(|from: usize, to: usize| 2 * (from * 10 + to) as i64);
        g.set_arc_cost_evaluator_of_all_vehicles(arc).expect("binary");
        g.set_arc_cost_evaluator_of_vehicle(doubled, 1).expect("binary");
        assert_eq!(g.arc_cost(0, 1, 2), 12);
        assert_eq!(g.arc_cost(1, 1, 2), 24);
        assert!(g.set_arc_cost_evaluator_of_vehicle(doubled, 5).is_err());
    }

    #[test]
    fn test_unary_rejected_as_arc_cost() {
        let (mut g, _, demand) = graph();
        assert!(matches!(
            g.set_arc_cost_evaluator_of_all_vehicles(demand),
            Err(RoutingError::CallbackArity(1))
        ));
        assert!(matches!(
            g.set_arc_cost_evaluator_of_all_vehicles(CallbackHandle(9)),
            Err(RoutingError::UnknownCallback(9))
        ));
    }

    #[test]
    fn test_duplicate_dimension() {
        let (mut g, arc, demand) = graph();
        g.add_dimension(arc, 0, 100, true, "Distance").expect("new");
        let err = g.add_dimension(demand, 0, 100, true, "Distance").unwrap_err();
        assert!(matches!(err, RoutingError::DuplicateDimension(name) if name == "Distance"));
        assert_eq!(g.dimensions().len(), 1);
    }

    #[test]
    fn test_vehicle_capacity_length() {
        let (mut g, _, demand) = graph();
        assert!(g
            .add_dimension_with_vehicle_capacity(demand, 0, vec![5], true, "Load")
            .is_err());
        g.add_dimension_with_vehicle_capacity(demand, 0, vec![5, 7], true, "Load")
            .expect("aligned");
        let load = g.dimension("Load").expect("registered");
        assert_eq!(load.capacity().for_vehicle(1), 7);
    }

    #[test]
    fn test_negative_slack_and_capacity() {
        let (mut g, arc, _) = graph();
        assert!(g.add_dimension(arc, -1, 100, true, "A").is_err());
        assert!(g.add_dimension(arc, 0, -100, true, "B").is_err());
    }

    #[test]
    fn test_span_coefficients_need_dimension() {
        let (mut g, arc, _) = graph();
        assert!(matches!(
            g.set_global_span_cost_coefficient("Distance", 100),
            Err(RoutingError::UnknownDimension(_))
        ));
        g.add_dimension(arc, 0, 100, true, "Distance").expect("new");
        g.set_global_span_cost_coefficient("Distance", 100).expect("known");
        g.set_span_cost_coefficient_for_all_vehicles("Distance", 3)
            .expect("known");
        let d = g.dimension("Distance").expect("registered");
        assert_eq!(d.global_span_cost_coefficient(), 100);
        assert_eq!(d.span_cost_coefficient(), 3);
    }

    #[test]
    fn test_pickup_delivery_constraint() {
        let (mut g, arc, _) = graph();
        let pairs = [PickupDelivery::new(1, 2)];
        assert!(g.add_pickup_and_delivery_constraint(&pairs, "Distance").is_err());
        g.add_dimension(arc, 0, 100, true, "Distance").expect("new");
        g.add_pickup_and_delivery_constraint(&pairs, "Distance")
            .expect("known");
        let pairing = g.pairing().expect("set");
        assert_eq!(pairing.dimension, 0);
        assert_eq!(pairing.pairs, pairs.to_vec());
    }

    #[test]
    fn test_cumul_range_validation() {
        let (mut g, arc, _) = graph();
        g.add_dimension(arc, 10, 100, false, "Time").expect("new");
        assert!(g.set_cumul_range("Time", 3, 50, 10).is_err());
        g.set_cumul_range("Time", 3, 10, 50).expect("valid");
        let t = g.dimension("Time").expect("registered");
        assert_eq!(t.cumul_bounds(0, 3, false), (10, 50));
    }
}
