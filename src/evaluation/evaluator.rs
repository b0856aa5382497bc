//! Route evaluator that propagates dimension cumuls and checks feasibility.

use crate::constraints::{ConstraintGraph, Dimension};
use crate::models::{
    IndexManager, Route, RoutingModel, Solution, Violation, ViolationType, Visit,
};

use super::{Assignment, Request};

/// Cost and realized dimension values of one feasible route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMetrics {
    /// Sum of arc costs, sentinels included.
    pub arc_cost: i64,
    /// Arc cost plus fixed vehicle cost and per-route span costs.
    pub cost: i64,
    /// Cumul at the start sentinel, per dimension.
    pub start_cumuls: Vec<i64>,
    /// Cumul at the end sentinel, per dimension.
    pub end_cumuls: Vec<i64>,
}

#[derive(Debug, Clone, Copy)]
struct Partner {
    node: usize,
    is_pickup: bool,
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Capacity { position: usize, cumul: i64, capacity: i64 },
    Range { position: usize },
}

/// Cumul intervals along a path for one dimension.
struct Propagation {
    lower: Vec<i64>,
    upper: Vec<i64>,
    transits: Vec<i64>,
    failure: Option<Failure>,
}

impl Propagation {
    /// Realizes one cumul per stop: the smallest reachable end value, pulled
    /// backwards as late as the slack allows.
    fn realize(&self, slack_max: i64) -> Vec<i64> {
        let n = self.lower.len();
        let mut values = self.lower.clone();
        for k in (0..n.saturating_sub(1)).rev() {
            let latest = values[k + 1]
                .saturating_sub(self.transits[k])
                .saturating_sub(slack_max);
            values[k] = self.lower[k].max(latest).min(self.upper[k].max(self.lower[k]));
        }
        values
    }
}

/// Evaluates routes against the registered dimensions and pairing rules.
///
/// Every dimension is checked by interval propagation along the route: the
/// start interval comes from the start bounds, and each arc `i -> j` narrows
/// `[e, l]` to `[max(e + t, lo_j), min(l + t + slack, hi_j)]`. An empty
/// interval makes the route infeasible.
///
/// # Examples
///
/// ```
/// use u_vrp::constraints::{ConstraintGraph, MatrixTransit};
/// use u_vrp::evaluation::RouteEvaluator;
/// use u_vrp::models::{IndexManager, RoutingModel};
/// use std::sync::Arc;
///
/// let model = Arc::new(RoutingModel::from_coordinates(
///     &[0.0, 3.0, 3.0], &[0.0, 0.0, 4.0], 1, 0).unwrap());
/// let manager = Arc::new(IndexManager::new(&model).unwrap());
/// let mut graph = ConstraintGraph::new(1);
/// let distance = graph.register_transit_callback(MatrixTransit::new(model.clone(), manager.clone()));
/// graph.set_arc_cost_evaluator_of_all_vehicles(distance).unwrap();
/// graph.add_dimension(distance, 0, 11, true, "Distance").unwrap();
///
/// let evaluator = RouteEvaluator::new(&model, &manager, &graph);
/// let metrics = evaluator.route_metrics(0, &[1]).unwrap();
/// assert_eq!(metrics.arc_cost, 6);
/// // 3 + 4 + 5 exceeds the distance capacity of 11.
/// assert!(evaluator.route_metrics(0, &[1, 2]).is_none());
/// let (route, violations) = evaluator.build_route(0, &[1, 2]);
/// assert_eq!(route.len(), 2);
/// assert_eq!(violations.len(), 1);
/// ```
pub struct RouteEvaluator<'a> {
    model: &'a RoutingModel,
    manager: &'a IndexManager,
    constraints: &'a ConstraintGraph,
    partners: Vec<Option<Partner>>,
    penalties: Vec<Option<i64>>,
}

impl<'a> RouteEvaluator<'a> {
    /// Creates an evaluator over the given model and constraints.
    pub fn new(
        model: &'a RoutingModel,
        manager: &'a IndexManager,
        constraints: &'a ConstraintGraph,
    ) -> Self {
        let n = model.num_nodes();
        let mut partners = vec![None; n];
        if let Some(pairing) = constraints.pairing() {
            for pair in &pairing.pairs {
                partners[pair.pickup] = Some(Partner {
                    node: pair.delivery,
                    is_pickup: true,
                });
                partners[pair.delivery] = Some(Partner {
                    node: pair.pickup,
                    is_pickup: false,
                });
            }
        }
        let mut penalties = vec![None; n];
        for d in model.disjunctions() {
            penalties[d.node] = Some(d.penalty);
        }
        Self {
            model,
            manager,
            constraints,
            partners,
            penalties,
        }
    }

    /// Problem data.
    pub fn model(&self) -> &RoutingModel {
        self.model
    }

    /// Index space.
    pub fn manager(&self) -> &IndexManager {
        self.manager
    }

    /// Registered constraints.
    pub fn constraints(&self) -> &ConstraintGraph {
        self.constraints
    }

    /// Number of vehicles.
    pub fn num_vehicles(&self) -> usize {
        self.model.num_vehicles()
    }

    /// All nodes except the depot, in node order.
    pub fn customers(&self) -> Vec<usize> {
        let depot = self.model.depot();
        (0..self.model.num_nodes()).filter(|&n| n != depot).collect()
    }

    /// Insertion units: coupled pairs as one request, every other customer alone.
    pub fn requests(&self) -> Vec<Request> {
        let mut requests: Vec<Request> = self
            .customers()
            .into_iter()
            .filter(|&n| self.partners[n].is_none())
            .map(Request::Single)
            .collect();
        if let Some(pairing) = self.constraints.pairing() {
            requests.extend(pairing.pairs.iter().copied().map(Request::Pair));
        }
        requests.sort_by_key(Request::key);
        requests
    }

    /// Returns `true` if `node` belongs to a coupled pickup-delivery pair.
    pub fn is_paired(&self, node: usize) -> bool {
        self.partners[node].is_some()
    }

    /// Partner of a paired node and whether `node` is the pickup.
    pub fn partner(&self, node: usize) -> Option<(usize, bool)> {
        self.partners[node].map(|p| (p.node, p.is_pickup))
    }

    /// Drop penalty of an optional node; `None` for mandatory nodes.
    pub fn drop_penalty(&self, node: usize) -> Option<i64> {
        self.penalties[node]
    }

    /// Route indices on either side of an insertion at `position`.
    pub fn insertion_neighbors(&self, vehicle: usize, route: &[usize], position: usize) -> (usize, usize) {
        let prev = if position == 0 {
            self.manager.vehicle_start(vehicle)
        } else {
            self.manager.node_to_index(route[position - 1])
        };
        let next = if position == route.len() {
            self.manager.vehicle_end(vehicle)
        } else {
            self.manager.node_to_index(route[position])
        };
        (prev, next)
    }

    /// Arc cost between two route indices for `vehicle`.
    pub fn arc_cost(&self, vehicle: usize, from: usize, to: usize) -> i64 {
        self.constraints.arc_cost(vehicle, from, to)
    }

    /// Arc cost added by inserting `node` at `position`.
    pub fn insertion_cost(&self, vehicle: usize, route: &[usize], position: usize, node: usize) -> i64 {
        let (prev, next) = self.insertion_neighbors(vehicle, route, position);
        let idx = self.manager.node_to_index(node);
        self.arc_cost(vehicle, prev, idx) + self.arc_cost(vehicle, idx, next)
            - self.arc_cost(vehicle, prev, next)
    }

    fn propagate(&self, dimension: &Dimension, vehicle: usize, path: &[usize]) -> Propagation {
        let n = path.len();
        let mut lower = Vec::with_capacity(n);
        let mut upper = Vec::with_capacity(n);
        let mut transits = Vec::with_capacity(n.saturating_sub(1));
        let mut failure = None;
        let capacity = dimension.capacity().for_vehicle(vehicle);
        let slack = dimension.slack_max();

        let (mut e, mut l) = dimension.cumul_bounds(vehicle, path[0], true);
        if e > l {
            failure = Some(Failure::Range { position: 0 });
            l = e;
        }
        lower.push(e);
        upper.push(l);

        for k in 1..n {
            let t = self.constraints.evaluate(dimension.callback(), path[k - 1], path[k]);
            let (lo, hi) = dimension.cumul_bounds(vehicle, path[k], false);
            let mut ne = e.saturating_add(t).max(lo);
            let mut nl = l.saturating_add(t).saturating_add(slack).min(hi);
            if ne > nl {
                if failure.is_none() {
                    let reached = e.saturating_add(t);
                    failure = Some(if reached > capacity {
                        Failure::Capacity {
                            position: k,
                            cumul: reached,
                            capacity,
                        }
                    } else {
                        Failure::Range { position: k }
                    });
                }
                ne = e.saturating_add(t).max(0);
                nl = ne;
            }
            transits.push(t);
            lower.push(ne);
            upper.push(nl);
            e = ne;
            l = nl;
        }

        Propagation {
            lower,
            upper,
            transits,
            failure,
        }
    }

    /// Returns `false` if the route breaks a pairing rule by position alone.
    fn pairs_ordered(&self, nodes: &[usize]) -> bool {
        nodes.iter().enumerate().all(|(pos, &node)| match self.partners[node] {
            None => true,
            Some(p) => match nodes.iter().position(|&n| n == p.node) {
                None => false,
                Some(other) => (pos < other) == p.is_pickup,
            },
        })
    }

    /// Cost and cumuls of serving `nodes` with `vehicle`, or `None` if infeasible.
    pub fn route_metrics(&self, vehicle: usize, nodes: &[usize]) -> Option<RouteMetrics> {
        if !self.pairs_ordered(nodes) {
            return None;
        }
        let path = self.manager.route_indices(vehicle, nodes);
        let arc_cost: i64 = path
            .windows(2)
            .map(|w| self.arc_cost(vehicle, w[0], w[1]))
            .sum();

        let dims = self.constraints.dimensions();
        let pairing = self.constraints.pairing();
        let mut start_cumuls = Vec::with_capacity(dims.len());
        let mut end_cumuls = Vec::with_capacity(dims.len());
        let mut span_cost = 0;

        for (d, dim) in dims.iter().enumerate() {
            let prop = self.propagate(dim, vehicle, &path);
            if prop.failure.is_some() {
                return None;
            }
            let values = prop.realize(dim.slack_max());
            let start = values[0];
            let end = values[values.len() - 1];
            span_cost += dim.span_cost_coefficient() * (end - start);
            start_cumuls.push(start);
            end_cumuls.push(end);

            if pairing.is_some_and(|p| p.dimension == d) && !self.pair_cumuls_ordered(nodes, &values) {
                return None;
            }
        }

        let fixed = if nodes.is_empty() {
            0
        } else {
            self.constraints.fixed_cost(vehicle)
        };
        Some(RouteMetrics {
            arc_cost,
            cost: arc_cost + fixed + span_cost,
            start_cumuls,
            end_cumuls,
        })
    }

    /// `values` are the realized cumuls along the path, sentinels included.
    fn pair_cumuls_ordered(&self, nodes: &[usize], values: &[i64]) -> bool {
        nodes.iter().enumerate().all(|(pos, &node)| match self.partners[node] {
            Some(p) if p.is_pickup => nodes
                .iter()
                .position(|&n| n == p.node)
                .is_some_and(|other| values[pos + 1] <= values[other + 1]),
            _ => true,
        })
    }

    /// Builds a [`Route`] with realized cumuls, reporting every rule it breaks.
    pub fn build_route(&self, vehicle: usize, nodes: &[usize]) -> (Route, Vec<Violation>) {
        let path = self.manager.route_indices(vehicle, nodes);
        let dims = self.constraints.dimensions();
        let mut violations = Vec::new();
        let mut realized = Vec::with_capacity(dims.len());

        for dim in dims {
            let prop = self.propagate(dim, vehicle, &path);
            match prop.failure {
                Some(Failure::Capacity {
                    position,
                    cumul,
                    capacity,
                }) => violations.push(Violation::new(ViolationType::CapacityExceeded {
                    vehicle,
                    dimension: dim.name().to_string(),
                    index: path[position],
                    cumul,
                    capacity,
                })),
                Some(Failure::Range { position }) => {
                    violations.push(Violation::new(ViolationType::CumulRangeViolated {
                        vehicle,
                        dimension: dim.name().to_string(),
                        index: path[position],
                    }))
                }
                None => {}
            }
            realized.push(prop.realize(dim.slack_max()));
        }

        for (pos, &node) in nodes.iter().enumerate() {
            let Some(p) = self.partners[node] else { continue };
            if !p.is_pickup {
                if !nodes.contains(&p.node) {
                    violations.push(Violation::new(ViolationType::PairSplit {
                        pickup: p.node,
                        delivery: node,
                    }));
                }
                continue;
            }
            match nodes.iter().position(|&n| n == p.node) {
                None => violations.push(Violation::new(ViolationType::PairSplit {
                    pickup: node,
                    delivery: p.node,
                })),
                Some(other) => {
                    let cumul_ok = self.constraints.pairing().map_or(true, |c| {
                        realized[c.dimension][pos + 1] <= realized[c.dimension][other + 1]
                    });
                    if other < pos || !cumul_ok {
                        violations.push(Violation::new(ViolationType::PairOrder {
                            pickup: node,
                            delivery: p.node,
                        }));
                    }
                }
            }
        }

        let mut route = Route::new(vehicle);
        let mut arc_cost = 0;
        for (k, &index) in path.iter().enumerate() {
            if k > 0 {
                arc_cost += self.arc_cost(vehicle, path[k - 1], index);
            }
            route.push_visit(Visit {
                node: self.manager.index_to_node(index),
                index,
                cumuls: realized.iter().map(|values| values[k]).collect(),
            });
        }
        route.set_cost(arc_cost);
        (route, violations)
    }

    /// Global span cost over all vehicles: per dimension,
    /// `coefficient * (max end cumul - min end cumul)`.
    pub fn global_span_cost(&self, metrics: &[&RouteMetrics]) -> i64 {
        self.constraints
            .dimensions()
            .iter()
            .enumerate()
            .filter(|(_, dim)| dim.global_span_cost_coefficient() > 0)
            .map(|(d, dim)| {
                let ends = metrics.iter().map(|m| m.end_cumuls[d]);
                let max = ends.clone().max().unwrap_or(0);
                let min = ends.min().unwrap_or(0);
                dim.global_span_cost_coefficient() * (max - min)
            })
            .sum()
    }

    /// Sum of drop penalties of the unassigned optional nodes.
    pub fn unperformed_penalty(&self, unassigned: &[usize]) -> i64 {
        unassigned.iter().filter_map(|&n| self.penalties[n]).sum()
    }

    /// Full objective of a set of route metrics and unassigned nodes.
    pub fn objective(&self, metrics: &[&RouteMetrics], unassigned: &[usize]) -> i64 {
        metrics.iter().map(|m| m.cost).sum::<i64>()
            + self.global_span_cost(metrics)
            + self.unperformed_penalty(unassigned)
    }

    /// Metrics of every route and the objective, or `None` if a route is infeasible.
    pub fn evaluate(&self, assignment: &Assignment) -> Option<(Vec<RouteMetrics>, i64)> {
        let metrics = assignment
            .routes
            .iter()
            .enumerate()
            .map(|(v, nodes)| self.route_metrics(v, nodes))
            .collect::<Option<Vec<_>>>()?;
        let refs: Vec<&RouteMetrics> = metrics.iter().collect();
        let cost = self.objective(&refs, &assignment.unassigned);
        Some((metrics, cost))
    }

    /// Returns `true` when every unassigned node may be dropped.
    pub fn is_complete(&self, assignment: &Assignment) -> bool {
        assignment
            .unassigned
            .iter()
            .all(|&n| self.penalties[n].is_some())
    }

    /// Mandatory nodes not on any route.
    pub fn missing_mandatory(&self, assignment: &Assignment) -> Vec<usize> {
        assignment
            .unassigned
            .iter()
            .copied()
            .filter(|&n| self.penalties[n].is_none())
            .collect()
    }

    /// Converts an assignment into a [`Solution`] with realized cumuls.
    pub fn build_solution(&self, assignment: &Assignment) -> Solution {
        let names = self
            .constraints
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        let mut solution = Solution::new(names);
        for (v, nodes) in assignment.routes.iter().enumerate() {
            let (route, _) = self.build_route(v, nodes);
            solution.add_route(route);
        }
        let mut unperformed = assignment.unassigned.clone();
        unperformed.sort_unstable();
        for node in unperformed {
            solution.add_unperformed(node);
        }
        if let Some((_, cost)) = self.evaluate(assignment) {
            solution.set_objective(cost);
        }
        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{CallbackHandle, DemandTransit, MatrixTransit};
    use crate::distance::DistanceMatrix;
    use crate::models::PickupDelivery;
    use std::sync::Arc;

    /// Five points on a line, 10 apart. Node 0 is the depot.
    fn line_model(vehicles: usize) -> (Arc<RoutingModel>, Arc<IndexManager>) {
        let xs = [0.0, 10.0, 20.0, 30.0, 40.0];
        let ys = [0.0; 5];
        let model = RoutingModel::from_coordinates(&xs, &ys, vehicles, 0).expect("valid");
        let manager = IndexManager::new(&model).expect("valid");
        (Arc::new(model), Arc::new(manager))
    }

    fn distance_graph(
        model: &Arc<RoutingModel>,
        manager: &Arc<IndexManager>,
        cap: i64,
    ) -> (ConstraintGraph, CallbackHandle) {
        let mut g = ConstraintGraph::new(model.num_vehicles());
        let h = g.register_transit_callback(MatrixTransit::new(model.clone(), manager.clone()));
        g.set_arc_cost_evaluator_of_all_vehicles(h).expect("binary");
        g.add_dimension(h, 0, cap, true, "Distance").expect("new");
        (g, h)
    }

    #[test]
    fn test_route_metrics_distance() {
        let (model, manager) = line_model(2);
        let (g, _) = distance_graph(&model, &manager, 1000);
        let eval = RouteEvaluator::new(&model, &manager, &g);
        let m = eval.route_metrics(0, &[1, 3]).expect("feasible");
        assert_eq!(m.arc_cost, 60);
        assert_eq!(m.end_cumuls, vec![60]);
        assert_eq!(m.start_cumuls, vec![0]);
        let empty = eval.route_metrics(1, &[]).expect("feasible");
        assert_eq!(empty.arc_cost, 0);
    }

    #[test]
    fn test_capacity_rejects_route() {
        let (model, manager) = line_model(1);
        let (g, _) = distance_graph(&model, &manager, 50);
        let eval = RouteEvaluator::new(&model, &manager, &g);
        assert!(eval.route_metrics(0, &[1, 2]).is_some());
        assert!(eval.route_metrics(0, &[3]).is_none());

        let (route, violations) = eval.build_route(0, &[3]);
        assert_eq!(route.len(), 1);
        assert!(matches!(
            &violations[0].kind,
            ViolationType::CapacityExceeded { cumul: 60, capacity: 50, .. }
        ));
    }

    #[test]
    fn test_demand_dimension() {
        let (model, manager) = line_model(1);
        let (mut g, _) = distance_graph(&model, &manager, 1000);
        let demand = DemandTransit::new(vec![0, 2, 2, 2, 2], manager.clone()).expect("aligned");
        let h = g.register_unary_transit_callback(demand);
        g.add_dimension_with_vehicle_capacity(h, 0, vec![5], true, "Load")
            .expect("new");
        let eval = RouteEvaluator::new(&model, &manager, &g);
        let m = eval.route_metrics(0, &[1, 2]).expect("feasible");
        assert_eq!(m.end_cumuls, vec![40, 4]);
        assert!(eval.route_metrics(0, &[1, 2, 3]).is_none());
    }

    #[test]
    fn test_slack_and_cumul_range() {
        let (model, manager) = line_model(1);
        let mut g = ConstraintGraph::new(1);
        let h = g.register_transit_callback(MatrixTransit::new(model.clone(), manager.clone()));
        g.set_arc_cost_evaluator_of_all_vehicles(h).expect("binary");
        g.add_dimension(h, 30, 500, true, "Time").expect("new");
        // Node 1 opens at 35: reachable at 10, waiting 25 fits in the slack.
        g.set_cumul_range("Time", 1, 35, 50).expect("valid");
        let eval = RouteEvaluator::new(&model, &manager, &g);
        let m = eval.route_metrics(0, &[1]).expect("feasible");
        assert_eq!(m.end_cumuls, vec![45]);

        // Node 2 opens too late for the slack when reached via node 1.
        g.set_cumul_range("Time", 2, 200, 300).expect("valid");
        let eval = RouteEvaluator::new(&model, &manager, &g);
        assert!(eval.route_metrics(0, &[1, 2]).is_none());
        let (_, violations) = eval.build_route(0, &[1, 2]);
        assert!(matches!(
            violations[0].kind,
            ViolationType::CumulRangeViolated { index: 2, .. }
        ));
    }

    #[test]
    fn test_pairs_same_route_and_order() {
        let (model, manager) = line_model(2);
        let (mut g, _) = distance_graph(&model, &manager, 1000);
        g.add_pickup_and_delivery_constraint(&[PickupDelivery::new(3, 1)], "Distance")
            .expect("known");
        let eval = RouteEvaluator::new(&model, &manager, &g);
        assert!(eval.route_metrics(0, &[3, 1]).is_some());
        assert!(eval.route_metrics(0, &[1, 3]).is_none());
        assert!(eval.route_metrics(0, &[3]).is_none());

        let (_, violations) = eval.build_route(0, &[1, 3]);
        assert_eq!(
            violations[0].kind,
            ViolationType::PairOrder { pickup: 3, delivery: 1 }
        );
        let (_, violations) = eval.build_route(1, &[1]);
        assert_eq!(
            violations[0].kind,
            ViolationType::PairSplit { pickup: 3, delivery: 1 }
        );

        let requests = eval.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests.contains(&Request::Pair(PickupDelivery::new(3, 1))));
    }

    #[test]
    fn test_objective_span_and_penalty() {
        let (mut model, _) = line_model(2);
        Arc::make_mut(&mut model).add_disjunction(4, 7);
        let manager = Arc::new(IndexManager::new(&model).expect("valid"));
        let (mut g, _) = distance_graph(&model, &manager, 1000);
        g.set_global_span_cost_coefficient("Distance", 2).expect("known");
        g.set_fixed_cost_of_all_vehicles(5).expect("valid");
        let eval = RouteEvaluator::new(&model, &manager, &g);

        let a = Assignment {
            routes: vec![vec![1, 2], vec![3]],
            unassigned: vec![4],
        };
        let (metrics, cost) = eval.evaluate(&a).expect("feasible");
        // arcs 40 + 60, fixed 2 * 5, span 2 * (60 - 40), penalty 7
        assert_eq!(metrics[0].cost, 45);
        assert_eq!(cost, 100 + 10 + 40 + 7);
        assert!(eval.is_complete(&a));

        let b = Assignment {
            routes: vec![vec![1, 2], vec![]],
            unassigned: vec![3, 4],
        };
        assert!(!eval.is_complete(&b));
        assert_eq!(eval.missing_mandatory(&b), vec![3]);
    }

    #[test]
    fn test_build_solution() {
        let (model, manager) = line_model(2);
        let (g, _) = distance_graph(&model, &manager, 1000);
        let eval = RouteEvaluator::new(&model, &manager, &g);
        let a = Assignment {
            routes: vec![vec![2, 1], vec![3, 4]],
            unassigned: vec![],
        };
        let sol = eval.build_solution(&a);
        assert_eq!(sol.num_routes(), 2);
        assert_eq!(sol.route(1).map(|r| r.customer_nodes()), Some(vec![3, 4]));
        assert_eq!(sol.route(1).map(|r| r.cost()), Some(80));
        assert_eq!(sol.route(1).and_then(|r| r.end_cumul(0)), Some(80));
        assert_eq!(sol.objective(), 40 + 80);
        let last = sol.route(1).and_then(|r| r.visits().last()).map(|v| v.index);
        assert_eq!(last, Some(manager.vehicle_end(1)));
    }
}
