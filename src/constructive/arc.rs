//! Arc-based constructive heuristics.
//!
//! Routes are grown from their last stop, one arc at a time. A node joins a
//! route only if the extended route stays feasible on every dimension. Paired
//! nodes are left to the insertion step that completes the assignment.
//!
//! # Complexity
//!
//! O(n² log n · V) for the path variants, where n = number of nodes.

use crate::constraints::CallbackHandle;
use crate::evaluation::{Assignment, RouteEvaluator};

/// How the path heuristics rank the next node of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PathRanking {
    /// Cheapest arc cost from the route's last stop.
    CheapestArc,
    /// Largest share of a dimension's capacity consumed by the arc, then cost.
    MostConstrained,
    /// Smallest value of a registered evaluator.
    Evaluator(CallbackHandle),
    /// Lowest node number.
    MinValue,
}

fn tail_index(ev: &RouteEvaluator<'_>, vehicle: usize, route: &[usize]) -> usize {
    route
        .last()
        .map_or(ev.manager().vehicle_start(vehicle), |&n| ev.manager().node_to_index(n))
}

/// Unassigned nodes that may be routed on their own.
fn single_candidates(ev: &RouteEvaluator<'_>, assignment: &Assignment) -> Vec<usize> {
    let mut nodes: Vec<usize> = assignment
        .unassigned
        .iter()
        .copied()
        .filter(|&n| !ev.is_paired(n))
        .collect();
    nodes.sort_unstable();
    nodes
}

fn rank(ev: &RouteEvaluator<'_>, ranking: PathRanking, vehicle: usize, tail: usize, node: usize) -> (i64, i64) {
    let to = ev.manager().node_to_index(node);
    let cost = ev.arc_cost(vehicle, tail, to);
    match ranking {
        PathRanking::CheapestArc => (cost, 0),
        PathRanking::MinValue => (node as i64, 0),
        PathRanking::Evaluator(handle) => (ev.constraints().evaluate(handle, tail, to), 0),
        PathRanking::MostConstrained => {
            let usage = ev
                .constraints()
                .dimensions()
                .iter()
                .filter_map(|dim| {
                    let cap = dim.capacity().for_vehicle(vehicle);
                    (cap > 0).then(|| {
                        ev.constraints()
                            .evaluate(dim.callback(), tail, to)
                            .saturating_mul(1_000_000)
                            / cap
                    })
                })
                .max()
                .unwrap_or(0);
            (-usage, cost)
        }
    }
}

/// Appends the first feasible node of `ranked` to `vehicle`'s route.
fn append_first_feasible(
    ev: &RouteEvaluator<'_>,
    assignment: &mut Assignment,
    vehicle: usize,
    ranked: impl IntoIterator<Item = usize>,
) -> bool {
    for node in ranked {
        let mut route = assignment.routes[vehicle].clone();
        route.push(node);
        if ev.route_metrics(vehicle, &route).is_some() {
            assignment.routes[vehicle] = route;
            assignment.mark_routed(node);
            return true;
        }
    }
    false
}

/// Builds routes one vehicle at a time, always extending the current route
/// with the best-ranked feasible node.
pub(crate) fn extend_paths(
    ev: &RouteEvaluator<'_>,
    mut assignment: Assignment,
    ranking: PathRanking,
) -> Assignment {
    for vehicle in 0..assignment.routes.len() {
        loop {
            let tail = tail_index(ev, vehicle, &assignment.routes[vehicle]);
            let mut ranked: Vec<((i64, i64), usize)> = single_candidates(ev, &assignment)
                .into_iter()
                .map(|n| (rank(ev, ranking, vehicle, tail, n), n))
                .collect();
            if ranked.is_empty() {
                return assignment;
            }
            ranked.sort_by_key(|&(key, _)| key);
            if !append_first_feasible(ev, &mut assignment, vehicle, ranked.into_iter().map(|(_, n)| n)) {
                break;
            }
        }
    }
    assignment
}

/// Repeatedly appends the globally cheapest feasible arc leaving any route's
/// last stop.
pub(crate) fn global_cheapest_arc(ev: &RouteEvaluator<'_>, mut assignment: Assignment) -> Assignment {
    loop {
        let nodes = single_candidates(ev, &assignment);
        let mut arcs: Vec<(i64, usize, usize)> = Vec::new();
        for vehicle in 0..assignment.routes.len() {
            let tail = tail_index(ev, vehicle, &assignment.routes[vehicle]);
            for &node in &nodes {
                let cost = ev.arc_cost(vehicle, tail, ev.manager().node_to_index(node));
                arcs.push((cost, vehicle, node));
            }
        }
        arcs.sort_unstable();
        let appended = arcs.into_iter().any(|(_, vehicle, node)| {
            append_first_feasible(ev, &mut assignment, vehicle, [node])
        });
        if !appended {
            return assignment;
        }
    }
}

/// Takes nodes in order and appends each behind the route end it is cheapest
/// to reach from.
pub(crate) fn local_cheapest_arc(ev: &RouteEvaluator<'_>, mut assignment: Assignment) -> Assignment {
    for node in single_candidates(ev, &assignment) {
        let to = ev.manager().node_to_index(node);
        let mut vehicles: Vec<(i64, usize)> = (0..assignment.routes.len())
            .map(|v| {
                let tail = tail_index(ev, v, &assignment.routes[v]);
                (ev.arc_cost(v, tail, to), v)
            })
            .collect();
        vehicles.sort_unstable();
        for (_, vehicle) in vehicles {
            if append_first_feasible(ev, &mut assignment, vehicle, [node]) {
                break;
            }
        }
    }
    assignment
}
