//! Sweep constructive heuristic.
//!
//! # Algorithm
//!
//! Sorts nodes by polar angle relative to the depot, then packs them into
//! routes by sweeping through the angles, opening the next vehicle when the
//! current route cannot take the next node feasibly. Nearby nodes tend to have
//! similar angles and land on the same route.
//!
//! # Complexity
//!
//! O(n log n) for the sort, plus one feasibility check per placement.
//!
//! # Reference
//!
//! Gillett, B.E. & Miller, L.R. (1974). "A Heuristic Algorithm for the
//! Vehicle-Dispatch Problem", *Operations Research* 22(2), 340-349.

use crate::evaluation::{Assignment, RouteEvaluator};

/// Distributes `order` over the vehicles in sequence, moving to the next
/// vehicle when a node no longer fits. Nodes that fit no fresh route are skipped.
pub(crate) fn split_into_routes(
    ev: &RouteEvaluator<'_>,
    mut assignment: Assignment,
    order: &[usize],
) -> Assignment {
    let mut vehicle = 0;
    let num_vehicles = assignment.routes.len();
    for &node in order {
        while vehicle < num_vehicles {
            let mut route = assignment.routes[vehicle].clone();
            route.push(node);
            if ev.route_metrics(vehicle, &route).is_some() {
                assignment.routes[vehicle] = route;
                assignment.mark_routed(node);
                break;
            }
            if assignment.routes[vehicle].is_empty() {
                // Does not fit even alone; try it in the next vehicle later on.
                break;
            }
            vehicle += 1;
        }
        if vehicle == num_vehicles {
            break;
        }
    }
    assignment
}

/// Sweeps the unpaired nodes by angle, or returns `None` without coordinates.
pub(crate) fn sweep(ev: &RouteEvaluator<'_>, assignment: Assignment) -> Option<Assignment> {
    let coords = ev.model().coordinates()?;
    let (depot_x, depot_y) = coords[ev.model().depot()];

    let mut angle_order: Vec<(usize, f64)> = assignment
        .unassigned
        .iter()
        .copied()
        .filter(|&n| !ev.is_paired(n))
        .map(|n| {
            let (x, y) = coords[n];
            (n, (y - depot_y).atan2(x - depot_x))
        })
        .collect();
    angle_order.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let order: Vec<usize> = angle_order.into_iter().map(|(n, _)| n).collect();
    Some(split_into_routes(ev, assignment, &order))
}
