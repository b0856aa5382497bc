//! Clarke-Wright savings algorithm.
//!
//! # Algorithm
//!
//! The savings algorithm (Clarke & Wright, 1964) starts with each node on its
//! own route (depot → node → depot). It then merges routes by joining the end
//! of one route to the start of another, in decreasing order of
//!
//! ```text
//! s(i, j) = c(i, depot) + c(depot, j) - c(i, j)
//! ```
//!
//! Savings are directed, so asymmetric costs are handled. A merge is kept only
//! if some vehicle can drive the merged route feasibly. Merged routes are then
//! handed to vehicles, longest first.
//!
//! # Complexity
//!
//! O(n² log n) where n = number of nodes (dominated by sorting savings).
//!
//! # Reference
//!
//! Clarke, G. & Wright, J.W. (1964). "Scheduling of Vehicles from a Central
//! Depot to a Number of Delivery Points", *Operations Research* 12(4), 568-581.

use crate::evaluation::{Assignment, RouteEvaluator};

/// A savings value for joining the route ending at `i` to the route starting at `j`.
#[derive(Debug)]
struct Saving {
    i: usize,
    j: usize,
    value: i64,
}

fn feasible_for_some_vehicle(ev: &RouteEvaluator<'_>, route: &[usize]) -> bool {
    (0..ev.num_vehicles()).any(|v| ev.route_metrics(v, route).is_some())
}

/// Builds routes by savings merges over the unassigned, unpaired nodes.
pub(crate) fn clarke_wright_savings(ev: &RouteEvaluator<'_>, mut assignment: Assignment) -> Assignment {
    let nodes: Vec<usize> = {
        let mut nodes: Vec<usize> = assignment
            .unassigned
            .iter()
            .copied()
            .filter(|&n| !ev.is_paired(n))
            .collect();
        nodes.sort_unstable();
        nodes
    };
    if nodes.is_empty() {
        return assignment;
    }

    // Savings are priced with vehicle 0's arc costs.
    let manager = ev.manager();
    let start = manager.vehicle_start(0);
    let end = manager.vehicle_end(0);
    let mut savings = Vec::new();
    for &i in &nodes {
        for &j in &nodes {
            if i == j {
                continue;
            }
            let (ii, jj) = (manager.node_to_index(i), manager.node_to_index(j));
            let value = ev.arc_cost(0, ii, end) + ev.arc_cost(0, start, jj) - ev.arc_cost(0, ii, jj);
            if value > 0 {
                savings.push(Saving { i, j, value });
            }
        }
    }

    // Sort by decreasing savings, ties by node pair
    savings.sort_by(|a, b| b.value.cmp(&a.value).then((a.i, a.j).cmp(&(b.i, b.j))));

    // route_of[node] = route slot holding the node
    let n = ev.model().num_nodes();
    let mut route_of = vec![usize::MAX; n];
    let mut members: Vec<Vec<usize>> = Vec::with_capacity(nodes.len());
    for (slot, &node) in nodes.iter().enumerate() {
        if feasible_for_some_vehicle(ev, &[node]) {
            route_of[node] = slot;
            members.push(vec![node]);
        } else {
            members.push(Vec::new());
        }
    }

    for saving in &savings {
        let (ri, rj) = (route_of[saving.i], route_of[saving.j]);
        if ri == usize::MAX || rj == usize::MAX || ri == rj {
            continue;
        }
        // i must end its route and j must start its own
        if members[ri].last() != Some(&saving.i) || members[rj].first() != Some(&saving.j) {
            continue;
        }

        let mut merged = members[ri].clone();
        merged.extend_from_slice(&members[rj]);
        if !feasible_for_some_vehicle(ev, &merged) {
            continue;
        }

        for &node in &members[rj] {
            route_of[node] = ri;
        }
        members[rj].clear();
        members[ri] = merged;
    }

    // Longest routes get the first vehicle able to drive them.
    let mut routes: Vec<Vec<usize>> = members.into_iter().filter(|m| !m.is_empty()).collect();
    routes.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    for route in routes {
        let free = (0..assignment.routes.len()).find(|&v| {
            assignment.routes[v].is_empty() && ev.route_metrics(v, &route).is_some()
        });
        if let Some(v) = free {
            for &node in &route {
                assignment.mark_routed(node);
            }
            assignment.routes[v] = route;
        }
    }
    assignment
}
