//! Node exchange (swap) moves.
//!
//! # Algorithm
//!
//! Swaps the positions of two nodes, either within one route or across two
//! routes. Across routes, paired nodes are skipped: swapping one half of a
//! pair out of its route always splits it.
//!
//! # Complexity
//!
//! O(n²) per pass.

use std::ops::ControlFlow;

use rand::Rng;

use super::{Move, MoveVisitor};
use crate::evaluation::{Assignment, RouteEvaluator};

pub(crate) fn exchange_moves(
    evaluator: &RouteEvaluator<'_>,
    a: &Assignment,
    f: MoveVisitor<'_>,
) -> ControlFlow<()> {
    let positions: Vec<(usize, usize, usize)> = a
        .routes
        .iter()
        .enumerate()
        .flat_map(|(r, nodes)| nodes.iter().enumerate().map(move |(p, &n)| (r, p, n)))
        .collect();
    for (i, &(route_a, pos_a, node_a)) in positions.iter().enumerate() {
        for &(route_b, pos_b, node_b) in &positions[i + 1..] {
            if route_a != route_b && (evaluator.is_paired(node_a) || evaluator.is_paired(node_b)) {
                continue;
            }
            f(Move::Exchange {
                route_a,
                pos_a,
                route_b,
                pos_b,
            })?;
        }
    }
    ControlFlow::Continue(())
}

pub(crate) fn random_exchange<R: Rng + ?Sized>(
    evaluator: &RouteEvaluator<'_>,
    a: &Assignment,
    rng: &mut R,
) -> Option<Move> {
    let n = a.routes.len();
    let route_a = rng.random_range(0..n);
    let route_b = rng.random_range(0..n);
    let (len_a, len_b) = (a.routes[route_a].len(), a.routes[route_b].len());
    if len_a == 0 || len_b == 0 {
        return None;
    }
    let pos_a = rng.random_range(0..len_a);
    let pos_b = rng.random_range(0..len_b);
    if route_a == route_b && pos_a == pos_b {
        return None;
    }
    if route_a != route_b
        && (evaluator.is_paired(a.routes[route_a][pos_a]) || evaluator.is_paired(a.routes[route_b][pos_b]))
    {
        return None;
    }
    Some(Move::Exchange {
        route_a,
        pos_a,
        route_b,
        pos_b,
    })
}
