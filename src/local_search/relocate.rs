//! Inter-route relocation of single nodes and pickup-delivery pairs.
//!
//! # Algorithm
//!
//! Removes a node from its route and inserts it at a position in another
//! route. Paired nodes never move alone, since a split pair is infeasible;
//! they move together through [`Move::RelocatePair`], which keeps the pickup
//! ahead of the delivery in the target route.
//!
//! # Complexity
//!
//! O(n²) single moves per pass; O(p × n²) pair moves for p pairs.

use std::ops::ControlFlow;

use rand::Rng;

use super::{Move, MoveVisitor};
use crate::evaluation::{Assignment, RouteEvaluator};

pub(crate) fn relocate_moves(
    evaluator: &RouteEvaluator<'_>,
    a: &Assignment,
    f: MoveVisitor<'_>,
) -> ControlFlow<()> {
    for (from_route, nodes) in a.routes.iter().enumerate() {
        for (from_pos, &node) in nodes.iter().enumerate() {
            if evaluator.is_paired(node) {
                continue;
            }
            for (to_route, target) in a.routes.iter().enumerate() {
                if to_route == from_route {
                    continue;
                }
                for to_pos in 0..=target.len() {
                    f(Move::Relocate {
                        from_route,
                        from_pos,
                        to_route,
                        to_pos,
                    })?;
                }
            }
        }
    }
    ControlFlow::Continue(())
}

pub(crate) fn random_relocate<R: Rng + ?Sized>(
    evaluator: &RouteEvaluator<'_>,
    a: &Assignment,
    rng: &mut R,
) -> Option<Move> {
    let n = a.routes.len();
    if n < 2 {
        return None;
    }
    let from_route = rng.random_range(0..n);
    let len = a.routes[from_route].len();
    if len == 0 {
        return None;
    }
    let from_pos = rng.random_range(0..len);
    if evaluator.is_paired(a.routes[from_route][from_pos]) {
        return None;
    }
    let mut to_route = rng.random_range(0..n - 1);
    if to_route >= from_route {
        to_route += 1;
    }
    let to_pos = rng.random_range(0..=a.routes[to_route].len());
    Some(Move::Relocate {
        from_route,
        from_pos,
        to_route,
        to_pos,
    })
}

/// Pickup positions in `route` whose delivery follows in the same route.
fn pair_positions(evaluator: &RouteEvaluator<'_>, route: &[usize]) -> Vec<(usize, usize)> {
    route
        .iter()
        .enumerate()
        .filter_map(|(p, &node)| match evaluator.partner(node) {
            Some((delivery, true)) => route
                .iter()
                .position(|&n| n == delivery)
                .map(|d| (p, d)),
            _ => None,
        })
        .collect()
}

pub(crate) fn relocate_pair_moves(
    evaluator: &RouteEvaluator<'_>,
    a: &Assignment,
    f: MoveVisitor<'_>,
) -> ControlFlow<()> {
    for (from_route, nodes) in a.routes.iter().enumerate() {
        for (pickup_pos, delivery_pos) in pair_positions(evaluator, nodes) {
            for (to_route, target) in a.routes.iter().enumerate() {
                if to_route == from_route {
                    continue;
                }
                for to_pickup in 0..=target.len() {
                    for to_delivery in to_pickup..=target.len() {
                        f(Move::RelocatePair {
                            from_route,
                            pickup_pos,
                            delivery_pos,
                            to_route,
                            to_pickup,
                            to_delivery,
                        })?;
                    }
                }
            }
        }
    }
    ControlFlow::Continue(())
}

pub(crate) fn random_relocate_pair<R: Rng + ?Sized>(
    evaluator: &RouteEvaluator<'_>,
    a: &Assignment,
    rng: &mut R,
) -> Option<Move> {
    let n = a.routes.len();
    if n < 2 {
        return None;
    }
    let from_route = rng.random_range(0..n);
    let pairs = pair_positions(evaluator, &a.routes[from_route]);
    if pairs.is_empty() {
        return None;
    }
    let (pickup_pos, delivery_pos) = pairs[rng.random_range(0..pairs.len())];
    let mut to_route = rng.random_range(0..n - 1);
    if to_route >= from_route {
        to_route += 1;
    }
    let len = a.routes[to_route].len();
    let to_pickup = rng.random_range(0..=len);
    let to_delivery = rng.random_range(to_pickup..=len);
    Some(Move::RelocatePair {
        from_route,
        pickup_pos,
        delivery_pos,
        to_route,
        to_pickup,
        to_delivery,
    })
}
