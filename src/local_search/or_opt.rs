//! Intra-route Or-opt segment relocation.
//!
//! # Algorithm
//!
//! Moves a segment of 1, 2, or 3 consecutive nodes to a different position
//! within the same route, keeping its orientation.
//!
//! # Complexity
//!
//! O(n² × 3) moves per pass where n = route length.
//!
//! # Reference
//!
//! Or, I. (1976). "Traveling Salesman-Type Combinatorial Problems and Their
//! Relation to the Logistics of Blood Banking". PhD thesis, Northwestern University.

use std::ops::ControlFlow;

use rand::Rng;

use super::{Move, MoveVisitor};
use crate::evaluation::Assignment;

/// Longest segment moved at once.
const MAX_SEGMENT: usize = 3;

pub(crate) fn or_opt_moves(a: &Assignment, f: MoveVisitor<'_>) -> ControlFlow<()> {
    for (route, nodes) in a.routes.iter().enumerate() {
        let n = nodes.len();
        for len in 1..=MAX_SEGMENT.min(n.saturating_sub(1)) {
            for start in 0..=n - len {
                for target in 0..=n - len {
                    if target != start {
                        f(Move::OrOpt {
                            route,
                            start,
                            len,
                            target,
                        })?;
                    }
                }
            }
        }
    }
    ControlFlow::Continue(())
}

pub(crate) fn random_or_opt<R: Rng + ?Sized>(a: &Assignment, rng: &mut R) -> Option<Move> {
    let route = rng.random_range(0..a.routes.len());
    let n = a.routes[route].len();
    if n < 2 {
        return None;
    }
    let len = rng.random_range(1..=MAX_SEGMENT.min(n - 1));
    let start = rng.random_range(0..=n - len);
    let target = rng.random_range(0..=n - len);
    (target != start).then_some(Move::OrOpt {
        route,
        start,
        len,
        target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_opt_moves_are_valid() {
        let a = Assignment {
            routes: vec![vec![1, 2, 3, 4]],
            unassigned: vec![],
        };
        let mut moves = Vec::new();
        let _ = or_opt_moves(&a, &mut |m| {
            moves.push(m);
            ControlFlow::Continue(())
        });
        // len 1: 4 starts x 3 targets, len 2: 3 x 2, len 3: 2 x 1
        assert_eq!(moves.len(), 12 + 6 + 2);
        for m in moves {
            let out = m.modified_routes(&a);
            let mut nodes = out[0].1.clone();
            nodes.sort_unstable();
            assert_eq!(nodes, vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_short_route_has_no_moves() {
        let a = Assignment {
            routes: vec![vec![1]],
            unassigned: vec![],
        };
        let mut count = 0;
        let _ = or_opt_moves(&a, &mut |_| {
            count += 1;
            ControlFlow::Continue(())
        });
        assert_eq!(count, 0);
    }
}
