//! 2-opt and 2-opt* moves.
//!
//! # Algorithm
//!
//! Intra-route 2-opt removes arcs (r[i-1], r[i]) and (r[j], r[j+1]) and
//! reconnects the route by reversing r[i..=j]:
//!
//! ```text
//! delta = c(r[i-1], r[j]) + c(r[i], r[j+1]) - c(r[i-1], r[i]) - c(r[j], r[j+1])
//! ```
//!
//! (for symmetric costs). The inter-route variant 2-opt* cuts two routes and
//! swaps their tails, which lets a route hand its end over to another vehicle.
//!
//! # Complexity
//!
//! O(n²) moves per pass.
//!
//! # Reference
//!
//! Croes, G.A. (1958). "A method for solving traveling salesman problems",
//! *Operations Research* 6(6), 791-812.
//!
//! Potvin, J.-Y. & Rousseau, J.-M. (1995). "An Exchange Heuristic for Routeing
//! Problems with Time Windows", *J. Operational Research Society* 46(12), 1433-1446.

use std::ops::ControlFlow;

use rand::Rng;

use super::{Move, MoveVisitor};
use crate::evaluation::Assignment;

pub(crate) fn two_opt_moves(a: &Assignment, f: MoveVisitor<'_>) -> ControlFlow<()> {
    for (route, nodes) in a.routes.iter().enumerate() {
        for from in 0..nodes.len().saturating_sub(1) {
            for to in from + 1..nodes.len() {
                f(Move::TwoOpt { route, from, to })?;
            }
        }
    }
    ControlFlow::Continue(())
}

pub(crate) fn random_two_opt<R: Rng + ?Sized>(a: &Assignment, rng: &mut R) -> Option<Move> {
    let route = rng.random_range(0..a.routes.len());
    let len = a.routes[route].len();
    if len < 2 {
        return None;
    }
    let from = rng.random_range(0..len - 1);
    let to = rng.random_range(from + 1..len);
    Some(Move::TwoOpt { route, from, to })
}

pub(crate) fn cross_exchange_moves(a: &Assignment, f: MoveVisitor<'_>) -> ControlFlow<()> {
    let n = a.routes.len();
    for route_a in 0..n {
        for route_b in route_a + 1..n {
            let (len_a, len_b) = (a.routes[route_a].len(), a.routes[route_b].len());
            for cut_a in 0..=len_a {
                for cut_b in 0..=len_b {
                    if cut_a == len_a && cut_b == len_b {
                        continue;
                    }
                    f(Move::CrossExchange {
                        route_a,
                        cut_a,
                        route_b,
                        cut_b,
                    })?;
                }
            }
        }
    }
    ControlFlow::Continue(())
}

pub(crate) fn random_cross_exchange<R: Rng + ?Sized>(a: &Assignment, rng: &mut R) -> Option<Move> {
    let n = a.routes.len();
    if n < 2 {
        return None;
    }
    let route_a = rng.random_range(0..n - 1);
    let route_b = rng.random_range(route_a + 1..n);
    let cut_a = rng.random_range(0..=a.routes[route_a].len());
    let cut_b = rng.random_range(0..=a.routes[route_b].len());
    if cut_a == a.routes[route_a].len() && cut_b == a.routes[route_b].len() {
        return None;
    }
    Some(Move::CrossExchange {
        route_a,
        cut_a,
        route_b,
        cut_b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(a: &Assignment, gen: fn(&Assignment, MoveVisitor<'_>) -> ControlFlow<()>) -> Vec<Move> {
        let mut out = Vec::new();
        let _ = gen(a, &mut |m| {
            out.push(m);
            ControlFlow::Continue(())
        });
        out
    }

    #[test]
    fn test_two_opt_count() {
        let a = Assignment {
            routes: vec![vec![1, 2, 3], vec![4]],
            unassigned: vec![],
        };
        // Three (from, to) pairs in the first route, none in the second.
        assert_eq!(collect(&a, two_opt_moves).len(), 3);
    }

    #[test]
    fn test_cross_exchange_skips_noop() {
        let a = Assignment {
            routes: vec![vec![1], vec![2]],
            unassigned: vec![],
        };
        let moves = collect(&a, cross_exchange_moves);
        assert_eq!(moves.len(), 3);
        assert!(!moves.contains(&Move::CrossExchange {
            route_a: 0,
            cut_a: 1,
            route_b: 1,
            cut_b: 1
        }));
    }

    #[test]
    fn test_stops_early() {
        let a = Assignment {
            routes: vec![vec![1, 2, 3, 4]],
            unassigned: vec![],
        };
        let mut seen = 0;
        let flow = two_opt_moves(&a, &mut |_| {
            seen += 1;
            if seen == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(flow.is_break());
        assert_eq!(seen, 2);
    }
}
