//! Moves that change which optional nodes are served.
//!
//! Only nodes with a drop penalty take part. Paired nodes are left alone,
//! since serving or dropping one half splits the pair.

use std::ops::ControlFlow;

use rand::Rng;

use super::{Move, MoveVisitor};
use crate::evaluation::{Assignment, RouteEvaluator};

fn optional(evaluator: &RouteEvaluator<'_>, node: usize) -> bool {
    evaluator.drop_penalty(node).is_some() && !evaluator.is_paired(node)
}

pub(crate) fn insert_moves(
    evaluator: &RouteEvaluator<'_>,
    a: &Assignment,
    f: MoveVisitor<'_>,
) -> ControlFlow<()> {
    for &node in &a.unassigned {
        if !optional(evaluator, node) {
            continue;
        }
        for (route, nodes) in a.routes.iter().enumerate() {
            for pos in 0..=nodes.len() {
                f(Move::Insert { node, route, pos })?;
            }
        }
    }
    ControlFlow::Continue(())
}

pub(crate) fn remove_moves(
    evaluator: &RouteEvaluator<'_>,
    a: &Assignment,
    f: MoveVisitor<'_>,
) -> ControlFlow<()> {
    for (route, nodes) in a.routes.iter().enumerate() {
        for (pos, &node) in nodes.iter().enumerate() {
            if optional(evaluator, node) {
                f(Move::Remove { route, pos })?;
            }
        }
    }
    ControlFlow::Continue(())
}

pub(crate) fn random_insert_or_remove<R: Rng + ?Sized>(
    evaluator: &RouteEvaluator<'_>,
    a: &Assignment,
    rng: &mut R,
) -> Option<Move> {
    if rng.random::<bool>() {
        let pending: Vec<usize> = a
            .unassigned
            .iter()
            .copied()
            .filter(|&n| optional(evaluator, n))
            .collect();
        if pending.is_empty() {
            return None;
        }
        let node = pending[rng.random_range(0..pending.len())];
        let route = rng.random_range(0..a.routes.len());
        let pos = rng.random_range(0..=a.routes[route].len());
        Some(Move::Insert { node, route, pos })
    } else {
        let route = rng.random_range(0..a.routes.len());
        let len = a.routes[route].len();
        if len == 0 {
            return None;
        }
        let pos = rng.random_range(0..len);
        optional(evaluator, a.routes[route][pos]).then_some(Move::Remove { route, pos })
    }
}
