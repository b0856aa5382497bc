//! Local search neighbourhoods for improving VRP solutions.
//!
//! - 2-opt: intra-route edge reversal
//! - 2-opt*: inter-route tail swap
//! - Or-opt: intra-route segment relocation
//! - relocate: inter-route move of a node, or of a pickup-delivery pair
//! - exchange: swap of two nodes
//! - insert and remove: serve or drop optional nodes
//!
//! Moves are generated lazily through a visitor that can stop the scan, and
//! priced by [`SearchState::evaluate`], which re-evaluates only the routes a
//! move touches.

mod exchange;
mod moves;
mod or_opt;
mod relocate;
mod state;
mod two_opt;
mod unperformed;

pub use moves::Move;
pub use state::{Candidate, SearchState};
pub(crate) use state::route_arcs;

use std::ops::ControlFlow;

use rand::Rng;

use crate::evaluation::{Assignment, RouteEvaluator};

/// Callback receiving generated moves; `Break` stops the scan.
pub(crate) type MoveVisitor<'f> = &'f mut dyn FnMut(Move) -> ControlFlow<()>;

/// Number of operator families sampled by [`random_move`].
const FAMILIES: usize = 7;

/// Visits every move of every neighbourhood, operator by operator.
///
/// Returns `Break` if the visitor stopped the scan.
pub fn for_each_move<F>(evaluator: &RouteEvaluator<'_>, a: &Assignment, mut f: F) -> ControlFlow<()>
where
    F: FnMut(Move) -> ControlFlow<()>,
{
    let f: MoveVisitor<'_> = &mut f;
    two_opt::two_opt_moves(a, f)?;
    or_opt::or_opt_moves(a, f)?;
    relocate::relocate_moves(evaluator, a, f)?;
    relocate::relocate_pair_moves(evaluator, a, f)?;
    exchange::exchange_moves(evaluator, a, f)?;
    two_opt::cross_exchange_moves(a, f)?;
    unperformed::insert_moves(evaluator, a, f)?;
    unperformed::remove_moves(evaluator, a, f)
}

/// Draws one move from a uniformly chosen operator family.
///
/// Retries a bounded number of times when the drawn family has nothing to
/// offer; `None` means no move was found.
pub fn random_move<R: Rng + ?Sized>(
    evaluator: &RouteEvaluator<'_>,
    a: &Assignment,
    rng: &mut R,
) -> Option<Move> {
    if a.routes.is_empty() {
        return None;
    }
    for _ in 0..4 * FAMILIES {
        let mv = match rng.random_range(0..FAMILIES) {
            0 => two_opt::random_two_opt(a, rng),
            1 => or_opt::random_or_opt(a, rng),
            2 => relocate::random_relocate(evaluator, a, rng),
            3 => relocate::random_relocate_pair(evaluator, a, rng),
            4 => exchange::random_exchange(evaluator, a, rng),
            5 => two_opt::random_cross_exchange(a, rng),
            _ => unperformed::random_insert_or_remove(evaluator, a, rng),
        };
        if mv.is_some() {
            return mv;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::constructive::tests::fixture;
    use crate::models::PickupDelivery;

    #[test]
    fn test_for_each_move_conserves_nodes() {
        let fx = fixture(2, 1000, &[PickupDelivery::new(1, 2)]);
        let ev = fx.evaluator();
        let a = Assignment {
            routes: vec![vec![1, 3, 2], vec![4, 5, 6]],
            unassigned: vec![],
        };
        let mut total = 0;
        let flow = for_each_move(&ev, &a, |m| {
            total += 1;
            let mut after = a.clone();
            for (v, nodes) in m.modified_routes(&a) {
                after.routes[v] = nodes;
            }
            assert_eq!(after.num_routed(), 6, "{m:?}");
            // Only 2-opt* may separate the pair; evaluation rejects it.
            if !matches!(m, Move::CrossExchange { .. }) {
                let (vp, _) = after.locate(1).expect("pickup");
                let (vd, _) = after.locate(2).expect("delivery");
                assert_eq!(vp, vd, "{m:?} split the pair");
            }
            ControlFlow::Continue(())
        });
        assert!(flow.is_continue());
        assert!(total > 0);
    }

    #[test]
    fn test_random_move_is_reproducible() {
        let fx = fixture(3, 1000, &[]);
        let ev = fx.evaluator();
        let a = Assignment {
            routes: vec![vec![1, 2], vec![3, 4], vec![5, 6]],
            unassigned: vec![],
        };
        let draw = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..20)
                .map(|_| random_move(&ev, &a, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(7), draw(7));
        assert!(draw(7).iter().any(Option::is_some));
    }
}
