//! Greedy descent.

use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::{first_accepted, Metaheuristic};
use crate::evaluation::RouteEvaluator;
use crate::local_search::SearchState;
use crate::search::Termination;

/// Applies the first strictly improving move until none is left.
///
/// Deterministic: the neighbourhoods are scanned in a fixed order and the
/// random generator is never drawn from.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyDescent;

impl Metaheuristic for GreedyDescent {
    fn name(&self) -> &'static str {
        "GREEDY_DESCENT"
    }

    fn improve(
        &mut self,
        evaluator: &RouteEvaluator<'_>,
        mut state: SearchState,
        termination: &mut Termination<'_>,
        _rng: &mut ChaCha8Rng,
    ) -> SearchState {
        while !termination.should_stop() {
            let current = state.cost();
            let Some(candidate) = first_accepted(evaluator, &state, termination, |c| c.cost < current)
            else {
                break;
            };
            debug!(
                event = "step",
                operator = candidate.mv.operator(),
                cost = candidate.cost,
                delta = candidate.cost - current,
            );
            state.apply(candidate);
            termination.record_step(true);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::metaheuristic::tests::crossed;

    #[test]
    fn test_untangles_crossed_routes() {
        let (fx, a) = crossed();
        let ev = fx.evaluator();
        let seed = SearchState::new(&ev, a).expect("feasible");
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut termination = Termination::new(None);
        let best = GreedyDescent.improve(&ev, seed.clone(), &mut termination, &mut rng);
        assert!(best.cost() < seed.cost());
        assert_eq!(termination.improvements(), termination.steps());
        // 54 + 108 before the search.
        assert_eq!(seed.cost(), 162);
    }

    #[test]
    fn test_local_optimum_is_stable() {
        let (fx, a) = crossed();
        let ev = fx.evaluator();
        let seed = SearchState::new(&ev, a).expect("feasible");
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let once = GreedyDescent.improve(&ev, seed, &mut Termination::new(None), &mut rng);
        let mut termination = Termination::new(None);
        let twice = GreedyDescent.improve(&ev, once.clone(), &mut termination, &mut rng);
        assert_eq!(once, twice);
        assert_eq!(termination.steps(), 0);
    }
}
