//! Tabu search, on arcs or on nodes.
//!
//! Every step scans the whole neighbourhood and applies the cheapest
//! admissible move, even when it worsens the objective. A move is
//! admissible when it does not touch a tabu attribute, or when it would
//! produce a new best solution (aspiration).
//!
//! - [`TabuAttribute::Arcs`]: arcs removed by a step may not be re-added
//!   for `tenure` steps.
//! - [`TabuAttribute::Nodes`]: nodes moved by a step may not move again
//!   for `tenure` steps.
//!
//! # Reference
//!
//! Glover, F. (1989). "Tabu Search, Part I", *ORSA J. on Computing* 1(3), 190-206.

use std::ops::ControlFlow;

use rand_chacha::ChaCha8Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::Metaheuristic;
use crate::evaluation::RouteEvaluator;
use crate::local_search::{for_each_move, route_arcs, Candidate, SearchState};
use crate::search::Termination;

/// What a step makes tabu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabuAttribute {
    /// Removed arcs, undirected.
    Arcs,
    /// Moved nodes.
    Nodes,
}

/// Tabu search with a fixed tenure.
#[derive(Debug, Clone)]
pub struct TabuSearch {
    attribute: TabuAttribute,
    tenure: u64,
    iteration: u64,
    arcs: FxHashMap<(usize, usize), u64>,
    nodes: FxHashMap<usize, u64>,
}

fn arc_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn arc_set(depot: usize, route: &[usize]) -> FxHashSet<(usize, usize)> {
    if route.is_empty() {
        return FxHashSet::default();
    }
    route_arcs(depot, route)
        .into_iter()
        .map(|(a, b)| arc_key(a, b))
        .collect()
}

impl TabuSearch {
    pub fn new(attribute: TabuAttribute, tenure: u64) -> Self {
        Self {
            attribute,
            tenure,
            iteration: 0,
            arcs: FxHashMap::default(),
            nodes: FxHashMap::default(),
        }
    }

    fn is_tabu(&self, depot: usize, state: &SearchState, candidate: &Candidate) -> bool {
        let active = |expiry: Option<&u64>| expiry.is_some_and(|&e| e > self.iteration);
        match self.attribute {
            TabuAttribute::Arcs => candidate.changed_routes().any(|(v, nodes)| {
                let before = arc_set(depot, &state.assignment().routes[v]);
                arc_set(depot, nodes)
                    .difference(&before)
                    .any(|k| active(self.arcs.get(k)))
            }),
            TabuAttribute::Nodes => candidate
                .mv
                .moved_nodes(state.assignment())
                .iter()
                .any(|n| active(self.nodes.get(n))),
        }
    }

    /// Marks what `candidate` removes or moves, before it is applied.
    fn make_tabu(&mut self, depot: usize, state: &SearchState, candidate: &Candidate) {
        let expiry = self.iteration + self.tenure + 1;
        match self.attribute {
            TabuAttribute::Arcs => {
                for (v, nodes) in candidate.changed_routes() {
                    let after = arc_set(depot, nodes);
                    for k in arc_set(depot, &state.assignment().routes[v]).difference(&after) {
                        self.arcs.insert(*k, expiry);
                    }
                }
            }
            TabuAttribute::Nodes => {
                for n in candidate.mv.moved_nodes(state.assignment()) {
                    self.nodes.insert(n, expiry);
                }
            }
        }
    }

    /// Cheapest admissible candidate, or `None` once the budget expires.
    fn best_admissible(
        &self,
        evaluator: &RouteEvaluator<'_>,
        depot: usize,
        state: &SearchState,
        best_cost: i64,
        termination: &Termination<'_>,
    ) -> Option<Candidate> {
        let mut chosen: Option<Candidate> = None;
        let flow = for_each_move(evaluator, state.assignment(), |mv| {
            if termination.is_expired() {
                return ControlFlow::Break(());
            }
            let Some(c) = state.evaluate(evaluator, mv) else {
                return ControlFlow::Continue(());
            };
            if chosen.as_ref().is_some_and(|b| b.cost <= c.cost) {
                return ControlFlow::Continue(());
            }
            if c.cost < best_cost || !self.is_tabu(depot, state, &c) {
                chosen = Some(c);
            }
            ControlFlow::Continue(())
        });
        if flow.is_break() {
            None
        } else {
            chosen
        }
    }
}

impl Metaheuristic for TabuSearch {
    fn name(&self) -> &'static str {
        match self.attribute {
            TabuAttribute::Arcs => "TABU_SEARCH",
            TabuAttribute::Nodes => "GENERIC_TABU_SEARCH",
        }
    }

    fn improve(
        &mut self,
        evaluator: &RouteEvaluator<'_>,
        mut state: SearchState,
        termination: &mut Termination<'_>,
        _rng: &mut ChaCha8Rng,
    ) -> SearchState {
        let depot = evaluator.model().depot();
        let mut best = state.clone();
        while !termination.should_stop() {
            let Some(candidate) =
                self.best_admissible(evaluator, depot, &state, best.cost(), termination)
            else {
                break;
            };
            self.make_tabu(depot, &state, &candidate);
            state.apply(candidate);
            self.iteration += 1;
            let improved = state.cost() < best.cost();
            if improved {
                debug!(event = "new_best", cost = state.cost(), iteration = self.iteration);
                best = state.clone();
            }
            termination.record_step(improved);
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::local_search::Move;
    use crate::metaheuristic::tests::crossed;

    #[test]
    fn test_arc_key_is_undirected() {
        assert_eq!(arc_key(5, 2), arc_key(2, 5));
    }

    #[test]
    fn test_removed_arcs_become_tabu() {
        let (fx, a) = crossed();
        let ev = fx.evaluator();
        let state = SearchState::new(&ev, a).expect("feasible");
        let mut tabu = TabuSearch::new(TabuAttribute::Arcs, 5);
        let mv = Move::TwoOpt {
            route: 0,
            from: 0,
            to: 1,
        };
        let cand = state.evaluate(&ev, mv).expect("feasible");
        tabu.make_tabu(0, &state, &cand);
        // [1, 5, 3] -> [5, 1, 3] drops 0-1 and 5-3.
        assert!(tabu.arcs.contains_key(&(0, 1)));
        assert!(tabu.arcs.contains_key(&(3, 5)));
        assert!(!tabu.arcs.contains_key(&(1, 5)));

        let mut moved = state.clone();
        moved.apply(cand);
        let undo = moved.evaluate(&ev, mv).expect("feasible");
        assert!(tabu.is_tabu(0, &moved, &undo));
    }

    #[test]
    fn test_moved_nodes_become_tabu() {
        let (fx, a) = crossed();
        let ev = fx.evaluator();
        let state = SearchState::new(&ev, a).expect("feasible");
        let mut tabu = TabuSearch::new(TabuAttribute::Nodes, 2);
        let cand = state
            .evaluate(
                &ev,
                Move::Relocate {
                    from_route: 0,
                    from_pos: 1,
                    to_route: 1,
                    to_pos: 0,
                },
            )
            .expect("feasible");
        tabu.make_tabu(0, &state, &cand);
        assert_eq!(tabu.nodes.get(&5), Some(&3));
    }

    #[test]
    fn test_tabu_runs_to_budget_and_keeps_best() {
        let (fx, a) = crossed();
        let ev = fx.evaluator();
        let seed = SearchState::new(&ev, a).expect("feasible");
        for attribute in [TabuAttribute::Arcs, TabuAttribute::Nodes] {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let mut termination = Termination::new(None).with_step_limit(Some(40));
            let best = TabuSearch::new(attribute, 4).improve(&ev, seed.clone(), &mut termination, &mut rng);
            assert!(best.cost() < seed.cost());
            assert!(termination.steps() > 0);
        }
    }
}
