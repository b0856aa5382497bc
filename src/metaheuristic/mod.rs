//! Improvement-phase metaheuristics.
//!
//! Each metaheuristic takes a feasible [`SearchState`] and a [`Termination`]
//! budget and returns the best state it observed, which is never worse than
//! the one it was given.
//!
//! | Name | Acceptance |
//! |---|---|
//! | `GREEDY_DESCENT` | first strictly improving move; stops at a local optimum |
//! | `GUIDED_LOCAL_SEARCH` | first move improving the arc-penalised objective |
//! | `SIMULATED_ANNEALING` | random move, worsening accepted with probability `exp(-Δ/T)` |
//! | `TABU_SEARCH` | best move not re-adding a recently removed arc |
//! | `GENERIC_TABU_SEARCH` | best move not touching a recently moved node |

mod annealing;
mod greedy;
mod guided;
mod tabu;

pub use annealing::SimulatedAnnealing;
pub use greedy::GreedyDescent;
pub use guided::GuidedLocalSearch;
pub use tabu::{TabuAttribute, TabuSearch};

use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::RoutingError;
use crate::evaluation::RouteEvaluator;
use crate::local_search::{for_each_move, Candidate, SearchState};
use crate::search::{SearchParameters, Termination};

/// An improvement policy over the local-search neighbourhoods.
pub trait Metaheuristic {
    /// Name used in logs and statistics.
    fn name(&self) -> &'static str;

    /// Improves `state` until the neighbourhood is exhausted or `termination`
    /// says stop, returning the best state seen.
    fn improve(
        &mut self,
        evaluator: &RouteEvaluator<'_>,
        state: SearchState,
        termination: &mut Termination<'_>,
        rng: &mut ChaCha8Rng,
    ) -> SearchState;
}

/// Metaheuristic guiding the improvement phase.
///
/// # Examples
///
/// ```
/// use u_vrp::metaheuristic::LocalSearchMetaheuristic;
///
/// let m: LocalSearchMetaheuristic = "GUIDED_LOCAL_SEARCH".parse().unwrap();
/// assert_eq!(m, LocalSearchMetaheuristic::GuidedLocalSearch);
/// assert_eq!(LocalSearchMetaheuristic::Automatic.resolve(), LocalSearchMetaheuristic::GreedyDescent);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocalSearchMetaheuristic {
    #[default]
    Automatic,
    GreedyDescent,
    GuidedLocalSearch,
    SimulatedAnnealing,
    TabuSearch,
    GenericTabuSearch,
}

impl LocalSearchMetaheuristic {
    /// Every metaheuristic, in lookup-table order.
    pub const ALL: [Self; 6] = [
        Self::Automatic,
        Self::GreedyDescent,
        Self::GuidedLocalSearch,
        Self::SimulatedAnnealing,
        Self::TabuSearch,
        Self::GenericTabuSearch,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Automatic => "AUTOMATIC",
            Self::GreedyDescent => "GREEDY_DESCENT",
            Self::GuidedLocalSearch => "GUIDED_LOCAL_SEARCH",
            Self::SimulatedAnnealing => "SIMULATED_ANNEALING",
            Self::TabuSearch => "TABU_SEARCH",
            Self::GenericTabuSearch => "GENERIC_TABU_SEARCH",
        }
    }

    /// Replaces `Automatic` with greedy descent.
    pub fn resolve(self) -> Self {
        match self {
            Self::Automatic => Self::GreedyDescent,
            other => other,
        }
    }

    /// Instantiates the resolved metaheuristic with its tuning parameters.
    pub fn create(self, params: &SearchParameters) -> Box<dyn Metaheuristic> {
        match self.resolve() {
            Self::Automatic | Self::GreedyDescent => Box::new(GreedyDescent),
            Self::GuidedLocalSearch => Box::new(GuidedLocalSearch::new(
                params.guided_local_search_lambda_coefficient,
            )),
            Self::SimulatedAnnealing => Box::new(SimulatedAnnealing::new(
                params.annealing_initial_temperature_ratio,
                params.annealing_cooling_rate,
            )),
            Self::TabuSearch => Box::new(TabuSearch::new(TabuAttribute::Arcs, params.tabu_tenure)),
            Self::GenericTabuSearch => {
                Box::new(TabuSearch::new(TabuAttribute::Nodes, params.tabu_tenure))
            }
        }
    }
}

impl FromStr for LocalSearchMetaheuristic {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| RoutingError::config(format!("unknown local search metaheuristic `{s}`")))
    }
}

impl fmt::Display for LocalSearchMetaheuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First feasible candidate satisfying `accept`, in neighbourhood order.
///
/// Gives up with `None` as soon as the budget expires.
pub(crate) fn first_accepted<F>(
    evaluator: &RouteEvaluator<'_>,
    state: &SearchState,
    termination: &Termination<'_>,
    mut accept: F,
) -> Option<Candidate>
where
    F: FnMut(&Candidate) -> bool,
{
    let mut found = None;
    let _ = for_each_move(evaluator, state.assignment(), |mv| {
        if termination.is_expired() {
            return ControlFlow::Break(());
        }
        match state.evaluate(evaluator, mv) {
            Some(c) if accept(&c) => {
                found = Some(c);
                ControlFlow::Break(())
            }
            _ => ControlFlow::Continue(()),
        }
    });
    found
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::constructive::tests::{fixture, Fixture};
    use crate::evaluation::Assignment;

    /// Six nodes on two routes, each visiting opposite sides of the depot.
    pub(crate) fn crossed() -> (Fixture, Assignment) {
        let fx = fixture(2, 1000, &[]);
        let a = Assignment {
            routes: vec![vec![1, 5, 3], vec![6, 2, 4]],
            unassigned: vec![],
        };
        (fx, a)
    }

    #[test]
    fn test_names_parse() {
        for m in LocalSearchMetaheuristic::ALL {
            assert_eq!(m.name().parse::<LocalSearchMetaheuristic>().ok(), Some(m));
        }
        assert!("TABU".parse::<LocalSearchMetaheuristic>().is_err());
    }

    #[test]
    fn test_create_resolves_automatic() {
        let params = SearchParameters::default();
        let m = LocalSearchMetaheuristic::Automatic.create(&params);
        assert_eq!(m.name(), "GREEDY_DESCENT");
        let m = LocalSearchMetaheuristic::GenericTabuSearch.create(&params);
        assert_eq!(m.name(), "GENERIC_TABU_SEARCH");
    }

    #[test]
    fn test_every_metaheuristic_never_worsens() {
        let (fx, a) = crossed();
        let ev = fx.evaluator();
        let seed = SearchState::new(&ev, a).expect("feasible");
        let params = SearchParameters::default();
        for m in LocalSearchMetaheuristic::ALL {
            let mut rng = <ChaCha8Rng as rand::SeedableRng>::seed_from_u64(1);
            let mut termination = Termination::new(None).with_step_limit(Some(300));
            let best = m
                .create(&params)
                .improve(&ev, seed.clone(), &mut termination, &mut rng);
            assert!(best.cost() <= seed.cost(), "{m}");
            let (_, full) = ev.evaluate(best.assignment()).expect("feasible");
            assert_eq!(best.cost(), full, "{m}");
        }
    }
}
