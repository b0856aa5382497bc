//! Guided local search over arc features.
//!
//! At every local optimum of the augmented objective
//!
//! ```text
//! augmented = cost + λ × Σ penalty(arc)   over the arcs driven
//! ```
//!
//! the driven arcs with the highest utility `cost(arc) / (1 + penalty(arc))`
//! have their penalty raised by one, so the search is pushed off expensive
//! arcs it keeps returning to. `λ` is fixed at the first local optimum to
//! `coefficient × cost / arcs`.
//!
//! # Reference
//!
//! Voudouris, C. & Tsang, E. (1999). "Guided local search and its application
//! to the traveling salesman problem", *European J. Operational Research*
//! 113(2), 469-499.

use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::{first_accepted, Metaheuristic};
use crate::evaluation::RouteEvaluator;
use crate::local_search::{route_arcs, Candidate, SearchState};
use crate::search::Termination;

const EPSILON: f64 = 1e-9;

/// Guided local search with arc penalties.
#[derive(Debug, Clone)]
pub struct GuidedLocalSearch {
    lambda_coefficient: f64,
    lambda: Option<f64>,
    penalties: FxHashMap<(usize, usize), u32>,
}

impl GuidedLocalSearch {
    pub fn new(lambda_coefficient: f64) -> Self {
        Self {
            lambda_coefficient,
            lambda: None,
            penalties: FxHashMap::default(),
        }
    }

    /// Current penalty of the arc between two nodes.
    pub fn penalty(&self, from: usize, to: usize) -> u32 {
        self.penalties.get(&(from, to)).copied().unwrap_or(0)
    }

    fn route_penalty(&self, depot: usize, route: &[usize]) -> i64 {
        if route.is_empty() {
            return 0;
        }
        route_arcs(depot, route)
            .into_iter()
            .map(|(a, b)| i64::from(self.penalty(a, b)))
            .sum()
    }

    fn penalty_delta(&self, depot: usize, state: &SearchState, candidate: &Candidate) -> i64 {
        candidate
            .changed_routes()
            .map(|(v, nodes)| {
                self.route_penalty(depot, nodes) - self.route_penalty(depot, &state.assignment().routes[v])
            })
            .sum()
    }

    /// Raises the penalty of the maximum-utility arcs. `false` if no arc has
    /// positive utility.
    fn penalize(&mut self, evaluator: &RouteEvaluator<'_>, state: &SearchState) -> bool {
        let manager = evaluator.manager();
        let mut features = Vec::new();
        for (v, nodes) in state.assignment().routes.iter().enumerate() {
            if nodes.is_empty() {
                continue;
            }
            let path = manager.route_indices(v, nodes);
            for w in path.windows(2) {
                let key = (manager.index_to_node(w[0]), manager.index_to_node(w[1]));
                let cost = evaluator.arc_cost(v, w[0], w[1]) as f64;
                features.push((key, cost / (1.0 + f64::from(self.penalty(key.0, key.1)))));
            }
        }
        let max = features.iter().map(|&(_, u)| u).fold(0.0, f64::max);
        if max <= EPSILON {
            return false;
        }
        for (key, utility) in features {
            if utility >= max - EPSILON {
                let p = self.penalties.entry(key).or_insert(0);
                *p = p.saturating_add(1);
            }
        }
        true
    }
}

impl Metaheuristic for GuidedLocalSearch {
    fn name(&self) -> &'static str {
        "GUIDED_LOCAL_SEARCH"
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
            let lambda = self.lambda.unwrap_or(0.0);
            let current = state.cost();
            let found = first_accepted(evaluator, &state, termination, |c| {
                let delta = (c.cost - current) as f64
                    + lambda * self.penalty_delta(depot, &state, c) as f64;
                delta < -EPSILON
            });
            match found {
                Some(candidate) => {
                    state.apply(candidate);
                    let improved = state.cost() < best.cost();
                    if improved {
                        debug!(event = "new_best", cost = state.cost());
                        best = state.clone();
                    }
                    termination.record_step(improved);
                }
                None => {
                    if termination.is_expired() {
                        break;
                    }
                    if self.lambda.is_none() {
                        let arcs = state.arcs(depot).len().max(1) as f64;
                        let lambda = self.lambda_coefficient * state.cost() as f64 / arcs;
                        debug!(event = "lambda_set", lambda);
                        self.lambda = Some(lambda);
                    }
                    if !self.penalize(evaluator, &state) {
                        break;
                    }
                    termination.record_step(false);
                }
            }
        }
        best
    }
}
