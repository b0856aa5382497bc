//! Simulated annealing over randomly drawn moves.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::Metaheuristic;
use crate::evaluation::RouteEvaluator;
use crate::local_search::{random_move, SearchState};
use crate::search::Termination;

/// Simulated annealing with geometric cooling.
///
/// The starting temperature is `initial_temperature_ratio × seed cost`, so
/// early on a move worsening the objective by that fraction is accepted with
/// probability `1/e`. The temperature is multiplied by `cooling_rate` after
/// every step.
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    initial_temperature_ratio: f64,
    cooling_rate: f64,
    temperature: f64,
}

impl SimulatedAnnealing {
    pub fn new(initial_temperature_ratio: f64, cooling_rate: f64) -> Self {
        Self {
            initial_temperature_ratio,
            cooling_rate,
            temperature: 0.0,
        }
    }

    /// Current temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    fn is_accepted(&self, delta: i64, rng: &mut ChaCha8Rng) -> bool {
        if delta <= 0 {
            return true;
        }
        if self.temperature <= f64::EPSILON {
            return false;
        }
        rng.random::<f64>() < (-(delta as f64) / self.temperature).exp()
    }
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self::new(0.05, 0.995)
    }
}

impl Metaheuristic for SimulatedAnnealing {
    fn name(&self) -> &'static str {
        "SIMULATED_ANNEALING"
    }

    fn improve(
        &mut self,
        evaluator: &RouteEvaluator<'_>,
        mut state: SearchState,
        termination: &mut Termination<'_>,
        rng: &mut ChaCha8Rng,
    ) -> SearchState {
        self.temperature = (self.initial_temperature_ratio * state.cost().abs() as f64).max(1.0);
        let mut best = state.clone();
        while !termination.should_stop() {
            let candidate =
                random_move(evaluator, state.assignment(), rng).and_then(|mv| state.evaluate(evaluator, mv));
            let mut improved = false;
            if let Some(candidate) = candidate {
                if self.is_accepted(candidate.cost - state.cost(), rng) {
                    state.apply(candidate);
                    if state.cost() < best.cost() {
                        debug!(
                            event = "new_best",
                            cost = state.cost(),
                            temperature = self.temperature
                        );
                        best = state.clone();
                        improved = true;
                    }
                }
            }
            termination.record_step(improved);
            self.temperature *= self.cooling_rate;
        }
        best
    }
}
