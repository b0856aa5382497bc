//! Search parameters, loadable from TOML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constructive::FirstSolutionStrategy;
use crate::error::{Result, RoutingError};
use crate::metaheuristic::LocalSearchMetaheuristic;

/// Parameters of one solve.
///
/// Every field has a default, so a parameter file only lists what it
/// changes.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_vrp::constructive::FirstSolutionStrategy;
/// use u_vrp::metaheuristic::LocalSearchMetaheuristic;
/// use u_vrp::search::SearchParameters;
///
/// let params = SearchParameters::from_toml_str(r#"
///     first_solution_strategy = "SAVINGS"
///     local_search_metaheuristic = "GUIDED_LOCAL_SEARCH"
///     time_limit = 1.5
/// "#).unwrap();
///
/// assert_eq!(params.first_solution_strategy, FirstSolutionStrategy::Savings);
/// assert_eq!(params.local_search_metaheuristic, LocalSearchMetaheuristic::GuidedLocalSearch);
/// assert_eq!(params.time_limit(), Some(Duration::from_millis(1500)));
/// assert_eq!(params.tabu_tenure, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchParameters {
    /// Phase 1 strategy.
    pub first_solution_strategy: FirstSolutionStrategy,
    /// Phase 2 metaheuristic.
    pub local_search_metaheuristic: LocalSearchMetaheuristic,
    /// Phase 2 deadline in seconds.
    pub time_limit: Option<f64>,
    /// Seed of the random generator used by randomised metaheuristics.
    pub random_seed: u64,
    /// Cap on Phase 2 steps.
    pub step_limit: Option<u64>,
    /// Cap on consecutive Phase 2 steps without a new best, applied when no
    /// time limit is set.
    pub unimproved_step_limit: Option<u64>,
    pub guided_local_search_lambda_coefficient: f64,
    pub annealing_initial_temperature_ratio: f64,
    pub annealing_cooling_rate: f64,
    pub tabu_tenure: u64,
    /// Reject unknown strategy and metaheuristic names instead of ignoring them.
    pub strict_names: bool,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            first_solution_strategy: FirstSolutionStrategy::Automatic,
            local_search_metaheuristic: LocalSearchMetaheuristic::Automatic,
            time_limit: None,
            random_seed: 0,
            step_limit: None,
            unimproved_step_limit: Some(200),
            guided_local_search_lambda_coefficient: 0.1,
            annealing_initial_temperature_ratio: 0.05,
            annealing_cooling_rate: 0.995,
            tabu_tenure: 10,
            strict_names: false,
        }
    }
}

impl SearchParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads parameters from a TOML file.
    ///
    /// # Errors
    ///
    /// I/O and parse failures, or values rejected by [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses parameters from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.time_limit {
            if !t.is_finite() || t < 0.0 {
                return Err(RoutingError::config(format!("time limit must be a non-negative number of seconds, got {t}")));
            }
        }
        if !(self.annealing_cooling_rate > 0.0 && self.annealing_cooling_rate <= 1.0) {
            return Err(RoutingError::config("annealing cooling rate must lie in (0, 1]"));
        }
        if !(self.annealing_initial_temperature_ratio >= 0.0) {
            return Err(RoutingError::config("annealing temperature ratio must be non-negative"));
        }
        if !(self.guided_local_search_lambda_coefficient >= 0.0) {
            return Err(RoutingError::config("guided local search lambda coefficient must be non-negative"));
        }
        Ok(())
    }

    /// Phase 2 deadline.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit.and_then(|t| Duration::try_from_secs_f64(t).ok())
    }

    pub fn with_first_solution_strategy(mut self, strategy: FirstSolutionStrategy) -> Self {
        self.first_solution_strategy = strategy;
        self
    }

    pub fn with_local_search_metaheuristic(mut self, metaheuristic: LocalSearchMetaheuristic) -> Self {
        self.local_search_metaheuristic = metaheuristic;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit.as_secs_f64());
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn with_unimproved_step_limit(mut self, limit: u64) -> Self {
        self.unimproved_step_limit = Some(limit);
        self
    }

    pub fn with_tabu_tenure(mut self, tenure: u64) -> Self {
        self.tabu_tenure = tenure;
        self
    }

    pub fn with_strict_names(mut self, strict: bool) -> Self {
        self.strict_names = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = SearchParameters::default();
        assert_eq!(p.first_solution_strategy, FirstSolutionStrategy::Automatic);
        assert_eq!(p.local_search_metaheuristic, LocalSearchMetaheuristic::Automatic);
        assert_eq!(p.time_limit(), None);
        assert_eq!(p.unimproved_step_limit, Some(200));
        assert!(!p.strict_names);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let p = SearchParameters::from_toml_str("").expect("valid");
        assert_eq!(p, SearchParameters::default());
    }

    #[test]
    fn test_unknown_strategy_in_file_is_error() {
        let err = SearchParameters::from_toml_str(r#"first_solution_strategy = "FASTEST""#).unwrap_err();
        assert!(matches!(err, RoutingError::Toml(_)));
    }

    #[test]
    fn test_rejects_negative_time_limit() {
        let err = SearchParameters::from_toml_str("time_limit = -1.0").unwrap_err();
        assert!(matches!(err, RoutingError::Configuration(_)));
    }

    #[test]
    fn test_builder() {
        let p = SearchParameters::new()
            .with_time_limit(Duration::from_secs(2))
            .with_random_seed(9)
            .with_tabu_tenure(3)
            .with_strict_names(true);
        assert_eq!(p.time_limit(), Some(Duration::from_secs(2)));
        assert_eq!(p.random_seed, 9);
        assert_eq!(p.tabu_tenure, 3);
        assert!(p.strict_names);
    }

    #[test]
    fn test_toml_round_trip() {
        let p = SearchParameters::new().with_step_limit(50);
        let text = toml::to_string(&p).expect("serialize");
        assert_eq!(SearchParameters::from_toml_str(&text).expect("parse"), p);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SearchParameters::load("/nonexistent/params.toml").unwrap_err();
        assert!(matches!(err, RoutingError::Io(_)));
    }
}
