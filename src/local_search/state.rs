//! Incrementally evaluated search state.

use super::Move;
use crate::evaluation::{Assignment, RouteEvaluator, RouteMetrics};

/// A feasible assignment with cached per-route metrics and objective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    assignment: Assignment,
    metrics: Vec<RouteMetrics>,
    routes_cost: i64,
    penalty_cost: i64,
    cost: i64,
}

/// A move evaluated against a state, ready to be applied.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The move.
    pub mv: Move,
    /// Objective after the move.
    pub cost: i64,
    changes: Vec<(usize, Vec<usize>, RouteMetrics)>,
    penalty_cost: i64,
    routes_cost: i64,
}

impl Candidate {
    /// Route sequences after the move, for the touched routes only.
    pub fn changed_routes(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.changes.iter().map(|(v, r, _)| (*v, r.as_slice()))
    }
}

impl SearchState {
    /// Evaluates `assignment`; `None` if a route is infeasible.
    pub fn new(evaluator: &RouteEvaluator<'_>, assignment: Assignment) -> Option<Self> {
        let (metrics, cost) = evaluator.evaluate(&assignment)?;
        let routes_cost = metrics.iter().map(|m| m.cost).sum();
        let penalty_cost = evaluator.unperformed_penalty(&assignment.unassigned);
        Some(Self {
            assignment,
            metrics,
            routes_cost,
            penalty_cost,
            cost,
        })
    }

    /// Current assignment.
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Consumes the state, returning the assignment.
    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }

    /// Cached route metrics.
    pub fn metrics(&self) -> &[RouteMetrics] {
        &self.metrics
    }

    /// Objective value.
    pub fn cost(&self) -> i64 {
        self.cost
    }

    /// Prices `mv`; `None` if it makes a touched route infeasible.
    ///
    /// Only the touched routes are re-evaluated. The global span is
    /// recombined from cached end cumuls.
    pub fn evaluate(&self, evaluator: &RouteEvaluator<'_>, mv: Move) -> Option<Candidate> {
        let mut changes = Vec::with_capacity(2);
        let mut routes_cost = self.routes_cost;
        for (v, nodes) in mv.modified_routes(&self.assignment) {
            let metrics = evaluator.route_metrics(v, &nodes)?;
            routes_cost += metrics.cost - self.metrics[v].cost;
            changes.push((v, nodes, metrics));
        }

        let refs: Vec<&RouteMetrics> = self
            .metrics
            .iter()
            .enumerate()
            .map(|(v, m)| {
                changes
                    .iter()
                    .find(|(c, _, _)| *c == v)
                    .map_or(m, |(_, _, cm)| cm)
            })
            .collect();
        let span_cost = evaluator.global_span_cost(&refs);

        let penalty_cost = match mv.unassigned_change(&self.assignment) {
            Some((node, dropped)) => {
                let p = evaluator.drop_penalty(node).unwrap_or(0);
                if dropped {
                    self.penalty_cost + p
                } else {
                    self.penalty_cost - p
                }
            }
            None => self.penalty_cost,
        };

        Some(Candidate {
            mv,
            cost: routes_cost + span_cost + penalty_cost,
            changes,
            penalty_cost,
            routes_cost,
        })
    }

    /// Applies an evaluated candidate.
    pub fn apply(&mut self, candidate: Candidate) {
        if let Some((node, dropped)) = candidate.mv.unassigned_change(&self.assignment) {
            if dropped {
                self.assignment.unassigned.push(node);
            } else {
                self.assignment.mark_routed(node);
            }
        }
        for (v, nodes, metrics) in candidate.changes {
            self.assignment.routes[v] = nodes;
            self.metrics[v] = metrics;
        }
        self.routes_cost = candidate.routes_cost;
        self.penalty_cost = candidate.penalty_cost;
        self.cost = candidate.cost;
    }

    /// Arcs driven by each route, as node pairs with the depot at both ends.
    pub fn arcs(&self, depot: usize) -> Vec<(usize, usize)> {
        self.assignment
            .routes
            .iter()
            .filter(|r| !r.is_empty())
            .flat_map(|r| route_arcs(depot, r))
            .collect()
    }
}

/// Arcs of one route as node pairs, depot included.
pub(crate) fn route_arcs(depot: usize, route: &[usize]) -> Vec<(usize, usize)> {
    let mut arcs = Vec::with_capacity(route.len() + 1);
    let mut prev = depot;
    for &n in route {
        arcs.push((prev, n));
        prev = n;
    }
    arcs.push((prev, depot));
    arcs
}
