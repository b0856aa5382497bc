//! Cheapest-insertion heuristics.
//!
//! Every variant grows routes by inserting whole requests (a lone node, or a
//! pickup with its delivery) at the feasible position that prices cheapest.
//! Variants differ in which requests and routes compete in each round and in
//! how a position is priced:
//!
//! - arc pricing: added arc cost, `c(i, u) + c(u, j) - c(i, j)`
//! - objective pricing: change of the full objective, span and fixed costs included
//!
//! # Reference
//!
//! Rosenkrantz, Stearns & Lewis (1977). "An Analysis of Several Heuristics for
//! the Traveling Salesman Problem", *SIAM J. Computing* 6(3), 563-581.

use crate::evaluation::{Assignment, Request, RouteEvaluator, RouteMetrics};

/// How a candidate insertion is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pricing {
    Arc,
    Objective,
}

/// A priced, feasible insertion.
struct Insertion {
    request: Request,
    vehicle: usize,
    route: Vec<usize>,
    metrics: RouteMetrics,
    delta: i64,
}

/// Assignment under construction, with cached route metrics.
struct Inserter<'e, 'a> {
    evaluator: &'e RouteEvaluator<'a>,
    assignment: Assignment,
    metrics: Vec<RouteMetrics>,
    span_cost: i64,
}

impl<'e, 'a> Inserter<'e, 'a> {
    fn new(evaluator: &'e RouteEvaluator<'a>, assignment: Assignment) -> Result<Self, Assignment> {
        let Some((metrics, _)) = evaluator.evaluate(&assignment) else {
            return Err(assignment);
        };
        let refs: Vec<&RouteMetrics> = metrics.iter().collect();
        let span_cost = evaluator.global_span_cost(&refs);
        Ok(Self {
            evaluator,
            assignment,
            metrics,
            span_cost,
        })
    }

    /// Requests whose nodes are all still unassigned.
    fn pending(&self) -> Vec<Request> {
        self.evaluator
            .requests()
            .into_iter()
            .filter(|r| r.nodes().iter().all(|n| self.assignment.unassigned.contains(n)))
            .collect()
    }

    fn objective_delta(&self, vehicle: usize, metrics: &RouteMetrics, request: &Request) -> i64 {
        let refs: Vec<&RouteMetrics> = self
            .metrics
            .iter()
            .enumerate()
            .map(|(v, m)| if v == vehicle { metrics } else { m })
            .collect();
        let penalty: i64 = request
            .nodes()
            .iter()
            .filter_map(|&n| self.evaluator.drop_penalty(n))
            .sum();
        metrics.cost - self.metrics[vehicle].cost + self.evaluator.global_span_cost(&refs)
            - self.span_cost
            - penalty
    }

    /// Candidate routes for `request` in `vehicle`'s route with their arc delta.
    fn candidates(&self, vehicle: usize, request: Request) -> Vec<(Vec<usize>, i64)> {
        let ev = self.evaluator;
        let route = &self.assignment.routes[vehicle];
        let len = route.len();
        let mut out = Vec::new();
        match request {
            Request::Single(node) => {
                for pos in 0..=len {
                    let delta = ev.insertion_cost(vehicle, route, pos, node);
                    let mut r = route.clone();
                    r.insert(pos, node);
                    out.push((r, delta));
                }
            }
            Request::Pair(pair) => {
                let pickup = ev.manager().node_to_index(pair.pickup);
                let delivery = ev.manager().node_to_index(pair.delivery);
                for p in 0..=len {
                    for d in p..=len {
                        let delta = if d == p {
                            let (prev, next) = ev.insertion_neighbors(vehicle, route, p);
                            ev.arc_cost(vehicle, prev, pickup)
                                + ev.arc_cost(vehicle, pickup, delivery)
                                + ev.arc_cost(vehicle, delivery, next)
                                - ev.arc_cost(vehicle, prev, next)
                        } else {
                            ev.insertion_cost(vehicle, route, p, pair.pickup)
                                + ev.insertion_cost(vehicle, route, d, pair.delivery)
                        };
                        let mut r = route.clone();
                        r.insert(d, pair.delivery);
                        r.insert(p, pair.pickup);
                        out.push((r, delta));
                    }
                }
            }
        }
        out
    }

    /// Cheapest feasible insertion of `request` into `vehicle`'s route.
    fn best_in_route(&self, vehicle: usize, request: Request, pricing: Pricing) -> Option<Insertion> {
        let mut candidates = self.candidates(vehicle, request);
        if pricing == Pricing::Arc {
            // Cheapest first: the first feasible candidate wins.
            candidates.sort_by_key(|(_, delta)| *delta);
        }
        let mut best: Option<Insertion> = None;
        for (route, arc_delta) in candidates {
            let Some(metrics) = self.evaluator.route_metrics(vehicle, &route) else {
                continue;
            };
            let delta = match pricing {
                Pricing::Arc => arc_delta,
                Pricing::Objective => self.objective_delta(vehicle, &metrics, &request),
            };
            if best.as_ref().map_or(true, |b| delta < b.delta) {
                best = Some(Insertion {
                    request,
                    vehicle,
                    route,
                    metrics,
                    delta,
                });
            }
            if pricing == Pricing::Arc {
                break;
            }
        }
        best
    }

    fn best_over_vehicles(&self, request: Request, pricing: Pricing) -> Option<Insertion> {
        (0..self.assignment.routes.len())
            .filter_map(|v| self.best_in_route(v, request, pricing))
            .fold(None, |best: Option<Insertion>, ins| match best {
                Some(b) if b.delta <= ins.delta => Some(b),
                _ => Some(ins),
            })
    }

    fn apply(&mut self, insertion: Insertion) {
        let v = insertion.vehicle;
        self.assignment.routes[v] = insertion.route;
        self.metrics[v] = insertion.metrics;
        for node in insertion.request.nodes() {
            self.assignment.mark_routed(node);
        }
        let refs: Vec<&RouteMetrics> = self.metrics.iter().collect();
        self.span_cost = self.evaluator.global_span_cost(&refs);
    }
}

fn cheaper(best: Option<Insertion>, candidate: Option<Insertion>) -> Option<Insertion> {
    match (best, candidate) {
        (Some(b), Some(c)) if c.delta < b.delta => Some(c),
        (Some(b), _) => Some(b),
        (None, c) => c,
    }
}

/// Repeatedly performs the cheapest insertion over all pending requests and
/// all routes.
pub(crate) fn parallel_cheapest_insertion(
    evaluator: &RouteEvaluator<'_>,
    assignment: Assignment,
    pricing: Pricing,
) -> Assignment {
    let mut inserter = match Inserter::new(evaluator, assignment) {
        Ok(i) => i,
        Err(a) => return a,
    };
    loop {
        let best = inserter
            .pending()
            .into_iter()
            .fold(None, |best, request| {
                cheaper(best, inserter.best_over_vehicles(request, pricing))
            });
        match best {
            Some(insertion) => inserter.apply(insertion),
            None => break,
        }
    }
    inserter.assignment
}

/// Fills one route at a time with its cheapest insertions before opening the next.
pub(crate) fn sequential_cheapest_insertion(
    evaluator: &RouteEvaluator<'_>,
    assignment: Assignment,
) -> Assignment {
    let mut inserter = match Inserter::new(evaluator, assignment) {
        Ok(i) => i,
        Err(a) => return a,
    };
    for vehicle in 0..inserter.assignment.routes.len() {
        loop {
            let best = inserter.pending().into_iter().fold(None, |best, request| {
                cheaper(best, inserter.best_in_route(vehicle, request, Pricing::Arc))
            });
            match best {
                Some(insertion) => inserter.apply(insertion),
                None => break,
            }
        }
    }
    inserter.assignment
}

/// Inserts pending requests in node order, each at its own cheapest position.
///
/// Also used to complete the partial assignments left by arc-based strategies.
pub(crate) fn local_cheapest_insertion(
    evaluator: &RouteEvaluator<'_>,
    assignment: Assignment,
    pricing: Pricing,
) -> Assignment {
    let mut inserter = match Inserter::new(evaluator, assignment) {
        Ok(i) => i,
        Err(a) => return a,
    };
    for request in inserter.pending() {
        if let Some(insertion) = inserter.best_over_vehicles(request, pricing) {
            inserter.apply(insertion);
        }
    }
    inserter.assignment
}
