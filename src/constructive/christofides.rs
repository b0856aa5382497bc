//! Christofides tour construction.
//!
//! Builds a single tour through the depot and the unpaired nodes: minimum
//! spanning tree, greedy matching of its odd-degree vertices, Euler circuit of
//! the union, and shortcutting of repeated vertices. The tour is then split
//! into vehicle routes in order.
//!
//! Matching is greedy rather than perfect, so the 3/2 bound does not hold.
//! Arc costs are symmetrized as `(c(a, b) + c(b, a)) / 2`.
//!
//! # Reference
//!
//! Christofides, N. (1976). "Worst-case analysis of a new heuristic for the
//! travelling salesman problem", Report 388, GSIA, Carnegie-Mellon University.

use super::sweep::split_into_routes;
use crate::evaluation::{Assignment, RouteEvaluator};

/// Prim's algorithm over a dense weight matrix. Returns tree edges.
fn minimum_spanning_tree(weights: &[Vec<i64>]) -> Vec<(usize, usize)> {
    let n = weights.len();
    let mut in_tree = vec![false; n];
    let mut best = vec![i64::MAX; n];
    let mut parent = vec![usize::MAX; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));
    best[0] = 0;

    for _ in 0..n {
        let Some(u) = (0..n).filter(|&v| !in_tree[v]).min_by_key(|&v| (best[v], v)) else {
            break;
        };
        in_tree[u] = true;
        if parent[u] != usize::MAX {
            edges.push((parent[u], u));
        }
        for v in 0..n {
            if !in_tree[v] && weights[u][v] < best[v] {
                best[v] = weights[u][v];
                parent[v] = u;
            }
        }
    }
    edges
}

/// Pairs odd-degree vertices, cheapest pair first.
fn greedy_matching(weights: &[Vec<i64>], odd: &[usize]) -> Vec<(usize, usize)> {
    let mut pairs: Vec<(i64, usize, usize)> = Vec::new();
    for (k, &a) in odd.iter().enumerate() {
        for &b in &odd[k + 1..] {
            pairs.push((weights[a][b], a, b));
        }
    }
    pairs.sort_unstable();
    let mut matched = vec![false; weights.len()];
    let mut out = Vec::with_capacity(odd.len() / 2);
    for (_, a, b) in pairs {
        if !matched[a] && !matched[b] {
            matched[a] = true;
            matched[b] = true;
            out.push((a, b));
        }
    }
    out
}

/// Hierholzer's algorithm from vertex 0 over a connected multigraph with even degrees.
fn euler_circuit(n: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut adj: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for (id, &(a, b)) in edges.iter().enumerate() {
        adj[a].push((b, id));
        adj[b].push((a, id));
    }
    let mut used = vec![false; edges.len()];
    let mut next = vec![0usize; n];
    let mut stack = vec![0usize];
    let mut circuit = Vec::with_capacity(edges.len() + 1);

    while let Some(&v) = stack.last() {
        while next[v] < adj[v].len() && used[adj[v][next[v]].1] {
            next[v] += 1;
        }
        if let Some(&(u, id)) = adj[v].get(next[v]) {
            used[id] = true;
            stack.push(u);
        } else {
            circuit.push(v);
            stack.pop();
        }
    }
    circuit.reverse();
    circuit
}

/// Visiting order of a shortcut Euler tour from vertex 0 (the depot), depot excluded.
fn tour_order(weights: &[Vec<i64>]) -> Vec<usize> {
    let n = weights.len();
    let mut edges = minimum_spanning_tree(weights);
    let mut degree = vec![0usize; n];
    for &(a, b) in &edges {
        degree[a] += 1;
        degree[b] += 1;
    }
    let odd: Vec<usize> = (0..n).filter(|&v| degree[v] % 2 == 1).collect();
    edges.extend(greedy_matching(weights, &odd));

    let mut seen = vec![false; n];
    seen[0] = true;
    euler_circuit(n, &edges)
        .into_iter()
        .filter(|&v| !std::mem::replace(&mut seen[v], true))
        .collect()
}

/// Routes the unpaired nodes along a Christofides tour.
pub(crate) fn christofides(ev: &RouteEvaluator<'_>, assignment: Assignment) -> Assignment {
    let mut verts = vec![ev.model().depot()];
    let mut nodes: Vec<usize> = assignment
        .unassigned
        .iter()
        .copied()
        .filter(|&n| !ev.is_paired(n))
        .collect();
    nodes.sort_unstable();
    verts.extend(nodes);
    if verts.len() < 2 {
        return assignment;
    }

    let manager = ev.manager();
    let index: Vec<usize> = verts.iter().map(|&n| manager.node_to_index(n)).collect();
    let weights: Vec<Vec<i64>> = index
        .iter()
        .map(|&a| {
            index
                .iter()
                .map(|&b| (ev.arc_cost(0, a, b) + ev.arc_cost(0, b, a)) / 2)
                .collect()
        })
        .collect();

    let order: Vec<usize> = tour_order(&weights).into_iter().map(|v| verts[v]).collect();
    split_into_routes(ev, assignment, &order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructive::tests::fixture;

    fn square() -> Vec<Vec<i64>> {
        // Unit square corners 0..4 with diagonals of 14.
        vec![
            vec![0, 10, 14, 10],
            vec![10, 0, 10, 14],
            vec![14, 10, 0, 10],
            vec![10, 14, 10, 0],
        ]
    }

    #[test]
    fn test_mst_weight() {
        let edges = minimum_spanning_tree(&square());
        assert_eq!(edges.len(), 3);
        let w: i64 = edges.iter().map(|&(a, b)| square()[a][b]).sum();
        assert_eq!(w, 30);
    }

    #[test]
    fn test_euler_circuit_uses_every_edge() {
        let edges = [(0, 1), (1, 2), (2, 0), (0, 3), (3, 0)];
        let circuit = euler_circuit(4, &edges);
        assert_eq!(circuit.len(), edges.len() + 1);
        assert_eq!(circuit.first(), Some(&0));
        assert_eq!(circuit.last(), Some(&0));
    }

    #[test]
    fn test_tour_visits_each_vertex_once() {
        let mut order = tour_order(&square());
        assert_eq!(order.len(), 3);
        order.sort_unstable();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_christofides_routes_all() {
        let fx = fixture(2, 1000, &[]);
        let ev = fx.evaluator();
        let a = christofides(&ev, Assignment::empty(2, ev.customers()));
        assert!(a.unassigned.is_empty());
        assert!(ev.evaluate(&a).is_some());
    }
}
