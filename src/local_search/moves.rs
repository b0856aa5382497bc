//! Neighbourhood moves over an [`Assignment`].

use crate::evaluation::Assignment;

/// A local modification of an assignment.
///
/// Positions index the node sequences of [`Assignment::routes`], which
/// exclude the depot sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    /// Reverses `route[from..=to]`.
    TwoOpt { route: usize, from: usize, to: usize },
    /// Cuts `len` nodes starting at `start` and reinserts them at `target`
    /// in the shortened route.
    OrOpt {
        route: usize,
        start: usize,
        len: usize,
        target: usize,
    },
    /// Moves one node to position `to_pos` of another route.
    Relocate {
        from_route: usize,
        from_pos: usize,
        to_route: usize,
        to_pos: usize,
    },
    /// Moves a pickup and its delivery to another route. In the target, the
    /// delivery goes before the node at `to_delivery` and the pickup before
    /// the node at `to_pickup`, with `to_pickup <= to_delivery`.
    RelocatePair {
        from_route: usize,
        pickup_pos: usize,
        delivery_pos: usize,
        to_route: usize,
        to_pickup: usize,
        to_delivery: usize,
    },
    /// Swaps two nodes, within a route or across routes.
    Exchange {
        route_a: usize,
        pos_a: usize,
        route_b: usize,
        pos_b: usize,
    },
    /// 2-opt*: swaps the tails of two routes after the given cut points.
    CrossExchange {
        route_a: usize,
        cut_a: usize,
        route_b: usize,
        cut_b: usize,
    },
    /// Serves an unassigned optional node at `pos` of `route`.
    Insert { node: usize, route: usize, pos: usize },
    /// Drops the optional node at `pos` of `route`.
    Remove { route: usize, pos: usize },
}

impl Move {
    /// Operator name, for logging.
    pub fn operator(&self) -> &'static str {
        match self {
            Self::TwoOpt { .. } => "2-opt",
            Self::OrOpt { .. } => "or-opt",
            Self::Relocate { .. } => "relocate",
            Self::RelocatePair { .. } => "relocate-pair",
            Self::Exchange { .. } => "exchange",
            Self::CrossExchange { .. } => "2-opt*",
            Self::Insert { .. } => "insert",
            Self::Remove { .. } => "remove",
        }
    }

    /// New node sequences of every route the move touches.
    pub fn modified_routes(&self, a: &Assignment) -> Vec<(usize, Vec<usize>)> {
        match *self {
            Self::TwoOpt { route, from, to } => {
                let mut r = a.routes[route].clone();
                r[from..=to].reverse();
                vec![(route, r)]
            }
            Self::OrOpt {
                route,
                start,
                len,
                target,
            } => {
                let mut r = a.routes[route].clone();
                let segment: Vec<usize> = r.drain(start..start + len).collect();
                r.splice(target..target, segment);
                vec![(route, r)]
            }
            Self::Relocate {
                from_route,
                from_pos,
                to_route,
                to_pos,
            } => {
                let mut from = a.routes[from_route].clone();
                let node = from.remove(from_pos);
                let mut to = a.routes[to_route].clone();
                to.insert(to_pos, node);
                vec![(from_route, from), (to_route, to)]
            }
            Self::RelocatePair {
                from_route,
                pickup_pos,
                delivery_pos,
                to_route,
                to_pickup,
                to_delivery,
            } => {
                let source = &a.routes[from_route];
                let (pickup, delivery) = (source[pickup_pos], source[delivery_pos]);
                let from: Vec<usize> = source
                    .iter()
                    .enumerate()
                    .filter(|&(k, _)| k != pickup_pos && k != delivery_pos)
                    .map(|(_, &n)| n)
                    .collect();
                let mut to = a.routes[to_route].clone();
                to.insert(to_delivery, delivery);
                to.insert(to_pickup, pickup);
                vec![(from_route, from), (to_route, to)]
            }
            Self::Exchange {
                route_a,
                pos_a,
                route_b,
                pos_b,
            } => {
                if route_a == route_b {
                    let mut r = a.routes[route_a].clone();
                    r.swap(pos_a, pos_b);
                    vec![(route_a, r)]
                } else {
                    let mut ra = a.routes[route_a].clone();
                    let mut rb = a.routes[route_b].clone();
                    std::mem::swap(&mut ra[pos_a], &mut rb[pos_b]);
                    vec![(route_a, ra), (route_b, rb)]
                }
            }
            Self::CrossExchange {
                route_a,
                cut_a,
                route_b,
                cut_b,
            } => {
                let (ra, rb) = (&a.routes[route_a], &a.routes[route_b]);
                let mut na = ra[..cut_a].to_vec();
                na.extend_from_slice(&rb[cut_b..]);
                let mut nb = rb[..cut_b].to_vec();
                nb.extend_from_slice(&ra[cut_a..]);
                vec![(route_a, na), (route_b, nb)]
            }
            Self::Insert { node, route, pos } => {
                let mut r = a.routes[route].clone();
                r.insert(pos, node);
                vec![(route, r)]
            }
            Self::Remove { route, pos } => {
                let mut r = a.routes[route].clone();
                r.remove(pos);
                vec![(route, r)]
            }
        }
    }

    /// Node leaving the unassigned list (`Insert`) or joining it (`Remove`).
    pub fn unassigned_change(&self, a: &Assignment) -> Option<(usize, bool)> {
        match *self {
            Self::Insert { node, .. } => Some((node, false)),
            Self::Remove { route, pos } => Some((a.routes[route][pos], true)),
            _ => None,
        }
    }

    /// Nodes whose position the move changes most directly.
    pub fn moved_nodes(&self, a: &Assignment) -> Vec<usize> {
        match *self {
            Self::TwoOpt { route, from, to } => vec![a.routes[route][from], a.routes[route][to]],
            Self::OrOpt {
                route, start, len, ..
            } => a.routes[route][start..start + len].to_vec(),
            Self::Relocate {
                from_route,
                from_pos,
                ..
            } => vec![a.routes[from_route][from_pos]],
            Self::RelocatePair {
                from_route,
                pickup_pos,
                delivery_pos,
                ..
            } => vec![a.routes[from_route][pickup_pos], a.routes[from_route][delivery_pos]],
            Self::Exchange {
                route_a,
                pos_a,
                route_b,
                pos_b,
            } => vec![a.routes[route_a][pos_a], a.routes[route_b][pos_b]],
            Self::CrossExchange {
                route_a,
                cut_a,
                route_b,
                cut_b,
            } => a.routes[route_a]
                .get(cut_a)
                .into_iter()
                .chain(a.routes[route_b].get(cut_b))
                .copied()
                .collect(),
            Self::Insert { node, .. } => vec![node],
            Self::Remove { route, pos } => vec![a.routes[route][pos]],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment() -> Assignment {
        Assignment {
            routes: vec![vec![1, 2, 3, 4], vec![5, 6], vec![]],
            unassigned: vec![7],
        }
    }

    fn routes_after(mv: Move) -> Vec<(usize, Vec<usize>)> {
        mv.modified_routes(&assignment())
    }

    #[test]
    fn test_two_opt_reverses() {
        let out = routes_after(Move::TwoOpt { route: 0, from: 1, to: 3 });
        assert_eq!(out, vec![(0, vec![1, 4, 3, 2])]);
    }

    #[test]
    fn test_or_opt_moves_segment() {
        let out = routes_after(Move::OrOpt {
            route: 0,
            start: 0,
            len: 2,
            target: 2,
        });
        assert_eq!(out, vec![(0, vec![3, 4, 1, 2])]);
    }

    #[test]
    fn test_relocate_and_pair() {
        let out = routes_after(Move::Relocate {
            from_route: 0,
            from_pos: 1,
            to_route: 2,
            to_pos: 0,
        });
        assert_eq!(out, vec![(0, vec![1, 3, 4]), (2, vec![2])]);

        let out = routes_after(Move::RelocatePair {
            from_route: 0,
            pickup_pos: 0,
            delivery_pos: 2,
            to_route: 1,
            to_pickup: 1,
            to_delivery: 2,
        });
        assert_eq!(out, vec![(0, vec![2, 4]), (1, vec![5, 1, 6, 3])]);
    }

    #[test]
    fn test_exchange_and_cross() {
        let out = routes_after(Move::Exchange {
            route_a: 0,
            pos_a: 0,
            route_b: 1,
            pos_b: 1,
        });
        assert_eq!(out, vec![(0, vec![6, 2, 3, 4]), (1, vec![5, 1])]);

        let out = routes_after(Move::CrossExchange {
            route_a: 0,
            cut_a: 2,
            route_b: 1,
            cut_b: 1,
        });
        assert_eq!(out, vec![(0, vec![1, 2, 6]), (1, vec![5, 3, 4])]);
    }

    #[test]
    fn test_insert_remove() {
        let a = assignment();
        let ins = Move::Insert { node: 7, route: 2, pos: 0 };
        assert_eq!(ins.modified_routes(&a), vec![(2, vec![7])]);
        assert_eq!(ins.unassigned_change(&a), Some((7, false)));
        let rem = Move::Remove { route: 1, pos: 0 };
        assert_eq!(rem.unassigned_change(&a), Some((5, true)));
        assert_eq!(rem.moved_nodes(&a), vec![5]);
    }
}
