//! Component D — the edge planner.
//!
//! Turns outstanding demand into a multiset of edges (component B) plus
//! the precedence constraints (component C) those edges' transshipment
//! chains require.

use crate::constraints::ConstraintStore;
use crate::demand::DemandModel;
use crate::edges::EdgeStore;
use std::collections::VecDeque;

/// Runs the full edge-planning pass: bulk direct flights, transshipment
/// reuse, then a residual direct flight, for every origin-destination
/// pair in descending-demand order.
pub fn plan_edges(demand: &mut DemandModel) -> (EdgeStore, ConstraintStore) {
    let capacity = demand.capacity();
    let n_cities = demand.n_cities();
    let mut edges = EdgeStore::new(capacity, n_cities);
    let mut constraints = ConstraintStore::new(0);

    let pairs = demand.pairs_by_descending_demand();

    for (i, j) in pairs {
        // 1. Bulk direct flights: saturate full-capacity edges first.
        while demand.remaining(i, j) >= capacity {
            edges.add(i, j, capacity);
            demand.decrement(i, j, capacity);
            log::trace!("edge_planner: bulk direct {} -> {} (capacity {})", i, j, capacity);
        }

        // 2. Transshipment reuse: route the remainder through existing
        // under-filled edges wherever a constraint-respecting path exists.
        while demand.remaining(i, j) > 0 {
            let path = match find_path(&edges, &constraints, n_cities, i, j) {
                Some(p) => p,
                None => break,
            };

            let path_cap = path
                .iter()
                .map(|&idx| edges.remaining(idx))
                .min()
                .expect("path is non-empty");
            let amount = path_cap.min(demand.remaining(i, j));

            for &idx in &path {
                edges.increment(idx, j, amount);
            }
            for pair in path.windows(2) {
                constraints.add(pair[0], pair[1]);
            }
            demand.decrement(i, j, amount);
            log::trace!(
                "edge_planner: transshipped {} crates {} -> {} via path {:?}",
                amount, i, j, path
            );
        }

        // 3. Residual direct flight for whatever transshipment couldn't
        // absorb.
        let residual = demand.remaining(i, j);
        if residual > 0 {
            edges.add(i, j, residual);
            demand.decrement(i, j, residual);
        }

        log::debug!("edge_planner: pair ({}, {}) fully routed", i, j);
    }

    (edges, constraints)
}

/// Breadth-first search for a constraint-respecting path from `i` to `j`
/// over the current edge graph (nodes = cities, arcs = existing edges with
/// spare capacity). First discovery wins; ties are broken by the order
/// edges were appended to the store, which in turn orders cities by index
/// because edges are scanned in index order at each node.
///
/// An edge `E` leaving the current node, with path-so-far `P`, is usable
/// only if none of `P`'s edges already has `(E, p)` as a constraint — a
/// forward-only guard against appending `E` when doing so would invert an
/// existing precedence. It deliberately does not check `(p, E)`
/// symmetrically: the tighter check would reject some valid transshipment
/// chains this planner is meant to find, so it stays asymmetric on purpose.
fn find_path(
    edges: &EdgeStore,
    constraints: &ConstraintStore,
    n_cities: usize,
    from: usize,
    to: usize,
) -> Option<Vec<usize>> {
    let mut paths: Vec<Option<Vec<usize>>> = vec![None; n_cities];
    paths[from] = Some(Vec::new());
    let mut queue: VecDeque<usize> = VecDeque::new();
    queue.push_back(from);

    while let Some(u) = queue.pop_front() {
        let path_to_u = paths[u].clone().expect("node was enqueued with a path");

        for (edge_idx, edge) in edges.iter().enumerate() {
            if edge.i != u {
                continue;
            }
            if paths[edge.j].is_some() {
                continue;
            }
            if edges.remaining(edge_idx) == 0 {
                continue;
            }

            let usable = path_to_u
                .iter()
                .all(|&p| !constraints.contains(edge_idx, p));
            if !usable {
                continue;
            }

            let mut extended = path_to_u.clone();
            extended.push(edge_idx);
            paths[edge.j] = Some(extended);
            queue.push_back(edge.j);
        }
    }

    paths[to].take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;

    fn demand_from(capacity: u64, crates: Vec<Vec<u64>>) -> DemandModel {
        let n = crates.len();
        let instance = Instance {
            capacity,
            n_cities: n,
            crates,
            plane_start: vec![0],
        };
        DemandModel::from_instance(&instance)
    }

    #[test]
    fn single_pair_single_edge() {
        let mut demand = demand_from(30, vec![vec![0, 15], vec![0, 0]]);
        let (edges, constraints) = plan_edges(&mut demand);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges.get(0).i, 0);
        assert_eq!(edges.get(0).j, 1);
        assert_eq!(edges.get(0).cargo, vec![0, 15]);
        assert_eq!(constraints.successors_of(0).count(), 0);
    }

    #[test]
    fn overflow_splits_into_bulk_and_residual() {
        let mut demand = demand_from(30, vec![vec![0, 65], vec![0, 0]]);
        let (edges, _constraints) = plan_edges(&mut demand);
        assert_eq!(edges.len(), 3);
        let totals: Vec<u64> = (0..3).map(|idx| edges.get(idx).total_cargo()).collect();
        let mut sorted = totals.clone();
        sorted.sort();
        assert_eq!(sorted, vec![5, 30, 30]);
    }

    #[test]
    fn no_shared_path_creates_two_independent_edges() {
        let mut demand = demand_from(
            30,
            vec![vec![0, 20, 0], vec![0, 0, 0], vec![0, 5, 0]],
        );
        let (edges, constraints) = plan_edges(&mut demand);
        assert_eq!(edges.len(), 2);
        assert_eq!(constraints.successors_of(0).count(), 0);
        assert_eq!(constraints.successors_of(1).count(), 0);
    }

    #[test]
    fn transshipment_adds_ordering_constraint() {
        // Pre-existing edge 0->1 with slack, then demand 0->2 that must
        // route through it plus a new 1->2 edge.
        let mut demand = demand_from(30, vec![vec![0, 25, 5], vec![0, 0, 0], vec![0, 0, 0]]);
        let (edges, constraints) = plan_edges(&mut demand);
        // (0,1) processed first (largest demand): edge0 = 0->1 (25).
        // (0,2) processed next: edge0 has 5 slack, reused for the 5
        // c-bound crates, then a fresh 1->2 edge continues them.
        assert!(edges.len() >= 2);
        let e0 = edges.get(0);
        assert_eq!((e0.i, e0.j), (0, 1));
        assert_eq!(e0.cargo[1], 25);
        assert_eq!(e0.cargo[2], 5);
        let continuation = (0..edges.len())
            .find(|&idx| edges.get(idx).i == 1 && edges.get(idx).j == 2)
            .expect("a continuation edge 1->2 must exist");
        assert!(constraints.contains(0, continuation));
    }

    #[test]
    fn all_demand_is_routed_exactly() {
        let mut demand = demand_from(
            10,
            vec![
                vec![0, 7, 3, 0],
                vec![2, 0, 0, 5],
                vec![0, 1, 0, 9],
                vec![4, 0, 0, 0],
            ],
        );
        let (edges, _constraints) = plan_edges(&mut demand);
        // Every edge's cargo sums to the total crates originating there
        // that this edge is responsible for; conservation is checked at
        // the Plan level in plan.rs, here we just confirm all demand was
        // drained from the working copy.
        for i in 0..4 {
            for j in 0..4 {
                if i != j {
                    assert_eq!(demand.remaining(i, j), 0);
                }
            }
        }
        assert!(!edges.is_empty());
    }
}
