//! Component E — the plane planner.
//!
//! Turns edges + constraints + initial plane positions into a concrete,
//! geography-chained sequence of plane flights, inserting zero-cargo
//! repositioning flights wherever a plane must jump.
//!
//! Edge sets here are `BTreeSet<usize>` rather than `HashSet<usize>`: the
//! extend phase indexes into a `Vec` collected from `available_out[i]`, and
//! that collection order has to be reproducible from the seed alone for a
//! given instance, which `HashSet`'s randomized hasher does not guarantee
//! across process runs.

use crate::constraints::ConstraintStore;
use crate::edges::EdgeStore;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single concrete flight. `cargo` is the zero vector for a
/// repositioning flight; otherwise it is exactly some edge's cargo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaneFlight {
    pub plane: usize,
    pub from: usize,
    pub to: usize,
    pub cargo: Vec<u64>,
}

struct PlannerState<'a> {
    edges: &'a EdgeStore,
    constraints: &'a ConstraintStore,
    n_cities: usize,
    all_out: Vec<BTreeSet<usize>>,
    all_in: Vec<BTreeSet<usize>>,
    available_out: Vec<BTreeSet<usize>>,
    available_in: Vec<BTreeSet<usize>>,
    visited: BTreeSet<usize>,
}

impl<'a> PlannerState<'a> {
    fn new(edges: &'a EdgeStore, constraints: &'a ConstraintStore, n_cities: usize) -> Self {
        let mut state = PlannerState {
            edges,
            constraints,
            n_cities,
            all_out: vec![BTreeSet::new(); n_cities],
            all_in: vec![BTreeSet::new(); n_cities],
            available_out: vec![BTreeSet::new(); n_cities],
            available_in: vec![BTreeSet::new(); n_cities],
            visited: BTreeSet::new(),
        };

        for (idx, edge) in edges.iter().enumerate() {
            state.all_out[edge.i].insert(idx);
            state.all_in[edge.j].insert(idx);
            if state.is_available(idx) {
                state.make_available(idx);
            }
        }

        state
    }

    fn is_available(&self, idx: usize) -> bool {
        self.constraints
            .predecessors_of(idx)
            .all(|pred| self.visited.contains(&pred))
    }

    fn make_available(&mut self, idx: usize) {
        let edge = self.edges.get(idx);
        self.available_out[edge.i].insert(idx);
        self.available_in[edge.j].insert(idx);
    }

    fn visit_edge(&mut self, idx: usize) {
        let edge = self.edges.get(idx);
        self.available_out[edge.i].remove(&idx);
        self.available_in[edge.j].remove(&idx);
        self.visited.insert(idx);

        let dest = edge.j;
        let candidates: Vec<usize> = self.all_out[dest].iter().copied().collect();
        for candidate in candidates {
            let already_visited = self.visited.contains(&candidate);
            let already_available = self.available_out[dest].contains(&candidate);
            if !already_visited && !already_available && self.is_available(candidate) {
                self.make_available(candidate);
            }
        }
    }

    fn all_visited(&self) -> bool {
        self.visited.len() == self.edges.len()
    }

    fn stranded_cities(&self) -> Vec<usize> {
        (0..self.n_cities)
            .filter(|&c| !self.available_out[c].is_empty())
            .collect()
    }
}

/// Runs the full two-phase schedule (extend, then jump, repeating) until
/// every edge has been visited.
pub fn plan_flights<R: Rng>(
    edges: &EdgeStore,
    constraints: &ConstraintStore,
    n_cities: usize,
    plane_start: &[usize],
    rng: &mut R,
) -> Vec<PlaneFlight> {
    let mut state = PlannerState::new(edges, constraints, n_cities);
    let mut plane_pos: Vec<usize> = plane_start.to_vec();
    let mut flights: Vec<PlaneFlight> = Vec::new();

    if edges.is_empty() {
        return flights;
    }
    assert!(!plane_pos.is_empty(), "edges exist but no planes to fly them");

    loop {
        extend_phase(&mut state, &mut plane_pos, &mut flights, rng);

        if state.all_visited() {
            break;
        }

        let jump_cities = state.stranded_cities();
        if jump_cities.is_empty() {
            break;
        }

        let jump_j = *jump_cities
            .iter()
            .max_by_key(|&&c| {
                (
                    state.available_out[c].len() as i64 - state.available_in[c].len() as i64,
                    -(c as i64),
                )
            })
            .expect("jump_cities is non-empty");

        let jump_plane = (0..plane_pos.len())
            .min_by_key(|&p| {
                let pos = plane_pos[p];
                let local_work = state.all_out[pos]
                    .iter()
                    .filter(|idx| !state.visited.contains(idx))
                    .count();
                (local_work, p)
            })
            .expect("plane_pos is non-empty");

        let from = plane_pos[jump_plane];
        flights.push(PlaneFlight {
            plane: jump_plane,
            from,
            to: jump_j,
            cargo: vec![0u64; n_cities],
        });
        plane_pos[jump_plane] = jump_j;

        log::debug!(
            "plane_planner: plane {} repositions {} -> {}",
            jump_plane,
            from,
            jump_j
        );
    }

    assert!(
        state.all_visited(),
        "plane planner terminated without visiting every edge"
    );
    flights
}

fn extend_phase<R: Rng>(
    state: &mut PlannerState,
    plane_pos: &mut [usize],
    flights: &mut Vec<PlaneFlight>,
    rng: &mut R,
) {
    loop {
        let mut extended_any = false;
        for p in 0..plane_pos.len() {
            loop {
                let i = plane_pos[p];
                let out_edges: Vec<usize> = state.available_out[i].iter().copied().collect();
                if out_edges.is_empty() {
                    break;
                }
                let pick = out_edges[rng.gen_range(0..out_edges.len())];
                state.visit_edge(pick);

                let edge = state.edges.get(pick);
                flights.push(PlaneFlight {
                    plane: p,
                    from: edge.i,
                    to: edge.j,
                    cargo: edge.cargo.clone(),
                });
                plane_pos[p] = edge.j;
                extended_any = true;
            }
        }
        if !extended_any {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintStore;
    use crate::edges::EdgeStore;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn single_edge_single_plane_no_constraints() {
        let mut edges = EdgeStore::new(30, 2);
        edges.add(0, 1, 15);
        let constraints = ConstraintStore::new(1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let flights = plan_flights(&edges, &constraints, 2, &[0], &mut rng);
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].plane, 0);
        assert_eq!(flights[0].from, 0);
        assert_eq!(flights[0].to, 1);
    }

    #[test]
    fn two_independent_edges_two_planes_no_repositioning() {
        let mut edges = EdgeStore::new(30, 4);
        edges.add(0, 1, 30);
        edges.add(2, 3, 30);
        let constraints = ConstraintStore::new(2);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let flights = plan_flights(&edges, &constraints, 4, &[0, 2], &mut rng);
        assert_eq!(flights.len(), 2);
        assert!(flights.iter().all(|f| f.cargo.iter().sum::<u64>() > 0));
    }

    #[test]
    fn disconnected_edges_one_plane_requires_repositioning() {
        let mut edges = EdgeStore::new(30, 3);
        edges.add(0, 1, 20);
        edges.add(2, 1, 5);
        let constraints = ConstraintStore::new(2);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let flights = plan_flights(&edges, &constraints, 3, &[0], &mut rng);
        // Two cargo flights and at least one repositioning.
        let cargo_flights = flights.iter().filter(|f| f.cargo.iter().sum::<u64>() > 0).count();
        let reposition_flights = flights.len() - cargo_flights;
        assert_eq!(cargo_flights, 2);
        assert!(reposition_flights >= 1);
    }

    #[test]
    fn respects_precedence_constraint() {
        let mut edges = EdgeStore::new(30, 3);
        let e0 = edges.add(0, 1, 25);
        edges.increment(e0, 2, 5);
        let e1 = edges.add(1, 2, 5);
        let mut constraints = ConstraintStore::new(2);
        constraints.add(e0, e1);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let flights = plan_flights(&edges, &constraints, 3, &[0], &mut rng);
        let pos0 = flights.iter().position(|f| f.from == 0 && f.to == 1).unwrap();
        let pos1 = flights.iter().position(|f| f.from == 1 && f.to == 2).unwrap();
        assert!(pos0 < pos1);
    }

    #[test]
    fn geography_is_chained_per_plane() {
        let mut edges = EdgeStore::new(10, 4);
        edges.add(0, 1, 5);
        edges.add(1, 2, 5);
        edges.add(2, 3, 5);
        let constraints = ConstraintStore::new(3);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let flights = plan_flights(&edges, &constraints, 4, &[0], &mut rng);
        let this_plane: Vec<&PlaneFlight> = flights.iter().filter(|f| f.plane == 0).collect();
        for w in this_plane.windows(2) {
            assert_eq!(w[0].to, w[1].from);
        }
    }

    #[test]
    fn no_edges_no_flights() {
        let edges = EdgeStore::new(30, 2);
        let constraints = ConstraintStore::new(0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let flights = plan_flights(&edges, &constraints, 2, &[0], &mut rng);
        assert!(flights.is_empty());
    }
}
