//! Component C — the transitively-closed precedence relation over edge
//! indices.
//!
//! Kept as sparse successor/predecessor adjacency sets rather than a dense
//! bit matrix: realistic edge counts here are in the hundreds to low
//! thousands, where `HashSet` adjacency is the cheaper default. Only
//! membership and set size are ever read back out of these sets, never
//! iteration order, so the randomized hasher is not a determinism concern
//! here the way it would be for a container whose iteration order feeds a
//! random pick.

use std::collections::HashSet;

pub struct ConstraintStore {
    /// `successors[a]` = all `b` with `(a, b)` in the relation.
    successors: Vec<HashSet<usize>>,
    /// `predecessors[b]` = all `a` with `(a, b)` in the relation.
    predecessors: Vec<HashSet<usize>>,
}

impl ConstraintStore {
    pub fn new(n_edges_hint: usize) -> Self {
        ConstraintStore {
            successors: Vec::with_capacity(n_edges_hint),
            predecessors: Vec::with_capacity(n_edges_hint),
        }
    }

    fn ensure_capacity(&mut self, idx: usize) {
        if idx >= self.successors.len() {
            self.successors.resize_with(idx + 1, HashSet::new);
            self.predecessors.resize_with(idx + 1, HashSet::new);
        }
    }

    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.successors
            .get(a)
            .map(|s| s.contains(&b))
            .unwrap_or(false)
    }

    pub fn predecessors_of(&self, b: usize) -> impl Iterator<Item = usize> + '_ {
        self.predecessors
            .get(b)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn successors_of(&self, a: usize) -> impl Iterator<Item = usize> + '_ {
        self.successors
            .get(a)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// Inserts `(a, b)` and transitively closes the relation. Asserts the
    /// caller never introduces a cycle: adding `(a, b)` when `(b, a)` is
    /// already present is a bug upstream, not a recoverable condition.
    pub fn add(&mut self, a: usize, b: usize) {
        assert!(a != b, "a constraint cannot relate an edge to itself");
        self.ensure_capacity(a.max(b));

        if self.contains(b, a) {
            panic!("constraint ({}, {}) would introduce a cycle", a, b);
        }
        if self.contains(a, b) {
            return;
        }

        self.successors[a].insert(b);
        self.predecessors[b].insert(a);

        // Close transitively: anything that must precede a now must
        // precede b, and anything b must precede, a must also precede.
        let preds_of_a: Vec<usize> = self.predecessors_of(a).collect();
        let succs_of_b: Vec<usize> = self.successors_of(b).collect();

        for x in preds_of_a {
            self.add(x, b);
        }
        for y in succs_of_b {
            self.add(a, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_transitively_closed() {
        let mut c = ConstraintStore::new(4);
        c.add(0, 1);
        c.add(1, 2);
        assert!(c.contains(0, 2));
        assert!(c.contains(0, 1));
        assert!(c.contains(1, 2));
    }

    #[test]
    fn add_is_idempotent() {
        let mut c = ConstraintStore::new(2);
        c.add(0, 1);
        c.add(0, 1);
        assert!(c.contains(0, 1));
    }

    #[test]
    #[should_panic]
    fn add_reverse_of_existing_panics() {
        let mut c = ConstraintStore::new(2);
        c.add(0, 1);
        c.add(1, 0);
    }

    #[test]
    fn predecessors_and_successors_reflect_closure() {
        let mut c = ConstraintStore::new(5);
        c.add(0, 1);
        c.add(1, 2);
        c.add(2, 3);
        let preds_of_3: HashSet<usize> = c.predecessors_of(3).collect();
        assert_eq!(preds_of_3, [0, 1, 2].into_iter().collect());
        let succs_of_0: HashSet<usize> = c.successors_of(0).collect();
        assert_eq!(succs_of_0, [1, 2, 3].into_iter().collect());
    }
}
