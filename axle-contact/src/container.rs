//! Per-step solver body storage and the island scratch.

use crate::SolverBody;
use axle_types::ParticleId;
use hashbrown::HashMap;

/// Dense per-step storage of solver bodies, keyed by particle.
///
/// Populated by the evolution's gather phase at the start of every substep
/// and reset afterwards; constraints hold plain indices into it for the
/// duration of the step.
#[derive(Debug, Default)]
pub struct SolverBodyContainer {
    bodies: Vec<SolverBody>,
    index: HashMap<ParticleId, usize>,
}

impl SolverBodyContainer {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of gathered bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether no bodies have been gathered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Drop all bodies, keeping allocations for the next step.
    pub fn reset(&mut self) {
        self.bodies.clear();
        self.index.clear();
    }

    /// Index of the solver body for `particle`, inserting one built by
    /// `make` if the particle has not been gathered yet.
    pub fn find_or_add(
        &mut self,
        particle: ParticleId,
        make: impl FnOnce() -> SolverBody,
    ) -> usize {
        *self.index.entry(particle).or_insert_with(|| {
            self.bodies.push(make());
            self.bodies.len() - 1
        })
    }

    /// Index of an already-gathered body, if any.
    #[must_use]
    pub fn index_of(&self, particle: ParticleId) -> Option<usize> {
        self.index.get(&particle).copied()
    }

    /// Body at a gather index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SolverBody> {
        self.bodies.get(index)
    }

    /// Mutable body at a gather index.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut SolverBody> {
        self.bodies.get_mut(index)
    }

    /// Iterate over gathered bodies.
    pub fn iter(&self) -> impl Iterator<Item = &SolverBody> {
        self.bodies.iter()
    }

    /// Iterate mutably over gathered bodies.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SolverBody> {
        self.bodies.iter_mut()
    }
}

/// Per-island scratch: the constraint indices participating in the current
/// solve batch.
///
/// An opaque hand-off between the gather phase (which registers constraint
/// indices) and the apply/scatter phases (which iterate them in order). The
/// evolution owns one per solver instance; islands are not partitioned
/// further inside this stack.
#[derive(Debug, Default)]
pub struct IslandScratch {
    indices: Vec<usize>,
}

impl IslandScratch {
    /// Create an empty scratch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear and reserve for an expected constraint count.
    pub fn reset(&mut self, expected: usize) {
        self.indices.clear();
        self.indices.reserve(expected);
    }

    /// Register a constraint index for this batch.
    pub fn push(&mut self, constraint_index: usize) {
        self.indices.push(constraint_index);
    }

    /// The registered constraint indices, in registration order.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of registered constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_find_or_add_deduplicates() {
        let mut container = SolverBodyContainer::new();
        let id = ParticleId::new(1);
        let a = container.find_or_add(id, || SolverBody::static_at(Point3::origin()));
        let b = container.find_or_add(id, || SolverBody::static_at(Point3::origin()));
        assert_eq!(a, b);
        assert_eq!(container.len(), 1);
        assert_eq!(container.index_of(id), Some(a));
    }

    #[test]
    fn test_reset_clears_lookup() {
        let mut container = SolverBodyContainer::new();
        let id = ParticleId::new(2);
        container.find_or_add(id, || SolverBody::static_at(Point3::origin()));
        container.reset();
        assert!(container.is_empty());
        assert_eq!(container.index_of(id), None);
    }

    #[test]
    fn test_scratch_preserves_order() {
        let mut scratch = IslandScratch::new();
        scratch.reset(3);
        scratch.push(2);
        scratch.push(0);
        scratch.push(1);
        assert_eq!(scratch.indices(), &[2, 0, 1]);
    }
}
