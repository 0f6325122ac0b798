//! Collision acceleration structure bookkeeping.

use crate::Aabb;
use axle_types::ParticleId;
use hashbrown::HashMap;

/// Flat broadphase: particle world bounds, queryable by overlap.
///
/// Membership is the contract that matters for state sync: a particle is
/// present exactly when it has collision enabled on at least one shape (or
/// is force-registered), and the push path inserts, removes and dirties
/// entries as collision flags and transforms change. The spatial index
/// itself is a linear scan; narrowphase pair generation is out of scope
/// for this stack.
#[derive(Debug, Default)]
pub struct AccelerationStructure {
    entries: HashMap<ParticleId, Aabb>,
}

impl AccelerationStructure {
    /// Create an empty structure.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no particles are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or refresh a particle's bounds.
    pub fn update(&mut self, particle: ParticleId, bounds: Aabb) {
        self.entries.insert(particle, bounds);
    }

    /// Remove a particle. Returns whether it was present.
    pub fn remove(&mut self, particle: ParticleId) -> bool {
        self.entries.remove(&particle).is_some()
    }

    /// Whether a particle is registered.
    #[must_use]
    pub fn contains(&self, particle: ParticleId) -> bool {
        self.entries.contains_key(&particle)
    }

    /// Registered bounds of a particle.
    #[must_use]
    pub fn bounds(&self, particle: ParticleId) -> Option<&Aabb> {
        self.entries.get(&particle)
    }

    /// All particles whose bounds overlap `query`, in arbitrary order.
    pub fn overlapping(&self, query: &Aabb) -> impl Iterator<Item = ParticleId> + '_ {
        let query = *query;
        self.entries
            .iter()
            .filter(move |(_, bounds)| bounds.overlaps(&query))
            .map(|(&id, _)| id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn unit_box_at(z: f64) -> Aabb {
        Aabb::from_half_extents(Point3::new(0.0, 0.0, z), Vector3::repeat(0.5))
    }

    #[test]
    fn test_update_then_query() {
        let mut accel = AccelerationStructure::new();
        let near = ParticleId::new(1);
        let far = ParticleId::new(2);
        accel.update(near, unit_box_at(0.0));
        accel.update(far, unit_box_at(100.0));

        let hits: Vec<_> = accel.overlapping(&unit_box_at(0.5)).collect();
        assert_eq!(hits, vec![near]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut accel = AccelerationStructure::new();
        let id = ParticleId::new(1);
        accel.update(id, unit_box_at(0.0));
        assert!(accel.remove(id));
        assert!(!accel.remove(id));
        assert!(accel.is_empty());
    }
}
