//! Axis-aligned bounding boxes.

use axle_types::Pose;
use nalgebra::{Point3, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// World- or local-space axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::point(Point3::origin())
    }
}

impl Aabb {
    /// Box from explicit corners.
    #[must_use]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Degenerate box containing a single point.
    #[must_use]
    pub fn point(p: Point3<f64>) -> Self {
        Self { min: p, max: p }
    }

    /// Box centered at `center` with the given half extents.
    #[must_use]
    pub fn from_half_extents(center: Point3<f64>, half: Vector3<f64>) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Half extents of the box.
    #[must_use]
    pub fn half_extents(&self) -> Vector3<f64> {
        (self.max - self.min) * 0.5
    }

    /// The box grown by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vector3::repeat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Whether the boxes overlap (touching counts).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// This local-space box transformed into world space.
    ///
    /// Conservative: the rotated box is re-boxed, so the result can be
    /// larger than the tight bounds of the rotated geometry.
    #[must_use]
    pub fn transformed_by(&self, pose: &Pose) -> Self {
        let rot = pose.rotation.to_rotation_matrix();
        let abs_rot = rot.matrix().abs();
        let center = pose.transform_point(&self.center());
        let half = abs_rot * self.half_extents();
        Self::from_half_extents(center, half)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    #[test]
    fn test_overlap_is_inclusive() {
        let a = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(Point3::new(1.1, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_transformed_by_is_conservative() {
        let local = Aabb::from_half_extents(Point3::origin(), Vector3::new(1.0, 1.0, 1.0));
        let pose = Pose {
            position: Point3::new(0.0, 0.0, 5.0),
            rotation: UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_4),
        };
        let world = local.transformed_by(&pose);
        assert_relative_eq!(world.center().z, 5.0, epsilon = 1e-12);
        // A rotated cube re-boxed grows along x and y.
        assert!(world.half_extents().x > 1.0);
        assert_relative_eq!(world.half_extents().z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_union_contains_both() {
        let a = Aabb::new(Point3::new(-1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(2.0, -1.0, 0.0), Point3::new(3.0, 0.0, 2.0));
        let u = a.union(&b);
        assert_eq!(u.min, Point3::new(-1.0, -1.0, 0.0));
        assert_eq!(u.max, Point3::new(3.0, 1.0, 2.0));
    }
}
