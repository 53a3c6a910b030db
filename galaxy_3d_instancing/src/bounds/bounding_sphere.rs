/// Bounding sphere of a shape, used by the per-instance (dynamic) culling path.

use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius: radius.abs() }
    }

    /// World-space sphere of a local-space sphere under a TRS transform.
    ///
    /// The radius is scaled by the largest absolute scale component so the
    /// result always encloses the transformed shape.
    pub fn transformed(&self, position: Vec3, rotation: Quat, scale: Vec3) -> BoundingSphere {
        BoundingSphere {
            center: position + rotation * (self.center * scale),
            radius: self.radius * scale.abs().max_element(),
        }
    }
}
