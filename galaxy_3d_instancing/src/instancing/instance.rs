/// Instance - one independently transformable copy of an instanced shape.
///
/// An instance owns its transform (position, rotation, scale) and a few
/// state flags. Its slot in the shared attribute arrays is NOT stored here:
/// it belongs to the `ActiveSet`, which moves instances between slots.

use std::fmt;
use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3};

// ===== INSTANCE ID =====

/// Stable identity of an instance within its container.
///
/// Assigned at creation (0..count) and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u32);

impl InstanceId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ===== FLAGS =====

bitflags! {
    /// Per-instance state bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InstanceFlags: u8 {
        /// Requested visible by the user
        const VISIBLE             = 1 << 0;
        /// Last culling pass found the instance inside the frustum
        const IN_FRUSTUM          = 1 << 1;
        /// Transform changed while inactive; matrix not yet written to its slot
        const MATRIX_NEEDS_UPDATE = 1 << 2;
    }
}

// ===== INSTANCE =====

#[derive(Debug, Clone)]
pub struct Instance {
    id: InstanceId,
    /// World position
    pub position: Vec3,
    /// World rotation
    pub rotation: Quat,
    /// World scale
    pub scale: Vec3,
    flags: InstanceFlags,
}

impl Instance {
    /// New instance at the origin, identity rotation, unit scale,
    /// visible and inside the frustum.
    pub(crate) fn new(id: InstanceId) -> Self {
        Self {
            id,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            flags: InstanceFlags::VISIBLE | InstanceFlags::IN_FRUSTUM,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn flags(&self) -> InstanceFlags {
        self.flags
    }

    /// Requested visibility (set through `InstancedMesh::set_instance_visible`).
    pub fn is_visible(&self) -> bool {
        self.flags.contains(InstanceFlags::VISIBLE)
    }

    /// Cached result of the last culling pass.
    pub fn is_in_frustum(&self) -> bool {
        self.flags.contains(InstanceFlags::IN_FRUSTUM)
    }

    pub fn matrix_needs_update(&self) -> bool {
        self.flags.contains(InstanceFlags::MATRIX_NEEDS_UPDATE)
    }

    pub(crate) fn set_flag(&mut self, flag: InstanceFlags, value: bool) {
        self.flags.set(flag, value);
    }

    /// World matrix composed from scale, rotation and translation.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Replace the transform with `m * current`.
    ///
    /// Shear in `m` is lost: the result is decomposed back into TRS.
    pub fn apply_matrix(&mut self, m: &Mat4) -> &mut Self {
        let (scale, rotation, position) = (*m * self.matrix()).to_scale_rotation_translation();
        self.scale = scale;
        self.rotation = rotation;
        self.position = position;
        self
    }

    /// Pre-multiply the rotation by `q` (world-space rotation).
    pub fn apply_quaternion(&mut self, q: Quat) -> &mut Self {
        self.rotation = (q * self.rotation).normalize();
        self
    }

    /// Rotate around a local-space axis.
    pub fn rotate_on_axis(&mut self, axis: Vec3, angle: f32) -> &mut Self {
        let q = Quat::from_axis_angle(axis.normalize_or_zero(), angle);
        self.rotation = (self.rotation * q).normalize();
        self
    }

    /// Rotate around a world-space axis.
    pub fn rotate_on_world_axis(&mut self, axis: Vec3, angle: f32) -> &mut Self {
        let q = Quat::from_axis_angle(axis.normalize_or_zero(), angle);
        self.apply_quaternion(q)
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
