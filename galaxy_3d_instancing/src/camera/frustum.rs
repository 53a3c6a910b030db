/// Frustum - six clipping planes for visibility culling.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing unit normal
/// - D is the signed distance constant
/// - A point P is inside the frustum if dot(plane, P_homogeneous) >= 0 for all planes
///
/// Rebuilt every frame from the camera's projection * view matrix and
/// never persisted across frames.

use std::fmt;
use std::str::FromStr;
use glam::{Mat4, Vec3, Vec4};
use crate::bounds::{AABB, BoundingSphere};
use crate::error::Result;
use crate::engine_err;

/// Result of a 3-way frustum/AABB classification.
///
/// A tag, not an ordering:
/// - `Out` → skip the entire subtree
/// - `In` → everything below is visible without further testing
/// - `Intersect` → "don't know", descendants must test themselves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityState {
    /// AABB is entirely inside the frustum
    In,
    /// AABB straddles at least one plane
    Intersect,
    /// AABB is entirely outside the frustum
    Out,
}

/// Clip-space depth convention of the projection matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthRange {
    /// OpenGL style: clip z in [-w, w]
    NegativeOneToOne,
    /// Vulkan / WebGPU / D3D style: clip z in [0, w] (glam's `perspective_rh`)
    #[default]
    ZeroToOne,
}

impl FromStr for DepthRange {
    type Err = crate::error::Error;

    /// Accepts `"negative_one_to_one"` / `"gl"` and `"zero_to_one"` / `"vulkan"`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "negative_one_to_one" | "gl" | "opengl" | "webgl" => Ok(DepthRange::NegativeOneToOne),
            "zero_to_one" | "vulkan" | "webgpu" | "d3d" => Ok(DepthRange::ZeroToOne),
            other => Err(engine_err!("galaxy3d::Frustum", "Unsupported depth range '{}'", other)),
        }
    }
}

impl fmt::Display for DepthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthRange::NegativeOneToOne => write!(f, "negative_one_to_one"),
            DepthRange::ZeroToOne => write!(f, "zero_to_one"),
        }
    }
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six frustum planes for culling.
///
/// Works with both perspective and orthographic projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Uses the Gribb & Hartmann method: every plane is a signed sum of
    /// matrix rows. Only the near plane depends on the depth convention.
    /// Planes are normalized so the normal has unit length, which makes
    /// the result independent of any positive scale applied to `vp`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the matrix has a NaN or infinite element.
    pub fn from_view_projection(vp: &Mat4, depth_range: DepthRange) -> Result<Self> {
        if !vp.is_finite() {
            return Err(engine_err!(
                "galaxy3d::Frustum",
                "View-projection matrix has non-finite elements"
            ));
        }

        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let near = match depth_range {
            DepthRange::NegativeOneToOne => row3 + row2,
            DepthRange::ZeroToOne => row2,
        };

        let mut planes = [
            row3 + row0, // Left
            row3 - row0, // Right
            row3 + row1, // Bottom
            row3 - row1, // Top
            near,        // Near
            row3 - row2, // Far
        ];

        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            // Zero-length normals come from degenerate matrices; keep the raw plane
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Ok(Self { planes })
    }

    /// Plane `index` (`PLANE_LEFT..=PLANE_FAR`) as (normal, constant).
    ///
    /// Returns None for an index past `PLANE_FAR`.
    pub fn plane(&self, index: usize) -> Option<(Vec3, f32)> {
        self.planes.get(index).map(|p| (p.truncate(), p.w))
    }

    /// Test if an AABB (potentially) intersects this frustum.
    ///
    /// Positive-vertex test only: may return false positives, never
    /// false negatives.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            normal.dot(Self::positive_vertex(normal, aabb)) + plane.w >= 0.0
        })
    }

    /// Classify an AABB against the frustum (3-way test).
    ///
    /// For each plane:
    /// - p-vertex outside → `Out` immediately
    /// - n-vertex on or outside → downgrade to `Intersect`, keep scanning
    ///   the remaining planes for an `Out` but skip their n-vertex tests
    ///
    /// A zero-extent box classifies like the point it is (`In`/`Out`), or
    /// `Intersect` when it lies exactly on a plane.
    pub fn classify_aabb(&self, aabb: &AABB) -> VisibilityState {
        let mut result = VisibilityState::In;

        for plane in &self.planes {
            let normal = plane.truncate();

            if normal.dot(Self::positive_vertex(normal, aabb)) + plane.w < 0.0 {
                return VisibilityState::Out;
            }

            if result == VisibilityState::Intersect {
                continue;
            }

            if normal.dot(Self::negative_vertex(normal, aabb)) + plane.w <= 0.0 {
                result = VisibilityState::Intersect;
            }
        }

        result
    }

    /// Test if a sphere (potentially) intersects this frustum.
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes.iter().all(|plane| {
            plane.truncate().dot(sphere.center) + plane.w >= -sphere.radius
        })
    }

    /// Corner of `aabb` furthest along `normal`.
    #[inline]
    fn positive_vertex(normal: Vec3, aabb: &AABB) -> Vec3 {
        Vec3::new(
            if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
            if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
            if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
        )
    }

    /// Corner of `aabb` furthest against `normal`.
    #[inline]
    fn negative_vertex(normal: Vec3, aabb: &AABB) -> Vec3 {
        Vec3::new(
            if normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
            if normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
            if normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
        )
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
