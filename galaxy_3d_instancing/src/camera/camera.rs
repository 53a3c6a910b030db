/// Camera - low-level passive data container.
///
/// The Camera computes nothing but the combined matrix. The caller (scene
/// graph, controls) owns the camera and sets its view and projection every
/// frame; the culling driver only reads `view_projection_matrix()`.

use glam::Mat4;
use super::frustum::DepthRange;

/// Low-level camera. A passive data container.
#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    depth_range: DepthRange,
}

impl Camera {
    /// Create a new camera with the given matrices.
    ///
    /// `depth_range` describes the clip-space depth convention of
    /// `projection` (glam's `perspective_rh` is `ZeroToOne`).
    pub fn new(view: Mat4, projection: Mat4, depth_range: DepthRange) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
            depth_range,
        }
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (perspective or orthographic).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Clip-space depth convention of the projection.
    pub fn depth_range(&self) -> DepthRange {
        self.depth_range
    }

    // ===== SETTERS - store, compute nothing =====

    /// Set the view matrix.
    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    /// Set the projection matrix and its depth convention.
    pub fn set_projection(&mut self, matrix: Mat4, depth_range: DepthRange) {
        self.projection_matrix = matrix;
        self.depth_range = depth_range;
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
