/// InstancedScene - the instanced meshes culled against one camera.
///
/// Uses a SlotMap for O(1) insert/remove with stable keys. The frustum is
/// extracted once per frame and shared by every mesh.

use slotmap::{new_key_type, SlotMap};
use crate::camera::{Camera, Frustum};
use crate::error::Result;
use crate::engine_trace;
use super::instanced_mesh::InstancedMesh;

new_key_type! {
    /// Stable key for an InstancedMesh in an InstancedScene
    pub struct InstancedMeshKey;
}

/// Totals of one scene culling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneCullingReport {
    /// Meshes culled
    pub meshes: usize,
    pub shown: usize,
    pub hidden: usize,
    pub swaps: usize,
    /// Drawn instances across all meshes
    pub active_count: usize,
}

#[derive(Default)]
pub struct InstancedScene {
    meshes: SlotMap<InstancedMeshKey, InstancedMesh>,
}

impl InstancedScene {
    pub fn new() -> Self {
        Self {
            meshes: SlotMap::with_key(),
        }
    }

    /// Add a mesh. The key stays valid until the mesh is removed.
    pub fn add_mesh(&mut self, mesh: InstancedMesh) -> InstancedMeshKey {
        self.meshes.insert(mesh)
    }

    /// Remove a mesh and hand it back. Returns None for a stale key.
    pub fn remove_mesh(&mut self, key: InstancedMeshKey) -> Option<InstancedMesh> {
        self.meshes.remove(key)
    }

    pub fn mesh(&self, key: InstancedMeshKey) -> Option<&InstancedMesh> {
        self.meshes.get(key)
    }

    pub fn mesh_mut(&mut self, key: InstancedMeshKey) -> Option<&mut InstancedMesh> {
        self.meshes.get_mut(key)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn meshes(&self) -> impl Iterator<Item = (InstancedMeshKey, &InstancedMesh)> + '_ {
        self.meshes.iter()
    }

    /// Cull every mesh against the camera.
    ///
    /// The camera's depth convention is used for every mesh; the depth
    /// range stored in each mesh config only applies to
    /// `InstancedMesh::update_culling`.
    ///
    /// Stops at the first mesh that fails (meshes culled before it keep
    /// their new state).
    pub fn update_culling(&mut self, camera: &Camera) -> Result<SceneCullingReport> {
        let frustum = Frustum::from_view_projection(
            &camera.view_projection_matrix(),
            camera.depth_range(),
        )?;

        let mut report = SceneCullingReport::default();
        for mesh in self.meshes.values_mut() {
            let mesh_report = mesh.cull_frustum(&frustum)?;
            report.meshes += 1;
            report.shown += mesh_report.shown;
            report.hidden += mesh_report.hidden;
            report.swaps += mesh_report.swaps;
            report.active_count += mesh_report.active_count;
        }

        engine_trace!(
            "galaxy3d::InstancedScene",
            "Culled {} meshes: +{} -{}, {} drawn",
            report.meshes,
            report.shown,
            report.hidden,
            report.active_count
        );

        Ok(report)
    }
}

#[cfg(test)]
#[path = "instanced_scene_tests.rs"]
mod tests;
