/// InstancedMesh - a fixed set of instances of one shape, culled per frame.
///
/// Owns the instances, the `ActiveSet` that packs drawn instances at the
/// front of the attribute buffers, and the culling strategy chosen by the
/// configured behaviour (`BvhCuller` for static, `SphereCuller` for
/// dynamic).
///
/// An instance is drawn iff it is requested visible and, when per-instance
/// culling is enabled, inside the frustum. Every public operation keeps
/// the active set equal to that predicate.
///
/// # Example
///
/// ```ignore
/// let geometry = InstanceGeometry::from_aabb(AABB::new(Vec3::splat(-0.5), Vec3::splat(0.5)));
/// let mut trees = InstancedMesh::new(InstancedMeshConfig::default(), geometry, 10_000, |tree, i| {
///     tree.position = Vec3::new((i % 100) as f32 * 4.0, 0.0, (i / 100) as f32 * 4.0);
/// })?;
/// let report = trees.update_culling(&camera.view_projection_matrix())?;
/// if let Some(range) = trees.take_dirty_range() { /* upload */ }
/// ```

use std::ops::Range;
use glam::{Mat4, Vec3};
use crate::bounds::{AABB, BoundingSphere};
use crate::bvh::InstanceBvh;
use crate::camera::Frustum;
use crate::config::{CullingBehaviour, InstancedMeshConfig};
use crate::error::Result;
use crate::{engine_debug, engine_err, engine_info, engine_precondition, engine_trace};
use super::active_set::ActiveSet;
use super::culler::{BvhCuller, InstanceCuller, SphereCuller};
use super::instance::{Instance, InstanceFlags, InstanceId};

/// Name of the per-instance matrix attribute (16 floats, column-major)
pub const MATRIX_ATTRIBUTE: &str = "instance_matrix";
/// Name of the optional per-instance color attribute (3 floats)
pub const COLOR_ATTRIBUTE: &str = "instance_color";

// ===== GEOMETRY =====

/// Local-space bounds of the shared shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceGeometry {
    pub bounding_box: AABB,
    pub bounding_sphere: BoundingSphere,
}

impl InstanceGeometry {
    pub fn new(bounding_box: AABB, bounding_sphere: BoundingSphere) -> Self {
        Self { bounding_box, bounding_sphere }
    }

    /// Bounds from a box alone; the sphere circumscribes it.
    pub fn from_aabb(bounding_box: AABB) -> Self {
        Self {
            bounding_box,
            bounding_sphere: BoundingSphere::new(
                bounding_box.center(),
                bounding_box.extent().length() * 0.5,
            ),
        }
    }
}

// ===== REPORT =====

/// Outcome of one culling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CullingReport {
    /// Instances that became drawn
    pub shown: usize,
    /// Instances that stopped being drawn
    pub hidden: usize,
    /// Slot swaps performed in the attribute buffers
    pub swaps: usize,
    /// Drawn instances after the pass
    pub active_count: usize,
}

// ===== INSTANCED MESH =====

pub struct InstancedMesh {
    config: InstancedMeshConfig,
    geometry: InstanceGeometry,
    instances: Vec<Instance>,
    active_set: ActiveSet,
    culler: Box<dyn InstanceCuller>,
    matrix_attribute: usize,
    color_attribute: Option<usize>,
    show: Vec<InstanceId>,
    hide: Vec<InstanceId>,
}

impl InstancedMesh {
    /// Create `count` instances, all visible and drawn.
    ///
    /// `on_create` runs once per instance (with its index) to set the
    /// initial transform. Every matrix is then written to its slot, and for
    /// the static behaviour the BVH is built over the resulting boxes.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an invalid config or a count beyond 32-bit ids.
    pub fn new<F>(
        config: InstancedMeshConfig,
        geometry: InstanceGeometry,
        count: usize,
        mut on_create: F,
    ) -> Result<Self>
    where
        F: FnMut(&mut Instance, usize),
    {
        config.validate()?;

        let mut active_set = ActiveSet::new(count, count)?;
        let matrix_attribute = active_set.add_attribute(MATRIX_ATTRIBUTE, 16)?;

        let instances: Vec<Instance> = (0..count)
            .map(|index| {
                let mut instance = Instance::new(InstanceId(index as u32));
                on_create(&mut instance, index);
                instance
            })
            .collect();

        for instance in &instances {
            active_set.write_item(matrix_attribute, instance.id(), &instance.matrix().to_cols_array())?;
        }
        active_set.mark_all_dirty();

        let culler: Box<dyn InstanceCuller> = match config.behaviour {
            CullingBehaviour::Static => {
                let mut culler = BvhCuller::new(config.bvh);
                culler.rebuild(&instances, &geometry)?;
                Box::new(culler)
            }
            CullingBehaviour::Dynamic => Box::new(SphereCuller::new()),
        };

        engine_info!(
            "galaxy3d::InstancedMesh",
            "Created instanced mesh: {} instances, {} culler",
            count,
            culler.name()
        );

        Ok(Self {
            config,
            geometry,
            instances,
            active_set,
            culler,
            matrix_attribute,
            color_attribute: None,
            show: Vec::new(),
            hide: Vec::new(),
        })
    }

    /// Add the `instance_color` attribute, every instance set to `color`.
    pub fn with_color(mut self, color: Vec3) -> Result<Self> {
        let index = self.active_set.add_attribute(COLOR_ATTRIBUTE, 3)?;
        for instance in &self.instances {
            self.active_set.write_item(index, instance.id(), &color.to_array())?;
        }
        self.color_attribute = Some(index);
        Ok(self)
    }

    /// Add a custom per-instance attribute (zero-initialized).
    pub fn add_attribute(&mut self, name: &str, item_size: usize) -> Result<usize> {
        self.active_set.add_attribute(name, item_size)
    }

    /// Write a custom attribute value for one instance.
    pub fn set_attribute(&mut self, name: &str, id: InstanceId, values: &[f32]) -> Result<()> {
        self.active_set.write_attribute(name, id, values)
    }

    // ===== CULLING =====

    /// Cull against a view-projection matrix (in the configured depth
    /// convention) and update the drawn set.
    ///
    /// Does nothing when per-instance culling is disabled.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a non-finite matrix. `PreconditionViolation`
    /// for the static behaviour after `discard_bvh`.
    pub fn update_culling(&mut self, view_projection: &Mat4) -> Result<CullingReport> {
        if !self.config.per_instance_culling {
            return Ok(self.idle_report());
        }
        let frustum = Frustum::from_view_projection(view_projection, self.config.depth_range)?;
        self.cull_frustum(&frustum)
    }

    /// Cull against an already extracted frustum.
    pub fn cull_frustum(&mut self, frustum: &Frustum) -> Result<CullingReport> {
        if !self.config.per_instance_culling {
            return Ok(self.idle_report());
        }

        self.show.clear();
        self.hide.clear();
        self.culler.cull(frustum, &mut self.instances, &self.geometry, &mut self.show, &mut self.hide)?;

        let swaps = self.active_set.reconcile(&self.show, &self.hide)?;
        for i in 0..self.show.len() {
            self.flush_pending_matrix(self.show[i])?;
        }

        let report = CullingReport {
            shown: self.show.len(),
            hidden: self.hide.len(),
            swaps: swaps.len(),
            active_count: self.active_set.active_count(),
        };

        engine_trace!(
            "galaxy3d::InstancedMesh",
            "Culled ({}): +{} -{}, {} swaps, {}/{} drawn",
            self.culler.name(),
            report.shown,
            report.hidden,
            report.swaps,
            report.active_count,
            self.instances.len()
        );

        Ok(report)
    }

    fn idle_report(&self) -> CullingReport {
        CullingReport {
            active_count: self.active_set.active_count(),
            ..CullingReport::default()
        }
    }

    /// Enable or disable frustum culling.
    ///
    /// Disabling draws every visible instance. Re-enabling resets the
    /// cached frustum state, so the next `update_culling` recomputes
    /// everything.
    pub fn set_per_instance_culling(&mut self, enabled: bool) -> Result<()> {
        if self.config.per_instance_culling == enabled {
            return Ok(());
        }
        self.config.per_instance_culling = enabled;
        if enabled {
            self.culler.reset();
            Ok(())
        } else {
            self.mark_all_in_frustum()
        }
    }

    /// Set `IN_FRUSTUM` on every instance and draw the visible ones that
    /// were waiting on it.
    fn mark_all_in_frustum(&mut self) -> Result<()> {
        self.show.clear();
        for instance in &mut self.instances {
            if !instance.is_in_frustum() {
                instance.set_flag(InstanceFlags::IN_FRUSTUM, true);
                if instance.is_visible() {
                    self.show.push(instance.id());
                }
            }
        }
        self.active_set.reconcile(&self.show, &[])?;
        for i in 0..self.show.len() {
            self.flush_pending_matrix(self.show[i])?;
        }
        Ok(())
    }

    // ===== BVH =====

    /// Rebuild the BVH from the current transforms (static behaviour).
    ///
    /// The new tree starts with every node inside the frustum: instances
    /// culled so far are drawn again until the next `update_culling`.
    pub fn rebuild_bvh(&mut self) -> Result<()> {
        if self.config.behaviour != CullingBehaviour::Static {
            return Err(engine_precondition!(
                "galaxy3d::InstancedMesh",
                "Only static instanced meshes have a BVH"
            ));
        }
        self.culler.rebuild(&self.instances, &self.geometry)?;
        self.mark_all_in_frustum()?;
        engine_debug!(
            "galaxy3d::InstancedMesh",
            "Rebuilt BVH over {} instances",
            self.instances.len()
        );
        Ok(())
    }

    /// Drop the BVH. Static culling fails until `rebuild_bvh`.
    pub fn discard_bvh(&mut self) {
        self.culler.discard();
    }

    pub fn bvh(&self) -> Option<&InstanceBvh> {
        self.culler.bvh()
    }

    // ===== VISIBILITY =====

    /// Request an instance visible or hidden.
    ///
    /// A visible instance is drawn only while inside the frustum (when
    /// per-instance culling is on). The frustum state used here is the one
    /// of the last culling pass: an instance moved or shown since then is
    /// drawn (or not) from that state until the next `update_culling`.
    pub fn set_instance_visible(&mut self, id: InstanceId, visible: bool) -> Result<()> {
        let index = self.checked_index(id)?;
        let was_drawn = self.should_draw(&self.instances[index]);
        self.instances[index].set_flag(InstanceFlags::VISIBLE, visible);
        let now_drawn = self.should_draw(&self.instances[index]);

        match (was_drawn, now_drawn) {
            (false, true) => {
                self.active_set.activate(id)?;
                self.flush_pending_matrix(id)
            }
            (true, false) => self.active_set.deactivate(id),
            _ => Ok(()),
        }
    }

    /// Make the first `count` instances visible and the rest hidden.
    pub fn set_visible_count(&mut self, count: usize) -> Result<()> {
        if count > self.instances.len() {
            return Err(engine_err!(
                "galaxy3d::InstancedMesh",
                "Visible count {} exceeds instance count {}",
                count,
                self.instances.len()
            ));
        }

        self.show.clear();
        self.hide.clear();
        let culling = self.config.per_instance_culling;
        for (index, instance) in self.instances.iter_mut().enumerate() {
            let drawn = |i: &Instance| i.is_visible() && (!culling || i.is_in_frustum());
            let was_drawn = drawn(&*instance);
            instance.set_flag(InstanceFlags::VISIBLE, index < count);
            match (was_drawn, drawn(&*instance)) {
                (false, true) => self.show.push(instance.id()),
                (true, false) => self.hide.push(instance.id()),
                _ => {}
            }
        }

        self.active_set.reconcile(&self.show, &self.hide)?;
        for i in 0..self.show.len() {
            self.flush_pending_matrix(self.show[i])?;
        }
        Ok(())
    }

    fn should_draw(&self, instance: &Instance) -> bool {
        instance.is_visible() && (!self.config.per_instance_culling || instance.is_in_frustum())
    }

    // ===== TRANSFORMS =====

    /// Mutable access to an instance transform.
    ///
    /// Call `update_instance_matrix` afterwards; static meshes also need
    /// `rebuild_bvh` once instances moved significantly.
    pub fn instance_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(id.index())
    }

    /// Write the instance matrix to its slot if the instance is drawn,
    /// otherwise defer until it becomes drawn.
    pub fn update_instance_matrix(&mut self, id: InstanceId) -> Result<()> {
        let index = self.checked_index(id)?;
        if self.active_set.is_active(id) {
            self.compose(index)
        } else {
            self.instances[index].set_flag(InstanceFlags::MATRIX_NEEDS_UPDATE, true);
            Ok(())
        }
    }

    /// Write the instance matrix to its slot now, drawn or not.
    pub fn force_update_instance_matrix(&mut self, id: InstanceId) -> Result<()> {
        let index = self.checked_index(id)?;
        self.compose(index)
    }

    fn flush_pending_matrix(&mut self, id: InstanceId) -> Result<()> {
        if self.instances[id.index()].matrix_needs_update() {
            self.compose(id.index())?;
        }
        Ok(())
    }

    fn compose(&mut self, index: usize) -> Result<()> {
        let instance = &mut self.instances[index];
        self.active_set
            .write_item(self.matrix_attribute, instance.id(), &instance.matrix().to_cols_array())?;
        instance.set_flag(InstanceFlags::MATRIX_NEEDS_UPDATE, false);
        Ok(())
    }

    /// Matrix currently stored in the instance's slot.
    pub fn stored_matrix(&self, id: InstanceId) -> Option<Mat4> {
        self.active_set
            .read_item(self.matrix_attribute, id)
            .map(Mat4::from_cols_slice)
    }

    // ===== COLOR =====

    /// # Errors
    ///
    /// `PreconditionViolation` when the mesh was built without `with_color`.
    pub fn set_color(&mut self, id: InstanceId, color: Vec3) -> Result<()> {
        let Some(attribute) = self.color_attribute else {
            return Err(engine_precondition!(
                "galaxy3d::InstancedMesh",
                "Instanced mesh has no color attribute"
            ));
        };
        self.active_set.write_item(attribute, id, &color.to_array())
    }

    pub fn color(&self, id: InstanceId) -> Option<Vec3> {
        let attribute = self.color_attribute?;
        self.active_set.read_item(attribute, id).map(Vec3::from_slice)
    }

    // ===== QUERIES =====

    /// Total number of instances
    pub fn count(&self) -> usize {
        self.instances.len()
    }

    /// Number of drawn instances (the instance count of the draw call)
    pub fn active_count(&self) -> usize {
        self.active_set.active_count()
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id.index())
    }

    pub fn active_set(&self) -> &ActiveSet {
        &self.active_set
    }

    /// Slots written since the last call; upload them before drawing.
    pub fn take_dirty_range(&mut self) -> Option<Range<u32>> {
        self.active_set.take_dirty_range()
    }

    pub fn behaviour(&self) -> CullingBehaviour {
        self.config.behaviour
    }

    pub fn config(&self) -> &InstancedMeshConfig {
        &self.config
    }

    pub fn geometry(&self) -> &InstanceGeometry {
        &self.geometry
    }

    fn checked_index(&self, id: InstanceId) -> Result<usize> {
        if id.index() < self.instances.len() {
            Ok(id.index())
        } else {
            Err(engine_precondition!(
                "galaxy3d::InstancedMesh",
                "Instance {} out of range ({} instances)",
                id,
                self.instances.len()
            ))
        }
    }
}

#[cfg(test)]
#[path = "instanced_mesh_tests.rs"]
mod tests;
