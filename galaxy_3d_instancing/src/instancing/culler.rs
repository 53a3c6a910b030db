/// Instance culling strategies.
///
/// An InstanceCuller decides, once per frame, which instances of an
/// instanced mesh crossed the frustum boundary. It updates each instance's
/// `IN_FRUSTUM` flag and reports the instances whose drawn state changes,
/// ready to be fed to `ActiveSet::reconcile`.
///
/// Instances the user hid (`VISIBLE` cleared) never appear in the output.

use crate::bvh::{BvhItem, InstanceBvh};
use crate::camera::{Frustum, VisibilityState};
use crate::config::BvhConfig;
use crate::error::Result;
use crate::engine_precondition;
use super::instance::{Instance, InstanceFlags, InstanceId};
use super::instanced_mesh::InstanceGeometry;

/// Strategy for detecting frustum transitions of instances.
///
/// `&mut self` allows stateful implementations (a BVH with cached node
/// states, scratch buffers) to keep state across frames.
pub trait InstanceCuller: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Cull `instances` against `frustum`, appending ids that must become
    /// drawn to `show` and ids that must stop being drawn to `hide`.
    fn cull(
        &mut self,
        frustum: &Frustum,
        instances: &mut [Instance],
        geometry: &InstanceGeometry,
        show: &mut Vec<InstanceId>,
        hide: &mut Vec<InstanceId>,
    ) -> Result<()>;

    /// Rebuild any spatial structure from the current instance transforms.
    fn rebuild(&mut self, _instances: &[Instance], _geometry: &InstanceGeometry) -> Result<()> {
        Ok(())
    }

    /// Drop any spatial structure.
    fn discard(&mut self) {}

    /// Forget cached frustum state; the next cull treats every instance
    /// as inside the frustum.
    fn reset(&mut self) {}

    /// Spatial structure, if the strategy has one.
    fn bvh(&self) -> Option<&InstanceBvh> {
        None
    }
}

// ===== BVH CULLER =====

/// Static culler: walks a BVH built from the instance boxes.
///
/// Instances are expected not to move (or barely); after significant
/// movement call `rebuild`.
pub struct BvhCuller {
    config: BvhConfig,
    bvh: Option<InstanceBvh>,
    show: Vec<InstanceId>,
    hide: Vec<InstanceId>,
}

impl BvhCuller {
    /// Culler with no BVH yet (`rebuild` must run before `cull`).
    pub fn new(config: BvhConfig) -> Self {
        Self {
            config,
            bvh: None,
            show: Vec::new(),
            hide: Vec::new(),
        }
    }

    pub fn config(&self) -> &BvhConfig {
        &self.config
    }

    /// BVH items for the current transforms: world box and position.
    pub fn items(instances: &[Instance], geometry: &InstanceGeometry) -> Vec<BvhItem> {
        instances
            .iter()
            .map(|instance| BvhItem {
                id: instance.id(),
                aabb: geometry.bounding_box.transformed(&instance.matrix()),
                position: instance.position,
            })
            .collect()
    }
}

impl InstanceCuller for BvhCuller {
    fn name(&self) -> &'static str {
        "bvh"
    }

    fn cull(
        &mut self,
        frustum: &Frustum,
        instances: &mut [Instance],
        _geometry: &InstanceGeometry,
        show: &mut Vec<InstanceId>,
        hide: &mut Vec<InstanceId>,
    ) -> Result<()> {
        let Some(bvh) = self.bvh.as_mut() else {
            return Err(engine_precondition!(
                "galaxy3d::BvhCuller",
                "Static culling requested but no BVH is built"
            ));
        };

        self.show.clear();
        self.hide.clear();
        bvh.update_visibility(frustum, &mut self.show, &mut self.hide);

        for &id in &self.show {
            let instance = &mut instances[id.index()];
            if !instance.is_in_frustum() {
                instance.set_flag(InstanceFlags::IN_FRUSTUM, true);
                if instance.is_visible() {
                    show.push(id);
                }
            }
        }
        for &id in &self.hide {
            let instance = &mut instances[id.index()];
            if instance.is_in_frustum() {
                instance.set_flag(InstanceFlags::IN_FRUSTUM, false);
                if instance.is_visible() {
                    hide.push(id);
                }
            }
        }

        Ok(())
    }

    fn rebuild(&mut self, instances: &[Instance], geometry: &InstanceGeometry) -> Result<()> {
        let items = Self::items(instances, geometry);
        self.bvh = Some(InstanceBvh::build(&items, &self.config)?);
        Ok(())
    }

    fn discard(&mut self) {
        self.bvh = None;
    }

    fn reset(&mut self) {
        if let Some(bvh) = self.bvh.as_mut() {
            bvh.reset_visibility(VisibilityState::In);
        }
    }

    fn bvh(&self) -> Option<&InstanceBvh> {
        self.bvh.as_ref()
    }
}

// ===== SPHERE CULLER =====

/// Dynamic culler: tests the world bounding sphere of every instance,
/// every frame. O(n), no build cost, any amount of movement.
///
/// Hidden instances are tested too so their `IN_FRUSTUM` flag stays
/// current for the moment they are shown again; only visible ones are
/// reported.
pub struct SphereCuller;

impl SphereCuller {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SphereCuller {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceCuller for SphereCuller {
    fn name(&self) -> &'static str {
        "sphere"
    }

    fn cull(
        &mut self,
        frustum: &Frustum,
        instances: &mut [Instance],
        geometry: &InstanceGeometry,
        show: &mut Vec<InstanceId>,
        hide: &mut Vec<InstanceId>,
    ) -> Result<()> {
        for instance in instances.iter_mut() {
            let sphere = geometry
                .bounding_sphere
                .transformed(instance.position, instance.rotation, instance.scale);
            let inside = frustum.intersects_sphere(&sphere);
            if inside == instance.is_in_frustum() {
                continue;
            }
            instance.set_flag(InstanceFlags::IN_FRUSTUM, inside);
            if !instance.is_visible() {
                continue;
            }
            if inside {
                show.push(instance.id());
            } else {
                hide.push(instance.id());
            }
        }
        Ok(())
    }
}
