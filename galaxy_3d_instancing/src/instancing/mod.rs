//! Instancing module
//!
//! Instances, the active-set partitioner keeping drawn instances packed at
//! the front of the attribute buffers, culling strategies, and the
//! instanced mesh / scene containers driving them once per frame.

mod instance;
mod attribute_buffer;
mod active_set;
mod culler;
mod instanced_mesh;
mod instanced_scene;

pub use instance::{Instance, InstanceId, InstanceFlags};
pub use attribute_buffer::AttributeBuffer;
pub use active_set::{ActiveSet, SlotSwap};
pub use culler::{InstanceCuller, BvhCuller, SphereCuller};
pub use instanced_mesh::{
    InstancedMesh, InstanceGeometry, CullingReport,
    MATRIX_ATTRIBUTE, COLOR_ATTRIBUTE,
};
pub use instanced_scene::{InstancedScene, InstancedMeshKey, SceneCullingReport};
