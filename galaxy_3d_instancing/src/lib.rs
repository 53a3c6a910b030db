/*!
# Galaxy 3D Instancing

Visibility engine for instanced rendering in the Galaxy 3D engine.

Many copies of one shape are drawn with a single instanced draw call. Each
frame, the instances outside the camera frustum are culled, and the
survivors are kept packed at the front of the per-instance attribute
buffers so the draw call only has to cover `[0, active_count)`.

## Architecture

- **Frustum**: six planes extracted from a view-projection matrix, with a
  tri-state (In / Intersect / Out) box classification
- **InstanceBvh**: static bounding volume hierarchy over instance boxes,
  caching each node's last classification so only changes are reported
- **ActiveSet**: slot permutation keeping drawn instances contiguous,
  updated in batches with the minimum of attribute swaps
- **InstancedMesh**: drives culler and active set once per frame, with a
  static (BVH) or dynamic (per-instance sphere) culling behaviour
- **InstancedScene**: a set of instanced meshes culled against one camera

Nothing here touches a GPU: the renderer pulls the attribute bytes and the
dirty slot range after each culling pass.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod bounds;
pub mod camera;
pub mod bvh;
pub mod config;
pub mod instancing;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (logging)
    pub use crate::engine::{Engine, DEFAULT_MIN_SEVERITY};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Bounding volumes
    pub mod bounds {
        pub use crate::bounds::*;
    }

    // Camera and frustum
    pub mod camera {
        pub use crate::camera::*;
    }

    // BVH
    pub mod bvh {
        pub use crate::bvh::*;
    }

    // Configuration
    pub mod config {
        pub use crate::config::*;
    }

    // Instances, active set, cullers, instanced meshes
    pub mod instancing {
        pub use crate::instancing::*;
    }
}

// Re-export math library at crate root
pub use glam;
