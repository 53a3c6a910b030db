//! BVH module - static bounding volume hierarchy for instance culling.
//!
//! Built once over the instance boxes, walked every frame with frustum
//! state caching so only instances that changed side are reported.

mod bvh;

pub use bvh::{InstanceBvh, BvhItem, BvhNode, BvhNodeKind, ROOT};
