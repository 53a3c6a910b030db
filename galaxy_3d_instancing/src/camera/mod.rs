//! Camera module - low-level camera and frustum.
//!
//! Provides passive data containers for the culling pipeline.
//! Cameras are owned and driven by the caller.

mod camera;
mod frustum;

pub use camera::Camera;
pub use frustum::{
    Frustum, VisibilityState, DepthRange,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
