//! Bounding volumes shared by the frustum, the BVH and the culling driver.

mod aabb;
mod bounding_sphere;

pub use aabb::{AABB, AXIS_X, AXIS_Y, AXIS_Z};
pub use bounding_sphere::BoundingSphere;
